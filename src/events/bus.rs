//! Process-wide event fan-out with the cross-context retrigger path.

use super::kind::EventKind;
use crate::environment::WindowRole;
use crate::error::SdkError;
use crate::messenger::{Command, Messenger};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error};

pub type EventHandler = Arc<dyn Fn(&Value) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    once: bool,
    handler: EventHandler,
}

/// Payload of a `RETRIGGER_EVENT` command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetriggerPayload {
    pub event_name: String,
    #[serde(default)]
    pub event_data: Value,
    #[serde(default)]
    pub source_role: Option<WindowRole>,
}

/// What one `trigger` call did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Triggered {
    /// Subscriber invocations, aliases included
    pub delivered: usize,
    /// Dropped by the single-fire guard
    pub suppressed: bool,
    /// Sent to the creator context
    pub forwarded: bool,
}

/// Event bus of one browsing context
pub struct EventBus {
    role: WindowRole,
    subscribers: RwLock<HashMap<EventKind, Vec<Subscription>>>,
    initialized: AtomicBool,
    creator: RwLock<Option<Messenger>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new(role: WindowRole) -> Self {
        Self {
            role,
            subscribers: RwLock::new(HashMap::new()),
            initialized: AtomicBool::new(false),
            creator: RwLock::new(None),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn role(&self) -> WindowRole {
        self.role
    }

    pub fn on<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.subscribe(kind, false, Arc::new(handler))
    }

    /// Subscribe for the next firing only
    pub fn once<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.subscribe(kind, true, Arc::new(handler))
    }

    fn subscribe(&self, kind: EventKind, once: bool, handler: EventHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .write()
            .entry(kind)
            .or_default()
            .push(Subscription { id, once, handler });
        id
    }

    pub fn off(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let mut removed = false;
        for list in subscribers.values_mut() {
            let before = list.len();
            list.retain(|s| s.id != id);
            removed |= list.len() != before;
        }
        removed
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers.read().get(&kind).map_or(0, Vec::len)
    }

    /// Whether the SDK-initialized event has fired (or been pre-empted)
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Consume the single `SdkInitialized` firing without notifying anyone.
    /// Remote contexts do this at boot; they are initialized by their creator.
    pub fn mark_initialized(&self) {
        self.initialized.store(true, Ordering::SeqCst);
    }

    /// Channel to the context that created this one
    pub fn set_creator_channel(&self, messenger: Option<Messenger>) {
        *self.creator.write() = messenger;
    }

    pub fn creator_channel(&self) -> Option<Messenger> {
        self.creator.read().clone()
    }

    /// Fire an event raised in this context
    pub fn trigger(&self, kind: EventKind, data: Option<Value>) -> Triggered {
        self.dispatch(kind, data.unwrap_or(Value::Null), None)
    }

    /// Fire an event retriggered from a remote context running as `source`
    pub fn trigger_remote(&self, kind: EventKind, data: Value, source: WindowRole) -> Triggered {
        self.dispatch(kind, data, Some(source))
    }

    fn dispatch(&self, kind: EventKind, data: Value, source: Option<WindowRole>) -> Triggered {
        if !kind.is_silent() {
            let label = match source {
                Some(source) => format!("{} ⬸ {}", self.role, source),
                None => self.role.to_string(),
            };
            if data.is_null() {
                debug!("({}) » {}", label, kind);
            } else {
                debug!("({}) » {}: {}", label, kind, data);
            }
        }

        let mut triggered = Triggered::default();

        if kind == EventKind::SdkInitialized && self.initialized.swap(true, Ordering::SeqCst) {
            triggered.suppressed = true;
            return triggered;
        }

        triggered.delivered = self.fire(kind, &data);
        if let Some(alias) = kind.legacy_alias() {
            triggered.delivered += self.fire(alias, &data);
        }

        if self.role.is_remote() && kind.is_retriggerable() {
            triggered.forwarded = self.forward(kind, data);
        }

        triggered
    }

    fn fire(&self, kind: EventKind, data: &Value) -> usize {
        let handlers: Vec<EventHandler> = {
            let mut subscribers = self.subscribers.write();
            match subscribers.get_mut(&kind) {
                Some(list) => {
                    let handlers = list.iter().map(|s| Arc::clone(&s.handler)).collect();
                    list.retain(|s| !s.once);
                    handlers
                }
                None => return 0,
            }
        };
        for handler in &handlers {
            handler(data);
        }
        handlers.len()
    }

    fn forward(&self, kind: EventKind, data: Value) -> bool {
        let Some(creator) = self.creator_channel() else {
            let err = SdkError::NoCreatorReachable {
                event: kind.name().to_string(),
            };
            error!(role = %self.role, "{}", err);
            return false;
        };
        let payload = RetriggerPayload {
            event_name: kind.name().to_string(),
            event_data: data,
            source_role: Some(self.role),
        };
        match creator.message(Command::RetriggerEvent, payload) {
            Ok(_) => true,
            Err(e) => {
                error!("Could not retrigger '{}' on the creator: {}", kind, e);
                false
            }
        }
    }
}
