//! Simulated browsing contexts.
//!
//! Each window owns a FIFO message queue drained by its own tokio task, so
//! `post_message` returns before any listener runs, as in a browser. Must be
//! created inside a tokio runtime.

use crate::error::SdkError;
use crate::messenger::{
    ListenerId, MessageEvent, MessageListener, MessageSource, Origin, OriginPattern, WindowTarget,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tracing::trace;
use url::Url;

struct WindowInner {
    location: Url,
    origin: String,
    listeners: Mutex<Vec<(ListenerId, MessageListener)>>,
    next_listener: AtomicU64,
    queue: mpsc::UnboundedSender<MessageEvent>,
    inbox: Mutex<Vec<MessageEvent>>,
    outbox: Mutex<Vec<Value>>,
    closed: AtomicBool,
}

impl WindowInner {
    fn deliver(&self, event: MessageEvent) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        self.inbox.lock().push(event.clone());
        let listeners: Vec<MessageListener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(event.clone());
        }
    }
}

/// One browsing context's window
#[derive(Clone)]
pub struct SimWindow {
    inner: Arc<WindowInner>,
}

impl SimWindow {
    pub fn open(location: Url) -> Self {
        let origin = Origin::from_url(&location)
            .map(|o| o.as_str().to_string())
            .unwrap_or_else(|_| "null".to_string());
        let (queue, mut rx) = mpsc::unbounded_channel::<MessageEvent>();
        let inner = Arc::new(WindowInner {
            location,
            origin,
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(0),
            queue,
            inbox: Mutex::new(Vec::new()),
            outbox: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        });

        let weak = Arc::downgrade(&inner);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match weak.upgrade() {
                    Some(inner) => inner.deliver(event),
                    None => break,
                }
            }
        });

        Self { inner }
    }

    pub fn open_str(location: &str) -> Result<Self, SdkError> {
        Ok(Self::open(Url::parse(location)?))
    }

    pub fn location(&self) -> Url {
        self.inner.location.clone()
    }

    pub fn origin(&self) -> &str {
        &self.inner.origin
    }

    /// Handle through which this window posts into `target`
    pub fn handle_to(&self, target: &SimWindow) -> Arc<dyn WindowTarget> {
        Arc::new(SimWindowHandle {
            target: Arc::downgrade(&target.inner),
            from: Arc::downgrade(&self.inner),
            from_origin: self.inner.origin.clone(),
        })
    }

    /// Queue a message as if posted by a context at `origin`
    pub fn post_from(&self, origin: &str, data: Value) {
        if self.is_closed() {
            return;
        }
        let _ = self.inner.queue.send(MessageEvent {
            origin: origin.to_string(),
            data,
        });
    }

    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.listeners.lock().clear();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Every message delivered to this window so far
    pub fn received(&self) -> Vec<MessageEvent> {
        self.inner.inbox.lock().clone()
    }

    /// Every message this window posted, delivered or not
    pub fn sent(&self) -> Vec<Value> {
        self.inner.outbox.lock().clone()
    }

    /// `command` fields of the envelopes this window posted
    pub fn sent_commands(&self) -> Vec<String> {
        self.sent()
            .iter()
            .filter_map(|m| m.get("command").and_then(Value::as_str).map(str::to_string))
            .collect()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    pub fn as_source(&self) -> Arc<dyn MessageSource> {
        Arc::new(self.clone())
    }
}

impl MessageSource for SimWindow {
    fn add_message_listener(&self, listener: MessageListener) -> ListenerId {
        let id = ListenerId(self.inner.next_listener.fetch_add(1, Ordering::Relaxed));
        if !self.is_closed() {
            self.inner.listeners.lock().push((id, listener));
        }
        id
    }

    fn remove_message_listener(&self, id: ListenerId) {
        self.inner.listeners.lock().retain(|(lid, _)| *lid != id);
    }
}

struct SimWindowHandle {
    target: Weak<WindowInner>,
    from: Weak<WindowInner>,
    from_origin: String,
}

impl WindowTarget for SimWindowHandle {
    fn post_message(&self, message: Value, target_origin: &OriginPattern) {
        if let Some(from) = self.from.upgrade() {
            from.outbox.lock().push(message.clone());
        }
        let Some(target) = self.target.upgrade() else {
            return;
        };
        if target.closed.load(Ordering::SeqCst) {
            return;
        }
        if !target_origin.matches_str(&target.origin) {
            trace!(
                target_origin = %target_origin,
                actual = %target.origin,
                "Browser dropped message for mismatched target origin"
            );
            return;
        }
        let _ = target.queue.send(MessageEvent {
            origin: self.from_origin.clone(),
            data: message,
        });
    }

    fn is_closed(&self) -> bool {
        self.target
            .upgrade()
            .map_or(true, |t| t.closed.load(Ordering::SeqCst))
    }
}
