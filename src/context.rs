//! Process-wide SDK context.
//!
//! Constructed once at boot from the classified window role and handed by
//! reference to the components that need configuration, init options or the
//! event bus.

use crate::config::SdkConfig;
use crate::environment::{classify, AmbientContext, BuildMode, WindowRole};
use crate::error::SdkError;
use crate::events::{EventBus, EventKind};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Created → Configured → Ready → Disposed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Configured,
    Ready,
    Disposed,
}

pub struct SdkContext {
    role: WindowRole,
    build: BuildMode,
    config: RwLock<SdkConfig>,
    state: RwLock<LifecycleState>,
    init_options: RwLock<Value>,
    bus: Arc<EventBus>,
}

impl SdkContext {
    /// Classify the ambient environment and build the context for that role
    pub fn new(ambient: &AmbientContext) -> Arc<Self> {
        Self::with_role(classify(ambient), ambient.build)
    }

    pub fn with_role(role: WindowRole, build: BuildMode) -> Arc<Self> {
        let context = Arc::new(Self {
            role,
            build,
            config: RwLock::new(SdkConfig::default()),
            state: RwLock::new(LifecycleState::Created),
            init_options: RwLock::new(Value::Object(Default::default())),
            bus: Arc::new(EventBus::new(role)),
        });

        let weak = Arc::downgrade(&context);
        context.bus.on(EventKind::SdkInitialized, move |_| {
            if let Some(context) = weak.upgrade() {
                context.mark_ready();
            }
        });

        info!(role = %role, build = %build, "SDK context created");
        context
    }

    pub fn role(&self) -> WindowRole {
        self.role
    }

    pub fn build(&self) -> BuildMode {
        self.build
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.read()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == LifecycleState::Ready
    }

    pub fn config(&self) -> SdkConfig {
        self.config.read().clone()
    }

    /// Install configuration; the host's init options are derived from it.
    pub fn configure(&self, config: SdkConfig) -> Result<(), SdkError> {
        config.validate()?;
        let mut state = self.state.write();
        if *state == LifecycleState::Disposed {
            return Err(SdkError::InvalidState(
                "Cannot configure a disposed SDK context".to_string(),
            ));
        }
        *self.init_options.write() = config.app.host_init_options();
        *self.config.write() = config;
        if *state == LifecycleState::Created {
            *state = LifecycleState::Configured;
        }
        Ok(())
    }

    pub fn mark_ready(&self) {
        let mut state = self.state.write();
        if *state != LifecycleState::Disposed && *state != LifecycleState::Ready {
            debug!(role = %self.role, "SDK context ready");
            *state = LifecycleState::Ready;
        }
    }

    /// Terminal; drops the creator channel held by the bus
    pub fn dispose(&self) {
        *self.state.write() = LifecycleState::Disposed;
        self.bus.set_creator_channel(None);
    }

    /// Init options in effect: the host's own, or for a remote context the
    /// merged options it received from its creator
    pub fn init_options(&self) -> Value {
        self.init_options.read().clone()
    }

    pub fn set_init_options(&self, options: Value) {
        *self.init_options.write() = options;
    }
}
