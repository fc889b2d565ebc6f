//! Boot of a remote context (proxy frame or subscription popup) inside the
//! service origin.

use crate::collaborators::Collaborators;
use crate::context::SdkContext;
use crate::environment::WindowRole;
use crate::error::SdkError;
use crate::events::EventKind;
use crate::frames::{services, HandlerDeps};
use crate::messenger::{Command, HandlerOutcome, MessageSource, Messenger, OriginPattern, WindowTarget};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, error, info};

/// The window that created this context
pub enum Creator {
    /// Popups post back to `window.opener`
    Opener(Arc<dyn WindowTarget>),
    /// Frames post back to `window.parent`
    Parent(Arc<dyn WindowTarget>),
    /// Opened directly; nobody to talk to
    Itself,
}

/// Options a remote page is booted with by its creator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteOptions {
    /// Origin of the host page
    pub origin: String,
    #[serde(default)]
    pub is_popup: bool,
    #[serde(default)]
    pub continue_pressed: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A booted remote context and its channel to the creator
pub struct RemoteContext {
    context: Arc<SdkContext>,
    channel: Messenger,
}

impl RemoteContext {
    /// Bind to the creator, install every responder and announce readiness.
    ///
    /// Popups start the handshake by posting `POPUP_BEGIN_MESSAGEPORT_COMMS`
    /// and report `httpInitialize` once the host connects. Frames report it
    /// immediately.
    pub fn start(
        context: Arc<SdkContext>,
        collaborators: Collaborators,
        local: Arc<dyn MessageSource>,
        creator: Creator,
        options: RemoteOptions,
    ) -> Result<Self, SdkError> {
        let target = match creator {
            Creator::Opener(window) | Creator::Parent(window) => window,
            Creator::Itself => {
                error!("This page cannot be opened directly; it must be opened by a subscription call.");
                return Err(SdkError::DirectlyOpened);
            }
        };

        let own_options = serde_json::to_value(&options)?;
        context.bus().mark_initialized();
        context.set_init_options(own_options.clone());

        let origin = OriginPattern::parse(&options.origin)?;
        let channel = Messenger::new(local, target, origin.clone(), origin)?;

        let deps = HandlerDeps {
            context: Arc::clone(&context),
            collaborators,
            remote_role: WindowRole::Host,
        };
        services::install_all(&channel, &deps, own_options);
        context.bus().set_creator_channel(Some(channel.clone()));

        if options.is_popup || context.role() == WindowRole::SubscriptionPopup {
            let bus = Arc::clone(context.bus());
            channel.on(Command::Connected, move |_| {
                info!("(Popup) Host connected; the popup is ready for commands");
                bus.trigger(EventKind::HttpInitialize, None);
                HandlerOutcome::Continue
            });
            channel.listen();
            channel.message(Command::PopupBeginMessageportComms, Value::Null)?;
            debug!("(Popup) Asked the opener to begin communication");
        } else {
            channel.listen();
            context.bus().trigger(EventKind::HttpInitialize, None);
        }

        Ok(Self { context, channel })
    }

    pub fn context(&self) -> &Arc<SdkContext> {
        &self.context
    }

    pub fn channel(&self) -> &Messenger {
        &self.channel
    }

    /// Tear down the channel and the context
    pub fn shutdown(&self) {
        self.channel.destroy();
        self.context.dispose();
    }
}
