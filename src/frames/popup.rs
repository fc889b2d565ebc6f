//! Subscription popup opened from the host page.

use super::{host_handlers, HandlerDeps};
use crate::collaborators::{PopupGeometry, PopupOpener};
use crate::environment::{subscription_popup_url, WindowRole};
use crate::error::SdkError;
use crate::events::EventKind;
use crate::messenger::{Command, HandlerOutcome, MessageSource, Messenger, OriginPattern};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopupOptions {
    /// Subscribe without showing the popup's own prompt
    pub auto_accept: bool,
    /// Open off-screen to host an HTTP permission request
    pub http_permission_request: bool,
}

pub struct PopupHost {
    deps: HandlerDeps,
    opener: Arc<dyn PopupOpener>,
    local: Arc<dyn MessageSource>,
    messenger: Mutex<Option<Messenger>>,
}

impl PopupHost {
    pub fn new(deps: HandlerDeps, opener: Arc<dyn PopupOpener>, local: Arc<dyn MessageSource>) -> Self {
        Self {
            deps: HandlerDeps {
                remote_role: WindowRole::SubscriptionPopup,
                ..deps
            },
            opener,
            local,
            messenger: Mutex::new(None),
        }
    }

    pub fn messenger(&self) -> Option<Messenger> {
        self.messenger.lock().clone()
    }

    /// Form data posted to the popup page
    pub fn post_data(&self, options: PopupOptions, prompt_options: &Map<String, Value>) -> Map<String, Value> {
        let mut data = prompt_options.clone();
        data.insert("promptType".to_string(), json!("popup"));
        let href = self.deps.collaborators.page.location_href();
        let hostname = Url::parse(&href)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();
        data.insert("parentHostname".to_string(), Value::String(hostname));
        if options.auto_accept {
            data.insert("autoAccept".to_string(), json!(true));
        }
        if options.http_permission_request {
            data.insert("httpPermissionRequest".to_string(), json!(true));
        }
        data
    }

    /// Open the popup and bind a channel to it.
    ///
    /// The popup starts the handshake itself by posting
    /// `POPUP_BEGIN_MESSAGEPORT_COMMS`; the host then connects.
    pub fn open(&self, options: PopupOptions, prompt_options: &Map<String, Value>) -> Result<Messenger, SdkError> {
        let context = &self.deps.context;
        let url = subscription_popup_url(&context.config().app.app_config(), context.build())?;
        let geometry = options
            .http_permission_request
            .then(PopupGeometry::offscreen);

        if let Some(previous) = self.messenger.lock().take() {
            previous.destroy();
        }

        debug!("Opening a popup to {}", url);
        let window = self.opener.open(&url, &self.post_data(options, prompt_options), geometry)?;
        let origin = OriginPattern::exact(&url)?;
        let messenger = Messenger::new(Arc::clone(&self.local), window, origin.clone(), origin)?;
        messenger.start_post_message_receive();
        self.install_handlers(&messenger);
        *self.messenger.lock() = Some(messenger.clone());
        Ok(messenger)
    }

    fn install_handlers(&self, messenger: &Messenger) {
        host_handlers::install_retrigger(messenger, &self.deps);

        messenger.on(Command::PopupBeginMessageportComms, |message| {
            debug!("(Popup Postmam) Popup is ready; connecting");
            if let Err(e) = message.channel().connect() {
                warn!("Could not connect to the popup: {}", e);
            }
            HandlerOutcome::Handled
        });

        let bus = Arc::clone(self.deps.context.bus());
        messenger.once(Command::PopupLoaded, move |_| {
            bus.trigger(EventKind::PopupLoad, None);
            HandlerOutcome::Continue
        });

        let bus = Arc::clone(self.deps.context.bus());
        messenger.once(Command::PopupAccepted, move |_| {
            bus.trigger(EventKind::CustomPromptClick, Some(json!({"result": "granted"})));
            HandlerOutcome::Continue
        });

        let bus = Arc::clone(self.deps.context.bus());
        messenger.once(Command::PopupRejected, move |_| {
            bus.trigger(EventKind::CustomPromptClick, Some(json!({"result": "denied"})));
            HandlerOutcome::Continue
        });

        let bus = Arc::clone(self.deps.context.bus());
        messenger.once(Command::PopupClosing, move |message| {
            info!("Detected popup is closing.");
            bus.trigger(EventKind::PopupClose, None);
            message.reply(crate::messenger::REMOTE_OPERATION_COMPLETE);
            message.channel().destroy();
            HandlerOutcome::Handled
        });

        let page = self.deps.collaborators.page.clone();
        messenger.once(Command::BeginBrowsingSession, move |_| {
            debug!("(Popup Postmam) Beginning browsing session");
            page.begin_browser_session();
            HandlerOutcome::Continue
        });

        let bus = Arc::clone(self.deps.context.bus());
        messenger.once(Command::WindowTimeout, move |_| {
            debug!("(Popup Postmam) Received a popup window timeout");
            bus.trigger(EventKind::PopupWindowTimeout, None);
            HandlerOutcome::Continue
        });

        let deps = self.deps.clone();
        messenger.once(Command::FinishRemoteRegistration, move |message| {
            debug!("(Popup Postmam) Finishing remote registration");
            message.reply(json!({"progress": true}));
            // The popup is about to close; stop listening before it goes
            message.channel().stop_post_message_receive();

            let subscription_info = message
                .data()
                .get("subscriptionInfo")
                .cloned()
                .unwrap_or(Value::Null);
            let deps = deps.clone();
            tokio::spawn(async move {
                let platform = &deps.collaborators.platform;
                if let Err(e) = platform.finish_remote_registration(subscription_info).await {
                    warn!("Failed to finish remote registration: {}", e);
                    return;
                }
                let enabled = platform.is_push_enabled().await;
                deps.context
                    .bus()
                    .trigger(EventKind::SubscriptionChange, Some(Value::Bool(enabled)));
            });
            HandlerOutcome::Handled
        });
    }

    pub fn close(&self) {
        if let Some(messenger) = self.messenger.lock().take() {
            messenger.destroy();
        }
    }
}
