//! Subscription prompt shown in a modal iframe on the host page.

use super::{host_handlers, HandlerDeps};
use crate::collaborators::{Document, FrameSpec, PermissionState};
use crate::environment::{canonical_subscription_urls, WindowRole, PUSH_MODAL_PATH};
use crate::error::SdkError;
use crate::events::EventKind;
use crate::messenger::{
    Command, HandlerOutcome, MessageSource, Messenger, OriginPattern, REMOTE_OPERATION_COMPLETE,
};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::{Arc, Weak};
use tracing::{debug, warn};
use url::Url;

pub const MODAL_CONTAINER_ID: &str = "OneSignal-iframe-modal";

pub struct SubscriptionModalHost {
    deps: HandlerDeps,
    document: Arc<dyn Document>,
    local: Arc<dyn MessageSource>,
    url: Mutex<Option<Url>>,
    messenger: Mutex<Option<Messenger>>,
}

impl SubscriptionModalHost {
    pub fn new(
        deps: HandlerDeps,
        document: Arc<dyn Document>,
        local: Arc<dyn MessageSource>,
    ) -> Arc<Self> {
        Arc::new(Self {
            deps: HandlerDeps {
                remote_role: WindowRole::SubscriptionModal,
                ..deps
            },
            document,
            local,
            url: Mutex::new(None),
            messenger: Mutex::new(None),
        })
    }

    pub fn messenger(&self) -> Option<Messenger> {
        self.messenger.lock().clone()
    }

    pub fn url(&self) -> Option<Url> {
        self.url.lock().clone()
    }

    /// URL of the modal page; `prompt_query` is prepended to the query string
    pub async fn modal_url(&self, prompt_query: Option<&str>) -> Result<Url, SdkError> {
        let config = self.deps.context.config().app.app_config();
        let app_id = config
            .app_id
            .clone()
            .ok_or_else(|| SdkError::Config("An app id is required to show the modal prompt".to_string()))?;
        let mut url = canonical_subscription_urls(&config, self.deps.context.build())?.remove(0);
        url.set_path(PUSH_MODAL_PATH);

        let platform = &self.deps.collaborators.platform;
        let push_enabled = platform.is_push_enabled().await;
        let blocked = platform.notification_permission().await == PermissionState::Denied;
        let mut query = String::new();
        if let Some(prefix) = prompt_query.filter(|q| !q.is_empty()) {
            query.push_str(prefix);
            query.push('&');
        }
        query.push_str(&format!(
            "id={}&httpsPrompt=true&pushEnabled={}&permissionBlocked={}&promptType=modal",
            app_id, push_enabled, blocked
        ));
        url.set_query(Some(&query));
        Ok(url)
    }

    /// Mount the modal frame and listen for the prompt's outcome
    pub async fn load(self: &Arc<Self>, prompt_query: Option<&str>) -> Result<Messenger, SdkError> {
        let url = self.modal_url(prompt_query).await?;
        self.dispose();

        debug!("Showing the modal prompt at {}", url);
        let mounted = self
            .document
            .append_frame(FrameSpec::modal(url.clone(), MODAL_CONTAINER_ID));
        let origin = OriginPattern::exact(&url)?;
        let messenger = Messenger::new(
            Arc::clone(&self.local),
            mounted.element.content_window(),
            origin.clone(),
            origin,
        )?;
        messenger.start_post_message_receive();
        self.install_handlers(&messenger);
        *self.url.lock() = Some(url);
        *self.messenger.lock() = Some(messenger.clone());
        Ok(messenger)
    }

    fn install_handlers(self: &Arc<Self>, messenger: &Messenger) {
        host_handlers::install_retrigger(messenger, &self.deps);

        let weak = Arc::downgrade(self);
        messenger.once(Command::ModalPromptLoaded, move |_| {
            if let Some(modal) = weak.upgrade() {
                modal.document.reveal_element(MODAL_CONTAINER_ID);
                modal.deps.context.bus().trigger(EventKind::ModalLoaded, None);
            }
            HandlerOutcome::Continue
        });

        let weak = Arc::downgrade(self);
        messenger.once(Command::ModalPromptAccepted, move |message| {
            debug!("User accepted the modal prompt.");
            message.reply(REMOTE_OPERATION_COMPLETE);
            if let Some(modal) = weak.upgrade() {
                modal.dispose();
                modal.deps.context.bus().trigger(
                    EventKind::CustomPromptClick,
                    Some(json!({"result": "granted"})),
                );
                let platform = modal.deps.collaborators.platform.clone();
                tokio::spawn(async move {
                    if let Err(e) = platform.set_subscription(true).await {
                        warn!("Could not enable the subscription: {}", e);
                    }
                });
            }
            HandlerOutcome::Handled
        });

        let weak = Arc::downgrade(self);
        messenger.once(Command::ModalPromptRejected, move |message| {
            debug!("User rejected the modal prompt.");
            message.reply(REMOTE_OPERATION_COMPLETE);
            if let Some(modal) = weak.upgrade() {
                modal.dispose();
                modal.deps.context.bus().trigger(
                    EventKind::CustomPromptClick,
                    Some(json!({"result": "denied"})),
                );
            }
            HandlerOutcome::Handled
        });

        let weak: Weak<Self> = Arc::downgrade(self);
        messenger.once(Command::PopupClosing, move |message| {
            message.reply(REMOTE_OPERATION_COMPLETE);
            if let Some(modal) = weak.upgrade() {
                modal.dispose();
            }
            HandlerOutcome::Handled
        });
    }

    /// Destroy the channel and remove the modal. Idempotent.
    pub fn dispose(&self) {
        if let Some(messenger) = self.messenger.lock().take() {
            messenger.destroy();
        }
        if let Some(url) = self.url.lock().take() {
            self.document.remove_frames_with_src(&url);
        }
        self.document.remove_element(MODAL_CONTAINER_ID);
    }
}
