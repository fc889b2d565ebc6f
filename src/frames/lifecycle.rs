//! Hidden proxy iframe: mount, connect, initialize, tear down.

use super::services::{self, InitializePayload};
use super::{host_handlers, HandlerDeps};
use crate::collaborators::{Collaborators, Document, FrameElement, FrameSpec};
use crate::context::SdkContext;
use crate::environment::{WindowRole, PUSH_IFRAME_PATH};
use crate::error::SdkError;
use crate::events::EventKind;
use crate::messenger::{
    Command, CorrelationId, MessageSource, Messenger, OriginPattern, REMOTE_OPERATION_COMPLETE,
};
use crate::storage::OPTIONS_TABLE;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Absent,
    Loading,
    Connected,
    Disposed,
}

/// One proxy iframe on one origin
pub struct FrameLifecycle {
    url: Url,
    context: Arc<SdkContext>,
    collaborators: Collaborators,
    document: Arc<dyn Document>,
    local: Arc<dyn MessageSource>,
    state: Mutex<FrameState>,
    element: Mutex<Option<Arc<dyn FrameElement>>>,
    messenger: Mutex<Option<Messenger>>,
}

impl FrameLifecycle {
    /// `origin` is the service origin; the frame page path is fixed.
    pub fn new(
        origin: &Url,
        context: Arc<SdkContext>,
        collaborators: Collaborators,
        document: Arc<dyn Document>,
        local: Arc<dyn MessageSource>,
    ) -> Self {
        let mut url = origin.clone();
        url.set_path(PUSH_IFRAME_PATH);
        url.set_query(None);
        Self {
            url,
            context,
            collaborators,
            document,
            local,
            state: Mutex::new(FrameState::Absent),
            element: Mutex::new(None),
            messenger: Mutex::new(None),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn state(&self) -> FrameState {
        *self.state.lock()
    }

    /// The channel to the frame once it has been created
    pub fn messenger(&self) -> Option<Messenger> {
        self.messenger.lock().clone()
    }

    /// Mount the frame and bring its channel up.
    ///
    /// Any frame already mounted at the same URL is removed first. The whole
    /// load → connect → initialize sequence is bounded by the configured load
    /// timeout. Resolves once the frame acknowledged initialization.
    pub async fn load(&self) -> Result<(), SdkError> {
        {
            let mut state = self.state.lock();
            if *state == FrameState::Loading {
                return Err(SdkError::InvalidState(format!(
                    "Frame at {} is already loading",
                    self.url
                )));
            }
            *state = FrameState::Loading;
        }
        if let Some(previous) = self.messenger.lock().take() {
            previous.destroy();
        }

        debug!("Opening an iFrame to {}", self.url);
        let replaced = self.document.remove_frames_with_src(&self.url);
        if replaced > 0 {
            debug!(replaced, "Removed existing frames at {}", self.url);
        }
        let mounted = self.document.append_frame(FrameSpec::proxy(self.url.clone()));
        *self.element.lock() = Some(Arc::clone(&mounted.element));

        let frames = self.context.config().frames;
        let outcome = tokio::time::timeout(
            frames.load_timeout(),
            self.establish(mounted.element, mounted.loaded),
        )
        .await;

        match outcome {
            Ok(Ok(())) => {
                {
                    let mut state = self.state.lock();
                    if *state != FrameState::Loading {
                        return Err(SdkError::ChannelDestroyed);
                    }
                    *state = FrameState::Connected;
                }
                info!("Proxy frame at {} is ready", self.url);
                self.context.bus().trigger(EventKind::SdkInitialized, None);
                Ok(())
            }
            Ok(Err(e)) => {
                warn!("Proxy frame at {} failed to initialize: {}", self.url, e);
                self.abandon(true);
                Err(e)
            }
            Err(_) => {
                warn!(
                    "Could not load iFrame with URL {}. Please check that your 'subdomainName' \
                     matches the one in your app settings, and that your Site URL there is a \
                     valid, reachable URL pointing to your site.",
                    self.url
                );
                self.abandon(frames.remove_on_timeout);
                Err(SdkError::Timeout {
                    url: self.url.to_string(),
                    after_ms: frames.load_timeout_ms,
                })
            }
        }
    }

    async fn establish(
        &self,
        element: Arc<dyn FrameElement>,
        loaded: oneshot::Receiver<()>,
    ) -> Result<(), SdkError> {
        loaded.await.map_err(|_| {
            SdkError::InvalidState(format!("Frame at {} was removed before loading", self.url))
        })?;
        debug!("iFrame at {} finished loading", self.url);

        let origin = OriginPattern::exact(&self.url)?;
        let messenger = Messenger::new(
            Arc::clone(&self.local),
            element.content_window(),
            origin.clone(),
            origin,
        )?;
        let deps = HandlerDeps {
            context: Arc::clone(&self.context),
            collaborators: self.collaborators.clone(),
            remote_role: WindowRole::ProxyFrame,
        };
        host_handlers::install(&messenger, &deps);
        services::install_storage_proxy(&messenger, &deps);
        services::install_permission_proxy(&messenger, &deps);
        *self.messenger.lock() = Some(messenger.clone());

        messenger.connect()?;
        messenger.wait_connected().await?;
        debug!("Established cross-origin communication with {}", self.url);

        let payload = self.initialize_payload().await;
        let reply = messenger.request(Command::IframePopupInitialize, payload).await?;
        match reply {
            Value::String(s) if s == REMOTE_OPERATION_COMPLETE => Ok(()),
            other => Err(SdkError::Remote(other)),
        }
    }

    async fn initialize_payload(&self) -> InitializePayload {
        let storage = &self.collaborators.storage;
        let stored = |key: &'static str| async move {
            match storage.get(OPTIONS_TABLE, key).await {
                Ok(Some(Value::String(value))) => Some(value),
                Ok(_) => None,
                Err(e) => {
                    debug!("Could not read option {}: {}", key, e);
                    None
                }
            }
        };
        let page = &self.collaborators.page;
        InitializePayload {
            host_init_options: self.context.init_options(),
            default_url: Some(
                stored("defaultUrl")
                    .await
                    .unwrap_or_else(|| page.location_href()),
            ),
            page_url: Some(page.location_href()),
            page_title: Some(stored("defaultTitle").await.unwrap_or_else(|| page.title())),
        }
    }

    fn abandon(&self, remove_element: bool) {
        if let Some(messenger) = self.messenger.lock().take() {
            messenger.destroy();
        }
        if remove_element {
            if let Some(element) = self.element.lock().take() {
                element.remove();
            }
        }
        *self.state.lock() = FrameState::Disposed;
    }

    /// Destroy the channel and remove the frame. Idempotent.
    pub fn dispose(&self) {
        if self.state() == FrameState::Disposed && self.messenger.lock().is_none() {
            return;
        }
        self.abandon(true);
        self.document.remove_frames_with_src(&self.url);
        debug!("Disposed proxy frame at {}", self.url);
    }

    pub fn message(&self, command: impl Into<Command>, data: impl Serialize) -> Result<CorrelationId, SdkError> {
        self.messenger()
            .ok_or(SdkError::NotConnected)?
            .message(command, data)
    }

    pub async fn request(&self, command: impl Into<Command>, data: impl Serialize) -> Result<Value, SdkError> {
        let messenger = self.messenger().ok_or(SdkError::NotConnected)?;
        messenger.request(command, data).await
    }
}
