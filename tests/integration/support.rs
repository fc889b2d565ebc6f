use parking_lot::Mutex;
use pushlink::collaborators::Collaborators;
use pushlink::config::SdkConfig;
use pushlink::context::SdkContext;
use pushlink::environment::{BuildMode, WindowRole};
use pushlink::frames::HandlerDeps;
use pushlink::remote::{Creator, RemoteContext, RemoteOptions};
use pushlink::sim::{SimDocument, SimHostPage, SimPushPlatform, SimWindow};
use pushlink::storage::MemoryStorage;
use std::sync::Arc;
use std::time::Duration;

pub const HOST_URL: &str = "https://shop.example/cart";
pub const APP_ID: &str = "4e6b1c9a-app";

/// Let every queued delivery and spawned responder run to quiescence
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// One browsing context with recording collaborators
pub struct Page {
    pub window: SimWindow,
    pub document: Arc<SimDocument>,
    pub context: Arc<SdkContext>,
    pub storage: Arc<MemoryStorage>,
    pub platform: Arc<SimPushPlatform>,
    pub page: Arc<SimHostPage>,
}

impl Page {
    pub fn new(url: &str, role: WindowRole) -> Self {
        let window = SimWindow::open_str(url).unwrap();
        Self {
            document: Arc::new(SimDocument::new(window.clone())),
            window,
            context: SdkContext::with_role(role, BuildMode::Production),
            storage: Arc::new(MemoryStorage::new()),
            platform: Arc::new(SimPushPlatform::new()),
            page: Arc::new(SimHostPage::new(url, "Shop")),
        }
    }

    /// Host page configured for the `shop` subdomain
    pub fn host() -> Self {
        let host = Self::new(HOST_URL, WindowRole::Host);
        let mut config = SdkConfig::default();
        config.app.app_id = Some(APP_ID.to_string());
        config.app.subdomain_name = Some("shop".to_string());
        config.frames.load_timeout_ms = 5_000;
        config.frames.remove_on_timeout = true;
        host.context.configure(config).unwrap();
        host
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            storage: self.storage.clone(),
            platform: self.platform.clone(),
            page: self.page.clone(),
        }
    }

    pub fn deps(&self, remote_role: WindowRole) -> HandlerDeps {
        HandlerDeps {
            context: Arc::clone(&self.context),
            collaborators: self.collaborators(),
            remote_role,
        }
    }
}

/// Collaborators and a slot for a remote context booted inside a sim hook
#[derive(Clone)]
pub struct RemoteSlot {
    pub storage: Arc<MemoryStorage>,
    pub platform: Arc<SimPushPlatform>,
    remote: Arc<Mutex<Option<Arc<RemoteContext>>>>,
}

impl RemoteSlot {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(MemoryStorage::new()),
            platform: Arc::new(SimPushPlatform::new()),
            remote: Arc::new(Mutex::new(None)),
        }
    }

    /// Boot a remote context in `window`, created by `creator`
    pub fn boot(&self, role: WindowRole, window: &SimWindow, creator: &SimWindow) -> Arc<RemoteContext> {
        let context = SdkContext::with_role(role, BuildMode::Production);
        let collaborators = Collaborators {
            storage: self.storage.clone(),
            platform: self.platform.clone(),
            page: Arc::new(SimHostPage::new(window.location().as_str(), "")),
        };
        let options = RemoteOptions {
            origin: creator.origin().to_string(),
            is_popup: role.is_popup(),
            ..Default::default()
        };
        let handle = window.handle_to(creator);
        let creator = if role.is_popup() {
            Creator::Opener(handle)
        } else {
            Creator::Parent(handle)
        };
        let remote = Arc::new(
            RemoteContext::start(context, collaborators, window.as_source(), creator, options).unwrap(),
        );
        *self.remote.lock() = Some(Arc::clone(&remote));
        remote
    }

    pub fn get(&self) -> Arc<RemoteContext> {
        self.remote.lock().clone().expect("remote context was not booted")
    }

    pub fn is_booted(&self) -> bool {
        self.remote.lock().is_some()
    }
}
