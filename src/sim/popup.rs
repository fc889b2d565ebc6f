//! Simulated `window.open`.

use super::window::SimWindow;
use crate::collaborators::{PopupGeometry, PopupOpener};
use crate::error::SdkError;
use crate::messenger::WindowTarget;
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use std::sync::Arc;
use url::Url;

/// Runs a popup's page scripts: `(popup window, opener window)`
pub type PopupBootHook = Arc<dyn Fn(&SimWindow, &SimWindow) + Send + Sync>;

#[derive(Clone)]
pub struct OpenedPopup {
    pub url: Url,
    pub post_data: Map<String, Value>,
    pub geometry: Option<PopupGeometry>,
    pub window: SimWindow,
}

pub struct SimPopupOpener {
    opener: SimWindow,
    opened: Mutex<Vec<OpenedPopup>>,
    boot_hook: RwLock<Option<PopupBootHook>>,
    blocked: RwLock<bool>,
}

impl SimPopupOpener {
    pub fn new(opener: SimWindow) -> Self {
        Self {
            opener,
            opened: Mutex::new(Vec::new()),
            boot_hook: RwLock::new(None),
            blocked: RwLock::new(false),
        }
    }

    pub fn on_popup_boot<F>(&self, hook: F)
    where
        F: Fn(&SimWindow, &SimWindow) + Send + Sync + 'static,
    {
        *self.boot_hook.write() = Some(Arc::new(hook));
    }

    /// Simulate a popup blocker
    pub fn set_blocked(&self, blocked: bool) {
        *self.blocked.write() = blocked;
    }

    pub fn opened(&self) -> Vec<OpenedPopup> {
        self.opened.lock().clone()
    }
}

impl PopupOpener for SimPopupOpener {
    fn open(
        &self,
        url: &Url,
        post_data: &Map<String, Value>,
        geometry: Option<PopupGeometry>,
    ) -> Result<Arc<dyn WindowTarget>, SdkError> {
        if *self.blocked.read() {
            return Err(SdkError::InvalidState(format!(
                "Popup to {} was blocked",
                url
            )));
        }
        let window = SimWindow::open(url.clone());
        self.opened.lock().push(OpenedPopup {
            url: url.clone(),
            post_data: post_data.clone(),
            geometry,
            window: window.clone(),
        });
        let hook = self.boot_hook.read().clone();
        if let Some(hook) = hook {
            hook(&window, &self.opener);
        }
        Ok(self.opener.handle_to(&window))
    }
}
