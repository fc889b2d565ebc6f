//! Third-party cookie sync pixel.

use crate::collaborators::Document;
use std::sync::Arc;
use tracing::debug;

pub const COOKIE_SYNC_DOM_ID: &str = "onesignal-cookie-sync";
pub const COOKIE_SYNC_SRC: &str = "onesignal-cookie-sync";

pub struct CookieSyncer {
    document: Arc<dyn Document>,
    enabled: bool,
}

impl CookieSyncer {
    pub fn new(document: Arc<dyn Document>, enabled: bool) -> Self {
        Self { document, enabled }
    }

    pub fn is_installed(&self) -> bool {
        self.document.has_element(COOKIE_SYNC_DOM_ID)
    }

    /// Place the pixel, replacing any previous one
    pub fn install(&self) -> bool {
        if !self.enabled {
            debug!("Cookie sync is disabled");
            return false;
        }
        self.uninstall();
        self.document.append_pixel(COOKIE_SYNC_DOM_ID, COOKIE_SYNC_SRC);
        debug!("Installed cookie sync pixel");
        true
    }

    pub fn uninstall(&self) -> bool {
        self.document.remove_element(COOKIE_SYNC_DOM_ID)
    }
}
