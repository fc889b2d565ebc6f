//! Window role classification.

use super::build::BuildMode;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Path of the subscription popup page on the service domain
pub const SUBSCRIBE_PATH: &str = "/subscribe";
/// Path of the hidden helper iframe
pub const PUSH_IFRAME_PATH: &str = "/webPushIframe";
/// Path of the modal prompt iframe
pub const PUSH_MODAL_PATH: &str = "/webPushModal";

/// Marker in the URL that explicitly requests popup initialization
const INIT_REQUEST_MARKER: &str = "initOneSignal";
/// Hostname suffix of the service's own domain
const SERVICE_DOMAIN_SUFFIX: &str = ".onesignal.com";
/// Local development hostnames contain this label
const LOCAL_DEV_HOST_LABEL: &str = ".localhost";

/// The purpose the current execution context serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowRole {
    /// A service worker global scope
    ServiceWorker,
    /// Top-level frame of the customer's site
    Host,
    /// Subscription popup opened for alt-origin sites
    SubscriptionPopup,
    /// Modal prompt iframe
    SubscriptionModal,
    /// Hidden helper iframe loaded from the subscription origin
    ProxyFrame,
    /// Some other iframe on the customer's site
    CustomIframe,
    /// Nothing we recognize
    Unknown,
}

impl WindowRole {
    /// Whether this context was created by another context and reports back to it
    pub fn is_remote(self) -> bool {
        matches!(self, WindowRole::SubscriptionPopup | WindowRole::ProxyFrame)
    }

    /// Legacy `environment.isPopup()` helper
    pub fn is_popup(self) -> bool {
        self == WindowRole::SubscriptionPopup
    }

    /// Legacy `environment.isIframe()` helper
    pub fn is_iframe(self) -> bool {
        self == WindowRole::ProxyFrame
    }
}

impl fmt::Display for WindowRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WindowRole::ServiceWorker => "ServiceWorker",
            WindowRole::Host => "Host",
            WindowRole::SubscriptionPopup => "SubscriptionPopup",
            WindowRole::SubscriptionModal => "SubscriptionModal",
            WindowRole::ProxyFrame => "ProxyFrame",
            WindowRole::CustomIframe => "CustomIframe",
            WindowRole::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Snapshot of the ambient state classification depends on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbientContext {
    /// A `window` global exists
    pub has_window: bool,
    /// A service-worker style `registration` handle exists on the global scope
    pub has_worker_registration: bool,
    /// `window === window.top`
    pub is_top_frame: bool,
    /// Current location, if there is one
    pub location: Option<Url>,
    /// Compile-time build flavour
    pub build: BuildMode,
}

impl AmbientContext {
    /// Top-level window at the given location
    pub fn top_window(location: Url) -> Self {
        Self {
            has_window: true,
            has_worker_registration: false,
            is_top_frame: true,
            location: Some(location),
            build: BuildMode::current(),
        }
    }

    /// Nested iframe at the given location
    pub fn nested_frame(location: Url) -> Self {
        Self {
            is_top_frame: false,
            ..Self::top_window(location)
        }
    }

    /// Windowless global scope, optionally with a worker registration
    pub fn windowless(has_worker_registration: bool) -> Self {
        Self {
            has_window: false,
            has_worker_registration,
            is_top_frame: false,
            location: None,
            build: BuildMode::current(),
        }
    }

    pub fn with_build(mut self, build: BuildMode) -> Self {
        self.build = build;
        self
    }
}

/// Classify the execution context
///
/// First match wins: windowless scopes, then top frames (popup before host),
/// then nested frames by path. Path and query checks are strict equality so
/// a host page sharing a hostname is never taken for the popup.
pub fn classify(ambient: &AmbientContext) -> WindowRole {
    if !ambient.has_window {
        return if ambient.has_worker_registration {
            WindowRole::ServiceWorker
        } else {
            WindowRole::Unknown
        };
    }

    let Some(location) = ambient.location.as_ref() else {
        return WindowRole::Unknown;
    };

    if ambient.is_top_frame {
        if is_subscription_popup(location, ambient.build) {
            WindowRole::SubscriptionPopup
        } else {
            WindowRole::Host
        }
    } else if location.path() == PUSH_IFRAME_PATH || location.path() == PUSH_MODAL_PATH {
        WindowRole::ProxyFrame
    } else {
        WindowRole::CustomIframe
    }
}

fn is_subscription_popup(location: &Url, build: BuildMode) -> bool {
    if location.as_str().contains(INIT_REQUEST_MARKER) {
        return true;
    }

    let empty_query = location.query().map_or(true, str::is_empty);
    if location.path() != SUBSCRIBE_PATH || !empty_query {
        return false;
    }

    let host = location.host_str().unwrap_or_default();
    host.ends_with(SERVICE_DOMAIN_SUFFIX)
        || (host.contains(LOCAL_DEV_HOST_LABEL) && build == BuildMode::Development)
}
