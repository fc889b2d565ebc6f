//! Execution environment classification
//!
//! Works out which role the current browsing context plays (host page, proxy
//! iframe, subscription popup, ...) and which build mode the SDK was compiled
//! for. Both are pure functions of ambient state so they can run before any
//! other component initializes.

mod alt_origin;
mod build;
mod window_role;

pub use alt_origin::{canonical_subscription_urls, subscription_popup_url, AppConfig};
pub use build::BuildMode;
pub use window_role::{classify, AmbientContext, WindowRole, SUBSCRIBE_PATH, PUSH_IFRAME_PATH, PUSH_MODAL_PATH};
