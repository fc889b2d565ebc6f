//! In-memory browser: windows, documents, popups, page and platform fakes.
//!
//! Runs host and remote contexts side by side in one process. Compiled for
//! tests and behind the `testing` feature.

pub mod document;
pub mod platform;
pub mod popup;
pub mod window;

pub use document::{FrameBootHook, LoadBehavior, SimDocument, SimElement, SimFrame};
pub use platform::{SimHostPage, SimPushPlatform};
pub use popup::{OpenedPopup, PopupBootHook, SimPopupOpener};
pub use window::SimWindow;
