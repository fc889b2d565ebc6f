//! Cross-origin frames and windows the host creates, and the protocol
//! handlers installed on their channels.

pub mod cookie_sync;
pub mod host_handlers;
pub mod lifecycle;
pub mod modal;
pub mod popup;
pub mod services;

pub use cookie_sync::CookieSyncer;
pub use lifecycle::{FrameLifecycle, FrameState};
pub use modal::{SubscriptionModalHost, MODAL_CONTAINER_ID};
pub use popup::{PopupHost, PopupOptions};
pub use services::InitializePayload;

use crate::collaborators::Collaborators;
use crate::context::SdkContext;
use crate::environment::WindowRole;
use std::sync::Arc;

/// What protocol handlers need from their surroundings
#[derive(Clone)]
pub struct HandlerDeps {
    pub context: Arc<SdkContext>,
    pub collaborators: Collaborators,
    /// Role of the context at the other end of the channel
    pub remote_role: WindowRole,
}
