//! postMessage boundary.
//!
//! A browsing context can post into another context's window and can listen
//! for `message` events on its own window. Nothing above the messenger sees
//! these traits.

use super::origin::OriginPattern;
use serde_json::Value;
use std::sync::Arc;

/// A `message` event as delivered by the browser
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEvent {
    /// Origin of the posting context, as reported by the browser
    pub origin: String,
    pub data: Value,
}

/// Handle to another context's window (opener, parent or iframe content window)
pub trait WindowTarget: Send + Sync {
    /// Post into the target window. The browser drops the message if the
    /// target's origin does not match `target_origin`, and posting into a
    /// closed window is a no-op.
    fn post_message(&self, message: Value, target_origin: &OriginPattern);

    fn is_closed(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

pub type MessageListener = Arc<dyn Fn(MessageEvent) + Send + Sync>;

/// The local window's `message` event registration
pub trait MessageSource: Send + Sync {
    fn add_message_listener(&self, listener: MessageListener) -> ListenerId;
    fn remove_message_listener(&self, id: ListenerId);
}
