//! SDK lifecycle events.

pub mod bus;
pub mod kind;

pub use bus::{EventBus, EventHandler, RetriggerPayload, SubscriptionId, Triggered};
pub use kind::EventKind;
