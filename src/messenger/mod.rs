//! Cross-context messaging.
//!
//! A [`Messenger`] is bound to one target window for its whole lifetime,
//! accepts inbound traffic from exactly one origin, and pairs requests with
//! replies by correlation id.

pub mod channel;
pub mod command;
pub mod envelope;
pub mod origin;
pub mod transport;

pub use channel::{ChannelState, HandlerId, HandlerOutcome, IncomingMessage, Messenger};
pub use command::{Command, REMOTE_OPERATION_COMPLETE};
pub use envelope::{CorrelationId, MessageEnvelope};
pub use origin::{Origin, OriginPattern};
pub use transport::{ListenerId, MessageEvent, MessageListener, MessageSource, WindowTarget};
