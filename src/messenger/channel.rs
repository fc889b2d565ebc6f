//! Origin-checked, command-addressed RPC over a single postMessage target.

use super::command::{Command, REMOTE_OPERATION_COMPLETE};
use super::envelope::{CorrelationId, MessageEnvelope};
use super::origin::OriginPattern;
use super::transport::{ListenerId, MessageEvent, MessageSource, WindowTarget};
use crate::error::SdkError;
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tracing::{debug, warn};

/// What a handler did with an inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// The handler owns the reply; suppresses the automatic acknowledgement
    Handled,
    /// Leave acknowledgement to the channel
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Connection status observable through [`Messenger::wait_connected`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Pending,
    Connected,
    Destroyed,
}

type Handler = Arc<dyn Fn(&IncomingMessage) -> HandlerOutcome + Send + Sync>;

struct HandlerEntry {
    id: HandlerId,
    once: bool,
    handler: Handler,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReceiveMode {
    /// Non-exempt commands wait for the connect handshake
    Handshake,
    /// Everything is dispatched as it arrives
    Direct,
}

struct State {
    receive_mode: Option<ReceiveMode>,
    listener: Option<ListenerId>,
    connected: bool,
    connect_id: Option<CorrelationId>,
    handlers: HashMap<Command, Vec<HandlerEntry>>,
    pending: HashMap<CorrelationId, oneshot::Sender<MessageEnvelope>>,
    backlog: Vec<(MessageEnvelope, String)>,
    next_handler: u64,
    destroyed: bool,
}

struct Inner {
    local: Arc<dyn MessageSource>,
    target: RwLock<Option<Arc<dyn WindowTarget>>>,
    send_origin: OriginPattern,
    receive_origin: OriginPattern,
    state: Mutex<State>,
    status: watch::Sender<ChannelState>,
}

/// Bidirectional channel to one other browsing context
///
/// Owns exactly one target window for its whole lifetime. Every inbound
/// message whose origin is not the configured receive origin is dropped
/// before it reaches a handler. Clones share the same channel.
#[derive(Clone)]
pub struct Messenger {
    inner: Arc<Inner>,
}

impl Messenger {
    /// Bind a channel to `target`, listening on the local window `local`.
    ///
    /// `receive_origin` must name a concrete origin.
    pub fn new(
        local: Arc<dyn MessageSource>,
        target: Arc<dyn WindowTarget>,
        send_origin: OriginPattern,
        receive_origin: OriginPattern,
    ) -> Result<Self, SdkError> {
        if receive_origin == OriginPattern::Any {
            return Err(SdkError::UntrustedOrigin);
        }
        let (status, _) = watch::channel(ChannelState::Pending);
        Ok(Self {
            inner: Arc::new(Inner {
                local,
                target: RwLock::new(Some(target)),
                send_origin,
                receive_origin,
                state: Mutex::new(State {
                    receive_mode: None,
                    listener: None,
                    connected: false,
                    connect_id: None,
                    handlers: HashMap::new(),
                    pending: HashMap::new(),
                    backlog: Vec::new(),
                    next_handler: 0,
                    destroyed: false,
                }),
                status,
            }),
        })
    }

    pub fn send_origin(&self) -> &OriginPattern {
        &self.inner.send_origin
    }

    pub fn receive_origin(&self) -> &OriginPattern {
        &self.inner.receive_origin
    }

    /// Start accepting inbound messages, holding back non-handshake commands
    /// until the channel is connected. Idempotent.
    pub fn listen(&self) {
        self.start_receiving(ReceiveMode::Handshake);
    }

    /// Start accepting inbound messages and dispatch them immediately. Idempotent.
    pub fn start_post_message_receive(&self) {
        self.start_receiving(ReceiveMode::Direct);
    }

    /// Stop accepting inbound messages without tearing the channel down
    pub fn stop_post_message_receive(&self) {
        let listener = {
            let mut state = self.inner.state.lock();
            state.receive_mode = None;
            state.listener.take()
        };
        if let Some(id) = listener {
            self.inner.local.remove_message_listener(id);
        }
    }

    fn start_receiving(&self, mode: ReceiveMode) {
        {
            let mut state = self.inner.state.lock();
            if state.destroyed || state.receive_mode.is_some() {
                return;
            }
            state.receive_mode = Some(mode);
        }

        let weak = Arc::downgrade(&self.inner);
        let id = self
            .inner
            .local
            .add_message_listener(Arc::new(move |event: MessageEvent| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_window_message(event);
                }
            }));

        let mut state = self.inner.state.lock();
        if state.destroyed || state.receive_mode.is_none() {
            drop(state);
            self.inner.local.remove_message_listener(id);
        } else {
            state.listener = Some(id);
        }
    }

    pub fn is_listening(&self) -> bool {
        self.inner.state.lock().listener.is_some()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.state.lock().connected
    }

    pub fn state(&self) -> ChannelState {
        *self.inner.status.borrow()
    }

    /// Register a handler for every inbound `command`
    pub fn on<F>(&self, command: impl Into<Command>, handler: F) -> HandlerId
    where
        F: Fn(&IncomingMessage) -> HandlerOutcome + Send + Sync + 'static,
    {
        self.register(command.into(), false, Arc::new(handler))
    }

    /// Register a handler that is removed after the first matching message
    pub fn once<F>(&self, command: impl Into<Command>, handler: F) -> HandlerId
    where
        F: Fn(&IncomingMessage) -> HandlerOutcome + Send + Sync + 'static,
    {
        self.register(command.into(), true, Arc::new(handler))
    }

    fn register(&self, command: Command, once: bool, handler: Handler) -> HandlerId {
        let mut state = self.inner.state.lock();
        let id = HandlerId(state.next_handler);
        state.next_handler += 1;
        if !state.destroyed {
            state
                .handlers
                .entry(command)
                .or_default()
                .push(HandlerEntry { id, once, handler });
        }
        id
    }

    /// Remove a handler; returns whether it was still registered
    pub fn off(&self, id: HandlerId) -> bool {
        let mut state = self.inner.state.lock();
        let mut removed = false;
        for entries in state.handlers.values_mut() {
            let before = entries.len();
            entries.retain(|entry| entry.id != id);
            removed |= entries.len() != before;
        }
        state.handlers.retain(|_, entries| !entries.is_empty());
        removed
    }

    pub fn handler_count(&self, command: &Command) -> usize {
        self.inner
            .state
            .lock()
            .handlers
            .get(command)
            .map_or(0, Vec::len)
    }

    /// Fire-and-forget post of `command`
    pub fn message(
        &self,
        command: impl Into<Command>,
        data: impl Serialize,
    ) -> Result<CorrelationId, SdkError> {
        let envelope = MessageEnvelope::request(&command.into(), serde_json::to_value(data)?);
        self.inner.post(&envelope)?;
        Ok(envelope.id)
    }

    /// Post `command` and wait for the reply carrying the same id.
    ///
    /// The message is posted before this returns; the future only waits. The
    /// wait never expires on its own; callers needing a bound wrap it in
    /// `tokio::time::timeout`. It fails with [`SdkError::ChannelDestroyed`] if
    /// the channel is destroyed first.
    pub fn request(
        &self,
        command: impl Into<Command>,
        data: impl Serialize,
    ) -> impl Future<Output = Result<Value, SdkError>> + Send + 'static {
        let registered = self.send_request(command.into(), data);
        async move {
            let reply = registered?.await.map_err(|_| SdkError::ChannelDestroyed)?;
            Ok(reply.data)
        }
    }

    fn send_request(
        &self,
        command: Command,
        data: impl Serialize,
    ) -> Result<oneshot::Receiver<MessageEnvelope>, SdkError> {
        let envelope = MessageEnvelope::request(&command, serde_json::to_value(data)?);
        let (tx, rx) = oneshot::channel();
        {
            let mut state = self.inner.state.lock();
            if state.destroyed {
                return Err(SdkError::ChannelDestroyed);
            }
            state.pending.insert(envelope.id.clone(), tx);
        }
        if let Err(err) = self.inner.post(&envelope) {
            self.inner.state.lock().pending.remove(&envelope.id);
            return Err(err);
        }
        Ok(rx)
    }

    /// Number of requests still waiting for a reply
    pub fn pending_replies(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    /// Start the connect handshake.
    ///
    /// Posts the reserved `CONNECTED` command once per channel lifetime; later
    /// calls are no-ops whether or not the handshake has completed.
    pub fn connect(&self) -> Result<(), SdkError> {
        self.listen();
        let envelope = {
            let mut state = self.inner.state.lock();
            if state.destroyed {
                return Err(SdkError::ChannelDestroyed);
            }
            if state.connected || state.connect_id.is_some() {
                return Ok(());
            }
            let envelope = MessageEnvelope::request(&Command::Connected, Value::Null);
            state.connect_id = Some(envelope.id.clone());
            envelope
        };
        debug!(target_origin = %self.inner.send_origin, "Sending connect handshake");
        self.inner.post(&envelope)
    }

    /// Resolve once both sides have completed the handshake
    pub fn wait_connected(&self) -> impl Future<Output = Result<(), SdkError>> + Send + 'static {
        let mut status = self.inner.status.subscribe();
        async move {
            loop {
                let current = *status.borrow_and_update();
                match current {
                    ChannelState::Connected => return Ok(()),
                    ChannelState::Destroyed => return Err(SdkError::ChannelDestroyed),
                    ChannelState::Pending => {}
                }
                if status.changed().await.is_err() {
                    return Err(SdkError::ChannelDestroyed);
                }
            }
        }
    }

    /// Tear the channel down locally.
    ///
    /// Deregisters every handler, stops listening, abandons pending reply
    /// waiters and releases the target. The remote side is not notified.
    /// Idempotent.
    pub fn destroy(&self) {
        let listener = {
            let mut state = self.inner.state.lock();
            if state.destroyed {
                return;
            }
            state.destroyed = true;
            state.connected = false;
            state.receive_mode = None;
            state.handlers.clear();
            state.pending.clear();
            state.backlog.clear();
            state.listener.take()
        };
        if let Some(id) = listener {
            self.inner.local.remove_message_listener(id);
        }
        *self.inner.target.write() = None;
        self.inner.status.send_replace(ChannelState::Destroyed);
        debug!(receive_origin = %self.inner.receive_origin, "Messenger destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.state.lock().destroyed
    }
}

impl Inner {
    fn post(&self, envelope: &MessageEnvelope) -> Result<(), SdkError> {
        let target = self
            .target
            .read()
            .clone()
            .ok_or(SdkError::ChannelDestroyed)?;
        target.post_message(serde_json::to_value(envelope)?, &self.send_origin);
        Ok(())
    }

    fn on_window_message(self: Arc<Self>, event: MessageEvent) {
        if !self.receive_origin.matches_str(&event.origin) {
            debug!(
                origin = %event.origin,
                expected = %self.receive_origin,
                "Dropping message from untrusted origin"
            );
            return;
        }

        let envelope: MessageEnvelope = match serde_json::from_value(event.data) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!(origin = %event.origin, "Ignoring message that is not an envelope: {}", e);
                return;
            }
        };

        if envelope.is_reply {
            self.on_reply(envelope, event.origin);
            return;
        }

        let command = envelope.command();
        if command == Command::Connected {
            self.on_connect_request(envelope, event.origin);
            return;
        }

        {
            let mut state = self.state.lock();
            if state.destroyed {
                return;
            }
            if state.receive_mode == Some(ReceiveMode::Handshake)
                && !state.connected
                && !command.is_handshake_exempt()
            {
                debug!(command = %command, "Holding message until the handshake completes");
                state.backlog.push((envelope, event.origin));
                return;
            }
        }

        self.dispatch(envelope, event.origin);
    }

    fn on_connect_request(self: Arc<Self>, envelope: MessageEnvelope, origin: String) {
        let newly_connected = {
            let mut state = self.state.lock();
            if state.destroyed {
                return;
            }
            let newly = !state.connected;
            state.connected = true;
            newly
        };

        if let Err(e) = self.post(&envelope.reply_to(Value::Null)) {
            debug!("Could not answer connect handshake: {}", e);
        }

        if newly_connected {
            self.status.send_replace(ChannelState::Connected);
            debug!(origin = %origin, "Channel connected by remote handshake");
            Arc::clone(&self).dispatch(envelope, origin);
            self.flush_backlog();
        }
    }

    fn on_reply(self: Arc<Self>, envelope: MessageEnvelope, origin: String) {
        enum Resolution {
            Handshake,
            Waiter(oneshot::Sender<MessageEnvelope>),
            Ignored,
        }

        let resolution = {
            let mut state = self.state.lock();
            if state.destroyed {
                return;
            }
            if state.connect_id.as_ref() == Some(&envelope.id) {
                if state.connected {
                    Resolution::Ignored
                } else {
                    state.connected = true;
                    Resolution::Handshake
                }
            } else if let Some(waiter) = state.pending.remove(&envelope.id) {
                Resolution::Waiter(waiter)
            } else {
                debug!(id = %envelope.id, command = %envelope.command, "Reply matches no waiting request");
                Resolution::Ignored
            }
        };

        match resolution {
            Resolution::Handshake => {
                self.status.send_replace(ChannelState::Connected);
                debug!(origin = %origin, "Channel connected by handshake reply");
                Arc::clone(&self).dispatch(envelope, origin);
                self.flush_backlog();
            }
            Resolution::Waiter(waiter) => {
                let _ = waiter.send(envelope);
            }
            Resolution::Ignored => {}
        }
    }

    fn flush_backlog(self: &Arc<Self>) {
        loop {
            let next = {
                let mut state = self.state.lock();
                if state.destroyed || state.backlog.is_empty() {
                    None
                } else {
                    Some(state.backlog.remove(0))
                }
            };
            match next {
                Some((envelope, origin)) => Arc::clone(self).dispatch(envelope, origin),
                None => break,
            }
        }
    }

    fn dispatch(self: Arc<Self>, envelope: MessageEnvelope, origin: String) {
        let command = envelope.command();
        let handlers: Vec<Handler> = {
            let mut state = self.state.lock();
            if state.destroyed {
                return;
            }
            match state.handlers.get_mut(&command) {
                Some(entries) => {
                    let handlers = entries.iter().map(|e| Arc::clone(&e.handler)).collect();
                    // once-handlers leave before any handler body runs
                    entries.retain(|e| !e.once);
                    if entries.is_empty() {
                        state.handlers.remove(&command);
                    }
                    handlers
                }
                None => Vec::new(),
            }
        };

        if handlers.is_empty() {
            if command != Command::Connected {
                debug!(command = %command, "No handler registered, dropping message");
            }
            return;
        }

        let already_answered = envelope.is_reply || command == Command::Connected;
        let message = IncomingMessage {
            channel: Messenger { inner: self },
            command,
            envelope,
            origin,
            replied: Arc::new(AtomicBool::new(already_answered)),
        };

        let mut handled = false;
        for handler in handlers {
            if handler(&message) == HandlerOutcome::Handled {
                handled = true;
            }
        }

        if message.command.expects_ack() && !handled && !message.has_replied() {
            message.reply(REMOTE_OPERATION_COMPLETE);
        }
    }
}

/// An inbound command as seen by a handler
///
/// Cheap to clone; handlers that finish their work asynchronously move a
/// clone into a task and call [`IncomingMessage::reply`] later.
#[derive(Clone)]
pub struct IncomingMessage {
    channel: Messenger,
    command: Command,
    envelope: MessageEnvelope,
    origin: String,
    replied: Arc<AtomicBool>,
}

impl IncomingMessage {
    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn data(&self) -> &Value {
        &self.envelope.data
    }

    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, SdkError> {
        Ok(serde_json::from_value(self.envelope.data.clone())?)
    }

    pub fn id(&self) -> &CorrelationId {
        &self.envelope.id
    }

    /// Origin the message arrived from
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// The channel this message arrived on
    pub fn channel(&self) -> Messenger {
        self.channel.clone()
    }

    pub fn has_replied(&self) -> bool {
        self.replied.load(Ordering::SeqCst)
    }

    /// Send the single reply for this message. Later calls are ignored.
    pub fn reply(&self, data: impl Serialize) {
        if self.replied.swap(true, Ordering::SeqCst) {
            warn!(command = %self.command, id = %self.envelope.id, "Message already answered, dropping extra reply");
            return;
        }
        let data = match serde_json::to_value(data) {
            Ok(data) => data,
            Err(e) => {
                warn!(command = %self.command, "Could not encode reply: {}", e);
                return;
            }
        };
        if let Err(e) = self.channel.inner.post(&self.envelope.reply_to(data)) {
            debug!(command = %self.command, "Reply not sent: {}", e);
        }
    }
}
