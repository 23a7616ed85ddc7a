//! Transport Abstraction
//!
//! The facade does not speak the wire protocol itself. It consumes a
//! `Transport` capability (connect, disconnect, subscribe, publish) and
//! receives events back through two observer traits the transport driver
//! holds: `ConnectionObserver` for session-level events and
//! `ActionObserver` for action results, inbound messages, and delivery
//! completions.
//!
//! Transport methods submit work; their `Result` covers submission only.
//! Whether an action ultimately succeeded is reported asynchronously via
//! `ActionObserver::action_succeeded` / `action_failed`.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;

use crate::message::{InboundMessage, MessageId, PublishResult, QoS};

/// Error type for transport submissions
#[derive(Debug)]
pub enum TransportError {
    /// Connection to the broker failed or was lost
    ConnectionLost(String),
    /// The broker rejected the operation
    Rejected(String),
    /// Operation timed out
    Timeout,
    /// Other error
    Other(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::ConnectionLost(msg) => write!(f, "Connection lost: {}", msg),
            TransportError::Rejected(msg) => write!(f, "Rejected: {}", msg),
            TransportError::Timeout => write!(f, "Operation timed out"),
            TransportError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

/// The kind of transport action an asynchronous result refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Connect,
    Subscribe,
    Publish,
    Unsubscribe,
    Disconnect,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Connect => write!(f, "Connect"),
            ActionKind::Subscribe => write!(f, "Subscribe"),
            ActionKind::Publish => write!(f, "Publish"),
            ActionKind::Unsubscribe => write!(f, "Unsubscribe"),
            ActionKind::Disconnect => write!(f, "Disconnect"),
        }
    }
}

/// Capability trait for the underlying pub/sub transport.
///
/// Implementations own the socket, the handshake, TLS, and the wire codec.
/// All methods are submissions: they initiate the operation and return once
/// it has been handed to the transport's I/O path. Completion is reported
/// through the observers the driver holds.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Initiate a connection to the broker.
    async fn connect(&self) -> Result<(), TransportError>;

    /// Initiate a graceful disconnect.
    async fn disconnect(&self) -> Result<(), TransportError>;

    /// Request a subscription for a topic filter.
    async fn subscribe(&self, filter: &str, qos: QoS) -> Result<(), TransportError>;

    /// Publish a message, returning the transport-assigned message id.
    async fn publish(
        &self,
        topic: &str,
        payload: Bytes,
        qos: QoS,
        retain: bool,
    ) -> Result<MessageId, TransportError>;

    /// Whether a live session to the broker currently exists.
    fn is_connected(&self) -> bool;
}

/// Observer for session-level connection events.
#[async_trait]
pub trait ConnectionObserver: Send + Sync {
    /// A connection (first or re-established) is up. `cause` is a
    /// transport-provided description and may be empty.
    async fn connected(&self, cause: &str);

    /// The connection was lost unsolicited.
    async fn connection_lost(&self, cause: &str);
}

/// Observer for action results, delivery completions, and inbound messages.
///
/// `message_arrived` must return quickly: the transport's receive path is
/// blocked for its duration. The facade's implementation only enqueues.
#[async_trait]
pub trait ActionObserver: Send + Sync {
    /// A previously submitted action completed successfully.
    async fn action_succeeded(&self, action: ActionKind);

    /// A previously submitted action failed.
    async fn action_failed(&self, action: ActionKind);

    /// The transport resolved the fate of a published message.
    async fn delivery_complete(&self, message_id: MessageId, outcome: PublishResult);

    /// An inbound message arrived from the broker.
    async fn message_arrived(&self, message: InboundMessage);
}
