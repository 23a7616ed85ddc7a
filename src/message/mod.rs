//! Message types exchanged with the transport
//!
//! The facade treats messages as opaque structured values: the transport
//! decodes them off the wire and hands them in, the dispatch workers hand
//! responses back out. QoS is carried through without interpretation.

use bytes::Bytes;

/// Transport-assigned message identifier (MQTT packet identifier).
pub type MessageId = u16;

/// Quality of Service levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum QoS {
    /// At most once delivery
    #[default]
    AtMostOnce = 0,
    /// At least once delivery
    AtLeastOnce = 1,
    /// Exactly once delivery
    ExactlyOnce = 2,
}

impl QoS {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(QoS::AtMostOnce),
            1 => Some(QoS::AtLeastOnce),
            2 => Some(QoS::ExactlyOnce),
            _ => None,
        }
    }
}

/// An inbound message delivered by the transport.
///
/// Produced by the transport's receive path, consumed exactly once by
/// exactly one dispatch worker.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Concrete topic the message was published to
    pub topic: String,
    /// Message payload
    pub payload: Bytes,
    /// Where a computed reply should be published, if the publisher asked
    /// for one (MQTT v5.0 response topic property)
    pub response_topic: Option<String>,
    /// QoS the message was delivered with
    pub qos: QoS,
    /// Retain flag as delivered
    pub retain: bool,
}

impl InboundMessage {
    /// Create a message with no response topic.
    pub fn new(topic: impl Into<String>, payload: impl Into<Bytes>, qos: QoS, retain: bool) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            response_topic: None,
            qos,
            retain,
        }
    }

    /// Set the response topic, consuming self.
    pub fn with_response_topic(mut self, response_topic: impl Into<String>) -> Self {
        self.response_topic = Some(response_topic.into());
        self
    }
}

/// Outcome of an asynchronous publish, as reported by the transport's
/// delivery-completion event. Binary by design: the facade does not model
/// partial or intermediate delivery states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishResult {
    /// The transport acknowledged delivery
    Success,
    /// The transport reported the delivery failed
    Failure,
}
