//! MqHub - Callback-oriented MQTT client facade
//!
//! A dispatch and connection-lifecycle core over a pluggable pub/sub
//! transport: register handlers against topic filters, publish, and let the
//! facade match inbound messages to handlers on a worker pool, answer
//! request/response traffic via response topics, and recover the session
//! (including all subscriptions) after connection loss.
//!
//! The wire protocol itself lives behind the [`transport::Transport`]
//! trait; this crate never touches sockets or packet encoding.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod handler;
pub mod lifecycle;
pub mod message;
pub mod topic;
pub mod tracker;
pub mod transport;

pub use client::Client;
pub use config::{ClientConfig, ConfigError, MqttVersion, Protocol, TlsConfig};
pub use handler::{HandlerRegistry, MessageHandler};
pub use lifecycle::{ConnectionController, ConnectionState};
pub use message::{InboundMessage, MessageId, PublishResult, QoS};
pub use topic::topic_matches_filter;
pub use tracker::PublishTracker;
pub use transport::{ActionKind, ActionObserver, ConnectionObserver, Transport, TransportError};
