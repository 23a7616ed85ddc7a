//! Client facade
//!
//! Ties the registry, dispatch pool, lifecycle controller, and publish
//! tracker together behind one callback-oriented surface: register handlers
//! with [`Client::on`], start the session, publish, and tear down with
//! [`Client::finish`]. The transport driver gets its event sinks from
//! [`Client::connection_observer`] and [`Client::action_observer`].

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::dispatch::WorkerPool;
use crate::handler::{HandlerRegistry, MessageHandler};
use crate::lifecycle::{ConnectionController, ConnectionState};
use crate::message::{MessageId, PublishResult, QoS};
use crate::topic::{validate_topic_filter, validate_topic_name};
use crate::tracker::PublishTracker;
use crate::transport::{ActionObserver, ConnectionObserver, Transport, TransportError};

/// QoS requested for handler subscriptions.
const SUBSCRIBE_QOS: QoS = QoS::AtMostOnce;

/// Callback-oriented MQTT client facade.
///
/// Handler registrations are declarative: they are subscribed immediately
/// when a session exists and replayed after every reconnect, so interest
/// registered once survives arbitrarily many transport-level disconnects.
pub struct Client {
    transport: Arc<dyn Transport>,
    registry: Arc<HandlerRegistry>,
    pool: Arc<WorkerPool>,
    tracker: Arc<PublishTracker>,
    controller: Arc<ConnectionController>,
}

impl Client {
    /// Create a client over the given transport. Spawns the dispatch
    /// workers, so this must run within a tokio runtime.
    pub fn new(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        let registry = Arc::new(HandlerRegistry::new());
        let tracker = Arc::new(PublishTracker::new());
        let pool = Arc::new(WorkerPool::spawn(
            config.concurrency,
            registry.clone(),
            transport.clone(),
        ));
        let controller = Arc::new(ConnectionController::new(
            transport.clone(),
            registry.clone(),
            pool.clone(),
            tracker.clone(),
            &config,
        ));

        Self {
            transport,
            registry,
            pool,
            tracker,
            controller,
        }
    }

    /// The session-event sink for the transport driver.
    pub fn connection_observer(&self) -> Arc<dyn ConnectionObserver> {
        self.controller.clone()
    }

    /// The action/message/delivery event sink for the transport driver.
    pub fn action_observer(&self) -> Arc<dyn ActionObserver> {
        self.controller.clone()
    }

    /// Register a handler for a topic filter.
    ///
    /// Idempotent per filter: re-registering an already known filter is a
    /// no-op and the first handler wins. When a session exists the
    /// subscription is issued immediately (fire and forget; the blanket
    /// re-subscribe on reconnect is the durable fallback). While
    /// disconnected the subscribe is suppressed, not failed.
    pub fn on<F>(&self, filter: &str, handler: F)
    where
        F: Fn(&str, &[u8]) -> Option<Bytes> + Send + Sync + 'static,
    {
        if let Err(reason) = validate_topic_filter(filter) {
            warn!("Registering filter '{}' anyway: {}", filter, reason);
        }

        if !self.registry.register(filter, Arc::new(handler) as MessageHandler) {
            debug!("Filter '{}' already registered", filter);
            return;
        }

        if self.transport.is_connected() {
            let transport = self.transport.clone();
            let filter: Arc<str> = filter.into();
            tokio::spawn(async move {
                if let Err(e) = transport.subscribe(&filter, SUBSCRIBE_QOS).await {
                    warn!("Subscribe submission for '{}' failed: {}", filter, e);
                }
            });
        }
    }

    /// Register the connected callback. Single slot, last writer wins.
    pub fn on_connect<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.controller.set_on_connect(Arc::new(callback));
    }

    /// Register the disconnected callback. Single slot, last writer wins.
    pub fn on_disconnect<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.controller.set_on_disconnect(Arc::new(callback));
    }

    /// Register the publish-outcome callback. Single slot, last writer
    /// wins; only outcomes reported after registration are delivered.
    pub fn on_publish_result<F>(&self, callback: F)
    where
        F: Fn(PublishResult, MessageId) + Send + Sync + 'static,
    {
        self.tracker.set_observer(Arc::new(callback));
    }

    /// Publish a message. Returns the transport-assigned message id; the
    /// delivery outcome arrives later through the publish-result callback.
    pub async fn publish(
        &self,
        topic: &str,
        payload: impl Into<Bytes>,
        qos: QoS,
        retain: bool,
    ) -> Result<MessageId, TransportError> {
        if let Err(reason) = validate_topic_name(topic) {
            warn!("Publishing to questionable topic '{}': {}", topic, reason);
        }
        self.transport.publish(topic, payload.into(), qos, retain).await
    }

    /// Begin connecting to the broker.
    pub async fn start(&self) {
        self.controller.start().await;
    }

    /// Tear down: stop reconnecting, disconnect the transport, and stop the
    /// dispatch workers. Messages still queued are dropped; no handler runs
    /// after this returns.
    pub async fn finish(&self) {
        self.controller.finish().await;
        self.pool.shutdown().await;
    }

    /// Whether a live session to the broker currently exists.
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.controller.state()
    }

    /// Number of registered topic filters.
    pub fn handler_count(&self) -> usize {
        self.registry.len()
    }
}
