//! Connection lifecycle management
//!
//! A state machine driven purely by transport callback events. It owns the
//! connection state, re-issues every registered subscription after a
//! (re)connection, and keeps retrying lost connections at a flat interval
//! until the client is torn down. Reconnection is transparent: callers
//! register interest once and it survives arbitrarily many transport-level
//! disconnects.
//!
//! The controller composes the two observer capabilities the transport
//! driver needs: `ConnectionObserver` for session events and
//! `ActionObserver` for action results, delivery completions, and inbound
//! messages.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::dispatch::WorkerPool;
use crate::handler::HandlerRegistry;
use crate::message::{InboundMessage, MessageId, PublishResult, QoS};
use crate::tracker::PublishTracker;
use crate::transport::{ActionKind, ActionObserver, ConnectionObserver, Transport};


/// QoS requested for handler subscriptions.
const SUBSCRIBE_QOS: QoS = QoS::AtMostOnce;

/// Connection state as seen by the controller. Written only from transport
/// callback events and the `start()`/`finish()` bookends, never polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected and not trying to connect
    Disconnected,
    /// A connect attempt is in flight
    Connecting,
    /// Session established
    Connected,
    /// Connection failed or was lost, waiting out the retry interval
    Reconnecting,
}

/// Callback invoked on connect/disconnect transitions.
pub type LifecycleCallback = Arc<dyn Fn() + Send + Sync>;

/// Reacts to transport lifecycle events and drives reconnection.
pub struct ConnectionController {
    transport: Arc<dyn Transport>,
    registry: Arc<HandlerRegistry>,
    pool: Arc<WorkerPool>,
    tracker: Arc<PublishTracker>,
    state: Arc<RwLock<ConnectionState>>,
    on_connect: RwLock<Option<LifecycleCallback>>,
    on_disconnect: RwLock<Option<LifecycleCallback>>,
    reconnect_interval: Duration,
    automatic_reconnect: bool,
}

impl ConnectionController {
    pub fn new(
        transport: Arc<dyn Transport>,
        registry: Arc<HandlerRegistry>,
        pool: Arc<WorkerPool>,
        tracker: Arc<PublishTracker>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            transport,
            registry,
            pool,
            tracker,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            on_connect: RwLock::new(None),
            on_disconnect: RwLock::new(None),
            reconnect_interval: config.reconnect_interval_duration(),
            automatic_reconnect: config.automatic_reconnect,
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Register the on-connect callback. Single slot, last writer wins.
    pub fn set_on_connect(&self, callback: LifecycleCallback) {
        *self.on_connect.write() = Some(callback);
    }

    /// Register the on-disconnect callback. Single slot, last writer wins.
    pub fn set_on_disconnect(&self, callback: LifecycleCallback) {
        *self.on_disconnect.write() = Some(callback);
    }

    /// Begin connecting. The session is reported through the on-connect
    /// callback once the transport confirms it.
    pub async fn start(&self) {
        {
            let mut state = self.state.write();
            if *state != ConnectionState::Disconnected {
                warn!("Client already started, ignoring start()");
                return;
            }
            *state = ConnectionState::Connecting;
        }
        self.submit_connect().await;
    }

    /// Tear down: stop retrying and ask the transport to disconnect. The
    /// state becomes `Disconnected` and any pending retry is abandoned.
    pub async fn finish(&self) {
        *self.state.write() = ConnectionState::Disconnected;
        if let Err(e) = self.transport.disconnect().await {
            warn!("Disconnect submission failed: {}", e);
        }
    }

    async fn submit_connect(&self) {
        if let Err(e) = self.transport.connect().await {
            warn!("Connect submission failed: {}", e);
            self.schedule_reconnect();
        }
    }

    /// Move to `Reconnecting` and retry connecting after the flat backoff
    /// interval, indefinitely, until teardown or the next established
    /// session.
    fn schedule_reconnect(&self) {
        if !self.automatic_reconnect {
            *self.state.write() = ConnectionState::Disconnected;
            info!("Automatic reconnect disabled, staying disconnected");
            return;
        }

        {
            let mut state = self.state.write();
            if *state == ConnectionState::Disconnected {
                return;
            }
            *state = ConnectionState::Reconnecting;
        }

        let state = self.state.clone();
        let transport = self.transport.clone();
        let interval = self.reconnect_interval;
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                {
                    let mut state = state.write();
                    if *state != ConnectionState::Reconnecting {
                        return;
                    }
                    *state = ConnectionState::Connecting;
                }
                debug!("Retrying connection");
                match transport.connect().await {
                    // Outcome now arrives via the observer callbacks
                    Ok(()) => return,
                    Err(e) => {
                        warn!("Reconnect submission failed: {}", e);
                        let mut state = state.write();
                        if *state != ConnectionState::Connecting {
                            return;
                        }
                        *state = ConnectionState::Reconnecting;
                    }
                }
            }
        });
    }
}

#[async_trait]
impl ConnectionObserver for ConnectionController {
    async fn connected(&self, cause: &str) {
        {
            let mut state = self.state.write();
            if *state == ConnectionState::Disconnected {
                debug!("Ignoring connect event after teardown");
                return;
            }
            *state = ConnectionState::Connected;
        }
        if cause.is_empty() {
            info!("Connected to broker");
        } else {
            info!("Connected to broker: {}", cause);
        }

        // Blanket re-subscribe covers both the first connect and every
        // reconnect; filters registered while disconnected are included.
        for filter in self.registry.filters() {
            if let Err(e) = self.transport.subscribe(&filter, SUBSCRIBE_QOS).await {
                warn!("Subscribe submission for '{}' failed: {}", filter, e);
            }
        }

        let callback = self.on_connect.read().clone();
        if let Some(callback) = callback {
            callback();
        }
    }

    async fn connection_lost(&self, cause: &str) {
        if cause.is_empty() {
            warn!("Connection lost");
        } else {
            warn!("Connection lost: {}", cause);
        }

        let callback = self.on_disconnect.read().clone();
        if let Some(callback) = callback {
            callback();
        }

        self.schedule_reconnect();
    }
}

#[async_trait]
impl ActionObserver for ConnectionController {
    async fn action_succeeded(&self, action: ActionKind) {
        debug!("{} action succeeded", action);
    }

    async fn action_failed(&self, action: ActionKind) {
        warn!("{} action failed", action);
        // Only connect failures drive the retry loop; subscribe and publish
        // failures are covered by the blanket re-subscribe on reconnect
        if action == ActionKind::Connect {
            self.schedule_reconnect();
        }
    }

    async fn delivery_complete(&self, message_id: MessageId, outcome: PublishResult) {
        self.tracker.report(message_id, outcome);
    }

    async fn message_arrived(&self, message: InboundMessage) {
        self.pool.enqueue(message);
    }
}
