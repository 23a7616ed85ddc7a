//! Integration Tests for the MqHub client facade
//!
//! These tests drive the facade end to end against a scripted transport
//! double. The test plays the transport driver's role: it records the
//! submissions the facade makes and feeds connection, message, and delivery
//! events back through the observers the client exposes.

use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use mqhub::{
    ActionObserver, Client, ClientConfig, ConnectionObserver, InboundMessage, MessageId,
    PublishResult, QoS, Transport, TransportError,
};

/// Transport double that records submissions and exposes a settable
/// connected flag.
struct ScriptedTransport {
    connected: AtomicBool,
    subscribes: Mutex<Vec<String>>,
    publishes: Mutex<Vec<(String, Bytes, QoS, bool)>>,
    next_id: AtomicU16,
}

impl ScriptedTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            connected: AtomicBool::new(false),
            subscribes: Mutex::new(Vec::new()),
            publishes: Mutex::new(Vec::new()),
            next_id: AtomicU16::new(1),
        })
    }

    fn subscribed(&self) -> Vec<String> {
        self.subscribes.lock().unwrap().clone()
    }

    fn published(&self) -> Vec<(String, Bytes, QoS, bool)> {
        self.publishes.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn subscribe(&self, filter: &str, _qos: QoS) -> Result<(), TransportError> {
        self.subscribes.lock().unwrap().push(filter.to_string());
        Ok(())
    }

    async fn publish(
        &self,
        topic: &str,
        payload: Bytes,
        qos: QoS,
        retain: bool,
    ) -> Result<MessageId, TransportError> {
        self.publishes
            .lock()
            .unwrap()
            .push((topic.to_string(), payload, qos, retain));
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

fn test_config() -> ClientConfig {
    ClientConfig {
        address: "localhost:1883".to_string(),
        client_id: "test-client".to_string(),
        concurrency: 2,
        ..Default::default()
    }
}

/// Start the client and play the transport's "session established" event.
async fn establish(client: &Client, transport: &Arc<ScriptedTransport>) {
    client.start().await;
    transport.connected.store(true, Ordering::SeqCst);
    client.connection_observer().connected("").await;
}

async fn wait_until(limit: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_request_response_round_trip() {
    let transport = ScriptedTransport::new();
    let client = Client::new(transport.clone(), test_config());

    client.on("rpc/+", |_topic, _payload| Some(Bytes::from_static(b"ack")));
    establish(&client, &transport).await;

    // A request carrying a response topic gets exactly one reply
    client
        .action_observer()
        .message_arrived(
            InboundMessage::new("rpc/ping", Bytes::from_static(b"hello"), QoS::AtMostOnce, false)
                .with_response_topic("r"),
        )
        .await;

    assert!(
        wait_until(Duration::from_secs(2), || !transport.published().is_empty()).await,
        "expected a response publish"
    );
    let published = transport.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, "r");
    assert_eq!(published[0].1.as_ref(), b"ack");
    assert_eq!(published[0].2, QoS::AtMostOnce);
    assert!(!published[0].3);

    // Without a response topic the handler's return value goes nowhere
    client
        .action_observer()
        .message_arrived(InboundMessage::new(
            "rpc/ping",
            Bytes::from_static(b"hello"),
            QoS::AtMostOnce,
            false,
        ))
        .await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(transport.published().len(), 1);

    client.finish().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_subscriptions_replayed_on_reconnect() {
    let transport = ScriptedTransport::new();
    let client = Client::new(transport.clone(), test_config());

    // Registered before any session exists: subscribe is suppressed
    client.on("sensors/#", |_t, _p| None);
    client.on("commands/+/set", |_t, _p| None);
    assert!(transport.subscribed().is_empty());

    establish(&client, &transport).await;
    assert_eq!(
        transport.subscribed(),
        vec!["sensors/#".to_string(), "commands/+/set".to_string()]
    );

    // Connection drops; a filter registered while down must still be
    // covered by the reconnect replay
    transport.connected.store(false, Ordering::SeqCst);
    client.connection_observer().connection_lost("gone").await;
    client.on("late/#", |_t, _p| None);

    transport.connected.store(true, Ordering::SeqCst);
    client.connection_observer().connected("automatic reconnect").await;

    let subscribed = transport.subscribed();
    assert_eq!(subscribed.len(), 5);
    assert_eq!(
        &subscribed[2..],
        &[
            "sensors/#".to_string(),
            "commands/+/set".to_string(),
            "late/#".to_string(),
        ]
    );

    client.finish().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_registration_while_connected_subscribes_immediately() {
    let transport = ScriptedTransport::new();
    let client = Client::new(transport.clone(), test_config());

    establish(&client, &transport).await;
    client.on("live/#", |_t, _p| None);

    assert!(
        wait_until(Duration::from_secs(2), || {
            transport.subscribed().contains(&"live/#".to_string())
        })
        .await,
        "registration while connected should subscribe immediately"
    );

    // Re-registering the same filter is a no-op
    client.on("live/#", |_t, _p| Some(Bytes::from_static(b"other")));
    assert_eq!(client.handler_count(), 1);

    client.finish().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_publish_result_callback() {
    let transport = ScriptedTransport::new();
    let client = Client::new(transport.clone(), test_config());
    establish(&client, &transport).await;

    // An outcome reported before registration is not delivered
    client.action_observer().delivery_complete(9, PublishResult::Failure).await;

    let seen: Arc<Mutex<Vec<(PublishResult, MessageId)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    client.on_publish_result(move |outcome, id| {
        sink.lock().unwrap().push((outcome, id));
    });

    let id = client
        .publish("status/online", Bytes::from_static(b"1"), QoS::AtLeastOnce, true)
        .await
        .expect("publish should submit");
    client
        .action_observer()
        .delivery_complete(id, PublishResult::Success)
        .await;

    assert_eq!(seen.lock().unwrap().as_slice(), &[(PublishResult::Success, id)]);

    let published = transport.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, "status/online");
    assert_eq!(published[0].2, QoS::AtLeastOnce);
    assert!(published[0].3);

    client.finish().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_connect_and_disconnect_callbacks() {
    let transport = ScriptedTransport::new();
    let client = Client::new(transport.clone(), test_config());

    let connects = Arc::new(AtomicU16::new(0));
    let disconnects = Arc::new(AtomicU16::new(0));
    let counter = connects.clone();
    client.on_connect(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let counter = disconnects.clone();
    client.on_disconnect(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    establish(&client, &transport).await;
    assert_eq!(connects.load(Ordering::SeqCst), 1);
    assert!(client.is_connected());

    transport.connected.store(false, Ordering::SeqCst);
    client.connection_observer().connection_lost("keepalive").await;
    assert_eq!(disconnects.load(Ordering::SeqCst), 1);

    transport.connected.store(true, Ordering::SeqCst);
    client.connection_observer().connected("reconnect").await;
    assert_eq!(connects.load(Ordering::SeqCst), 2);

    client.finish().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_finish_stops_dispatch() {
    let transport = ScriptedTransport::new();
    let client = Client::new(transport.clone(), test_config());

    let invocations = Arc::new(AtomicU16::new(0));
    let counter = invocations.clone();
    client.on("events/#", move |_t, _p| {
        counter.fetch_add(1, Ordering::SeqCst);
        None
    });
    establish(&client, &transport).await;

    client.finish().await;
    assert!(!client.is_connected());

    // Messages arriving after teardown never reach a handler
    client
        .action_observer()
        .message_arrived(InboundMessage::new(
            "events/late",
            Bytes::new(),
            QoS::AtMostOnce,
            false,
        ))
        .await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(invocations.load(Ordering::SeqCst), 0);
}
