//! Dispatch queue and worker pool
//!
//! Decouples the transport's receive path from user handler execution. The
//! transport enqueues inbound messages with a single non-blocking channel
//! send; a fixed set of long-lived worker tasks drains the queue, resolves
//! matching handlers through the registry, and publishes any responses back
//! through the transport.
//!
//! Ordering: no ordering is guaranteed between messages handled by different
//! workers. The handlers matched by a single message run sequentially, in
//! registration order, on the one worker that dequeued it.
//!
//! Shutdown is deliberately drain-less: workers observe the stop signal
//! before their next dequeue and exit, dropping whatever is still queued.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::handler::HandlerRegistry;
use crate::message::{InboundMessage, QoS};
use crate::transport::Transport;


/// Shared receiving end of the inbound queue. Workers contend on the mutex
/// so each message is dequeued by exactly one of them.
type SharedQueue = Arc<Mutex<mpsc::UnboundedReceiver<InboundMessage>>>;

/// Fixed-size pool of dispatch workers draining the inbound message queue.
pub struct WorkerPool {
    queue_tx: mpsc::UnboundedSender<InboundMessage>,
    shutdown: broadcast::Sender<()>,
    workers: parking_lot::Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Spawn `workers` dispatch tasks (at least one). Must be called from
    /// within a tokio runtime.
    pub fn spawn(
        workers: usize,
        registry: Arc<HandlerRegistry>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let queue: SharedQueue = Arc::new(Mutex::new(queue_rx));
        let (shutdown, _) = broadcast::channel(1);

        let handles = (0..workers.max(1))
            .map(|worker_id| {
                let queue = queue.clone();
                let registry = registry.clone();
                let transport = transport.clone();
                let shutdown_rx = shutdown.subscribe();
                tokio::spawn(async move {
                    worker_loop(worker_id, queue, registry, transport, shutdown_rx).await;
                })
            })
            .collect();

        Self {
            queue_tx,
            shutdown,
            workers: parking_lot::Mutex::new(handles),
        }
    }

    /// Queue an inbound message for dispatch. Never blocks the caller; this
    /// runs on the transport's receive path.
    pub fn enqueue(&self, message: InboundMessage) {
        if self.queue_tx.send(message).is_err() {
            debug!("Dispatch queue closed, inbound message dropped");
        }
    }

    /// Stop all workers and wait for them to terminate. Messages still
    /// queued are dropped, not drained. Idempotent; the stop signal is
    /// one-way.
    pub async fn shutdown(&self) {
        let _ = self.shutdown.send(());
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.workers.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                error!("Dispatch worker terminated abnormally: {}", e);
            }
        }
    }
}

async fn worker_loop(
    worker_id: usize,
    queue: SharedQueue,
    registry: Arc<HandlerRegistry>,
    transport: Arc<dyn Transport>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    debug!("Dispatch worker {} started", worker_id);
    loop {
        tokio::select! {
            biased;

            result = shutdown_rx.recv() => {
                match result {
                    Ok(()) => break,
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                }
            }
            message = dequeue(&queue) => {
                match message {
                    Some(message) => dispatch_message(message, &registry, &transport).await,
                    None => break,
                }
            }
        }
    }
    debug!("Dispatch worker {} stopped", worker_id);
}

async fn dequeue(queue: &SharedQueue) -> Option<InboundMessage> {
    queue.lock().await.recv().await
}

/// Run every matching handler for one message and forward non-empty
/// responses to the message's response topic, if it carries one.
async fn dispatch_message(
    message: InboundMessage,
    registry: &HandlerRegistry,
    transport: &Arc<dyn Transport>,
) {
    let handlers = registry.matches(&message.topic);
    if handlers.is_empty() {
        debug!("No handler matched topic '{}'", message.topic);
        return;
    }

    for handler in handlers {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            handler(&message.topic, &message.payload)
        }));
        let response = match outcome {
            Ok(response) => response,
            Err(_) => {
                error!("Handler for topic '{}' panicked", message.topic);
                continue;
            }
        };

        let Some(response) = response else { continue };
        if response.is_empty() {
            continue;
        }
        let Some(response_topic) = message.response_topic.as_deref() else {
            continue;
        };

        // Request/response convention: replies go out at QoS 0, non-retained
        match transport
            .publish(response_topic, response, QoS::AtMostOnce, false)
            .await
        {
            Ok(message_id) => debug!(
                "Response to '{}' published to '{}' as message {}",
                message.topic, response_topic, message_id
            ),
            Err(e) => warn!("Response publish to '{}' failed: {}", response_topic, e),
        }
    }
}
