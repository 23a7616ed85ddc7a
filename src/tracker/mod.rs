//! Publish result tracking
//!
//! Correlates the transport's delivery-completion events with a
//! caller-visible callback. A single observer slot is supported; registering
//! a new callback replaces the previous one (last writer wins). Outcomes are
//! forwarded once and never buffered, so a callback registered after a
//! publish completed does not see that outcome.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::message::{MessageId, PublishResult};

/// Callback invoked with the outcome of an asynchronous publish.
pub type PublishResultCallback = Arc<dyn Fn(PublishResult, MessageId) + Send + Sync>;

/// Forwards delivery outcomes to the registered observer, if any.
pub struct PublishTracker {
    observer: RwLock<Option<PublishResultCallback>>,
}

impl PublishTracker {
    pub fn new() -> Self {
        Self {
            observer: RwLock::new(None),
        }
    }

    /// Register the observer. Replaces any previous registration.
    pub fn set_observer(&self, callback: PublishResultCallback) {
        *self.observer.write() = Some(callback);
    }

    /// Report a delivery outcome to the current observer.
    pub fn report(&self, message_id: MessageId, outcome: PublishResult) {
        let observer = self.observer.read().clone();
        match observer {
            Some(callback) => callback(outcome, message_id),
            None => debug!(
                "Delivery outcome {:?} for message {} had no observer",
                outcome, message_id
            ),
        }
    }
}

impl Default for PublishTracker {
    fn default() -> Self {
        Self::new()
    }
}
