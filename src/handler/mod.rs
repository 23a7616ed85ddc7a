//! Handler registration and lookup
//!
//! Stores (topic filter, handler) pairs in insertion order and resolves the
//! handlers matching a concrete topic. Registrations are permanent for the
//! client's lifetime; there is no removal. The registry is read by every
//! dispatch worker and by the lifecycle controller on reconnect, and written
//! only by registration, so a read/write lock with short critical sections
//! is sufficient.

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use smallvec::SmallVec;

use crate::topic::topic_matches_filter;

/// A user-supplied message handler.
///
/// Invoked with the concrete topic and payload; the returned bytes, when
/// non-empty, are published to the message's response topic if it carries
/// one. Handlers run on dispatch workers and must not assume thread
/// affinity.
pub type MessageHandler = Arc<dyn Fn(&str, &[u8]) -> Option<Bytes> + Send + Sync>;

/// A (filter, handler) pair held by the registry.
#[derive(Clone)]
pub struct HandlerRegistration {
    pub filter: Arc<str>,
    pub handler: MessageHandler,
}

/// Ordered, thread-safe collection of handler registrations.
pub struct HandlerRegistry {
    entries: RwLock<Vec<HandlerRegistration>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Register a handler for a topic filter.
    ///
    /// At most one registration exists per distinct filter string; if the
    /// filter is already present the call is a no-op and the first handler
    /// wins. Returns `true` if the registration was newly added.
    pub fn register(&self, filter: &str, handler: MessageHandler) -> bool {
        let mut entries = self.entries.write();
        if entries.iter().any(|e| e.filter.as_ref() == filter) {
            return false;
        }
        entries.push(HandlerRegistration {
            filter: filter.into(),
            handler,
        });
        true
    }

    /// Collect the handlers whose filter matches `topic`, in registration
    /// order. Handlers are cloned out so callers iterate without holding
    /// the registry lock.
    pub fn matches(&self, topic: &str) -> SmallVec<[MessageHandler; 4]> {
        let entries = self.entries.read();
        let mut result: SmallVec<[MessageHandler; 4]> = SmallVec::new();
        for entry in entries.iter() {
            if topic_matches_filter(topic, &entry.filter) {
                result.push(entry.handler.clone());
            }
        }
        result
    }

    /// Snapshot of all registered filters, in registration order. Used for
    /// the blanket re-subscribe after (re)connection.
    pub fn filters(&self) -> Vec<Arc<str>> {
        self.entries.read().iter().map(|e| e.filter.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
