//! Per-tool progress channel.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{trace, warn};

use crate::event::ProgressEvent;

/// A subscriber to a tool's progress events.
///
/// Callbacks run synchronously on the publishing thread. A slow listener
/// slows the publisher; that is the listener's responsibility.
pub trait ProgressListener: Send + Sync {
    /// Handle one progress event.
    fn on_progress(&self, event: &ProgressEvent);
}

impl<F> ProgressListener for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: &ProgressEvent) {
        self(event);
    }
}

/// Observer registry owned by a single tool instance.
///
/// The listener set is insertion-ordered and holds each listener (identified
/// by its `Arc` allocation) at most once. Adding and removing may happen
/// concurrently with [`publish`](Self::publish): each publish delivers to a
/// snapshot of the set taken when it starts.
pub struct ProgressChannel {
    source: String,
    listeners: RwLock<Vec<Arc<dyn ProgressListener>>>,
}

impl ProgressChannel {
    /// Create a channel for the tool identified by `source`.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Identity stamped on every published event.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Register a listener.
    ///
    /// Returns `false` if this exact listener was already registered.
    pub fn add_listener(&self, listener: Arc<dyn ProgressListener>) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if listeners.iter().any(|l| same_listener(l, &listener)) {
            return false;
        }
        listeners.push(listener);
        true
    }

    /// Unregister a listener.
    ///
    /// Returns `false` if the listener was not registered.
    pub fn remove_listener(&self, listener: &Arc<dyn ProgressListener>) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|l| !same_listener(l, listener));
        listeners.len() != before
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Publish a message to every registered listener, in registration order.
    ///
    /// A listener that panics is skipped; the remaining listeners still
    /// receive the event. Returns the number of listeners that handled it.
    pub fn publish(&self, message: impl Into<String>) -> usize {
        let event = ProgressEvent::new(self.source.clone(), message);
        let snapshot: Vec<Arc<dyn ProgressListener>> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        trace!(source = %self.source, listeners = snapshot.len(), "Publishing progress");

        let mut delivered: usize = 0;
        for listener in &snapshot {
            if catch_unwind(AssertUnwindSafe(|| listener.on_progress(&event))).is_ok() {
                delivered = delivered.saturating_add(1);
            } else {
                warn!(source = %self.source, "Progress listener panicked");
            }
        }
        delivered
    }
}

impl std::fmt::Debug for ProgressChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressChannel")
            .field("source", &self.source)
            .field("listeners", &self.listener_count())
            .finish()
    }
}

fn same_listener(a: &Arc<dyn ProgressListener>, b: &Arc<dyn ProgressListener>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
