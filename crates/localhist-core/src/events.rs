//! History change notifications.
//!
//! Each event kind keeps its own list of observers. Emitting enqueues the
//! event for every subscription that exists at that moment; subscriptions
//! created later never see it. Queues are unbounded, so a slow subscriber
//! delays nothing and loses nothing.
//!
//! # Example
//!
//! ```ignore
//! let mut added = service.on_did_add_entry();
//! tokio::spawn(async move {
//!     while let Some(event) = added.recv().await {
//!         println!("captured {}", event.entry.resource);
//!     }
//! });
//! ```

use localhist_storage::{HistoryEntry, Resource};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tracing::debug;

/// Trait for events emitted by the history service.
pub trait Event: Clone + Send + Sync + 'static {
    /// Event type name for logging.
    fn event_type() -> &'static str;
}

/// A history entry was committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryAdded {
    pub entry: HistoryEntry,
}

impl EntryAdded {
    pub fn resource(&self) -> &Resource {
        &self.entry.resource
    }
}

impl Event for EntryAdded {
    fn event_type() -> &'static str {
        "history.entry.added"
    }
}

/// A history entry was removed, explicitly or by retention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRemoved {
    pub entry: HistoryEntry,
}

impl EntryRemoved {
    pub fn resource(&self) -> &Resource {
        &self.entry.resource
    }
}

impl Event for EntryRemoved {
    fn event_type() -> &'static str {
        "history.entry.removed"
    }
}

/// Observer lists for history events.
#[derive(Clone, Default)]
pub struct HistoryEvents {
    added: Arc<Observers<EntryAdded>>,
    removed: Arc<Observers<EntryRemoved>>,
}

impl HistoryEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to committed entries.
    pub fn on_did_add_entry(&self) -> Subscription<EntryAdded> {
        self.added.subscribe()
    }

    /// Subscribe to removed entries.
    pub fn on_did_remove_entry(&self) -> Subscription<EntryRemoved> {
        self.removed.subscribe()
    }

    /// Number of live add subscriptions.
    pub fn add_subscriber_count(&self) -> usize {
        self.added.live()
    }

    pub(crate) fn emit_added(&self, entry: HistoryEntry) {
        self.added.emit(EntryAdded { entry });
    }

    pub(crate) fn emit_removed(&self, entry: HistoryEntry) {
        self.removed.emit(EntryRemoved { entry });
    }
}

/// Senders of every subscription of one event kind.
struct Observers<E> {
    senders: Mutex<Vec<mpsc::UnboundedSender<E>>>,
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self {
            senders: Mutex::new(Vec::new()),
        }
    }
}

impl<E: Event> Observers<E> {
    // The list stays consistent even if a holder panicked
    fn senders(&self) -> MutexGuard<'_, Vec<mpsc::UnboundedSender<E>>> {
        self.senders.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn subscribe(&self) -> Subscription<E> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders().push(tx);
        Subscription { rx: Some(rx) }
    }

    fn live(&self) -> usize {
        let mut senders = self.senders();
        senders.retain(|tx| !tx.is_closed());
        senders.len()
    }

    fn emit(&self, event: E) {
        let mut senders = self.senders();
        // A send error means the subscription was disposed or dropped
        senders.retain(|tx| tx.send(event.clone()).is_ok());

        if senders.is_empty() {
            debug!(event = E::event_type(), "No subscribers for event");
        } else {
            debug!(event = E::event_type(), receivers = senders.len(), "Emitted event");
        }
    }
}

/// A handle that receives events until it is disposed or dropped.
pub struct Subscription<E> {
    rx: Option<mpsc::UnboundedReceiver<E>>,
}

impl<E: Event> Subscription<E> {
    /// Wait for the next event.
    ///
    /// Returns `None` once the subscription is disposed or the emitter is gone.
    pub async fn recv(&mut self) -> Option<E> {
        self.rx.as_mut()?.recv().await
    }

    /// Take the next already-emitted event without waiting.
    pub fn try_recv(&mut self) -> Option<E> {
        self.rx.as_mut()?.try_recv().ok()
    }

    /// Drain every already-emitted event.
    pub fn drain(&mut self) -> Vec<E> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// Stop receiving events. Pending events are discarded.
    pub fn dispose(&mut self) {
        self.rx = None;
    }

    pub fn is_disposed(&self) -> bool {
        self.rx.is_none()
    }
}
