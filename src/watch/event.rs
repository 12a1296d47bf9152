// src/watch/event.rs

//! Update events and the publish/subscribe channel they travel through.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::mpsc;
use tracing::trace;

use crate::types::{EventKind, FileKind};

/// Something found or changed in the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateEvent {
    pub kind: EventKind,
    pub file_kind: FileKind,
    pub path: PathBuf,
}

impl UpdateEvent {
    pub fn new(kind: EventKind, file_kind: FileKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            file_kind,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for UpdateEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.kind, self.file_kind, self.path.display())
    }
}

/// Callback invoked for every update event.
///
/// Listeners run on whichever thread emitted the event: the scan worker or
/// the change-dispatch thread.
pub type Listener = Arc<dyn Fn(&UpdateEvent) + Send + Sync>;

/// Identifies a subscription so it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Fan-out of update events to all current listeners, in subscription
/// order.
#[derive(Default)]
pub struct EventBus {
    next_id: AtomicU64,
    listeners: RwLock<Vec<(SubscriptionId, Listener)>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        id
    }

    /// Subscribe with a channel instead of a callback. Events are queued
    /// without bound; the subscription goes quiet once the receiver is
    /// dropped.
    pub fn subscribe_channel(&self) -> (SubscriptionId, mpsc::UnboundedReceiver<UpdateEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.subscribe(Arc::new(move |event: &UpdateEvent| {
            let _ = tx.send(event.clone());
        }));
        (id, rx)
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn emit(&self, event: &UpdateEvent) {
        // Snapshot so a listener may (un)subscribe without deadlocking.
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();

        trace!(%event, listeners = listeners.len(), "emitting update");
        for listener in listeners {
            listener(event);
        }
    }
}
