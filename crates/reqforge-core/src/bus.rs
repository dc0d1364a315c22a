//! Event bus for inter-component communication.
//!
//! A small typed publish/subscribe mechanism over tokio broadcast
//! channels. The snapshot manager listens for artifact mutations here so
//! the auto-save debounce stays decoupled from whoever performs the
//! mutation.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Per-event-type channel capacity.
const CHANNEL_CAPACITY: usize = 128;

/// Trait for events that can be published on the bus.
pub trait Event: Clone + Send + Sync + 'static {
    /// Event type name for logging.
    fn event_type() -> &'static str;
}

/// The event bus for pub/sub communication.
#[derive(Clone)]
pub struct Bus {
    channels: Arc<RwLock<HashMap<TypeId, Box<dyn Any + Send + Sync>>>>,
}

impl Bus {
    /// Create a new event bus.
    pub fn new() -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Events published with no subscribers are dropped silently.
    pub async fn publish<E: Event>(&self, event: E) {
        let channels = self.channels.read().await;
        if let Some(sender) = channels.get(&TypeId::of::<E>()) {
            if let Some(tx) = sender.downcast_ref::<broadcast::Sender<E>>() {
                let _ = tx.send(event);
            }
        }
    }

    /// Subscribe to events of type `E`.
    pub async fn subscribe<E: Event>(&self) -> broadcast::Receiver<E> {
        let type_id = TypeId::of::<E>();

        {
            let channels = self.channels.read().await;
            if let Some(sender) = channels.get(&type_id) {
                if let Some(tx) = sender.downcast_ref::<broadcast::Sender<E>>() {
                    return tx.subscribe();
                }
            }
        }

        let mut channels = self.channels.write().await;
        // Another subscriber may have raced us to create the channel.
        if let Some(sender) = channels.get(&type_id) {
            if let Some(tx) = sender.downcast_ref::<broadcast::Sender<E>>() {
                return tx.subscribe();
            }
        }
        let (tx, rx) = broadcast::channel::<E>(CHANNEL_CAPACITY);
        channels.insert(type_id, Box::new(tx));
        rx
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Event Types
// ============================================================================

/// An artifact collection was mutated (add/edit/remove of any record).
#[derive(Debug, Clone)]
pub struct ArtifactMutated {
    pub project_id: String,
}

impl Event for ArtifactMutated {
    fn event_type() -> &'static str {
        "artifact.mutated"
    }
}

/// A baseline was created.
#[derive(Debug, Clone)]
pub struct BaselineCreated {
    pub project_id: String,
    pub baseline_id: String,
    pub name: String,
}

impl Event for BaselineCreated {
    fn event_type() -> &'static str {
        "baseline.created"
    }
}

/// A version snapshot was recorded.
#[derive(Debug, Clone)]
pub struct SnapshotRecorded {
    pub project_id: String,
    pub snapshot_id: String,
    pub kind: &'static str,
}

impl Event for SnapshotRecorded {
    fn event_type() -> &'static str {
        "snapshot.recorded"
    }
}

/// Live collections were overwritten from a version snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotRestored {
    pub project_id: String,
    pub snapshot_id: String,
}

impl Event for SnapshotRestored {
    fn event_type() -> &'static str {
        "snapshot.restored"
    }
}

/// A project session was disposed.
#[derive(Debug, Clone)]
pub struct SessionDisposed {
    pub project_id: String,
}

impl Event for SessionDisposed {
    fn event_type() -> &'static str {
        "session.disposed"
    }
}
