//! Push notifications for inbox changes.
//!
//! The core stays passive: it has no timers and no refresh loop. Hosts that
//! want push updates subscribe here; everyone else polls `list_items`.

use crate::classifier::ClassificationFailure;
use crate::model::item::{ItemId, ItemStatus};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Change notification emitted after a successful store mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InboxEvent {
    Submitted {
        id: ItemId,
    },
    Classified {
        id: ItemId,
        is_task: bool,
    },
    ClassificationFailed {
        id: ItemId,
        failure: ClassificationFailure,
    },
    StatusChanged {
        id: ItemId,
        from: ItemStatus,
        to: ItemStatus,
    },
    Converted {
        parent_id: ItemId,
        derived_id: ItemId,
    },
}

impl InboxEvent {
    /// The item this event is about (the derived item for conversions).
    pub fn item_id(&self) -> ItemId {
        match self {
            Self::Submitted { id }
            | Self::Classified { id, .. }
            | Self::ClassificationFailed { id, .. }
            | Self::StatusChanged { id, .. } => *id,
            Self::Converted { derived_id, .. } => *derived_id,
        }
    }
}

/// Fan-out sender shared by engine clones.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<InboxEvent>,
}

impl Default for EventPublisher {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }
}

impl EventPublisher {
    pub fn subscribe(&self) -> broadcast::Receiver<InboxEvent> {
        self.sender.subscribe()
    }

    /// Publishes to current subscribers. Returns how many received it;
    /// zero subscribers is not an error.
    pub fn publish(&self, event: InboxEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}
