//! Inbound boundary commands.
//!
//! Transport layers (HTTP handlers, CLI, UI bridges) translate their
//! requests into `InboxCommand` and hand them to
//! `LifecycleEngine::handle`.

use crate::model::item::{Item, ItemId, ItemStatus, ItemType};
use serde::{Deserialize, Serialize};

/// Inbound command accepted by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum InboxCommand {
    /// Raw text or URL capture. `kind` must be `text` or `url`.
    SubmitRaw {
        content: String,
        #[serde(rename = "type")]
        kind: ItemType,
    },
    /// Uploaded file; text is extracted by the classifier collaborator.
    SubmitFile { bytes: Vec<u8>, filename: String },
    SetStatus { id: ItemId, target: ItemStatus },
    Convert { id: ItemId, derived_content: String },
    /// Manual retry for an item whose classification failed.
    Reclassify { id: ItemId },
}

/// Result of one handled command.
///
/// Submissions return as soon as the pending item is stored; classification
/// continues in the background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Submitted(Item),
    StatusSet(Item),
    Converted(Item),
    ReclassifyScheduled(ItemId),
}

impl CommandOutcome {
    /// Item touched or created by the command, when one is returned.
    pub fn item(&self) -> Option<&Item> {
        match self {
            Self::Submitted(item) | Self::StatusSet(item) | Self::Converted(item) => Some(item),
            Self::ReclassifyScheduled(_) => None,
        }
    }
}
