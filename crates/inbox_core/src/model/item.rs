//! Item domain model.
//!
//! # Responsibility
//! - Define the canonical captured record shared by every inbox view.
//! - Own the status transition table and one-shot classification rule.
//!
//! # Invariants
//! - `id` is stable and never reused for another item.
//! - `content`, `kind`, `created_at` and `derived_from` never change after
//!   creation.
//! - A classified item (`summary` set) carries at least one tag.
//! - Items are never hard-deleted; `Deleted` is a tombstone status.

use crate::model::tag_set::TagSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Stable identifier for every captured item.
pub type ItemId = Uuid;

/// Declared content type of a captured item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    /// Free text, typed or dictated.
    Text,
    /// URL string; the content is the link itself.
    Url,
    /// Text extracted from an uploaded file.
    File,
}

impl ItemType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Url => "url",
            Self::File => "file",
        }
    }
}

impl Display for ItemType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = ItemValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "url" => Ok(Self::Url),
            "file" => Ok(Self::File),
            other => Err(ItemValidationError::UnknownType(other.to_string())),
        }
    }
}

/// Lifecycle status of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Visible in the task or knowledge bucket.
    Active,
    /// Kept for reference, shown only in the archived view.
    Archived,
    /// Tombstoned; addressable by id but hidden from every bucket.
    Deleted,
}

impl ItemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
            Self::Deleted => "deleted",
        }
    }

    /// Transition table. Same-state moves are accepted as no-ops.
    ///
    /// | from \ to | active | archived | deleted |
    /// |-----------|--------|----------|---------|
    /// | active    | ok     | ok       | ok      |
    /// | archived  | -      | ok       | ok      |
    /// | deleted   | -      | -        | ok      |
    pub fn can_transition_to(self, target: ItemStatus) -> bool {
        matches!(
            (self, target),
            (Self::Active, _)
                | (Self::Archived, Self::Archived | Self::Deleted)
                | (Self::Deleted, Self::Deleted)
        )
    }
}

impl Display for ItemStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = ItemValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            // `new` is the default status written by older inbox databases.
            "active" | "new" => Ok(Self::Active),
            "archived" => Ok(Self::Archived),
            "deleted" => Ok(Self::Deleted),
            other => Err(ItemValidationError::UnknownStatus(other.to_string())),
        }
    }
}

/// Structural validation failures for items.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemValidationError {
    #[error("item id must not be nil")]
    NilId,
    #[error("item {0} cannot be derived from itself")]
    SelfDerived(ItemId),
    #[error("classified item {0} must carry at least one tag")]
    MissingTags(ItemId),
    #[error("item {0} has a blank summary")]
    BlankSummary(ItemId),
    #[error("unknown item type `{0}`")]
    UnknownType(String),
    #[error("unknown item status `{0}`")]
    UnknownStatus(String),
}

/// Canonical captured record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Stable id used for commands, provenance and auditing.
    pub id: ItemId,
    /// Raw payload: text, URL string, or extracted file text.
    pub content: String,
    /// Serialized as `type` to match the inbox wire schema.
    #[serde(rename = "type")]
    pub kind: ItemType,
    /// Derived headline. `None` while classification is pending.
    pub summary: Option<String>,
    pub tags: TagSet,
    pub status: ItemStatus,
    /// UTC creation instant, millisecond precision.
    pub created_at: DateTime<Utc>,
    /// Weak provenance link to the item this one was converted from.
    pub derived_from: Option<ItemId>,
}

impl Item {
    /// Creates an active, unclassified item with a fresh id.
    pub fn new_pending(content: impl Into<String>, kind: ItemType) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            kind,
            summary: None,
            tags: TagSet::new(),
            status: ItemStatus::Active,
            created_at: now_millis(),
            derived_from: None,
        }
    }

    /// Creates an already classified item derived from `parent`.
    pub fn new_derived(
        parent: ItemId,
        content: impl Into<String>,
        summary: impl Into<String>,
        tags: TagSet,
    ) -> Self {
        let mut item = Self::new_pending(content, ItemType::Text);
        item.summary = Some(summary.into());
        item.tags = tags;
        item.derived_from = Some(parent);
        item
    }

    /// Applies classifier output once.
    ///
    /// Returns `false` without touching the item when it is already
    /// classified, so retried or late classifier results stay idempotent.
    pub fn apply_classification(&mut self, summary: impl Into<String>, tags: TagSet) -> bool {
        if self.is_classified() {
            return false;
        }
        self.summary = Some(summary.into());
        self.tags = tags;
        true
    }

    /// Pending means the classifier has not produced a summary yet.
    pub fn is_pending(&self) -> bool {
        self.summary.is_none()
    }

    pub fn is_classified(&self) -> bool {
        self.summary.is_some()
    }

    pub fn is_task(&self) -> bool {
        self.tags.is_task()
    }

    /// Organic items were submitted directly; derived ones come from conversion.
    pub fn is_derived(&self) -> bool {
        self.derived_from.is_some()
    }

    /// Headline shown by presentation layers.
    pub fn display_summary(&self) -> &str {
        self.summary.as_deref().unwrap_or(PENDING_SUMMARY_PLACEHOLDER)
    }

    /// Checks structural invariants.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.id.is_nil() {
            return Err(ItemValidationError::NilId);
        }
        if self.derived_from == Some(self.id) {
            return Err(ItemValidationError::SelfDerived(self.id));
        }
        if let Some(summary) = self.summary.as_deref() {
            if summary.trim().is_empty() {
                return Err(ItemValidationError::BlankSummary(self.id));
            }
            if self.tags.is_empty() {
                return Err(ItemValidationError::MissingTags(self.id));
            }
        }
        Ok(())
    }

    /// Copies immutable identity fields from `original` back onto `self`.
    pub(crate) fn restore_immutable_fields(&mut self, original: &Item) {
        self.id = original.id;
        self.content.clone_from(&original.content);
        self.kind = original.kind;
        self.created_at = original.created_at;
        self.derived_from = original.derived_from;
    }
}

/// Placeholder headline for items still waiting on the classifier.
pub const PENDING_SUMMARY_PLACEHOLDER: &str = "Processing...";

/// Current UTC time truncated to milliseconds so stores round-trip it exactly.
pub(crate) fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::{Item, ItemStatus, ItemType, ItemValidationError};
    use crate::model::tag_set::TagSet;

    #[test]
    fn transition_table_is_forward_only() {
        use ItemStatus::{Active, Archived, Deleted};

        assert!(Active.can_transition_to(Active));
        assert!(Active.can_transition_to(Archived));
        assert!(Active.can_transition_to(Deleted));
        assert!(!Archived.can_transition_to(Active));
        assert!(Archived.can_transition_to(Archived));
        assert!(Archived.can_transition_to(Deleted));
        assert!(!Deleted.can_transition_to(Active));
        assert!(!Deleted.can_transition_to(Archived));
        assert!(Deleted.can_transition_to(Deleted));
    }

    #[test]
    fn legacy_new_status_reads_as_active() {
        assert_eq!("new".parse::<ItemStatus>().unwrap(), ItemStatus::Active);
        assert!("gone".parse::<ItemStatus>().is_err());
    }

    #[test]
    fn validate_requires_tags_once_classified() {
        let mut item = Item::new_pending("note", ItemType::Text);
        item.validate().unwrap();

        item.summary = Some("headline".to_string());
        assert_eq!(
            item.validate().unwrap_err(),
            ItemValidationError::MissingTags(item.id)
        );

        item.tags = TagSet::from_labels(["Research"]);
        item.validate().unwrap();
    }

    #[test]
    fn validate_rejects_self_derivation() {
        let mut item = Item::new_pending("note", ItemType::Text);
        item.derived_from = Some(item.id);
        assert!(matches!(
            item.validate(),
            Err(ItemValidationError::SelfDerived(_))
        ));
    }
}
