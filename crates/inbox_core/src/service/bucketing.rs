//! Presentation buckets.
//!
//! # Responsibility
//! - Project a store snapshot into tasks, knowledge and archived lists.
//!
//! # Invariants
//! - Deleted items appear in no bucket.
//! - Pending items are active and untagged, so they land in knowledge.
//! - Each bucket is ordered newest first; ties keep input order.

use crate::model::item::{Item, ItemId, ItemStatus};
use crate::store::{sort_for_display, ItemStore, StoreResult};
use serde::Serialize;

/// Single presentation partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Tasks,
    Knowledge,
    Archived,
}

impl Bucket {
    /// Placement of one item; `None` for deleted items.
    pub fn of(item: &Item) -> Option<Self> {
        match item.status {
            ItemStatus::Deleted => None,
            ItemStatus::Archived => Some(Self::Archived),
            ItemStatus::Active if item.is_task() => Some(Self::Tasks),
            ItemStatus::Active => Some(Self::Knowledge),
        }
    }
}

/// Bucketed snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Buckets {
    pub tasks: Vec<Item>,
    pub knowledge: Vec<Item>,
    pub archived: Vec<Item>,
}

/// What an inbox screen shows for its archive toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboxView<'a> {
    Inbox {
        tasks: &'a [Item],
        knowledge: &'a [Item],
    },
    Archived(&'a [Item]),
}

impl Buckets {
    /// Partitions `items`; input order breaks `created_at` ties.
    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        let mut buckets = Self::default();
        for item in items {
            match Bucket::of(&item) {
                Some(Bucket::Tasks) => buckets.tasks.push(item),
                Some(Bucket::Knowledge) => buckets.knowledge.push(item),
                Some(Bucket::Archived) => buckets.archived.push(item),
                None => {}
            }
        }
        sort_for_display(&mut buckets.tasks);
        sort_for_display(&mut buckets.knowledge);
        sort_for_display(&mut buckets.archived);
        buckets
    }

    pub fn view(&self, show_archived: bool) -> InboxView<'_> {
        if show_archived {
            InboxView::Archived(&self.archived)
        } else {
            InboxView::Inbox {
                tasks: &self.tasks,
                knowledge: &self.knowledge,
            }
        }
    }

    /// Bucket currently holding `id`, if any.
    pub fn locate(&self, id: ItemId) -> Option<Bucket> {
        let holds = |items: &[Item]| items.iter().any(|item| item.id == id);
        if holds(&self.tasks) {
            Some(Bucket::Tasks)
        } else if holds(&self.knowledge) {
            Some(Bucket::Knowledge)
        } else if holds(&self.archived) {
            Some(Bucket::Archived)
        } else {
            None
        }
    }

    pub fn total(&self) -> usize {
        self.tasks.len() + self.knowledge.len() + self.archived.len()
    }
}

/// Read-only bucketing over a store.
pub struct BucketingView<'a, S: ItemStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ItemStore + ?Sized> BucketingView<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Recomputes buckets from a fresh snapshot.
    pub fn buckets(&self) -> StoreResult<Buckets> {
        Ok(Buckets::from_items(self.store.all()?))
    }
}

#[cfg(test)]
mod tests {
    use super::{Bucket, Buckets, InboxView};
    use crate::model::item::{Item, ItemStatus, ItemType};
    use crate::model::tag_set::TagSet;
    use chrono::{DateTime, Utc};

    fn classified(labels: &[&str], millis: i64) -> Item {
        let mut item = Item::new_pending("captured text", ItemType::Text);
        item.apply_classification("headline", TagSet::from_labels(labels));
        item.created_at = at(millis);
        item
    }

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap()
    }

    #[test]
    fn action_tag_places_item_in_tasks() {
        let task = classified(&["Medical", "Action"], 1);
        let grain = classified(&["Medical"], 1);

        assert_eq!(Bucket::of(&task), Some(Bucket::Tasks));
        assert_eq!(Bucket::of(&grain), Some(Bucket::Knowledge));
    }

    #[test]
    fn pending_items_are_knowledge_and_deleted_items_vanish() {
        let pending = Item::new_pending("raw", ItemType::Url);
        let mut deleted = classified(&["todo"], 1);
        deleted.status = ItemStatus::Deleted;

        let buckets = Buckets::from_items(vec![pending.clone(), deleted.clone()]);
        assert_eq!(buckets.knowledge, vec![pending]);
        assert!(buckets.tasks.is_empty());
        assert_eq!(buckets.locate(deleted.id), None);
        assert_eq!(buckets.total(), 1);
    }

    #[test]
    fn buckets_sort_newest_first_with_stable_ties() {
        let old = classified(&["todo"], 10);
        let tie_first = classified(&["action"], 20);
        let tie_second = classified(&["Actionable Task"], 20);

        let buckets =
            Buckets::from_items(vec![old.clone(), tie_first.clone(), tie_second.clone()]);
        let ids: Vec<_> = buckets.tasks.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![tie_first.id, tie_second.id, old.id]);
    }

    #[test]
    fn view_switches_on_archive_toggle() {
        let mut archived = classified(&["Theology"], 5);
        archived.status = ItemStatus::Archived;
        let active = classified(&["Theology"], 6);
        let buckets = Buckets::from_items(vec![archived.clone(), active.clone()]);

        match buckets.view(true) {
            InboxView::Archived(items) => assert_eq!(items, [archived].as_slice()),
            other => panic!("unexpected view: {other:?}"),
        }
        match buckets.view(false) {
            InboxView::Inbox { tasks, knowledge } => {
                assert!(tasks.is_empty());
                assert_eq!(knowledge, [active].as_slice());
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }
}
