mod common;

use common::{memory_engine, StaticClassifier};
use inbox_core::{
    conversion_suggestions, next_steps, Bucket, InboxEvent, ItemStatus, ItemType, LifecycleError,
};
use uuid::Uuid;

#[tokio::test]
async fn convert_creates_task_and_leaves_parent_in_knowledge() {
    let engine = memory_engine(StaticClassifier::new("Paper on X", &["Research", "Medical"]));
    let submission = engine.submit("paper notes", ItemType::Text).unwrap();
    let parent_id = submission.item.id;
    submission.wait().await.unwrap().unwrap();
    let parent_before = engine.get(parent_id).unwrap();
    let mut events = engine.subscribe();

    let derived = engine.convert(parent_id, "Follow up on X").unwrap();

    assert_ne!(derived.id, parent_id);
    assert_eq!(derived.kind, ItemType::Text);
    assert_eq!(derived.content, "Follow up on X");
    assert_eq!(derived.summary.as_deref(), Some("Follow up on X"));
    assert_eq!(derived.derived_from, Some(parent_id));
    assert!(derived.is_derived());
    assert!(!parent_before.is_derived());
    assert_eq!(derived.status, ItemStatus::Active);
    assert_eq!(
        derived.tags.labels(),
        ["action", "Research", "Medical"].map(String::from).as_slice()
    );
    assert!(derived.tags.has("ACTION"));

    assert_eq!(engine.get(parent_id).unwrap(), parent_before);

    let buckets = engine.buckets().unwrap();
    assert_eq!(buckets.locate(derived.id), Some(Bucket::Tasks));
    assert_eq!(buckets.locate(parent_id), Some(Bucket::Knowledge));

    assert_eq!(
        events.recv().await.unwrap(),
        InboxEvent::Converted {
            parent_id,
            derived_id: derived.id,
        }
    );
}

#[tokio::test]
async fn convert_does_not_duplicate_action_label() {
    let engine = memory_engine(StaticClassifier::new("Todo", &["Action", "Theology"]));
    let submission = engine.submit("todo list", ItemType::Text).unwrap();
    let parent_id = submission.item.id;
    submission.wait().await.unwrap().unwrap();

    let derived = engine
        .convert(parent_id, "\n  Write a Blog Post: \"Reflections on Action...\"\nmore")
        .unwrap();
    assert_eq!(
        derived.tags.labels(),
        ["action", "Theology"].map(String::from).as_slice()
    );
    assert_eq!(
        derived.summary.as_deref(),
        Some("Write a Blog Post: \"Reflections on Action...\"")
    );
}

#[tokio::test]
async fn convert_from_archived_parent_is_allowed() {
    let engine = memory_engine(StaticClassifier::new("headline", &["Research"]));
    let parent_id = engine.submit("notes", ItemType::Text).unwrap().item.id;
    engine.set_status(parent_id, ItemStatus::Archived).unwrap();

    let derived = engine.convert(parent_id, "Create Task: Follow up").unwrap();
    assert_eq!(derived.derived_from, Some(parent_id));
    assert_eq!(engine.get(parent_id).unwrap().status, ItemStatus::Archived);
}

#[tokio::test]
async fn convert_rejects_deleted_missing_and_blank_inputs() {
    let engine = memory_engine(StaticClassifier::new("headline", &["Research"]));
    let parent_id = engine.submit("notes", ItemType::Text).unwrap().item.id;

    let blank = engine.convert(parent_id, " \n\t").unwrap_err();
    assert!(matches!(blank, LifecycleError::EmptyDerivedContent(id) if id == parent_id));

    engine.set_status(parent_id, ItemStatus::Deleted).unwrap();
    let deleted = engine.convert(parent_id, "Follow up").unwrap_err();
    assert!(matches!(deleted, LifecycleError::ConvertFromDeleted(id) if id == parent_id));

    let missing = engine.convert(Uuid::new_v4(), "Follow up").unwrap_err();
    assert!(matches!(missing, LifecycleError::NotFound(_)));

    assert_eq!(engine.list_items().unwrap().len(), 1);
}

#[tokio::test]
async fn suggestions_feed_conversion() {
    let engine = memory_engine(StaticClassifier::new("Paper on X", &["Medical"]));
    let submission = engine.submit("paper", ItemType::Text).unwrap();
    let parent_id = submission.item.id;
    submission.wait().await.unwrap().unwrap();

    let parent = engine.get(parent_id).unwrap();
    let suggestions = conversion_suggestions(&parent);
    let derived = engine.convert(parent_id, suggestions[0].clone()).unwrap();

    assert_eq!(derived.content, "Draft a Tweet Thread about: Paper on X...");
    assert_eq!(next_steps(&derived.content)[0], "Outline the main hook.");
}
