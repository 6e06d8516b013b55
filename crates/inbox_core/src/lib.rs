//! Core domain logic for the capture inbox.
//! This crate is the single source of truth for item lifecycle invariants.

pub mod classifier;
pub mod command;
pub mod config;
pub mod db;
pub mod events;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

pub use classifier::{Classification, ClassificationFailure, Classifier, KeywordClassifier};
pub use command::{CommandOutcome, InboxCommand};
pub use config::{ClassifierConfig, ConfigError, InboxConfig};
pub use events::InboxEvent;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::item::{
    Item, ItemId, ItemStatus, ItemType, ItemValidationError, PENDING_SUMMARY_PLACEHOLDER,
};
pub use model::tag_set::{TagSet, ACTION_LABEL, TASK_PREDICATE_LABELS};
pub use service::bucketing::{Bucket, BucketingView, Buckets, InboxView};
pub use service::lifecycle::{
    ClassificationHandle, ClassificationOutcome, LifecycleEngine, LifecycleError,
    LifecycleResult, Submission,
};
pub use service::recommend::{conversion_suggestions, next_steps};
pub use store::{InMemoryItemStore, ItemStore, SqliteItemStore, StoreError, StoreResult};
