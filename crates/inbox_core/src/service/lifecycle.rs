//! Item lifecycle engine.
//!
//! # Responsibility
//! - Turn raw submissions into pending items and drive classification.
//! - Validate and apply status transitions.
//! - Create derived task items from existing items (conversion).
//!
//! # Invariants
//! - Status only moves forward per `ItemStatus::can_transition_to`; the check
//!   runs inside the store's atomic update, so a rejected transition leaves
//!   the item untouched.
//! - Conversion is additive: the parent item is never mutated.
//! - Classifier failures are absorbed; the item stays pending and visible.
//! - Classification results apply only while the item is still pending,
//!   including items deleted in the meantime.

use crate::classifier::{Classification, ClassificationFailure, Classifier};
use crate::command::{CommandOutcome, InboxCommand};
use crate::events::{EventPublisher, InboxEvent};
use crate::model::item::{Item, ItemId, ItemStatus, ItemType};
use crate::model::tag_set::{TagSet, ACTION_LABEL};
use crate::service::bucketing::{BucketingView, Buckets};
use crate::store::{ItemStore, StoreError};
use log::{info, warn};
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Errors surfaced to callers of the core API.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("item not found: {0}")]
    NotFound(ItemId),
    #[error("invalid status transition for item {id}: {from} -> {to}")]
    InvalidTransition {
        id: ItemId,
        from: ItemStatus,
        to: ItemStatus,
    },
    #[error("item id already present: {0}")]
    DuplicateId(ItemId),
    #[error("cannot convert deleted item {0}")]
    ConvertFromDeleted(ItemId),
    #[error("derived content for item {0} is empty")]
    EmptyDerivedContent(ItemId),
    #[error("`{0}` items must be submitted as files")]
    UnsupportedSubmitType(ItemType),
    #[error("classification needs a running tokio runtime")]
    NoRuntime,
    #[error("background classification task failed: {0}")]
    Background(String),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for LifecycleError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::DuplicateId(id) => Self::DuplicateId(id),
            other => Self::Store(other),
        }
    }
}

impl LifecycleError {
    /// Stable code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::DuplicateId(_) => "duplicate_id",
            Self::ConvertFromDeleted(_) => "convert_from_deleted",
            Self::EmptyDerivedContent(_) => "empty_derived_content",
            Self::UnsupportedSubmitType(_) => "unsupported_submit_type",
            Self::NoRuntime => "no_runtime",
            Self::Background(_) => "background_task_failed",
            Self::Store(_) => "store_error",
        }
    }
}

/// Result of one classification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassificationOutcome {
    /// Summary and tags were written.
    Applied(Item),
    /// The item was already classified; nothing changed.
    AlreadyClassified(Item),
    /// The classifier failed; the item stays pending.
    Failed(ClassificationFailure),
}

impl ClassificationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Background classification task handle.
pub type ClassificationHandle = JoinHandle<LifecycleResult<ClassificationOutcome>>;

/// Pending item plus its in-flight classification.
#[derive(Debug)]
pub struct Submission {
    pub item: Item,
    /// `None` when no classification was attempted (unreadable upload).
    pub classification: Option<ClassificationHandle>,
}

impl Submission {
    /// Waits for classification to finish.
    ///
    /// Returns `None` when classification was never scheduled or the
    /// background task was cancelled by runtime shutdown.
    pub async fn wait(self) -> Option<LifecycleResult<ClassificationOutcome>> {
        match self.classification {
            Some(handle) => handle.await.ok(),
            None => None,
        }
    }
}

/// Lifecycle use-case service over an item store and a classifier.
pub struct LifecycleEngine<S: ItemStore> {
    store: Arc<S>,
    classifier: Arc<dyn Classifier>,
    events: EventPublisher,
}

impl<S: ItemStore> Clone for LifecycleEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            classifier: Arc::clone(&self.classifier),
            events: self.events.clone(),
        }
    }
}

impl<S: ItemStore + 'static> LifecycleEngine<S> {
    /// Creates an engine owning `store`.
    pub fn new(store: S, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            store: Arc::new(store),
            classifier,
            events: EventPublisher::default(),
        }
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Subscribes to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<InboxEvent> {
        self.events.subscribe()
    }

    /// Gets one item by id, tombstoned items included.
    pub fn get(&self, id: ItemId) -> LifecycleResult<Item> {
        Ok(self.store.get(id)?)
    }

    /// Every item in display order, deleted ones included.
    pub fn list_items(&self) -> LifecycleResult<Vec<Item>> {
        Ok(self.store.all()?)
    }

    /// Presentation buckets recomputed from the current store snapshot.
    pub fn buckets(&self) -> LifecycleResult<Buckets> {
        Ok(BucketingView::new(self.store.as_ref()).buckets()?)
    }

    /// Stores a pending item and schedules its classification.
    ///
    /// Fails with `NoRuntime`, storing nothing, when called outside a tokio
    /// runtime.
    pub fn submit(
        &self,
        content: impl Into<String>,
        kind: ItemType,
    ) -> LifecycleResult<Submission> {
        let runtime = current_runtime()?;
        let item = self.append_pending(content.into(), kind)?;
        let classification = self.spawn_classification(&runtime, item.id);
        Ok(Submission {
            item,
            classification: Some(classification),
        })
    }

    /// Extracts text from an upload, then submits it as a `file` item.
    ///
    /// When extraction fails the item is still stored (content
    /// `file:<filename>`) so the upload stays visible; no classification is
    /// attempted for it.
    pub async fn submit_file(&self, bytes: &[u8], filename: &str) -> LifecycleResult<Submission> {
        match self.classifier.extract_text(bytes, filename).await {
            Ok(text) => self.submit(text, ItemType::File),
            Err(failure) => {
                let item = self.append_pending(format!("file:{filename}"), ItemType::File)?;
                warn!(
                    "event=file_extract module=lifecycle status=error item_id={} bytes={} error={}",
                    item.id,
                    bytes.len(),
                    failure
                );
                self.events.publish(InboxEvent::ClassificationFailed {
                    id: item.id,
                    failure,
                });
                Ok(Submission {
                    item,
                    classification: None,
                })
            }
        }
    }

    /// Runs the classifier for a pending item and applies the result.
    pub async fn classify_pending(&self, id: ItemId) -> LifecycleResult<ClassificationOutcome> {
        let item = self.store.get(id)?;
        if item.is_classified() {
            return Ok(ClassificationOutcome::AlreadyClassified(item));
        }

        match self.classifier.classify(&item.content, item.kind).await {
            Ok(classification) => {
                // The SQLite host blocks on its connection; keep that off the
                // async workers.
                let engine = self.clone();
                tokio::task::spawn_blocking(move || {
                    engine.apply_classification(id, classification)
                })
                .await
                .map_err(|err| LifecycleError::Background(err.to_string()))?
            }
            Err(failure) => Ok(self.absorb_failure(id, failure)),
        }
    }

    /// Applies classifier output if the item is still pending.
    ///
    /// Unknown ids fail with `NotFound`. Output for an already classified
    /// item is ignored, even when it would be rejected as unusable.
    pub fn apply_classification(
        &self,
        id: ItemId,
        classification: Classification,
    ) -> LifecycleResult<ClassificationOutcome> {
        let current = self.store.get(id)?;
        if current.is_classified() {
            return Ok(ClassificationOutcome::AlreadyClassified(current));
        }

        let tags = TagSet::from_labels(&classification.tags);
        let summary = classification.summary.trim().to_string();
        if tags.is_empty() {
            return Ok(self.absorb_failure(
                id,
                ClassificationFailure::InvalidResult("no tags".to_string()),
            ));
        }
        if summary.is_empty() {
            return Ok(self.absorb_failure(
                id,
                ClassificationFailure::InvalidResult("blank summary".to_string()),
            ));
        }

        let mut applied = false;
        let item = self.store.update(id, |item| {
            applied = item.apply_classification(summary, tags);
            Ok::<(), LifecycleError>(())
        })?;

        if !applied {
            return Ok(ClassificationOutcome::AlreadyClassified(item));
        }

        info!(
            "event=item_classify module=lifecycle status=ok item_id={} tag_count={} item_status={}",
            item.id,
            item.tags.len(),
            item.status
        );
        self.events.publish(InboxEvent::Classified {
            id: item.id,
            is_task: item.is_task(),
        });
        Ok(ClassificationOutcome::Applied(item))
    }

    /// Manual recovery path: re-runs classification for an existing item.
    pub fn reclassify(&self, id: ItemId) -> LifecycleResult<ClassificationHandle> {
        let runtime = current_runtime()?;
        self.store.get(id)?;
        Ok(self.spawn_classification(&runtime, id))
    }

    /// Validates and applies a status transition.
    pub fn set_status(&self, id: ItemId, target: ItemStatus) -> LifecycleResult<Item> {
        let mut previous = None;
        let result = self.store.update(id, |item| {
            let from = item.status;
            if !from.can_transition_to(target) {
                return Err(LifecycleError::InvalidTransition {
                    id,
                    from,
                    to: target,
                });
            }
            previous = Some(from);
            item.status = target;
            Ok(())
        });

        match result {
            Ok(item) => {
                if let Some(from) = previous.filter(|from| *from != target) {
                    info!(
                        "event=item_status module=lifecycle status=ok item_id={} from={} to={}",
                        id, from, target
                    );
                    self.events.publish(InboxEvent::StatusChanged {
                        id,
                        from,
                        to: target,
                    });
                }
                Ok(item)
            }
            Err(err) => {
                warn!(
                    "event=item_status module=lifecycle status=error item_id={} to={} error_code={}",
                    id,
                    target,
                    err.code()
                );
                Err(err)
            }
        }
    }

    /// Creates a derived task item from `parent_id` without touching it.
    ///
    /// The derived item is stored already classified: its summary is the
    /// first non-blank line of `derived_content` and its tags are `action`
    /// followed by the parent's tags.
    pub fn convert(
        &self,
        parent_id: ItemId,
        derived_content: impl Into<String>,
    ) -> LifecycleResult<Item> {
        let parent = self.store.get(parent_id)?;
        if parent.status == ItemStatus::Deleted {
            return Err(LifecycleError::ConvertFromDeleted(parent_id));
        }

        let content = derived_content.into();
        let summary =
            headline(&content).ok_or(LifecycleError::EmptyDerivedContent(parent_id))?;
        let tags = parent.tags.with_label(ACTION_LABEL);
        let derived = Item::new_derived(parent_id, content, summary, tags);
        self.store.append(derived.clone())?;

        info!(
            "event=item_convert module=lifecycle status=ok parent_id={} derived_id={}",
            parent_id, derived.id
        );
        self.events.publish(InboxEvent::Converted {
            parent_id,
            derived_id: derived.id,
        });
        Ok(derived)
    }

    /// Dispatches one boundary command.
    pub async fn handle(&self, command: InboxCommand) -> LifecycleResult<CommandOutcome> {
        match command {
            InboxCommand::SubmitRaw { content, kind } => {
                if kind == ItemType::File {
                    return Err(LifecycleError::UnsupportedSubmitType(kind));
                }
                let submission = self.submit(content, kind)?;
                Ok(CommandOutcome::Submitted(submission.item))
            }
            InboxCommand::SubmitFile { bytes, filename } => {
                let submission = self.submit_file(&bytes, &filename).await?;
                Ok(CommandOutcome::Submitted(submission.item))
            }
            InboxCommand::SetStatus { id, target } => {
                self.set_status(id, target).map(CommandOutcome::StatusSet)
            }
            InboxCommand::Convert {
                id,
                derived_content,
            } => self
                .convert(id, derived_content)
                .map(CommandOutcome::Converted),
            InboxCommand::Reclassify { id } => {
                self.reclassify(id)?;
                Ok(CommandOutcome::ReclassifyScheduled(id))
            }
        }
    }

    fn append_pending(&self, content: String, kind: ItemType) -> LifecycleResult<Item> {
        let item = Item::new_pending(content, kind);
        self.store.append(item.clone())?;
        info!(
            "event=item_submit module=lifecycle status=ok item_id={} type={} content_chars={}",
            item.id,
            item.kind,
            item.content.chars().count()
        );
        self.events.publish(InboxEvent::Submitted { id: item.id });
        Ok(item)
    }

    fn spawn_classification(&self, runtime: &Handle, id: ItemId) -> ClassificationHandle {
        let engine = self.clone();
        runtime.spawn(async move { engine.classify_pending(id).await })
    }

    fn absorb_failure(&self, id: ItemId, failure: ClassificationFailure) -> ClassificationOutcome {
        warn!(
            "event=item_classify module=lifecycle status=error item_id={} classifier={} error={}",
            id,
            self.classifier.name(),
            failure
        );
        self.events.publish(InboxEvent::ClassificationFailed {
            id,
            failure: failure.clone(),
        });
        ClassificationOutcome::Failed(failure)
    }
}

fn current_runtime() -> LifecycleResult<Handle> {
    Handle::try_current().map_err(|_| LifecycleError::NoRuntime)
}

fn headline(content: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}
