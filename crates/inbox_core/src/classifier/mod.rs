//! Classifier collaborator boundary.
//!
//! # Responsibility
//! - Define the async contract the lifecycle engine uses to derive a
//!   summary and tags from raw content.
//! - Define text extraction for uploaded files.
//!
//! # Invariants
//! - Classifier failures are values, never panics; the engine absorbs them
//!   and leaves the originating item pending.
//! - The core never retries a classifier call on its own.

use crate::model::item::ItemType;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod keyword;

pub use keyword::KeywordClassifier;

/// Classifier output for one piece of content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub summary: String,
    /// Ordered labels; normalized into a `TagSet` when applied.
    pub tags: Vec<String>,
}

impl Classification {
    pub fn new<I, S>(summary: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            summary: summary.into(),
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }
}

/// Non-fatal classifier error.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ClassificationFailure {
    #[error("content is empty")]
    EmptyContent,
    #[error("unsupported content in `{filename}`: {reason}")]
    UnsupportedContent { filename: String, reason: String },
    #[error("classifier returned an unusable result: {0}")]
    InvalidResult(String),
    #[error("classifier backend failed: {0}")]
    Backend(String),
}

/// Pluggable classification backend.
///
/// Implementations may call remote models; the engine runs them on spawned
/// tasks so a slow classifier never blocks other items.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Derives a summary and tags for raw content of the declared type.
    async fn classify(
        &self,
        content: &str,
        kind: ItemType,
    ) -> Result<Classification, ClassificationFailure>;

    /// Extracts plain text from an uploaded file.
    async fn extract_text(
        &self,
        bytes: &[u8],
        filename: &str,
    ) -> Result<String, ClassificationFailure>;

    /// Backend name for diagnostics.
    fn name(&self) -> &str;
}
