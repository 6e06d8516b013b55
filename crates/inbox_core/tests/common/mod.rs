#![allow(dead_code)]

use async_trait::async_trait;
use inbox_core::{
    Classification, ClassificationFailure, Classifier, InMemoryItemStore, ItemType,
    LifecycleEngine,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Returns the same classification for every input.
pub struct StaticClassifier {
    pub summary: String,
    pub tags: Vec<String>,
}

impl StaticClassifier {
    pub fn new(summary: &str, tags: &[&str]) -> Self {
        Self {
            summary: summary.to_string(),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
        }
    }
}

#[async_trait]
impl Classifier for StaticClassifier {
    async fn classify(
        &self,
        _content: &str,
        _kind: ItemType,
    ) -> Result<Classification, ClassificationFailure> {
        Ok(Classification::new(self.summary.clone(), self.tags.clone()))
    }

    async fn extract_text(
        &self,
        bytes: &[u8],
        _filename: &str,
    ) -> Result<String, ClassificationFailure> {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Fails the first `failures` classify calls, then behaves like `inner`.
pub struct FlakyClassifier {
    inner: StaticClassifier,
    remaining_failures: AtomicUsize,
    pub calls: AtomicUsize,
}

impl FlakyClassifier {
    pub fn new(failures: usize, inner: StaticClassifier) -> Self {
        Self {
            inner,
            remaining_failures: AtomicUsize::new(failures),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Classifier for FlakyClassifier {
    async fn classify(
        &self,
        content: &str,
        kind: ItemType,
    ) -> Result<Classification, ClassificationFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failed = self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failed {
            return Err(ClassificationFailure::Backend("model unavailable".to_string()));
        }
        self.inner.classify(content, kind).await
    }

    async fn extract_text(
        &self,
        _bytes: &[u8],
        filename: &str,
    ) -> Result<String, ClassificationFailure> {
        Err(ClassificationFailure::UnsupportedContent {
            filename: filename.to_string(),
            reason: "no text layer".to_string(),
        })
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

/// Holds every classify call until the test releases a permit.
pub struct GatedClassifier {
    inner: StaticClassifier,
    gate: Arc<Semaphore>,
}

impl GatedClassifier {
    pub fn new(inner: StaticClassifier) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        (
            Self {
                inner,
                gate: Arc::clone(&gate),
            },
            gate,
        )
    }
}

#[async_trait]
impl Classifier for GatedClassifier {
    async fn classify(
        &self,
        content: &str,
        kind: ItemType,
    ) -> Result<Classification, ClassificationFailure> {
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|err| ClassificationFailure::Backend(err.to_string()))?;
        permit.forget();
        self.inner.classify(content, kind).await
    }

    async fn extract_text(
        &self,
        bytes: &[u8],
        filename: &str,
    ) -> Result<String, ClassificationFailure> {
        self.inner.extract_text(bytes, filename).await
    }

    fn name(&self) -> &str {
        "gated"
    }
}

pub fn memory_engine(classifier: impl Classifier + 'static) -> LifecycleEngine<InMemoryItemStore> {
    LifecycleEngine::new(InMemoryItemStore::new(), Arc::new(classifier))
}
