//! Rule-based classifier.
//!
//! # Responsibility
//! - Tag content by keyword families (theology, medical, actionable).
//! - Derive a short extractive summary from the leading sentences.
//!
//! # Invariants
//! - Output always carries at least one tag: either the actionable tag or
//!   the knowledge tag.
//! - Keyword detection is case-insensitive substring matching.

use crate::classifier::{Classification, Classifier, ClassificationFailure};
use crate::config::ClassifierConfig;
use crate::model::item::ItemType;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

pub const THEOLOGY_TAG: &str = "Theology";
pub const MEDICAL_TAG: &str = "Medical";
pub const ACTIONABLE_TAG: &str = "Actionable Task";
pub const KNOWLEDGE_TAG: &str = "Knowledge Grain";

static THEOLOGY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)sda|theology|god").expect("valid theology regex"));
static MEDICAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)medical|clinical|patient|guideline|mfm").expect("valid medical regex")
});
static ACTIONABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)todo|action").expect("valid actionable regex"));

static MARKDOWN_IMAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[[^\]]*]\(([^)]+)\)").expect("valid image regex"));
static MARKDOWN_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid link regex"));
static MARKDOWN_SYMBOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\*_`#>~]+").expect("valid markdown symbol regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));
static SENTENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^.!?]*[.!?]+").expect("valid sentence regex"));

/// Deterministic keyword classifier used when no model backend is wired in.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    config: ClassifierConfig,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

impl KeywordClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Keyword families found in `text`, in fixed display order.
    pub fn derive_tags(text: &str) -> Vec<String> {
        let mut tags = Vec::new();
        if THEOLOGY_RE.is_match(text) {
            tags.push(THEOLOGY_TAG.to_string());
        }
        if MEDICAL_RE.is_match(text) {
            tags.push(MEDICAL_TAG.to_string());
        }
        if ACTIONABLE_RE.is_match(text) {
            tags.push(ACTIONABLE_TAG.to_string());
        } else {
            tags.push(KNOWLEDGE_TAG.to_string());
        }
        tags
    }

    /// Extractive summary: leading sentences of the cleaned text, or a
    /// character-capped prefix when the text has no sentence punctuation.
    pub fn derive_summary(&self, text: &str) -> Option<String> {
        let cleaned = clean_text(text);
        if cleaned.is_empty() {
            return None;
        }

        let sentences: Vec<&str> = SENTENCE_RE
            .find_iter(&cleaned)
            .map(|found| found.as_str().trim())
            .filter(|sentence| !sentence.is_empty())
            .take(self.config.summary_sentences.max(1))
            .collect();
        if !sentences.is_empty() {
            return Some(sentences.join(" "));
        }

        Some(truncate_chars(&cleaned, self.config.fallback_chars))
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(
        &self,
        content: &str,
        kind: ItemType,
    ) -> Result<Classification, ClassificationFailure> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(ClassificationFailure::EmptyContent);
        }

        // Links are not fetched here; the link text itself is the headline.
        let summary = match kind {
            ItemType::Url => truncate_chars(trimmed, self.config.fallback_chars),
            ItemType::Text | ItemType::File => self
                .derive_summary(trimmed)
                .ok_or(ClassificationFailure::EmptyContent)?,
        };

        Ok(Classification::new(summary, Self::derive_tags(trimmed)))
    }

    async fn extract_text(
        &self,
        bytes: &[u8],
        filename: &str,
    ) -> Result<String, ClassificationFailure> {
        let text = std::str::from_utf8(bytes).map_err(|err| {
            ClassificationFailure::UnsupportedContent {
                filename: filename.to_string(),
                reason: format!("not valid UTF-8 text ({err})"),
            }
        })?;
        if text.trim().is_empty() {
            return Err(ClassificationFailure::EmptyContent);
        }
        Ok(text.to_string())
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

fn clean_text(text: &str) -> String {
    let without_images = MARKDOWN_IMAGE_RE.replace_all(text, " ");
    let without_links = MARKDOWN_LINK_RE.replace_all(&without_images, "$1");
    let without_symbols = MARKDOWN_SYMBOL_RE.replace_all(&without_links, " ");
    WHITESPACE_RE
        .replace_all(&without_symbols, " ")
        .trim()
        .to_string()
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    let mut truncated: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        truncated.push_str("...");
    }
    truncated
}
