//! Tag set attached to captured items.
//!
//! # Responsibility
//! - Normalize classifier labels into an ordered, duplicate-free set.
//! - Answer bucket membership questions without string formatting tricks.
//!
//! # Invariants
//! - Labels are trimmed and never empty.
//! - Duplicates are detected case-insensitively; the first spelling wins.
//! - Insertion order is display order.

use serde::{Deserialize, Serialize};

/// Predicate labels that mark an item as actionable.
pub const TASK_PREDICATE_LABELS: [&str; 2] = ["action", "todo"];

/// Label forced onto items produced by task conversion.
pub const ACTION_LABEL: &str = "action";

/// Ordered, case-preserving, case-insensitively unique label collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TagSet {
    labels: Vec<String>,
}

impl TagSet {
    /// Creates an empty set. Only pending items carry an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a normalized set from raw labels.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for label in labels {
            set.insert(label.as_ref());
        }
        set
    }

    /// Inserts one label. Returns `false` for blank or already present labels.
    pub fn insert(&mut self, label: &str) -> bool {
        let trimmed = label.trim();
        if trimmed.is_empty() || self.has(trimmed) {
            return false;
        }
        self.labels.push(trimmed.to_string());
        true
    }

    /// Returns a copy with `label` placed first when it is not present yet.
    pub fn with_label(&self, label: &str) -> Self {
        let mut forced = Self::from_labels([label]);
        for existing in &self.labels {
            forced.insert(existing);
        }
        forced
    }

    /// Case-insensitive exact membership.
    pub fn has(&self, label: &str) -> bool {
        let needle = label.trim().to_lowercase();
        self.labels
            .iter()
            .any(|existing| existing.to_lowercase() == needle)
    }

    /// Returns `true` when any label contains any predicate label.
    ///
    /// Containment is a case-insensitive substring test, so `"Actionable
    /// Research"` satisfies the `"action"` predicate. Known false-positive
    /// source; kept on purpose to match existing inbox data.
    pub fn matches<P>(&self, predicate_labels: &[P]) -> bool
    where
        P: AsRef<str>,
    {
        self.labels.iter().any(|label| {
            let lowered = label.to_lowercase();
            predicate_labels.iter().any(|predicate| {
                let predicate = predicate.as_ref().trim().to_lowercase();
                !predicate.is_empty() && lowered.contains(predicate.as_str())
            })
        })
    }

    /// Shorthand for the task predicate used by bucketing.
    pub fn is_task(&self) -> bool {
        self.matches(&TASK_PREDICATE_LABELS)
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Labels in display order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// First label, used as a topic hint by recommendations.
    pub fn first(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for TagSet {
    fn from(value: Vec<String>) -> Self {
        Self::from_labels(value)
    }
}

impl From<TagSet> for Vec<String> {
    fn from(value: TagSet) -> Self {
        value.labels
    }
}

impl<'a> FromIterator<&'a str> for TagSet {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        Self::from_labels(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::TagSet;

    #[test]
    fn from_labels_trims_and_collapses_case_duplicates() {
        let tags = TagSet::from_labels(["Medical", " medical ", "", "Research", "MEDICAL"]);
        assert_eq!(tags.labels(), &["Medical".to_string(), "Research".to_string()]);
    }

    #[test]
    fn has_is_case_insensitive_exact_match() {
        let tags = TagSet::from_labels(["Medical"]);
        assert!(tags.has("medical"));
        assert!(tags.has(" MEDICAL "));
        assert!(!tags.has("med"));
    }

    #[test]
    fn matches_uses_substring_containment() {
        let tags = TagSet::from_labels(["Actionable Task"]);
        assert!(tags.is_task());

        let knowledge = TagSet::from_labels(["Knowledge Grain", "Medical"]);
        assert!(!knowledge.is_task());
    }

    #[test]
    fn empty_set_never_matches() {
        assert!(!TagSet::new().is_task());
        assert!(!TagSet::from_labels(["x"]).matches::<&str>(&[]));
    }

    #[test]
    fn with_label_puts_new_label_first_and_keeps_existing() {
        let tags = TagSet::from_labels(["Medical"]).with_label("action");
        assert_eq!(tags.labels(), &["action".to_string(), "Medical".to_string()]);

        let already = TagSet::from_labels(["Medical", "Action"]).with_label("action");
        assert_eq!(already.len(), 2);
        assert!(already.has("action"));
    }
}
