//! Conversion suggestions and next steps for derived tasks.
//!
//! Pure helpers for presentation layers. The engine never rewrites derived
//! content with these strings.

use crate::model::item::Item;

const SUMMARY_PREVIEW_CHARS: usize = 30;
const FALLBACK_TOPIC: &str = "this topic";

const TWEET_STEPS: &[&str] = &[
    "Outline the main hook.",
    "Draft 3-5 tweets.",
    "Add hashtags (#SDA #Medical).",
];
const BLOG_STEPS: &[&str] = &[
    "Define the target audience.",
    "Create an outline (Intro, Body, Conclusion).",
    "Find relevant scripture or medical papers.",
];
const GENERIC_STEPS: &[&str] = &[
    "Review the source material.",
    "Define success criteria.",
    "Schedule execution time.",
];

/// Candidate `derived_content` values offered when converting `item`.
pub fn conversion_suggestions(item: &Item) -> Vec<String> {
    let preview: String = item
        .summary
        .as_deref()
        .unwrap_or(FALLBACK_TOPIC)
        .chars()
        .take(SUMMARY_PREVIEW_CHARS)
        .collect();
    let topic = item.tags.first().unwrap_or(FALLBACK_TOPIC);

    vec![
        format!("Draft a Tweet Thread about: {preview}..."),
        format!("Write a Blog Post: \"Reflections on {topic}...\""),
        "Create Task: Follow up on this research".to_string(),
    ]
}

/// Suggested next steps for a derived task, keyed on its content.
pub fn next_steps(content: &str) -> &'static [&'static str] {
    if content.contains("Tweet") {
        TWEET_STEPS
    } else if content.contains("Blog") {
        BLOG_STEPS
    } else {
        GENERIC_STEPS
    }
}
