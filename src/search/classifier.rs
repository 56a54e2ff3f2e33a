//! Question classification

use serde::{Deserialize, Serialize};

/// Keywords that mark a question as asking for images
pub const IMAGE_QUERY_KEYWORDS: [&str; 6] =
    ["image", "picture", "photo", "show me", "display", "visual"];

/// Which answer path a question takes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    Text,
    Image,
}

/// Decides which path answers a question
pub trait QueryClassifier: Send + Sync {
    fn classify(&self, question: &str) -> QueryKind;
}

/// Substring match of a fixed keyword list against the lowercased question
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    keywords: Vec<String>,
}

impl KeywordClassifier {
    /// Classifier using [`IMAGE_QUERY_KEYWORDS`]
    pub fn new() -> Self {
        Self::with_keywords(IMAGE_QUERY_KEYWORDS)
    }

    /// Classifier using a custom keyword list
    pub fn with_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .collect(),
        }
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryClassifier for KeywordClassifier {
    fn classify(&self, question: &str) -> QueryKind {
        let question = question.to_lowercase();
        if self.keywords.iter().any(|k| question.contains(k.as_str())) {
            QueryKind::Image
        } else {
            QueryKind::Text
        }
    }
}
