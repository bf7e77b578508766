//! Documents fed to the relevance scorer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A piece of content that can be ranked as related to another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub published_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>, published_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            published_at,
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Both documents carry a category and it is the same
    pub fn same_category(&self, other: &Document) -> bool {
        matches!((&self.category, &other.category), (Some(a), Some(b)) if a == b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_category_requires_both() {
        let now = Utc::now();
        let yoga = Document::new("a", "", now).with_category("yoga");
        let also_yoga = Document::new("b", "", now).with_category("yoga");
        let uncategorised = Document::new("c", "", now);

        assert!(yoga.same_category(&also_yoga));
        assert!(!yoga.same_category(&uncategorised));
        assert!(!uncategorised.same_category(&Document::new("d", "", now)));
    }

    #[test]
    fn test_deserialize_without_category() {
        let json = r#"{"id":"p1","text":"Corso di pilates","published_at":"2026-01-10T08:00:00Z"}"#;
        let document: Document = serde_json::from_str(json).unwrap();

        assert_eq!(document.id, "p1");
        assert!(document.category.is_none());
    }
}
