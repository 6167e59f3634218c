//! Read-only view of the curated content that progress is tracked against.

use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

use crate::model::TopicKey;

/// The fixed exam pseudo-topics every catalog carries.
pub const EXAM_TOPICS: [&str; 3] = ["exam_basic", "exam_intermediate", "exam_advanced"];

/// Level count of each exam pseudo-topic.
pub const EXAM_LEVELS: u32 = 1;

/// Level count assumed for a lesson when the catalog file does not say.
pub const DEFAULT_LESSON_LEVELS: u32 = 1;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("topic key cannot be empty")]
    EmptyKey,

    #[error("topic {key} must have at least one level")]
    NoLevels { key: String },

    #[error("duplicate topic key: {key}")]
    DuplicateKey { key: String },

    #[error("invalid catalog file: {0}")]
    Parse(#[from] serde_json::Error),
}

//
// ─── TOPICS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicKind {
    QuizCategory,
    Lesson,
    Exam,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogTopic {
    key: TopicKey,
    kind: TopicKind,
    levels: u32,
}

impl CatalogTopic {
    #[must_use]
    pub fn key(&self) -> &TopicKey {
        &self.key
    }

    #[must_use]
    pub fn kind(&self) -> TopicKind {
        self.kind
    }

    #[must_use]
    pub fn levels(&self) -> u32 {
        self.levels
    }
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

/// Topic keys and their level counts, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentCatalog {
    topics: Vec<CatalogTopic>,
}

impl ContentCatalog {
    #[must_use]
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// Parse a catalog description such as
    /// `{"quizCategories":[{"key":"numeros","levels":3}],"lessons":[{"key":"sumas"}]}`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Parse` for malformed JSON, or a validation error
    /// for empty keys, zero level counts and duplicates.
    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(raw)?;
        let mut builder = Self::builder();
        for entry in file.quiz_categories {
            builder = builder.quiz_category(entry.key, entry.levels.unwrap_or(1));
        }
        for entry in file.lessons {
            builder = builder.lesson(entry.key, entry.levels.unwrap_or(DEFAULT_LESSON_LEVELS));
        }
        builder.build()
    }

    pub fn topics(&self) -> impl Iterator<Item = &CatalogTopic> {
        self.topics.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &TopicKey> {
        self.topics.iter().map(CatalogTopic::key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CatalogTopic> {
        self.topics.iter().find(|t| t.key.as_str() == key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of levels available for a topic, if the catalog knows it.
    #[must_use]
    pub fn max_level(&self, key: &str) -> Option<u32> {
        self.get(key).map(CatalogTopic::levels)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct CatalogBuilder {
    entries: Vec<(String, TopicKind, u32)>,
}

impl CatalogBuilder {
    #[must_use]
    pub fn quiz_category(mut self, key: impl Into<String>, levels: u32) -> Self {
        self.entries.push((key.into(), TopicKind::QuizCategory, levels));
        self
    }

    #[must_use]
    pub fn lesson(mut self, key: impl Into<String>, levels: u32) -> Self {
        self.entries.push((key.into(), TopicKind::Lesson, levels));
        self
    }

    #[must_use]
    pub fn exam(mut self, key: impl Into<String>, levels: u32) -> Self {
        self.entries.push((key.into(), TopicKind::Exam, levels));
        self
    }

    /// Validate the entries and append any exam pseudo-topic not registered yet.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` for empty keys, zero level counts or duplicate keys.
    pub fn build(self) -> Result<ContentCatalog, CatalogError> {
        let mut entries: Vec<(String, TopicKind, u32)> = self
            .entries
            .into_iter()
            .map(|(key, kind, levels)| (key.trim().to_owned(), kind, levels))
            .collect();
        for exam in EXAM_TOPICS {
            if !entries.iter().any(|(key, _, _)| key == exam) {
                entries.push((exam.to_owned(), TopicKind::Exam, EXAM_LEVELS));
            }
        }

        let mut seen = HashSet::with_capacity(entries.len());
        let mut topics = Vec::with_capacity(entries.len());
        for (key, kind, levels) in entries {
            if key.is_empty() {
                return Err(CatalogError::EmptyKey);
            }
            if levels == 0 {
                return Err(CatalogError::NoLevels { key });
            }
            if !seen.insert(key.clone()) {
                return Err(CatalogError::DuplicateKey { key });
            }
            topics.push(CatalogTopic {
                key: TopicKey::new(key),
                kind,
                levels,
            });
        }

        Ok(ContentCatalog { topics })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogFile {
    #[serde(default)]
    quiz_categories: Vec<CatalogFileEntry>,
    #[serde(default)]
    lessons: Vec<CatalogFileEntry>,
}

#[derive(Deserialize)]
struct CatalogFileEntry {
    key: String,
    levels: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_appends_exam_pseudo_topics() {
        let catalog = ContentCatalog::builder()
            .quiz_category("numeros", 3)
            .lesson("sumas", 1)
            .build()
            .unwrap();

        assert_eq!(catalog.len(), 5);
        for exam in EXAM_TOPICS {
            let topic = catalog.get(exam).unwrap();
            assert_eq!(topic.kind(), TopicKind::Exam);
            assert_eq!(topic.levels(), EXAM_LEVELS);
        }
        assert_eq!(catalog.max_level("numeros"), Some(3));
        assert_eq!(catalog.max_level("missing"), None);
    }

    #[test]
    fn explicit_exam_overrides_default_level_count() {
        let catalog = ContentCatalog::builder()
            .exam("exam_basic", 4)
            .build()
            .unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.max_level("exam_basic"), Some(4));
    }

    #[test]
    fn padded_exam_key_still_overrides_the_default() {
        let catalog = ContentCatalog::builder()
            .exam(" exam_basic ", 2)
            .quiz_category("  numeros", 3)
            .build()
            .unwrap();
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.max_level("exam_basic"), Some(2));
        assert_eq!(catalog.max_level("numeros"), Some(3));
    }

    #[test]
    fn rejects_invalid_entries() {
        let err = ContentCatalog::builder().quiz_category(" ", 2).build().unwrap_err();
        assert!(matches!(err, CatalogError::EmptyKey));

        let err = ContentCatalog::builder().quiz_category("numeros", 0).build().unwrap_err();
        assert!(matches!(err, CatalogError::NoLevels { ref key } if key == "numeros"));

        let err = ContentCatalog::builder()
            .quiz_category("numeros", 2)
            .lesson("numeros", 1)
            .build()
            .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateKey { .. }));
    }

    #[test]
    fn parses_catalog_file() {
        let raw = r#"{
            "quizCategories": [{ "key": "numeros", "levels": 3 }, { "key": "formas", "levels": 2 }],
            "lessons": [{ "key": "sumas" }]
        }"#;
        let catalog = ContentCatalog::from_json_str(raw).unwrap();
        assert_eq!(catalog.max_level("formas"), Some(2));
        assert_eq!(catalog.get("sumas").unwrap().kind(), TopicKind::Lesson);
        assert_eq!(catalog.max_level("sumas"), Some(DEFAULT_LESSON_LEVELS));

        assert!(matches!(
            ContentCatalog::from_json_str("not json"),
            Err(CatalogError::Parse(_))
        ));
    }
}
