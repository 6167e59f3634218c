use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;

use crate::model::ids::TopicKey;
use crate::model::topic::TopicProgress;

/// Every topic a learner has progress for, keyed by topic.
///
/// Serializes as a plain JSON object of topic key to topic progress; this is
/// the blob written to the durable store for each learner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressDocument {
    topics: BTreeMap<TopicKey, TopicProgress>,
}

impl ProgressDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn topic(&self, key: &str) -> Option<&TopicProgress> {
        self.topics.get(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.topics.contains_key(key)
    }

    pub fn topics(&self) -> btree_map::Iter<'_, TopicKey, TopicProgress> {
        self.topics.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &TopicKey> {
        self.topics.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Serialize the whole document for the durable store.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if a stored exercise payload cannot be encoded.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Pretty-printed form, for inspection tools.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if a stored exercise payload cannot be encoded.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub(crate) fn insert(&mut self, key: TopicKey, progress: TopicProgress) {
        self.topics.insert(key, progress);
    }

    pub(crate) fn topic_mut(&mut self, key: &str) -> Option<&mut TopicProgress> {
        self.topics.get_mut(key)
    }

    pub(crate) fn topics_mut(&mut self) -> btree_map::IterMut<'_, TopicKey, TopicProgress> {
        self.topics.iter_mut()
    }
}

impl FromIterator<(TopicKey, TopicProgress)> for ProgressDocument {
    fn from_iter<I: IntoIterator<Item = (TopicKey, TopicProgress)>>(iter: I) -> Self {
        Self {
            topics: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ProgressDocument {
    type Item = (&'a TopicKey, &'a TopicProgress);
    type IntoIter = btree_map::Iter<'a, TopicKey, TopicProgress>;

    fn into_iter(self) -> Self::IntoIter {
        self.topics.iter()
    }
}
