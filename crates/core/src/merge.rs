//! Reconciles a persisted (possibly stale or corrupt) progress blob with the
//! current catalog when a learner session starts.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::ContentCatalog;
use crate::model::{ExerciseState, ProgressDocument, SkillRecord, TopicKey, TopicProgress};
use crate::policy::{INITIAL_CONTENT_VERSION, INITIAL_LEVEL};
use crate::schema::default_document;

/// How a load was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing was stored for this learner.
    Fresh,
    /// Stored bytes did not parse; canonical defaults were used.
    Corrupt { reason: String },
    /// Stored progress was merged onto the canonical defaults.
    Merged {
        /// Stored topics the current catalog no longer lists. They are kept as-is.
        orphaned: Vec<TopicKey>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    pub document: ProgressDocument,
    pub outcome: LoadOutcome,
}

/// Persisted topic as found on disk; any field may be missing in older blobs.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTopic {
    unlocked_level: Option<u32>,
    high_scores: Option<BTreeMap<u32, u32>>,
    skill_history: Option<Vec<SkillRecord>>,
    used_questions: Option<BTreeMap<u32, BTreeSet<u32>>>,
    content_version: Option<u32>,
    interactive_exercise_state: Option<BTreeMap<u32, ExerciseState>>,
}

impl StoredTopic {
    /// Field-by-field merge onto `base`. High scores are unioned with stored
    /// values winning; every other field is taken wholesale when present.
    fn merge_onto(self, mut base: TopicProgress) -> TopicProgress {
        if let Some(level) = self.unlocked_level {
            base.unlocked_level = level.max(INITIAL_LEVEL);
        }
        if let Some(version) = self.content_version {
            base.content_version = version.max(INITIAL_CONTENT_VERSION);
        }
        if let Some(scores) = self.high_scores {
            base.high_scores.extend(scores);
        }
        if let Some(history) = self.skill_history {
            base.skill_history = history;
        }
        if let Some(used) = self.used_questions {
            base.used_questions = used;
        }
        if let Some(state) = self.interactive_exercise_state {
            base.interactive_exercise_state = state;
        }
        base
    }
}

/// Build the session document from whatever the durable store returned.
///
/// Never fails: absent or unparseable input yields the canonical defaults.
#[must_use]
pub fn load_document(catalog: &ContentCatalog, stored: Option<&str>) -> LoadedDocument {
    let defaults = default_document(catalog);

    let Some(raw) = stored else {
        return LoadedDocument {
            document: defaults,
            outcome: LoadOutcome::Fresh,
        };
    };

    let parsed: BTreeMap<TopicKey, StoredTopic> = match serde_json::from_str(raw) {
        Ok(parsed) => parsed,
        Err(err) => {
            return LoadedDocument {
                document: defaults,
                outcome: LoadOutcome::Corrupt {
                    reason: err.to_string(),
                },
            };
        }
    };

    merge_stored(defaults, parsed)
}

fn merge_stored(
    defaults: ProgressDocument,
    mut stored: BTreeMap<TopicKey, StoredTopic>,
) -> LoadedDocument {
    let mut document = ProgressDocument::new();

    for (key, base) in defaults.topics() {
        let merged = match stored.remove(key) {
            Some(topic) => topic.merge_onto(base.clone()),
            None => base.clone(),
        };
        document.insert(key.clone(), merged);
    }

    // Anything left over belongs to content no longer in the catalog.
    let mut orphaned = Vec::with_capacity(stored.len());
    for (key, topic) in stored {
        document.insert(key.clone(), topic.merge_onto(TopicProgress::default()));
        orphaned.push(key);
    }

    LoadedDocument {
        document,
        outcome: LoadOutcome::Merged { orphaned },
    }
}
