use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::model::record::SkillRecord;
use crate::policy::{INITIAL_CONTENT_VERSION, INITIAL_LEVEL};

/// Completion payload of one interactive exercise inside a lesson.
///
/// Opaque to the engine: stored and returned exactly as the caller gave it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExerciseState(serde_json::Value);

impl ExerciseState {
    #[must_use]
    pub fn new(payload: serde_json::Value) -> Self {
        Self(payload)
    }

    #[must_use]
    pub fn payload(&self) -> &serde_json::Value {
        &self.0
    }

    #[must_use]
    pub fn into_payload(self) -> serde_json::Value {
        self.0
    }
}

impl From<serde_json::Value> for ExerciseState {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// Progress of one learner on one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicProgress {
    pub unlocked_level: u32,
    pub high_scores: BTreeMap<u32, u32>,
    pub skill_history: Vec<SkillRecord>,
    pub used_questions: BTreeMap<u32, BTreeSet<u32>>,
    pub content_version: u32,
    pub interactive_exercise_state: BTreeMap<u32, ExerciseState>,
}

impl TopicProgress {
    #[must_use]
    pub fn high_score(&self, level: u32) -> Option<u32> {
        self.high_scores.get(&level).copied()
    }

    #[must_use]
    pub fn used_at(&self, level: u32) -> Option<&BTreeSet<u32>> {
        self.used_questions.get(&level)
    }
}

impl Default for TopicProgress {
    fn default() -> Self {
        Self {
            unlocked_level: INITIAL_LEVEL,
            high_scores: BTreeMap::new(),
            skill_history: Vec::new(),
            used_questions: BTreeMap::new(),
            content_version: INITIAL_CONTENT_VERSION,
            interactive_exercise_state: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_topic_starts_at_level_one_version_one() {
        let topic = TopicProgress::default();
        assert_eq!(topic.unlocked_level, 1);
        assert_eq!(topic.content_version, 1);
        assert!(topic.high_scores.is_empty());
        assert!(topic.skill_history.is_empty());
        assert!(topic.used_questions.is_empty());
        assert!(topic.interactive_exercise_state.is_empty());
    }

    #[test]
    fn exercise_state_round_trips_untouched() {
        let payload = serde_json::json!({ "answers": [1, 2], "done": true });
        let state = ExerciseState::new(payload.clone());
        let text = serde_json::to_string(&state).unwrap();
        let back: ExerciseState = serde_json::from_str(&text).unwrap();
        assert_eq!(back.into_payload(), payload);
    }

    #[test]
    fn level_maps_serialize_with_string_keys() {
        let mut topic = TopicProgress::default();
        topic.high_scores.insert(2, 7);
        topic.used_questions.insert(2, [4, 1].into_iter().collect());

        let json = serde_json::to_value(&topic).unwrap();
        assert_eq!(json["highScores"]["2"], 7);
        assert_eq!(json["usedQuestions"]["2"], serde_json::json!([1, 4]));
        assert_eq!(json["unlockedLevel"], 1);
    }
}
