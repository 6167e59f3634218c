//! The progress mutation API.
//!
//! Every operation borrows the current document and returns the next one;
//! the input is never modified. Operations on topics the document does not
//! contain, and on level `0`, return an unchanged copy instead of failing.

use chrono::{DateTime, Utc};

use crate::catalog::ContentCatalog;
use crate::model::{ExerciseState, NewSkillRecord, ProgressDocument, TopicProgress};
use crate::policy::{INITIAL_LEVEL, UNLOCK_STEP, UnlockPolicy};
use crate::schema::default_document;

impl ProgressDocument {
    fn with_topic(&self, topic: &str, update: impl FnOnce(&mut TopicProgress)) -> Self {
        let mut next = self.clone();
        if let Some(progress) = next.topic_mut(topic) {
            update(progress);
        }
        next
    }

    /// Record a finished practice quiz: keep the best score per level and
    /// advance the unlocked level by one when the current level is passed.
    #[must_use]
    pub fn record_practice_result(
        &self,
        catalog: &ContentCatalog,
        policy: &UnlockPolicy,
        topic: &str,
        level: u32,
        score: u32,
        total: u32,
    ) -> Self {
        if level == 0 {
            return self.clone();
        }
        let max_level = catalog.max_level(topic);

        self.with_topic(topic, |progress| {
            // An absent high score counts as zero, so a zero score records nothing.
            if score > progress.high_score(level).unwrap_or(0) {
                progress.high_scores.insert(level, score);
            }

            let can_advance = max_level.is_some_and(|max| level < max);
            if policy.passes(score, total) && level == progress.unlocked_level && can_advance {
                progress.unlocked_level += UNLOCK_STEP;
            }
        })
    }

    /// Append an attempt to the topic's history, stamped with its current content version.
    #[must_use]
    pub fn add_skill_record(
        &self,
        topic: &str,
        record: NewSkillRecord,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        self.with_topic(topic, |progress| {
            let stamped = record.stamp(recorded_at, progress.content_version);
            progress.skill_history.push(stamped);
        })
    }

    /// Union `indices` into the set of questions already shown at `level`.
    #[must_use]
    pub fn record_used_questions(
        &self,
        topic: &str,
        level: u32,
        indices: impl IntoIterator<Item = u32>,
    ) -> Self {
        let mut indices = indices.into_iter().peekable();
        if level == 0 || indices.peek().is_none() {
            return self.clone();
        }
        self.with_topic(topic, |progress| {
            progress.used_questions.entry(level).or_default().extend(indices);
        })
    }

    /// Forget which questions were shown at `level`, so the pool can be recycled.
    #[must_use]
    pub fn clear_used_questions(&self, topic: &str, level: u32) -> Self {
        self.with_topic(topic, |progress| {
            progress.used_questions.remove(&level);
        })
    }

    /// Store the completion payload of one lesson exercise; last write wins.
    #[must_use]
    pub fn record_interactive_exercise_state(
        &self,
        lesson_id: &str,
        exercise_index: u32,
        state: ExerciseState,
    ) -> Self {
        self.with_topic(lesson_id, |progress| {
            progress
                .interactive_exercise_state
                .insert(exercise_index, state);
        })
    }

    /// Manual advance that bypasses the score rule, still capped at the topic's level count.
    #[must_use]
    pub fn unlock_next_level(&self, catalog: &ContentCatalog, topic: &str) -> Self {
        let Some(max_level) = catalog.max_level(topic) else {
            return self.clone();
        };
        self.with_topic(topic, |progress| {
            if progress.unlocked_level < max_level {
                progress.unlocked_level += UNLOCK_STEP;
            }
        })
    }

    /// Wipe one topic back to a fresh record, content version included.
    #[must_use]
    pub fn reset_progress_for_key(&self, topic: &str) -> Self {
        self.with_topic(topic, |progress| {
            *progress = TopicProgress::default();
        })
    }

    /// Start a topic over after its question set changed.
    ///
    /// Scores, used questions and the unlocked level reset; the history is kept
    /// and the content version moves on so new attempts are distinguishable.
    #[must_use]
    pub fn reset_practice_category_progress(&self, topic: &str) -> Self {
        self.with_topic(topic, |progress| {
            progress.high_scores.clear();
            progress.used_questions.clear();
            progress.unlocked_level = INITIAL_LEVEL;
            progress.content_version = progress.content_version.saturating_add(1);
        })
    }

    /// Open every level of every catalog topic.
    #[must_use]
    pub fn unlock_all_levels(&self, catalog: &ContentCatalog) -> Self {
        let mut next = self.clone();
        for (key, progress) in next.topics_mut() {
            if let Some(max_level) = catalog.max_level(key.as_str()) {
                progress.unlocked_level = max_level;
            }
        }
        next
    }

    /// Replace everything with the canonical defaults for `catalog`.
    #[must_use]
    pub fn reset_all_progress(&self, catalog: &ContentCatalog) -> Self {
        default_document(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::load_document;
    use crate::model::RecordKind;
    use crate::time::fixed_now;

    fn catalog() -> ContentCatalog {
        ContentCatalog::builder()
            .quiz_category("numeros", 3)
            .lesson("sumas", 1)
            .build()
            .unwrap()
    }

    fn fresh() -> ProgressDocument {
        default_document(&catalog())
    }

    fn practice(doc: &ProgressDocument, level: u32, score: u32, total: u32) -> ProgressDocument {
        doc.record_practice_result(&catalog(), &UnlockPolicy::default(), "numeros", level, score, total)
    }

    fn numeros(doc: &ProgressDocument) -> &TopicProgress {
        doc.topic("numeros").unwrap()
    }

    #[test]
    fn qualifying_pass_unlocks_next_level() {
        let doc = practice(&fresh(), 1, 9, 10);
        assert_eq!(numeros(&doc).high_score(1), Some(9));
        assert_eq!(numeros(&doc).unlocked_level, 2);
    }

    #[test]
    fn lower_score_keeps_best_and_level() {
        let doc = practice(&fresh(), 1, 9, 10);
        let doc = practice(&doc, 1, 6, 10);
        assert_eq!(numeros(&doc).high_score(1), Some(9));
        assert_eq!(numeros(&doc).unlocked_level, 2);
    }

    #[test]
    fn high_score_is_the_maximum_regardless_of_order() {
        for order in [[3, 9, 5], [9, 5, 3], [5, 3, 9]] {
            let mut doc = fresh();
            for score in order {
                doc = practice(&doc, 2, score, 10);
            }
            assert_eq!(numeros(&doc).high_score(2), Some(9));
        }
    }

    #[test]
    fn passing_a_later_level_does_not_skip_ahead() {
        let doc = practice(&fresh(), 3, 10, 10);
        let doc = practice(&doc, 2, 10, 10);
        assert_eq!(numeros(&doc).unlocked_level, 1);
        assert_eq!(numeros(&doc).high_score(3), Some(10));
    }

    #[test]
    fn unlock_stops_at_max_level() {
        let mut doc = fresh();
        for level in 1..=3 {
            doc = practice(&doc, level, 10, 10);
        }
        assert_eq!(numeros(&doc).unlocked_level, 3);
    }

    #[test]
    fn empty_quiz_never_unlocks() {
        let doc = practice(&fresh(), 1, 0, 0);
        assert_eq!(numeros(&doc).unlocked_level, 1);
    }

    #[test]
    fn unknown_topic_and_level_zero_are_no_ops() {
        let doc = fresh();
        let policy = UnlockPolicy::default();
        assert_eq!(doc.record_practice_result(&catalog(), &policy, "nope", 1, 9, 10), doc);
        assert_eq!(practice(&doc, 0, 9, 10), doc);
        assert_eq!(doc.record_used_questions("nope", 1, [1]), doc);
        assert_eq!(doc.reset_progress_for_key("nope"), doc);
    }

    #[test]
    fn input_document_is_never_mutated() {
        let before = fresh();
        let snapshot = before.clone();
        let _after = practice(&before, 1, 10, 10);
        assert_eq!(before, snapshot);
    }

    #[test]
    fn used_questions_accumulate_as_a_set() {
        let doc = fresh().record_used_questions("numeros", 1, [2, 5, 7]);
        let doc = doc.record_used_questions("numeros", 1, [5, 9]);
        let used: Vec<u32> = numeros(&doc).used_at(1).unwrap().iter().copied().collect();
        assert_eq!(used, vec![2, 5, 7, 9]);

        let again = doc.record_used_questions("numeros", 1, [5, 9]);
        assert_eq!(again, doc);
    }

    #[test]
    fn clear_used_questions_empties_one_level() {
        let doc = fresh()
            .record_used_questions("numeros", 1, [1, 2])
            .record_used_questions("numeros", 2, [3]);
        let doc = doc.clear_used_questions("numeros", 1);
        assert!(numeros(&doc).used_at(1).is_none());
        assert!(numeros(&doc).used_at(2).is_some());
    }

    #[test]
    fn skill_history_is_append_only() {
        let first = fresh().add_skill_record(
            "numeros",
            NewSkillRecord::new(7, 1, RecordKind::Practice, 30.0),
            fixed_now(),
        );
        let second = first.add_skill_record(
            "numeros",
            NewSkillRecord::new(7, 1, RecordKind::Practice, 30.0),
            fixed_now(),
        );
        assert_eq!(numeros(&first).skill_history.len(), 1);
        assert_eq!(numeros(&second).skill_history.len(), 2);
        assert_eq!(numeros(&second).skill_history[0], numeros(&first).skill_history[0]);
    }

    #[test]
    fn category_reset_bumps_version_and_keeps_history() {
        let mut doc = practice(&fresh(), 1, 9, 10).record_used_questions("numeros", 1, [1]);
        for _ in 0..3 {
            doc = doc.add_skill_record(
                "numeros",
                NewSkillRecord::new(9, 1, RecordKind::Practice, 20.0),
                fixed_now(),
            );
        }

        let doc = doc.reset_practice_category_progress("numeros");
        let topic = numeros(&doc);
        assert_eq!(topic.content_version, 2);
        assert_eq!(topic.skill_history.len(), 3);
        assert!(topic.high_scores.is_empty());
        assert!(topic.used_questions.is_empty());
        assert_eq!(topic.unlocked_level, 1);

        let doc = doc.add_skill_record(
            "numeros",
            NewSkillRecord::new(4, 1, RecordKind::Practice, 20.0),
            fixed_now(),
        );
        let versions: Vec<u32> = numeros(&doc)
            .skill_history
            .iter()
            .map(|r| r.content_version)
            .collect();
        assert_eq!(versions, vec![1, 1, 1, 2]);
    }

    #[test]
    fn zero_score_does_not_create_a_high_score() {
        let doc = practice(&fresh(), 1, 0, 10);
        assert_eq!(numeros(&doc).high_score(1), None);
        assert_eq!(doc, fresh());

        let doc = practice(&doc, 1, 3, 10);
        assert_eq!(numeros(&doc).high_score(1), Some(3));
    }

    #[test]
    fn category_reset_saturates_a_maximal_stored_version() {
        let stored = r#"{ "numeros": { "contentVersion": 4294967295, "highScores": { "1": 7 } } }"#;
        let doc = load_document(&catalog(), Some(stored)).document;

        let doc = doc.reset_practice_category_progress("numeros");
        let topic = numeros(&doc);
        assert_eq!(topic.content_version, u32::MAX);
        assert!(topic.high_scores.is_empty());
    }

    #[test]
    fn reset_for_key_restores_a_fresh_record() {
        let doc = practice(&fresh(), 1, 9, 10).reset_practice_category_progress("numeros");
        let doc = doc.reset_progress_for_key("numeros");
        assert_eq!(numeros(&doc), &TopicProgress::default());
    }

    #[test]
    fn exercise_state_last_write_wins_and_needs_existing_lesson() {
        let doc = fresh()
            .record_interactive_exercise_state("sumas", 0, serde_json::json!({"v": 1}).into())
            .record_interactive_exercise_state("sumas", 0, serde_json::json!({"v": 2}).into());
        let state = &doc.topic("sumas").unwrap().interactive_exercise_state[&0];
        assert_eq!(state.payload()["v"], 2);

        let untouched = doc.record_interactive_exercise_state("restas", 0, serde_json::json!(1).into());
        assert!(!untouched.contains("restas"));
    }

    #[test]
    fn manual_unlock_is_capped() {
        let catalog = catalog();
        let doc = fresh().unlock_next_level(&catalog, "numeros");
        assert_eq!(numeros(&doc).unlocked_level, 2);
        let doc = doc.unlock_next_level(&catalog, "numeros").unlock_next_level(&catalog, "numeros");
        assert_eq!(numeros(&doc).unlocked_level, 3);
        let single = doc.unlock_next_level(&catalog, "sumas");
        assert_eq!(single.topic("sumas").unwrap().unlocked_level, 1);
    }

    #[test]
    fn unlock_all_then_reset_all() {
        let catalog = catalog();
        let doc = fresh().unlock_all_levels(&catalog);
        assert_eq!(numeros(&doc).unlocked_level, 3);
        assert_eq!(doc.reset_all_progress(&catalog), fresh());
    }
}
