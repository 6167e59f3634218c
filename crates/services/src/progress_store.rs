use std::sync::Arc;

use mastery_core::model::{ExerciseState, LearnerId, NewSkillRecord, ProgressDocument};
use mastery_core::{Clock, ContentCatalog, LoadOutcome, LoadedDocument, UnlockPolicy, load_document};
use storage::repository::ProgressRepository;
use tracing::{debug, info, warn};

use crate::persistence::PersistenceWriter;

/// The active learner's progress for one session.
///
/// Each operation swaps in a new document and, if anything changed, queues
/// the whole document for persistence without waiting on it. Nothing here
/// returns an error: a failed read starts from defaults and a failed write
/// only loses durability.
pub struct ProgressStore {
    learner: LearnerId,
    catalog: Arc<ContentCatalog>,
    policy: UnlockPolicy,
    clock: Clock,
    repo: Arc<dyn ProgressRepository>,
    writer: PersistenceWriter,
    document: ProgressDocument,
}

impl ProgressStore {
    /// Load `learner`'s progress and start a session for it.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub async fn open(
        learner: LearnerId,
        catalog: Arc<ContentCatalog>,
        repo: Arc<dyn ProgressRepository>,
        clock: Clock,
    ) -> Self {
        let document = load(repo.as_ref(), &catalog, &learner).await;
        let writer = PersistenceWriter::spawn(Arc::clone(&repo));
        Self {
            learner,
            catalog,
            policy: UnlockPolicy::default(),
            clock,
            repo,
            writer,
            document,
        }
    }

    /// Override the unlock rule (defaults to `UnlockPolicy::default()`).
    #[must_use]
    pub fn with_policy(mut self, policy: UnlockPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Make another learner the active one.
    ///
    /// Snapshots already queued for the previous learner still go to that
    /// learner's slot.
    pub async fn switch_learner(&mut self, learner: LearnerId) {
        if learner == self.learner {
            return;
        }
        self.document = load(self.repo.as_ref(), &self.catalog, &learner).await;
        self.learner = learner;
    }

    #[must_use]
    pub fn learner(&self) -> &LearnerId {
        &self.learner
    }

    #[must_use]
    pub fn document(&self) -> &ProgressDocument {
        &self.document
    }

    #[must_use]
    pub fn catalog(&self) -> &ContentCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn policy(&self) -> &UnlockPolicy {
        &self.policy
    }

    /// Wait for queued writes to be attempted.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    pub fn record_practice_result(
        &mut self,
        topic: &str,
        level: u32,
        score: u32,
        total: u32,
    ) -> &ProgressDocument {
        let next = self.document.record_practice_result(
            &self.catalog,
            &self.policy,
            topic,
            level,
            score,
            total,
        );
        self.apply("record_practice_result", topic, next)
    }

    pub fn add_skill_record(&mut self, topic: &str, record: NewSkillRecord) -> &ProgressDocument {
        let next = self
            .document
            .add_skill_record(topic, record, self.clock.now());
        self.apply("add_skill_record", topic, next)
    }

    pub fn record_used_questions(
        &mut self,
        topic: &str,
        level: u32,
        indices: impl IntoIterator<Item = u32>,
    ) -> &ProgressDocument {
        let next = self.document.record_used_questions(topic, level, indices);
        self.apply("record_used_questions", topic, next)
    }

    pub fn clear_used_questions(&mut self, topic: &str, level: u32) -> &ProgressDocument {
        let next = self.document.clear_used_questions(topic, level);
        self.apply("clear_used_questions", topic, next)
    }

    pub fn record_interactive_exercise_state(
        &mut self,
        lesson_id: &str,
        exercise_index: u32,
        state: ExerciseState,
    ) -> &ProgressDocument {
        let next = self
            .document
            .record_interactive_exercise_state(lesson_id, exercise_index, state);
        self.apply("record_interactive_exercise_state", lesson_id, next)
    }

    pub fn unlock_next_level(&mut self, topic: &str) -> &ProgressDocument {
        let next = self.document.unlock_next_level(&self.catalog, topic);
        self.apply("unlock_next_level", topic, next)
    }

    pub fn reset_progress_for_key(&mut self, topic: &str) -> &ProgressDocument {
        let next = self.document.reset_progress_for_key(topic);
        self.apply("reset_progress_for_key", topic, next)
    }

    pub fn reset_practice_category_progress(&mut self, topic: &str) -> &ProgressDocument {
        let next = self.document.reset_practice_category_progress(topic);
        if let Some(progress) = next.topic(topic) {
            info!(
                learner = %self.learner,
                topic,
                content_version = progress.content_version,
                "practice category reset"
            );
        }
        self.apply("reset_practice_category_progress", topic, next)
    }

    pub fn unlock_all_levels(&mut self) -> &ProgressDocument {
        let next = self.document.unlock_all_levels(&self.catalog);
        self.apply("unlock_all_levels", "*", next)
    }

    pub fn reset_all_progress(&mut self) -> &ProgressDocument {
        info!(learner = %self.learner, "resetting all progress");
        let next = self.document.reset_all_progress(&self.catalog);
        self.apply("reset_all_progress", "*", next)
    }

    fn apply(&mut self, op: &'static str, topic: &str, next: ProgressDocument) -> &ProgressDocument {
        if next == self.document {
            debug!(learner = %self.learner, op, topic, "no change; skipping write");
            return &self.document;
        }
        self.document = next;
        self.persist();
        &self.document
    }

    fn persist(&self) {
        match self.document.to_json() {
            Ok(json) => self.writer.enqueue(&self.learner, json),
            Err(err) => warn!(
                learner = %self.learner,
                error = %err,
                "progress could not be serialized; write skipped"
            ),
        }
    }
}

async fn load(
    repo: &dyn ProgressRepository,
    catalog: &ContentCatalog,
    learner: &LearnerId,
) -> ProgressDocument {
    let stored = match repo.load_progress(learner).await {
        Ok(stored) => stored,
        Err(err) => {
            warn!(learner = %learner, error = %err, "progress read failed; using defaults");
            None
        }
    };

    let LoadedDocument { document, outcome } = load_document(catalog, stored.as_deref());
    match &outcome {
        LoadOutcome::Fresh => info!(learner = %learner, "no stored progress; starting fresh"),
        LoadOutcome::Corrupt { reason } => warn!(
            learner = %learner,
            reason = %reason,
            "stored progress unreadable; using defaults"
        ),
        LoadOutcome::Merged { orphaned } => {
            info!(learner = %learner, topics = document.len(), "progress loaded");
            if !orphaned.is_empty() {
                // Orphans stay in the document and are persisted with it.
                info!(learner = %learner, ?orphaned, "keeping topics no longer in the catalog");
            }
        }
    }
    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use mastery_core::time::fixed_clock;
    use storage::repository::InMemoryRepository;

    fn catalog() -> Arc<ContentCatalog> {
        Arc::new(
            ContentCatalog::builder()
                .quiz_category("numeros", 3)
                .build()
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn no_op_mutation_does_not_write() {
        let repo = InMemoryRepository::new();
        let ana = LearnerId::new("ana").unwrap();
        let mut store =
            ProgressStore::open(ana.clone(), catalog(), Arc::new(repo.clone()), fixed_clock()).await;

        store.record_practice_result("unknown", 1, 9, 10);
        store.flush().await;
        assert_eq!(repo.load_progress(&ana).await.unwrap(), None);

        store.record_practice_result("numeros", 1, 9, 10);
        store.flush().await;
        assert!(repo.load_progress(&ana).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn custom_policy_changes_threshold() {
        let repo = InMemoryRepository::new();
        let ana = LearnerId::new("ana").unwrap();
        let mut store = ProgressStore::open(ana, catalog(), Arc::new(repo), fixed_clock())
            .await
            .with_policy(UnlockPolicy::new(1.0).unwrap());

        store.record_practice_result("numeros", 1, 9, 10);
        assert_eq!(store.document().topic("numeros").unwrap().unlocked_level, 1);
        store.record_practice_result("numeros", 1, 10, 10);
        assert_eq!(store.document().topic("numeros").unwrap().unlocked_level, 2);
    }
}
