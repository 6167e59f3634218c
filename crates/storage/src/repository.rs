use async_trait::async_trait;
use mastery_core::model::LearnerId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Durable slot holding one serialized progress document per learner.
///
/// Adapters store the blob verbatim; parsing and reconciliation happen in the
/// core crate so a corrupt blob never surfaces as a storage error.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the stored document for a learner.
    ///
    /// Returns `Ok(None)` when the learner has never been saved.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the medium cannot be read.
    async fn load_progress(&self, learner: &LearnerId) -> Result<Option<String>, StorageError>;

    /// Replace the stored document for a learner in one write.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the medium cannot be written.
    async fn save_progress(&self, learner: &LearnerId, document: &str)
    -> Result<(), StorageError>;

    /// Learners that have a stored document, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the medium cannot be read.
    async fn list_learners(&self) -> Result<Vec<LearnerId>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    documents: Arc<Mutex<HashMap<LearnerId, String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            documents: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Place raw bytes in a learner's slot, bypassing serialization.
    ///
    /// Useful for simulating legacy or corrupt stored documents.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn put_raw(&self, learner: &LearnerId, raw: impl Into<String>) -> Result<(), StorageError> {
        let mut guard = self
            .documents
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(learner.clone(), raw.into());
        Ok(())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn load_progress(&self, learner: &LearnerId) -> Result<Option<String>, StorageError> {
        let guard = self
            .documents
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(learner).cloned())
    }

    async fn save_progress(
        &self,
        learner: &LearnerId,
        document: &str,
    ) -> Result<(), StorageError> {
        self.put_raw(learner, document)
    }

    async fn list_learners(&self) -> Result<Vec<LearnerId>, StorageError> {
        let guard = self
            .documents
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut learners: Vec<LearnerId> = guard.keys().cloned().collect();
        learners.sort();
        Ok(learners)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let progress: Arc<dyn ProgressRepository> = Arc::new(InMemoryRepository::new());
        Self { progress }
    }
}
