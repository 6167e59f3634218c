use std::path::Path;
use std::sync::Arc;

use mastery_core::model::LearnerId;
use mastery_core::{ContentCatalog, UnlockPolicy};
use storage::repository::{ProgressRepository, Storage};

use crate::Clock;
use crate::error::ServiceError;
use crate::progress_store::ProgressStore;

/// Assembles storage, catalog and policy, and opens learner sessions on them.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    catalog: Arc<ContentCatalog>,
    policy: UnlockPolicy,
    clock: Clock,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Sqlite` if the database cannot be opened or migrated.
    pub async fn new_sqlite(
        db_url: &str,
        catalog: ContentCatalog,
        clock: Clock,
    ) -> Result<Self, ServiceError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::with_storage(storage, catalog, clock))
    }

    /// Read and validate a catalog file (`{"quizCategories": [...], "lessons": [...]}`).
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::CatalogFile` if the file cannot be read and
    /// `ServiceError::Catalog` if its contents are not a valid catalog.
    pub fn read_catalog(path: impl AsRef<Path>) -> Result<ContentCatalog, ServiceError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ServiceError::CatalogFile {
            path: path.display().to_string(),
            source,
        })?;
        Ok(ContentCatalog::from_json_str(&raw)?)
    }

    #[must_use]
    pub fn in_memory(catalog: ContentCatalog, clock: Clock) -> Self {
        Self::with_storage(Storage::in_memory(), catalog, clock)
    }

    #[must_use]
    pub fn with_storage(storage: Storage, catalog: ContentCatalog, clock: Clock) -> Self {
        Self {
            storage,
            catalog: Arc::new(catalog),
            policy: UnlockPolicy::default(),
            clock,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: UnlockPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<ContentCatalog> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Start a progress session for `learner`.
    pub async fn open_learner(&self, learner: LearnerId) -> ProgressStore {
        ProgressStore::open(
            learner,
            Arc::clone(&self.catalog),
            Arc::clone(&self.storage.progress),
            self.clock,
        )
        .await
        .with_policy(self.policy)
    }

    /// Learners with stored progress.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if the store cannot be read.
    pub async fn learners(&self) -> Result<Vec<LearnerId>, ServiceError> {
        Ok(self.storage.progress.list_learners().await?)
    }
}
