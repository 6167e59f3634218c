use async_trait::async_trait;
use chrono::Utc;
use mastery_core::model::LearnerId;
use sqlx::Row;

use super::SqliteRepository;
use crate::repository::{ProgressRepository, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn load_progress(&self, learner: &LearnerId) -> Result<Option<String>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT document
                FROM learner_progress
                WHERE learner_id = ?1
            ",
        )
        .bind(learner.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.map(|row| row.try_get::<String, _>("document").map_err(ser))
            .transpose()
    }

    async fn save_progress(
        &self,
        learner: &LearnerId,
        document: &str,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO learner_progress (learner_id, document, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(learner_id) DO UPDATE SET
                    document = excluded.document,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(learner.as_str())
        .bind(document)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn list_learners(&self) -> Result<Vec<LearnerId>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT learner_id
                FROM learner_progress
                ORDER BY learner_id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter()
            .map(|row| {
                let raw: String = row.try_get("learner_id").map_err(ser)?;
                LearnerId::new(raw).map_err(ser)
            })
            .collect()
    }
}
