//! Shared error types for the services crate.

use thiserror::Error;

use mastery_core::catalog::CatalogError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted while bootstrapping services or querying storage directly.
///
/// Progress mutations never return errors; see `ProgressStore`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServiceError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("cannot read catalog file {path}: {source}")]
    CatalogFile {
        path: String,
        source: std::io::Error,
    },
}
