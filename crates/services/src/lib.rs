#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod persistence;
pub mod progress_store;

pub use mastery_core::Clock;

pub use app_services::AppServices;
pub use error::ServiceError;
pub use persistence::PersistenceWriter;
pub use progress_store::ProgressStore;
