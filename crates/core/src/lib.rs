#![forbid(unsafe_code)]

pub mod catalog;
pub mod merge;
pub mod model;
mod mutation;
pub mod policy;
pub mod schema;
pub mod time;
pub mod views;

pub use catalog::{CatalogError, ContentCatalog, TopicKind};
pub use merge::{LoadOutcome, LoadedDocument, load_document};
pub use policy::UnlockPolicy;
pub use schema::default_document;
pub use time::Clock;
