use crate::catalog::ContentCatalog;
use crate::model::{ProgressDocument, TopicProgress};

/// Canonical empty progress for a learner: one fresh record per catalog topic.
///
/// Deterministic for a fixed catalog; it is the fallback on every failure path.
#[must_use]
pub fn default_document(catalog: &ContentCatalog) -> ProgressDocument {
    catalog
        .keys()
        .map(|key| (key.clone(), TopicProgress::default()))
        .collect()
}
