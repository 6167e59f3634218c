//! Read-only projections of a progress document for dashboards.

use std::collections::BTreeSet;

use crate::catalog::ContentCatalog;
use crate::model::{ProgressDocument, SkillRecord};
use crate::policy::INITIAL_LEVEL;

/// Aggregated history of one topic.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicSummary {
    pub attempts: usize,
    pub best_score: Option<u32>,
    pub total_time: f64,
    /// Correct share over every recorded question result, if any were recorded.
    pub accuracy: Option<f64>,
}

/// Highest level the learner may attempt; unknown topics report the initial level.
#[must_use]
pub fn unlocked_level(doc: &ProgressDocument, topic: &str) -> u32 {
    doc.topic(topic).map_or(INITIAL_LEVEL, |t| t.unlocked_level)
}

#[must_use]
pub fn is_level_unlocked(doc: &ProgressDocument, topic: &str, level: u32) -> bool {
    level >= INITIAL_LEVEL && level <= unlocked_level(doc, topic)
}

#[must_use]
pub fn high_score(doc: &ProgressDocument, topic: &str, level: u32) -> Option<u32> {
    doc.topic(topic).and_then(|t| t.high_score(level))
}

/// Question indices already shown at `level`; empty when none are recorded.
#[must_use]
pub fn used_questions(doc: &ProgressDocument, topic: &str, level: u32) -> BTreeSet<u32> {
    doc.topic(topic)
        .and_then(|t| t.used_at(level))
        .cloned()
        .unwrap_or_default()
}

/// History entries earned under one content version of the topic.
#[must_use]
pub fn records_for_version<'a>(
    doc: &'a ProgressDocument,
    topic: &str,
    content_version: u32,
) -> Vec<&'a SkillRecord> {
    doc.topic(topic)
        .map(|t| {
            t.skill_history
                .iter()
                .filter(|r| r.content_version == content_version)
                .collect()
        })
        .unwrap_or_default()
}

/// Mastery of one topic in percent.
///
/// Multi-level topics measure how far the unlocked level has moved toward the
/// last level; single-level topics count as mastered once attempted.
#[must_use]
pub fn topic_mastery(doc: &ProgressDocument, catalog: &ContentCatalog, topic: &str) -> u8 {
    let (Some(progress), Some(levels)) = (doc.topic(topic), catalog.max_level(topic)) else {
        return 0;
    };

    if levels <= 1 {
        return if progress.skill_history.is_empty() { 0 } else { 100 };
    }

    let reached = progress.unlocked_level.clamp(INITIAL_LEVEL, levels) - INITIAL_LEVEL;
    let percent = u64::from(reached) * 100 / u64::from(levels - 1);
    u8::try_from(percent).unwrap_or(100)
}

/// Mean topic mastery over every catalog topic, in percent.
#[must_use]
pub fn overall_mastery(doc: &ProgressDocument, catalog: &ContentCatalog) -> u8 {
    if catalog.is_empty() {
        return 0;
    }
    let sum: usize = catalog
        .keys()
        .map(|key| usize::from(topic_mastery(doc, catalog, key.as_str())))
        .sum();
    u8::try_from(sum / catalog.len()).unwrap_or(100)
}

#[must_use]
pub fn topic_summary(doc: &ProgressDocument, topic: &str) -> TopicSummary {
    let history = doc.topic(topic).map_or(&[][..], |t| t.skill_history.as_slice());

    let results = history.iter().flat_map(|r| r.results.iter());
    let (answered, correct) = results.fold((0_usize, 0_usize), |(n, c), r| {
        (n + 1, c + usize::from(r.is_correct))
    });

    #[allow(clippy::cast_precision_loss)]
    let accuracy = (answered > 0).then(|| correct as f64 / answered as f64);

    TopicSummary {
        attempts: history.len(),
        best_score: history.iter().map(|r| r.score).max(),
        total_time: history.iter().map(|r| r.total_time).sum(),
        accuracy,
    }
}
