use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("invalid record type: {0}")]
    InvalidKind(String),
}

//
// ─── RECORD KIND ──────────────────────────────────────────────────────────────
//

/// What produced a skill record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Questions answered while working through a lesson.
    Lesson,
    /// A practice quiz for a category level.
    Practice,
    /// One of the fixed exams.
    Exam,
}

impl RecordKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Lesson => "lesson",
            RecordKind::Practice => "practice",
            RecordKind::Exam => "exam",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lesson" => Ok(Self::Lesson),
            "practice" => Ok(Self::Practice),
            "exam" => Ok(Self::Exam),
            other => Err(RecordError::InvalidKind(other.to_owned())),
        }
    }
}

//
// ─── QUESTION RESULT ──────────────────────────────────────────────────────────
//

/// Outcome of one question inside an attempt. Recorded as given; never validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    pub question: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    /// Seconds spent on the question.
    pub time_spent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hints_used: Option<u32>,
}

impl QuestionResult {
    #[must_use]
    pub fn new(
        question: impl Into<String>,
        user_answer: impl Into<String>,
        correct_answer: impl Into<String>,
        is_correct: bool,
        time_spent: f64,
    ) -> Self {
        Self {
            question: question.into(),
            user_answer: user_answer.into(),
            correct_answer: correct_answer.into(),
            is_correct,
            time_spent,
            hints_used: None,
        }
    }

    #[must_use]
    pub fn with_hints(mut self, hints_used: u32) -> Self {
        self.hints_used = Some(hints_used);
        self
    }
}

//
// ─── SKILL RECORD ─────────────────────────────────────────────────────────────
//

/// One entry of a topic's append-only attempt history.
///
/// `content_version` is the topic's content version at the moment the record
/// was appended, so attempts stay attributable to the question set they were
/// earned under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillRecord {
    pub score: u32,
    pub timestamp: DateTime<Utc>,
    pub level: u32,
    #[serde(rename = "type")]
    pub kind: RecordKind,
    pub content_version: u32,
    /// Seconds spent on the whole attempt.
    pub total_time: f64,
    #[serde(default)]
    pub results: Vec<QuestionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_id: Option<String>,
}

impl SkillRecord {
    /// Share of recorded questions answered correctly, if any were recorded.
    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        if self.results.is_empty() {
            return None;
        }
        let correct = self.results.iter().filter(|r| r.is_correct).count();
        #[allow(clippy::cast_precision_loss)]
        Some(correct as f64 / self.results.len() as f64)
    }
}

/// Caller-supplied part of a skill record; the engine adds the timestamp and
/// the content-version stamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSkillRecord {
    pub score: u32,
    pub level: u32,
    pub kind: RecordKind,
    pub total_time: f64,
    pub results: Vec<QuestionResult>,
    pub lesson_id: Option<String>,
}

impl NewSkillRecord {
    #[must_use]
    pub fn new(score: u32, level: u32, kind: RecordKind, total_time: f64) -> Self {
        Self {
            score,
            level,
            kind,
            total_time,
            results: Vec::new(),
            lesson_id: None,
        }
    }

    #[must_use]
    pub fn with_results(mut self, results: Vec<QuestionResult>) -> Self {
        self.results = results;
        self
    }

    #[must_use]
    pub fn with_lesson(mut self, lesson_id: impl Into<String>) -> Self {
        self.lesson_id = Some(lesson_id.into());
        self
    }

    #[must_use]
    pub fn stamp(self, timestamp: DateTime<Utc>, content_version: u32) -> SkillRecord {
        SkillRecord {
            score: self.score,
            timestamp,
            level: self.level,
            kind: self.kind,
            content_version,
            total_time: self.total_time,
            results: self.results,
            lesson_id: self.lesson_id,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
