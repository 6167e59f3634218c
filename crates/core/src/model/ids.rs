use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LearnerIdError {
    #[error("learner id cannot be empty")]
    Empty,
}

/// Identity of a learner; one persisted progress slot exists per identity.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LearnerId(String);

impl LearnerId {
    /// Creates a new `LearnerId` from a trimmed, non-empty name.
    ///
    /// # Errors
    ///
    /// Returns `LearnerIdError::Empty` if the name is blank.
    pub fn new(raw: impl Into<String>) -> Result<Self, LearnerIdError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LearnerIdError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Key of a tracked topic: a quiz category, a lesson id or an exam pseudo-topic.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicKey(String);

impl TopicKey {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TopicKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TopicKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TopicKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for LearnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LearnerId({})", self.0)
    }
}

impl fmt::Debug for TopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TopicKey({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for LearnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for TopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

impl FromStr for LearnerId {
    type Err = LearnerIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl FromStr for TopicKey {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn learner_id_is_trimmed() {
        let id = LearnerId::new("  ana ").unwrap();
        assert_eq!(id.as_str(), "ana");
        assert_eq!(id.to_string(), "ana");
    }

    #[test]
    fn blank_learner_id_is_rejected() {
        assert_eq!(LearnerId::new("   "), Err(LearnerIdError::Empty));
        assert!("".parse::<LearnerId>().is_err());
    }

    #[test]
    fn topic_key_serializes_as_plain_string() {
        let key = TopicKey::new("numeros");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"numeros\"");
        assert_eq!(format!("{key:?}"), "TopicKey(numeros)");
    }
}
