use thiserror::Error;

/// Fraction of a quiz that must be answered correctly to unlock the next level.
pub const UNLOCK_THRESHOLD: f64 = 0.8;

/// Levels gained per qualifying pass or manual advance. Progression is strictly sequential.
pub const UNLOCK_STEP: u32 = 1;

/// Level every topic starts at and returns to on reset.
pub const INITIAL_LEVEL: u32 = 1;

/// Content version of a topic that has never had its question set revised.
pub const INITIAL_CONTENT_VERSION: u32 = 1;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum UnlockPolicyError {
    #[error("unlock threshold must be in (0, 1], got {provided}")]
    InvalidThreshold { provided: f64 },
}

/// Score rule that decides when a practice pass unlocks the next level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnlockPolicy {
    threshold: f64,
}

impl UnlockPolicy {
    /// Build a policy with a custom pass threshold.
    ///
    /// # Errors
    ///
    /// Returns `UnlockPolicyError::InvalidThreshold` unless `0 < threshold <= 1`.
    pub fn new(threshold: f64) -> Result<Self, UnlockPolicyError> {
        if !threshold.is_finite() || threshold <= 0.0 || threshold > 1.0 {
            return Err(UnlockPolicyError::InvalidThreshold {
                provided: threshold,
            });
        }
        Ok(Self { threshold })
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Whether `score` out of `total` clears the threshold. An empty quiz never passes.
    #[must_use]
    pub fn passes(&self, score: u32, total: u32) -> bool {
        if total == 0 {
            return false;
        }
        f64::from(score) / f64::from(total) >= self.threshold
    }
}

impl Default for UnlockPolicy {
    fn default() -> Self {
        Self {
            threshold: UNLOCK_THRESHOLD,
        }
    }
}
