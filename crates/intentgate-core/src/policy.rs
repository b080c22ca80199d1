//! Threshold policy: maps a [`Judgment`] to a [`Decision`].
//!
//! Rules, in order:
//! 1. misaligned with at least one discrepancy -> `Block` (critical override)
//! 2. `score < block_below` -> `Block`
//! 3. `score < warn_below` -> `Warn`
//! 4. otherwise -> `Pass`
//!
//! Pure; no I/O.

use serde::{Deserialize, Serialize};

use crate::domain::decision::Decision;
use crate::domain::error::{IntentError, Result};
use crate::domain::judgment::{Judgment, MAX_SCORE};

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Score thresholds. Loaded once at pipeline start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Scores strictly below this block.
    pub block_below: u8,
    /// Scores strictly below this (and not blocked) warn.
    pub warn_below: u8,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            block_below: 3,
            warn_below: 5,
        }
    }
}

impl ThresholdConfig {
    pub fn new(block_below: u8, warn_below: u8) -> Result<Self> {
        let config = Self {
            block_below,
            warn_below,
        };
        config.validate()?;
        Ok(config)
    }

    /// `block_below <= warn_below <= MAX_SCORE + 1`.
    pub fn validate(&self) -> Result<()> {
        if self.block_below > self.warn_below {
            return Err(IntentError::InvalidConfig(format!(
                "block_below ({}) must not exceed warn_below ({})",
                self.block_below, self.warn_below
            )));
        }
        if self.warn_below > MAX_SCORE + 1 {
            return Err(IntentError::InvalidConfig(format!(
                "warn_below ({}) must be at most {}",
                self.warn_below,
                MAX_SCORE + 1
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Decide pass / warn / block for a judgment.
pub fn decide(judgment: &Judgment, config: &ThresholdConfig) -> Decision {
    decide_with_reason(judgment, config).0
}

/// Like [`decide`], with a human-readable reason.
pub fn decide_with_reason(judgment: &Judgment, config: &ThresholdConfig) -> (Decision, String) {
    let score = judgment.score;

    if judgment.is_critical() {
        return (
            Decision::Block,
            format!(
                "critical issue: judged misaligned with {} discrepancy(ies) at score {}/{}",
                judgment.discrepancies.len(),
                score,
                MAX_SCORE
            ),
        );
    }

    if score < config.block_below {
        (
            Decision::Block,
            format!(
                "score {}/{} is below the block threshold {}",
                score, MAX_SCORE, config.block_below
            ),
        )
    } else if score < config.warn_below {
        (
            Decision::Warn,
            format!(
                "score {}/{} is below the warn threshold {}",
                score, MAX_SCORE, config.warn_below
            ),
        )
    } else {
        (
            Decision::Pass,
            format!("score {}/{} meets the warn threshold {}", score, MAX_SCORE, config.warn_below),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::judgment::AlignmentStatus;

    fn judgment(score: u8, status: AlignmentStatus) -> Judgment {
        Judgment::new(score, 0.8, status)
    }

    #[test]
    fn test_default_thresholds() {
        let cfg = ThresholdConfig::default();
        assert_eq!(cfg.block_below, 3);
        assert_eq!(cfg.warn_below, 5);
    }

    #[test]
    fn test_score_bands_with_defaults() {
        let cfg = ThresholdConfig::default();
        assert_eq!(decide(&judgment(2, AlignmentStatus::Misaligned), &cfg), Decision::Block);
        assert_eq!(
            decide(&judgment(4, AlignmentStatus::PartiallyAligned), &cfg),
            Decision::Warn
        );
        assert_eq!(decide(&judgment(7, AlignmentStatus::Aligned), &cfg), Decision::Pass);
    }

    #[test]
    fn test_band_edges() {
        let cfg = ThresholdConfig::default();
        assert_eq!(decide(&judgment(3, AlignmentStatus::PartiallyAligned), &cfg), Decision::Warn);
        assert_eq!(decide(&judgment(5, AlignmentStatus::PartiallyAligned), &cfg), Decision::Pass);
        assert_eq!(decide(&judgment(0, AlignmentStatus::Aligned), &cfg), Decision::Block);
        assert_eq!(decide(&judgment(10, AlignmentStatus::Aligned), &cfg), Decision::Pass);
    }

    #[test]
    fn test_critical_override_blocks_borderline_score() {
        let cfg = ThresholdConfig::default();
        let j = judgment(6, AlignmentStatus::Misaligned).with_discrepancy("rewrote database layer");
        let (decision, reason) = decide_with_reason(&j, &cfg);
        assert_eq!(decision, Decision::Block);
        assert!(reason.contains("critical"));
    }

    #[test]
    fn test_misaligned_without_discrepancies_uses_score() {
        let cfg = ThresholdConfig::default();
        assert_eq!(decide(&judgment(6, AlignmentStatus::Misaligned), &cfg), Decision::Pass);
    }

    #[test]
    fn test_decide_is_deterministic() {
        let cfg = ThresholdConfig::default();
        let j = judgment(4, AlignmentStatus::PartiallyAligned).with_discrepancy("extra file");
        let first = decide(&j, &cfg);
        for _ in 0..10 {
            assert_eq!(decide(&j, &cfg), first);
        }
    }

    #[test]
    fn test_custom_thresholds() {
        let cfg = ThresholdConfig::new(5, 8).unwrap();
        assert_eq!(decide(&judgment(4, AlignmentStatus::Aligned), &cfg), Decision::Block);
        assert_eq!(decide(&judgment(7, AlignmentStatus::Aligned), &cfg), Decision::Warn);
        assert_eq!(decide(&judgment(8, AlignmentStatus::Aligned), &cfg), Decision::Pass);
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        assert!(ThresholdConfig::new(6, 5).is_err());
        assert!(ThresholdConfig::new(3, 12).is_err());
        assert!(ThresholdConfig::new(11, 11).is_ok());
    }

    #[test]
    fn test_threshold_config_serde_defaults() {
        let cfg: ThresholdConfig = serde_json::from_str(r#"{"warn_below": 6}"#).unwrap();
        assert_eq!(cfg.block_below, 3);
        assert_eq!(cfg.warn_below, 6);
    }
}
