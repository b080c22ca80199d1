//! Alignment judgments for a (story, changeset) pair.

use serde::{Deserialize, Serialize};

use super::changeset::ChangeSet;
use super::story::Story;

/// Highest valid alignment score.
pub const MAX_SCORE: u8 = 10;

/// The judge's categorical verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentStatus {
    Aligned,
    PartiallyAligned,
    Misaligned,
}

impl AlignmentStatus {
    /// Parse the wire value (`aligned`, `partially_aligned`, `misaligned`).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "aligned" => Some(AlignmentStatus::Aligned),
            "partially_aligned" => Some(AlignmentStatus::PartiallyAligned),
            "misaligned" => Some(AlignmentStatus::Misaligned),
            _ => None,
        }
    }
}

impl std::fmt::Display for AlignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AlignmentStatus::Aligned => "aligned",
            AlignmentStatus::PartiallyAligned => "partially_aligned",
            AlignmentStatus::Misaligned => "misaligned",
        };
        f.write_str(s)
    }
}

/// Risk level the judge attaches to a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Some(RiskLevel::Low),
            "medium" => Some(RiskLevel::Medium),
            "high" => Some(RiskLevel::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        };
        f.write_str(s)
    }
}

/// Where a judgment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgmentSource {
    /// Produced by the external AI judge.
    Ai,
    /// Produced by the title-keyword heuristic when AI judging is disabled.
    Heuristic,
}

/// A validated alignment judgment.
///
/// Only constructed from a fully validated judge response or by the
/// heuristic scorer; there is no partially-filled form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Judgment {
    /// Integer score in `0..=10`.
    pub score: u8,
    /// Confidence in `0.0..=1.0`.
    pub confidence: f64,
    pub status: AlignmentStatus,
    pub key_functionality_present: bool,
    pub matches: Vec<String>,
    pub discrepancies: Vec<String>,
    pub suggestions: Vec<String>,
    pub intent_summary: Option<String>,
    pub actual_changes: Option<String>,
    pub risk_level: Option<RiskLevel>,
    pub needs_human_review: bool,
    pub source: JudgmentSource,
}

impl Judgment {
    /// Create a judgment with empty lists. `score` is capped at [`MAX_SCORE`]
    /// and `confidence` clamped to `0.0..=1.0`.
    pub fn new(score: u8, confidence: f64, status: AlignmentStatus) -> Self {
        Self {
            score: score.min(MAX_SCORE),
            confidence: confidence.clamp(0.0, 1.0),
            status,
            key_functionality_present: false,
            matches: Vec::new(),
            discrepancies: Vec::new(),
            suggestions: Vec::new(),
            intent_summary: None,
            actual_changes: None,
            risk_level: None,
            needs_human_review: false,
            source: JudgmentSource::Ai,
        }
    }

    pub fn with_key_functionality(mut self, present: bool) -> Self {
        self.key_functionality_present = present;
        self
    }

    pub fn with_match(mut self, item: impl Into<String>) -> Self {
        self.matches.push(item.into());
        self
    }

    pub fn with_discrepancy(mut self, item: impl Into<String>) -> Self {
        self.discrepancies.push(item.into());
        self
    }

    pub fn with_suggestion(mut self, item: impl Into<String>) -> Self {
        self.suggestions.push(item.into());
        self
    }

    pub fn with_source(mut self, source: JudgmentSource) -> Self {
        self.source = source;
        self
    }

    /// Misaligned with at least one discrepancy: the scope-creep override.
    pub fn is_critical(&self) -> bool {
        self.status == AlignmentStatus::Misaligned && !self.discrepancies.is_empty()
    }
}

/// The unit submitted to the AI judge.
#[derive(Debug, Clone, Copy)]
pub struct JudgmentRequest<'a> {
    pub story: &'a Story,
    pub changeset: &'a ChangeSet,
}

impl<'a> JudgmentRequest<'a> {
    pub fn new(story: &'a Story, changeset: &'a ChangeSet) -> Self {
        Self { story, changeset }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(AlignmentStatus::parse("aligned"), Some(AlignmentStatus::Aligned));
        assert_eq!(
            AlignmentStatus::parse(" Partially_Aligned "),
            Some(AlignmentStatus::PartiallyAligned)
        );
        assert_eq!(AlignmentStatus::parse("unknown"), None);
    }

    #[test]
    fn test_new_caps_values() {
        let j = Judgment::new(42, 3.0, AlignmentStatus::Aligned);
        assert_eq!(j.score, MAX_SCORE);
        assert_eq!(j.confidence, 1.0);
    }

    #[test]
    fn test_is_critical_requires_both_conditions() {
        let j = Judgment::new(6, 0.9, AlignmentStatus::Misaligned);
        assert!(!j.is_critical());
        let j = j.with_discrepancy("refactored billing");
        assert!(j.is_critical());
        let j = Judgment::new(6, 0.9, AlignmentStatus::PartiallyAligned).with_discrepancy("x");
        assert!(!j.is_critical());
    }
}
