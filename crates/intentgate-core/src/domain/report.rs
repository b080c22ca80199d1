//! Per-ticket outcomes and the multi-story validation report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::decision::Decision;
use super::error::{JudgeError, StoryFetchError, StoryFetchKind};
use super::identifier::Identifier;
use super::judgment::Judgment;

/// Block reason when a commit must reference a ticket but references none.
pub const IDENTIFIER_REQUIRED_REASON: &str =
    "commit message must reference a ticket identifier (e.g. PROJ-123)";

/// Why a ticket could not be validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TicketFailure {
    StoryFetchFailed { reason: StoryFetchKind, message: String },
    JudgeUnavailable { message: String },
    MalformedJudgment { message: String },
}

impl std::fmt::Display for TicketFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketFailure::StoryFetchFailed { reason, message } => {
                write!(f, "story fetch failed ({reason}): {message}")
            }
            TicketFailure::JudgeUnavailable { message } => {
                write!(f, "alignment judge unavailable: {message}")
            }
            TicketFailure::MalformedJudgment { message } => {
                write!(f, "alignment judge returned a malformed judgment: {message}")
            }
        }
    }
}

impl From<&StoryFetchError> for TicketFailure {
    fn from(err: &StoryFetchError) -> Self {
        TicketFailure::StoryFetchFailed {
            reason: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<&JudgeError> for TicketFailure {
    fn from(err: &JudgeError) -> Self {
        match err {
            JudgeError::Unavailable { .. } => TicketFailure::JudgeUnavailable {
                message: err.to_string(),
            },
            JudgeError::Malformed { reason } => TicketFailure::MalformedJudgment {
                message: reason.clone(),
            },
        }
    }
}

/// The result for one referenced ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketOutcome {
    pub identifier: Identifier,
    /// Story title when the story was fetched.
    pub story_title: Option<String>,
    /// Present when the ticket was judged.
    pub judgment: Option<Judgment>,
    pub decision: Decision,
    /// Human-readable explanation of `decision`.
    pub reason: String,
    /// Present when the ticket could not be validated.
    pub failure: Option<TicketFailure>,
}

impl TicketOutcome {
    pub fn judged(
        identifier: Identifier,
        story_title: Option<String>,
        judgment: Judgment,
        decision: Decision,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            identifier,
            story_title,
            judgment: Some(judgment),
            decision,
            reason: reason.into(),
            failure: None,
        }
    }

    /// A ticket that could not be validated. Always `Block`.
    pub fn failed(identifier: Identifier, story_title: Option<String>, failure: TicketFailure) -> Self {
        Self {
            identifier,
            story_title,
            judgment: None,
            decision: Decision::Block,
            reason: failure.to_string(),
            failure: Some(failure),
        }
    }

    /// Score used for averaging; unvalidated tickets count as 0.
    pub fn score(&self) -> u8 {
        self.judgment.as_ref().map(|j| j.score).unwrap_or(0)
    }
}

/// Summary statistics over all ticket outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub average_score: f64,
    pub count: usize,
    /// Tickets decided `Block`.
    pub critical_issues: usize,
    /// Non-blocked tickets scoring below the warn threshold.
    pub low_alignment: usize,
    /// Non-blocked tickets scoring at or above the warn threshold.
    pub good_alignment: usize,
}

impl ReportSummary {
    pub fn empty() -> Self {
        Self {
            average_score: 0.0,
            count: 0,
            critical_issues: 0,
            low_alignment: 0,
            good_alignment: 0,
        }
    }
}

/// Whether validation actually ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ReportStatus {
    /// Tickets were extracted and each was evaluated.
    Validated,
    /// No identifiers in the commit text; nothing to validate.
    NoIdentifiers,
    /// No identifiers, and the configuration requires one.
    IdentifierRequired,
    /// Validation was skipped by an explicit override. Not a passing result.
    Bypassed { reason: String },
}

/// The result of one validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub status: ReportStatus,
    /// In first-extracted order.
    pub tickets: Vec<TicketOutcome>,
    pub summary: ReportSummary,
    /// Worst per-ticket decision.
    pub overall: Decision,
}

impl ValidationReport {
    pub(crate) fn with_status(status: ReportStatus, overall: Decision) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            status,
            tickets: Vec::new(),
            summary: ReportSummary::empty(),
            overall,
        }
    }

    /// Synthetic always-pass report carrying the bypass marker.
    pub fn bypassed(reason: impl Into<String>) -> Self {
        Self::with_status(
            ReportStatus::Bypassed {
                reason: reason.into(),
            },
            Decision::Pass,
        )
    }

    pub fn no_identifiers() -> Self {
        Self::with_status(ReportStatus::NoIdentifiers, Decision::Pass)
    }

    pub fn identifier_required() -> Self {
        Self::with_status(ReportStatus::IdentifierRequired, Decision::Block)
    }

    /// `false` for bypassed runs, even though they pass.
    pub fn is_validated(&self) -> bool {
        !matches!(self.status, ReportStatus::Bypassed { .. })
    }

    pub fn is_bypassed(&self) -> bool {
        matches!(self.status, ReportStatus::Bypassed { .. })
    }
}
