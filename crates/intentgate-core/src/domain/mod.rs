//! Domain models for IntentGate.
//!
//! - `Identifier`: ticket key extracted from commit text
//! - `Story`: ticket record from the issue tracker
//! - `ChangeSet`: changed files for a commit or range
//! - `Judgment`: validated alignment assessment
//! - `Decision`: pass / warn / block
//! - `ValidationReport`: per-ticket outcomes plus summary

pub mod changeset;
pub mod decision;
pub mod error;
pub mod identifier;
pub mod judgment;
pub mod report;
pub mod story;

pub use changeset::{ChangeSet, FileChange, DEFAULT_MAX_SUMMARY_LINES};
pub use decision::Decision;
pub use error::{
    IntentError, JudgeError, Result, StoryFetchError, StoryFetchKind, TransportError,
};
pub use identifier::Identifier;
pub use judgment::{
    AlignmentStatus, Judgment, JudgmentRequest, JudgmentSource, RiskLevel, MAX_SCORE,
};
pub use report::{
    ReportStatus, ReportSummary, TicketFailure, TicketOutcome, ValidationReport,
    IDENTIFIER_REQUIRED_REASON,
};
pub use story::{Story, StoryType};
