//! IntentGate Core Library
//!
//! Domain types, identifier extraction, threshold policy, report
//! aggregation, bypass handling and collaborator boundaries for validating
//! that commits implement the tickets they reference.

pub mod aggregate;
pub mod bypass;
pub mod collaborators;
pub mod config;
pub mod domain;
pub mod execution;
pub mod extract;
pub mod git;
pub mod heuristic;
pub mod obs;
pub mod policy;
pub mod telemetry;

#[cfg(any(test, feature = "fakes"))]
pub mod fakes;

pub use aggregate::{aggregate, summarize};
pub use bypass::{should_bypass, BypassConfig, BypassGate, BypassMode};
pub use collaborators::{AlignmentJudge, CommitRange, DiffCollector, StoryFetcher};
pub use config::{PipelineConfig, MAX_CONCURRENT_LIMIT, MAX_RETRIES_LIMIT};
pub use domain::{
    AlignmentStatus, ChangeSet, Decision, FileChange, Identifier, IntentError, JudgeError,
    Judgment, JudgmentRequest, JudgmentSource, ReportStatus, ReportSummary, Result, RiskLevel,
    Story, StoryFetchError, StoryFetchKind, StoryType, TicketFailure, TicketOutcome,
    TransportError, ValidationReport, IDENTIFIER_REQUIRED_REASON, MAX_SCORE,
};
pub use execution::{execute_with_retry, AttemptError, ExecutionControls};
pub use extract::{extract_from_messages, extract_identifiers};
pub use git::{hooks_dir, is_git_repo, GitDiffCollector};
pub use heuristic::heuristic_judgment;
pub use policy::{decide, decide_with_reason, ThresholdConfig};
pub use telemetry::init_tracing;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
