//! Jira Cloud adapter for IntentGate.
//!
//! Fetches issues over the REST v3 API, flattens Atlassian Document Format
//! descriptions and lifts acceptance criteria out of them.

pub mod adf;
pub mod client;
pub mod error;

pub use adf::{adf_to_text, description_text, extract_acceptance_criteria};
pub use client::{IssueResponse, JiraClient, JiraConfig};
pub use error::JiraError;

/// Result type for Jira operations
pub type Result<T> = std::result::Result<T, JiraError>;
