//! Collaborator boundaries consumed by the validation pipeline.
//!
//! The pipeline owns none of these; adapters live in `intentgate-jira`
//! (stories), `intentgate-judge` (AI judging) and [`crate::git`] (diffs).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::changeset::ChangeSet;
use crate::domain::error::{JudgeError, Result, StoryFetchError};
use crate::domain::identifier::Identifier;
use crate::domain::judgment::Judgment;
use crate::domain::story::Story;

/// Which changes to validate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommitRange {
    /// Index against HEAD; used from the commit-msg hook.
    Staged,
    /// A single commit.
    Commit(String),
    /// Merge-base diff `base...head`; used for pull requests.
    Range { base: String, head: String },
}

impl std::fmt::Display for CommitRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommitRange::Staged => f.write_str("staged"),
            CommitRange::Commit(sha) => f.write_str(sha),
            CommitRange::Range { base, head } => write!(f, "{base}...{head}"),
        }
    }
}

/// Fetches ticket records from the issue tracker.
#[async_trait]
pub trait StoryFetcher: Send + Sync {
    async fn fetch(&self, id: &Identifier) -> std::result::Result<Story, StoryFetchError>;
}

/// Produces the changeset for a commit or range. An empty changeset is a
/// valid result.
#[async_trait]
pub trait DiffCollector: Send + Sync {
    async fn collect(&self, range: &CommitRange) -> Result<ChangeSet>;
}

/// Judges how well a changeset implements a story.
///
/// Implementations retry transient transport failures themselves and return
/// [`JudgeError::Unavailable`] once attempts are exhausted. A schema
/// violation is returned as [`JudgeError::Malformed`] without retrying.
#[async_trait]
pub trait AlignmentJudge: Send + Sync {
    async fn judge(
        &self,
        story: &Story,
        changeset: &ChangeSet,
    ) -> std::result::Result<Judgment, JudgeError>;
}
