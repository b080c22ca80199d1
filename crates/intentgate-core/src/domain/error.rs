//! Domain-level error taxonomy for IntentGate.
//!
//! Collaborator boundaries each get their own error type so the pipeline can
//! decide retryability by kind: [`StoryFetchError`] for the issue tracker,
//! [`TransportError`] for the AI judge wire, and [`JudgeError`] for the
//! parsed judgment. [`IntentError`] covers everything else.

use serde::{Deserialize, Serialize};

/// Why a story could not be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryFetchKind {
    NotFound,
    Unauthorized,
    Transport,
}

impl std::fmt::Display for StoryFetchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StoryFetchKind::NotFound => "not_found",
            StoryFetchKind::Unauthorized => "unauthorized",
            StoryFetchKind::Transport => "transport",
        };
        f.write_str(s)
    }
}

/// Errors produced by a [`crate::collaborators::StoryFetcher`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoryFetchError {
    #[error("story {id} not found")]
    NotFound { id: String },

    #[error("issue tracker rejected credentials: {reason}")]
    Unauthorized { reason: String },

    #[error("issue tracker transport failure: {reason}")]
    Transport { reason: String },
}

impl StoryFetchError {
    pub fn kind(&self) -> StoryFetchKind {
        match self {
            StoryFetchError::NotFound { .. } => StoryFetchKind::NotFound,
            StoryFetchError::Unauthorized { .. } => StoryFetchKind::Unauthorized,
            StoryFetchError::Transport { .. } => StoryFetchKind::Transport,
        }
    }

    /// Only transport failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        self.kind() == StoryFetchKind::Transport
    }
}

/// Failure at the AI judge wire boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("judge transport error: {message}")]
pub struct TransportError {
    /// Whether the failure is transient (connect error, timeout, 5xx, 429).
    pub retryable: bool,
    pub message: String,
}

impl TransportError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            retryable: true,
            message: message.into(),
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            retryable: false,
            message: message.into(),
        }
    }
}

/// Errors produced by an [`crate::collaborators::AlignmentJudge`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum JudgeError {
    #[error("alignment judge unavailable after {attempts} attempt(s): {reason}")]
    Unavailable { attempts: u32, reason: String },

    #[error("malformed judgment: {reason}")]
    Malformed { reason: String },
}

impl JudgeError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        JudgeError::Malformed {
            reason: reason.into(),
        }
    }
}

/// IntentGate domain errors.
#[derive(Debug, thiserror::Error)]
pub enum IntentError {
    #[error("invalid ticket identifier: {0}")]
    InvalidIdentifier(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("git error: {0}")]
    GitError(String),

    #[error("story fetch failed ({}): {0}", .0.kind())]
    StoryFetch(#[from] StoryFetchError),

    #[error(transparent)]
    Judge(#[from] JudgeError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for IntentGate domain operations.
pub type Result<T> = std::result::Result<T, IntentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_fetch_kinds() {
        let err = StoryFetchError::NotFound {
            id: "PROJ-1".to_string(),
        };
        assert_eq!(err.kind(), StoryFetchKind::NotFound);
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("PROJ-1"));

        let err = StoryFetchError::Transport {
            reason: "connection reset".to_string(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_intent_error_wraps_story_fetch() {
        let err: IntentError = StoryFetchError::Unauthorized {
            reason: "401".to_string(),
        }
        .into();
        let msg = err.to_string();
        assert!(msg.contains("unauthorized"));
        assert!(msg.contains("401"));
    }

    #[test]
    fn test_judge_error_display() {
        let err = JudgeError::Unavailable {
            attempts: 3,
            reason: "timed out".to_string(),
        };
        assert!(err.to_string().contains("3 attempt(s)"));

        let err = JudgeError::malformed("missing field `score`");
        assert!(err.to_string().contains("missing field `score`"));
    }
}
