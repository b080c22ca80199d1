//! Error types for the Jira adapter

use intentgate_core::StoryFetchError;
use thiserror::Error;

/// Errors that can occur talking to Jira
#[derive(Error, Debug)]
pub enum JiraError {
    /// One or more of JIRA_URL / JIRA_EMAIL / JIRA_API_TOKEN is unset
    #[error("Jira credentials not found: set {0}")]
    MissingCredentials(String),

    /// Issue does not exist or is not visible to the account
    #[error("Jira issue {0} not found")]
    NotFound(String),

    /// 401 / 403
    #[error("Jira authentication failed (HTTP {status}); check your credentials")]
    Unauthorized { status: u16 },

    /// Any other non-success status
    #[error("Jira returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection, TLS or timeout failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// Response body did not match the issue schema
    #[error("invalid Jira response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for JiraError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            JiraError::Decode(err.to_string())
        } else {
            JiraError::Http(err.to_string())
        }
    }
}

impl From<JiraError> for StoryFetchError {
    fn from(err: JiraError) -> Self {
        match err {
            JiraError::NotFound(id) => StoryFetchError::NotFound { id },
            JiraError::Unauthorized { .. } | JiraError::MissingCredentials(_) => {
                StoryFetchError::Unauthorized {
                    reason: err.to_string(),
                }
            }
            JiraError::Status { .. } | JiraError::Http(_) | JiraError::Decode(_) => {
                StoryFetchError::Transport {
                    reason: err.to_string(),
                }
            }
        }
    }
}
