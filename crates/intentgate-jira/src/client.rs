//! Jira Cloud REST v3 client implementing [`StoryFetcher`].

use async_trait::async_trait;
use intentgate_core::{Identifier, Story, StoryFetchError, StoryFetcher, StoryType};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::adf::{description_text, extract_acceptance_criteria};
use crate::error::JiraError;

pub const URL_ENV: &str = "JIRA_URL";
pub const EMAIL_ENV: &str = "JIRA_EMAIL";
pub const TOKEN_ENV: &str = "JIRA_API_TOKEN";

const USER_AGENT: &str = concat!("intentgate-jira/", env!("CARGO_PKG_VERSION"));
const ISSUE_FIELDS: &str = "summary,description,issuetype,status,priority,labels,components";

/// Jira site and credentials.
#[derive(Clone)]
pub struct JiraConfig {
    /// Site URL, e.g. `https://yourcompany.atlassian.net`
    pub base_url: String,
    pub email: String,
    pub api_token: String,
}

impl std::fmt::Debug for JiraConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraConfig")
            .field("base_url", &self.base_url)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl JiraConfig {
    pub fn new(base_url: &str, email: &str, api_token: &str) -> Self {
        JiraConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            email: email.to_string(),
            api_token: api_token.to_string(),
        }
    }

    /// Read all three settings through `lookup`; every one is required.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, JiraError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let (url, email, token) = (get(URL_ENV), get(EMAIL_ENV), get(TOKEN_ENV));

        match (url, email, token) {
            (Some(url), Some(email), Some(token)) => Ok(Self::new(&url, &email, &token)),
            (url, email, token) => {
                let missing: Vec<&str> = [
                    (URL_ENV, url.is_none()),
                    (EMAIL_ENV, email.is_none()),
                    (TOKEN_ENV, token.is_none()),
                ]
                .iter()
                .filter(|(_, absent)| *absent)
                .map(|(key, _)| *key)
                .collect();
                Err(JiraError::MissingCredentials(missing.join(", ")))
            }
        }
    }

    /// Create a config from environment variables
    pub fn from_env() -> Result<Self, JiraError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn issue_url(&self, key: &str) -> String {
        format!("{}/rest/api/3/issue/{}", self.base_url, key)
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// The subset of an issue response the validator reads.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueResponse {
    pub key: String,
    #[serde(default)]
    pub fields: IssueFields,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueFields {
    pub summary: Option<String>,
    pub description: Option<Value>,
    pub issuetype: Option<Named>,
    pub status: Option<Named>,
    pub priority: Option<Named>,
    pub labels: Option<Vec<String>>,
    pub components: Option<Vec<Named>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Named {
    pub name: Option<String>,
}

fn name_of(field: &Option<Named>) -> Option<String> {
    field
        .as_ref()
        .and_then(|n| n.name.clone())
        .filter(|n| !n.is_empty())
}

impl IssueResponse {
    /// Convert into a [`Story`] for the requested identifier.
    pub fn into_story(self, id: Identifier) -> Story {
        let fields = self.fields;
        let description = description_text(fields.description.as_ref());
        let acceptance_criteria = extract_acceptance_criteria(&description);
        let story_type = name_of(&fields.issuetype)
            .map(|n| StoryType::from_tracker_name(&n))
            .unwrap_or(StoryType::Other);

        let mut story = Story::new(id, fields.summary.unwrap_or_default(), story_type)
            .with_description(description)
            .with_status(name_of(&fields.status).unwrap_or_default())
            .with_acceptance_criteria(acceptance_criteria);
        story.priority = name_of(&fields.priority);
        story.labels = fields.labels.unwrap_or_default();
        story.components = fields
            .components
            .unwrap_or_default()
            .into_iter()
            .filter_map(|c| c.name)
            .collect();
        story
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Jira client for story lookups
pub struct JiraClient {
    config: JiraConfig,
    http_client: reqwest::Client,
}

impl JiraClient {
    pub fn new(config: JiraConfig) -> Result<Self, JiraError> {
        let http_client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(JiraClient {
            config,
            http_client,
        })
    }

    /// Create client from environment variables
    pub fn from_env() -> Result<Self, JiraError> {
        Self::new(JiraConfig::from_env()?)
    }

    pub fn config(&self) -> &JiraConfig {
        &self.config
    }

    /// Fetch one issue.
    pub async fn get_issue(&self, key: &str) -> Result<IssueResponse, JiraError> {
        let url = self.config.issue_url(key);
        debug!(url = %url, "fetching Jira issue");

        let response = self
            .http_client
            .get(&url)
            .query(&[("fields", ISSUE_FIELDS)])
            .basic_auth(&self.config.email, Some(&self.config.api_token))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        match status {
            StatusCode::NOT_FOUND => return Err(JiraError::NotFound(key.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(JiraError::Unauthorized {
                    status: status.as_u16(),
                })
            }
            s if !s.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(JiraError::Status {
                    status: s.as_u16(),
                    body: body.chars().take(320).collect(),
                });
            }
            _ => {}
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| JiraError::Decode(e.to_string()))
    }
}

#[async_trait]
impl StoryFetcher for JiraClient {
    #[instrument(skip(self), fields(ticket = %id))]
    async fn fetch(&self, id: &Identifier) -> Result<Story, StoryFetchError> {
        let issue = self.get_issue(id.as_str()).await?;
        Ok(issue.into_story(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_from_lookup() {
        let cfg = JiraConfig::from_lookup(env(&[
            (URL_ENV, "https://acme.atlassian.net/"),
            (EMAIL_ENV, "dev@acme.io"),
            (TOKEN_ENV, "secret"),
        ]))
        .unwrap();
        assert_eq!(
            cfg.issue_url("PROJ-1"),
            "https://acme.atlassian.net/rest/api/3/issue/PROJ-1"
        );
        assert!(!format!("{cfg:?}").contains("secret"));
    }

    #[test]
    fn test_config_names_missing_vars() {
        let err = JiraConfig::from_lookup(env(&[(URL_ENV, "https://x")])).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains(EMAIL_ENV));
        assert!(msg.contains(TOKEN_ENV));
        assert!(!msg.contains(URL_ENV));
    }

    #[test]
    fn test_issue_into_story() {
        let issue: IssueResponse = serde_json::from_value(serde_json::json!({
            "key": "PROJ-5",
            "fields": {
                "summary": "Add OAuth login",
                "description": {
                    "type": "doc",
                    "content": [
                        {"type": "paragraph", "content": [{"type": "text", "text": "Acceptance Criteria:"}]},
                        {"type": "paragraph", "content": [{"type": "text", "text": "- Google button"}]}
                    ]
                },
                "issuetype": {"name": "Sub-task"},
                "status": {"name": "In Progress"},
                "priority": null,
                "labels": ["auth"],
                "components": [{"name": "web"}, {"name": null}]
            }
        }))
        .unwrap();

        let story = issue.into_story(Identifier::try_from("PROJ-5").unwrap());
        assert_eq!(story.title, "Add OAuth login");
        assert_eq!(story.story_type, StoryType::Task);
        assert_eq!(story.status, "In Progress");
        assert_eq!(story.priority, None);
        assert_eq!(story.description, "Acceptance Criteria:\n- Google button");
        assert_eq!(story.acceptance_criteria, "- Google button");
        assert_eq!(story.labels, vec!["auth"]);
        assert_eq!(story.components, vec!["web"]);
    }

    #[test]
    fn test_sparse_issue_defaults() {
        let issue: IssueResponse =
            serde_json::from_value(serde_json::json!({ "key": "PROJ-6" })).unwrap();
        let story = issue.into_story(Identifier::try_from("PROJ-6").unwrap());
        assert_eq!(story.title, "");
        assert_eq!(story.description, "");
        assert_eq!(story.story_type, StoryType::Other);
    }
}
