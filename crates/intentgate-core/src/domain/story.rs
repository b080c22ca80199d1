//! Ticket records as returned by the issue tracker.

use serde::{Deserialize, Serialize};

use super::identifier::Identifier;

/// Kind of ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryType {
    Story,
    Bug,
    Task,
    Epic,
    Other,
}

impl StoryType {
    /// Map an issue-tracker type name onto a `StoryType` (case-insensitive).
    pub fn from_tracker_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "story" | "user story" => StoryType::Story,
            "bug" | "defect" => StoryType::Bug,
            "task" | "sub-task" | "subtask" => StoryType::Task,
            "epic" => StoryType::Epic,
            _ => StoryType::Other,
        }
    }
}

impl std::fmt::Display for StoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StoryType::Story => "Story",
            StoryType::Bug => "Bug",
            StoryType::Task => "Task",
            StoryType::Epic => "Epic",
            StoryType::Other => "Other",
        };
        f.write_str(s)
    }
}

/// A fetched ticket. Borrowed read-only by the pipeline for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: Identifier,
    pub title: String,
    /// Plain-text description; may be empty.
    pub description: String,
    pub story_type: StoryType,
    pub status: String,
    pub priority: Option<String>,
    pub labels: Vec<String>,
    pub components: Vec<String>,
    /// Acceptance criteria lifted out of the description; may be empty.
    pub acceptance_criteria: String,
}

impl Story {
    /// Create a story with only the required fields set.
    pub fn new(id: Identifier, title: impl Into<String>, story_type: StoryType) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            story_type,
            status: String::new(),
            priority: None,
            labels: Vec::new(),
            components: Vec::new(),
            acceptance_criteria: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_acceptance_criteria(mut self, criteria: impl Into<String>) -> Self {
        self.acceptance_criteria = criteria.into();
        self
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.components.push(component.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_type_mapping() {
        assert_eq!(StoryType::from_tracker_name("Story"), StoryType::Story);
        assert_eq!(StoryType::from_tracker_name("BUG"), StoryType::Bug);
        assert_eq!(StoryType::from_tracker_name("Sub-task"), StoryType::Task);
        assert_eq!(StoryType::from_tracker_name("Epic"), StoryType::Epic);
        assert_eq!(StoryType::from_tracker_name("Spike"), StoryType::Other);
    }

    #[test]
    fn test_story_builder() {
        let story = Story::new(
            Identifier::try_from("PROJ-7").unwrap(),
            "Add email validation",
            StoryType::Story,
        )
        .with_status("In Progress")
        .with_component("web");

        assert!(story.description.is_empty());
        assert_eq!(story.status, "In Progress");
        assert_eq!(story.components, vec!["web".to_string()]);
    }
}
