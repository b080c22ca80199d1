//! In-memory collaborator fakes with call counters and artificial delay.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::collaborators::{AlignmentJudge, CommitRange, DiffCollector, StoryFetcher};
use crate::domain::changeset::ChangeSet;
use crate::domain::error::{JudgeError, Result, StoryFetchError};
use crate::domain::identifier::Identifier;
use crate::domain::judgment::Judgment;
use crate::domain::story::{Story, StoryType};

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// Stories
// ---------------------------------------------------------------------------

/// Serves canned stories; unknown ids are `NotFound`.
#[derive(Default)]
pub struct FakeStoryFetcher {
    stories: HashMap<String, Story>,
    failures: HashMap<String, StoryFetchError>,
    transient: Mutex<HashMap<String, u32>>,
    delays: HashMap<String, Duration>,
    calls: AtomicUsize,
}

impl FakeStoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_story(mut self, story: Story) -> Self {
        self.stories.insert(story.id.to_string(), story);
        self
    }

    /// Shorthand for a story with just a title.
    pub fn with_titled(self, id: &str, title: &str) -> Self {
        let id = Identifier::new_unchecked(id);
        self.with_story(Story::new(id, title, StoryType::Story))
    }

    pub fn with_failure(mut self, id: &str, error: StoryFetchError) -> Self {
        self.failures.insert(id.to_string(), error);
        self
    }

    /// Fail the first `count` fetches of `id` with a transport error.
    pub fn with_transient_failures(self, id: &str, count: u32) -> Self {
        lock(&self.transient).insert(id.to_string(), count);
        self
    }

    pub fn with_delay(mut self, id: &str, delay: Duration) -> Self {
        self.delays.insert(id.to_string(), delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoryFetcher for FakeStoryFetcher {
    async fn fetch(&self, id: &Identifier) -> std::result::Result<Story, StoryFetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(id.as_str()) {
            tokio::time::sleep(*delay).await;
        }

        {
            let mut transient = lock(&self.transient);
            if let Some(remaining) = transient.get_mut(id.as_str()) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(StoryFetchError::Transport {
                        reason: "connection reset".to_string(),
                    });
                }
            }
        }

        if let Some(error) = self.failures.get(id.as_str()) {
            return Err(error.clone());
        }
        self.stories
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| StoryFetchError::NotFound { id: id.to_string() })
    }
}

// ---------------------------------------------------------------------------
// Diffs
// ---------------------------------------------------------------------------

/// Returns the same changeset for every range.
#[derive(Default)]
pub struct FakeDiffCollector {
    changeset: ChangeSet,
    calls: AtomicUsize,
}

impl FakeDiffCollector {
    pub fn new(changeset: ChangeSet) -> Self {
        Self {
            changeset,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DiffCollector for FakeDiffCollector {
    async fn collect(&self, _range: &CommitRange) -> Result<ChangeSet> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.changeset.clone())
    }
}

// ---------------------------------------------------------------------------
// Judge
// ---------------------------------------------------------------------------

/// Returns a scripted judgment per story id, or a default.
pub struct FakeAlignmentJudge {
    default: Judgment,
    responses: HashMap<String, std::result::Result<Judgment, JudgeError>>,
    delays: HashMap<String, Duration>,
    calls: AtomicUsize,
    completed: Mutex<Vec<String>>,
}

impl FakeAlignmentJudge {
    pub fn new(default: Judgment) -> Self {
        Self {
            default,
            responses: HashMap::new(),
            delays: HashMap::new(),
            calls: AtomicUsize::new(0),
            completed: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(
        mut self,
        id: &str,
        response: std::result::Result<Judgment, JudgeError>,
    ) -> Self {
        self.responses.insert(id.to_string(), response);
        self
    }

    pub fn with_delay(mut self, id: &str, delay: Duration) -> Self {
        self.delays.insert(id.to_string(), delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Story ids in the order their judgments finished.
    pub fn completion_order(&self) -> Vec<String> {
        lock(&self.completed).clone()
    }
}

#[async_trait]
impl AlignmentJudge for FakeAlignmentJudge {
    async fn judge(
        &self,
        story: &Story,
        _changeset: &ChangeSet,
    ) -> std::result::Result<Judgment, JudgeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = story.id.as_str();
        if let Some(delay) = self.delays.get(key) {
            tokio::time::sleep(*delay).await;
        }
        lock(&self.completed).push(key.to_string());
        self.responses
            .get(key)
            .cloned()
            .unwrap_or_else(|| Ok(self.default.clone()))
    }
}
