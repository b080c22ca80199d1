//! AI-backed [`AlignmentJudge`].
//!
//! Transport failures are retried at the [`JudgeTransport`] boundary under
//! the configured [`ExecutionControls`]. The response is parsed exactly once;
//! a malformed response is never retried.

use std::sync::Arc;

use async_trait::async_trait;
use intentgate_core::{
    execute_with_retry, AlignmentJudge, AttemptError, ChangeSet, ExecutionControls, JudgeError,
    Judgment, JudgmentRequest, Story, TransportError,
};
use tracing::{debug, instrument};

use crate::parse::parse_judgment;
use crate::prompt::{build_prompt, JudgePrompt};

/// Wire boundary to the AI judge: submit a rendered request, get raw text.
#[async_trait]
pub trait JudgeTransport: Send + Sync {
    async fn submit(&self, prompt: &JudgePrompt) -> Result<String, TransportError>;
}

#[async_trait]
impl<T: JudgeTransport + ?Sized> JudgeTransport for Arc<T> {
    async fn submit(&self, prompt: &JudgePrompt) -> Result<String, TransportError> {
        (**self).submit(prompt).await
    }
}

/// Judge that renders a prompt, submits it and validates the answer.
pub struct AiAlignmentJudge<T> {
    transport: T,
    controls: ExecutionControls,
}

impl<T: JudgeTransport> AiAlignmentJudge<T> {
    pub fn new(transport: T, controls: ExecutionControls) -> Self {
        Self {
            transport,
            controls,
        }
    }

    pub fn controls(&self) -> &ExecutionControls {
        &self.controls
    }
}

#[async_trait]
impl<T: JudgeTransport> AlignmentJudge for AiAlignmentJudge<T> {
    #[instrument(skip_all, fields(ticket = %story.id, files = changeset.len()))]
    async fn judge(&self, story: &Story, changeset: &ChangeSet) -> Result<Judgment, JudgeError> {
        let prompt = build_prompt(&JudgmentRequest::new(story, changeset));

        let raw = execute_with_retry(
            &self.controls,
            "judge.submit",
            |e: &TransportError| e.retryable,
            || self.transport.submit(&prompt),
        )
        .await
        .map_err(|err| match err {
            AttemptError::TimedOut { attempts, limit_ms } => JudgeError::Unavailable {
                attempts,
                reason: format!("timed out after {limit_ms}ms"),
            },
            AttemptError::Failed { attempts, error } => JudgeError::Unavailable {
                attempts,
                reason: error.message,
            },
        })?;

        let judgment = parse_judgment(&raw)?;
        debug!(score = judgment.score, status = %judgment.status, "judge response accepted");
        Ok(judgment)
    }
}
