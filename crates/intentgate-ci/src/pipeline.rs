//! Validation pipeline: bypass, extract, fan-out fetch/judge, policy, aggregate.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use intentgate_core::obs::{
    emit_ticket_failed, emit_ticket_judged, emit_validation_bypassed, emit_validation_finished,
    emit_validation_started, validation_span,
};
use intentgate_core::{
    aggregate, decide_with_reason, execute_with_retry, extract_from_messages, extract_identifiers,
    heuristic_judgment, AlignmentJudge, AttemptError, BypassGate, BypassMode, ChangeSet,
    CommitRange, DiffCollector, Identifier, IntentError, JudgeError, Judgment, PipelineConfig,
    Result, Story, StoryFetchError, StoryFetcher, TicketFailure, TicketOutcome, ValidationReport,
    MAX_CONCURRENT_LIMIT,
};
use tokio::sync::Semaphore;
use tracing::{debug, instrument, Instrument};
use uuid::Uuid;

/// Slack on top of the judge's own retry budget before the pipeline gives up.
const JUDGE_BUDGET_SLACK: Duration = Duration::from_secs(1);

fn mode_label(mode: BypassMode) -> &'static str {
    match mode {
        BypassMode::Skip => "skip",
        BypassMode::HeuristicOnly => "heuristic",
        BypassMode::Full => "full",
    }
}

/// Orchestrates one validation run over injected collaborators.
///
/// The bypass flags are snapshotted at construction; later changes to the
/// configuration source have no effect on this pipeline.
pub struct ValidationPipeline {
    config: PipelineConfig,
    gate: BypassGate,
    fetcher: Arc<dyn StoryFetcher>,
    diffs: Arc<dyn DiffCollector>,
    judge: Arc<dyn AlignmentJudge>,
}

impl ValidationPipeline {
    pub fn new(
        config: PipelineConfig,
        fetcher: Arc<dyn StoryFetcher>,
        diffs: Arc<dyn DiffCollector>,
        judge: Arc<dyn AlignmentJudge>,
    ) -> Self {
        let gate = BypassGate::new(config.bypass);
        Self {
            config,
            gate,
            fetcher,
            diffs,
            judge,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn mode(&self) -> BypassMode {
        self.gate.mode()
    }

    /// Validate a single commit message against the changes in `range`.
    pub async fn validate_commit(
        &self,
        message: &str,
        range: &CommitRange,
    ) -> Result<ValidationReport> {
        self.run(|| extract_identifiers(message), range).await
    }

    /// Validate every commit message of a PR against the range diff.
    pub async fn validate_messages(
        &self,
        messages: &[String],
        range: &CommitRange,
    ) -> Result<ValidationReport> {
        self.run(|| extract_from_messages(messages.iter().map(String::as_str)), range)
            .await
    }

    /// Validate an explicit identifier list, in the given order.
    pub async fn validate_identifiers(
        &self,
        identifiers: Vec<Identifier>,
        range: &CommitRange,
    ) -> Result<ValidationReport> {
        self.run(move || identifiers, range).await
    }

    /// Extraction is deferred so a bypassed run does no work at all.
    #[instrument(skip(self, extract, range), fields(range = %range, mode = mode_label(self.gate.mode())))]
    async fn run<F>(&self, extract: F, range: &CommitRange) -> Result<ValidationReport>
    where
        F: FnOnce() -> Vec<Identifier>,
    {
        if self.gate.should_bypass() {
            let report = ValidationReport::bypassed(self.gate.reason());
            emit_validation_bypassed(&report.run_id.to_string(), &self.gate.reason());
            return Ok(report);
        }

        let identifiers = extract();
        if identifiers.is_empty() {
            debug!("no ticket identifiers in commit text");
            return Ok(if self.config.require_identifier {
                ValidationReport::identifier_required()
            } else {
                ValidationReport::no_identifiers()
            });
        }

        let run_id = Uuid::new_v4();
        let run_label = run_id.to_string();
        let mode = self.gate.mode();

        async {
            let started = Instant::now();
            emit_validation_started(&run_label, identifiers.len(), mode_label(mode));

            let changeset = self.diffs.collect(range).await?;
            debug!(files = changeset.len(), "collected changeset");

            let outcomes = self.evaluate_all(&identifiers, &changeset, mode).await;

            let mut report = aggregate(outcomes, &self.config.thresholds);
            report.run_id = run_id;

            emit_validation_finished(
                &run_label,
                started.elapsed().as_millis() as u64,
                report.summary.count,
                report.summary.average_score,
                report.overall,
            );
            Ok::<_, IntentError>(report)
        }
        .instrument(validation_span(&run_label))
        .await
    }

    /// Evaluate tickets concurrently, bounded by `max_concurrent`.
    ///
    /// Each task writes into the slot of its identifier's index, so the
    /// result order is the extraction order whatever the completion order.
    async fn evaluate_all(
        &self,
        identifiers: &[Identifier],
        changeset: &ChangeSet,
        mode: BypassMode,
    ) -> Vec<TicketOutcome> {
        let semaphore = Semaphore::new(self.config.max_concurrent.clamp(1, MAX_CONCURRENT_LIMIT));
        let mut slots: Vec<Option<TicketOutcome>> = vec![None; identifiers.len()];

        let tasks = identifiers.iter().enumerate().map(|(index, id)| {
            let semaphore = &semaphore;
            async move {
                // Never closed, so acquire cannot fail.
                let _permit = semaphore.acquire().await.ok();
                (index, self.evaluate_ticket(id, changeset, mode).await)
            }
        });

        for (index, outcome) in join_all(tasks).await {
            slots[index] = Some(outcome);
        }
        slots.into_iter().flatten().collect()
    }

    #[instrument(skip(self, id, changeset, mode), fields(ticket = %id))]
    async fn evaluate_ticket(
        &self,
        id: &Identifier,
        changeset: &ChangeSet,
        mode: BypassMode,
    ) -> TicketOutcome {
        let story = match self.fetch_story(id).await {
            Ok(story) => story,
            Err(err) => {
                let failure = TicketFailure::from(&err);
                emit_ticket_failed(id, &failure);
                return TicketOutcome::failed(id.clone(), None, failure);
            }
        };

        let judgment = match mode {
            BypassMode::HeuristicOnly => Ok(heuristic_judgment(&story, changeset)),
            _ => self.judge_story(&story, changeset).await,
        };

        match judgment {
            Ok(judgment) => {
                let (decision, reason) = decide_with_reason(&judgment, &self.config.thresholds);
                emit_ticket_judged(id, &judgment, decision);
                TicketOutcome::judged(id.clone(), Some(story.title), judgment, decision, reason)
            }
            Err(err) => {
                let failure = TicketFailure::from(&err);
                emit_ticket_failed(id, &failure);
                TicketOutcome::failed(id.clone(), Some(story.title), failure)
            }
        }
    }

    async fn fetch_story(&self, id: &Identifier) -> std::result::Result<Story, StoryFetchError> {
        let controls = &self.config.story_fetch;
        execute_with_retry(controls, "story.fetch", StoryFetchError::is_retryable, || {
            self.fetcher.fetch(id)
        })
        .await
        .map_err(|err| match err {
            AttemptError::Failed { error, .. } => error,
            timed_out @ AttemptError::TimedOut { .. } => StoryFetchError::Transport {
                reason: timed_out.to_string(),
            },
        })
    }

    /// The judge retries its own transport; this is the outer ceiling.
    async fn judge_story(
        &self,
        story: &Story,
        changeset: &ChangeSet,
    ) -> std::result::Result<Judgment, JudgeError> {
        let controls = &self.config.judge;
        let budget = controls.total_budget() + JUDGE_BUDGET_SLACK;

        match tokio::time::timeout(budget, self.judge.judge(story, changeset)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(JudgeError::Unavailable {
                attempts: controls.max_attempts(),
                reason: format!("no judgment within {}ms", budget.as_millis()),
            }),
        }
    }
}
