//! Integration tests for the validation pipeline with in-memory collaborators.

use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use intentgate_ci::{render_markdown, IntentGate, ValidationPipeline, EXIT_BLOCK, EXIT_OK};
use intentgate_core::fakes::{FakeAlignmentJudge, FakeDiffCollector, FakeStoryFetcher};
use intentgate_core::{
    AlignmentStatus, ChangeSet, CommitRange, Decision, FileChange, GitDiffCollector, JudgeError,
    Judgment, JudgmentSource, PipelineConfig, ReportStatus, StoryFetchError, StoryFetchKind,
    TicketFailure,
};

fn changes() -> ChangeSet {
    ChangeSet::new(vec![
        FileChange::new("src/auth/login.rs", 40, 3),
        FileChange::new("src/auth/session.rs", 12, 0),
    ])
}

fn aligned(score: u8) -> Judgment {
    Judgment::new(score, 0.9, AlignmentStatus::Aligned).with_key_functionality(true)
}

struct Harness {
    pipeline: ValidationPipeline,
    fetcher: Arc<FakeStoryFetcher>,
    diffs: Arc<FakeDiffCollector>,
    judge: Arc<FakeAlignmentJudge>,
}

fn harness(config: PipelineConfig, fetcher: FakeStoryFetcher, judge: FakeAlignmentJudge) -> Harness {
    let fetcher = Arc::new(fetcher);
    let diffs = Arc::new(FakeDiffCollector::new(changes()));
    let judge = Arc::new(judge);
    let pipeline =
        ValidationPipeline::new(config, fetcher.clone(), diffs.clone(), judge.clone());
    Harness {
        pipeline,
        fetcher,
        diffs,
        judge,
    }
}

fn three_stories() -> FakeStoryFetcher {
    FakeStoryFetcher::new()
        .with_titled("PROJ-1", "Login form")
        .with_titled("PROJ-2", "Session expiry")
        .with_titled("PROJ-3", "Audit log")
}

/// Test: bypass short-circuits before any collaborator is touched
#[tokio::test]
async fn test_bypass_skips_all_collaborators() {
    let mut config = PipelineConfig::default();
    config.bypass.skip_validation = true;
    let h = harness(config, three_stories(), FakeAlignmentJudge::new(aligned(9)));

    let report = h
        .pipeline
        .validate_commit("PROJ-1 PROJ-2 login", &CommitRange::Staged)
        .await
        .unwrap();

    assert!(report.is_bypassed());
    assert!(!report.is_validated());
    assert_eq!(report.overall, Decision::Pass);
    assert!(report.tickets.is_empty());
    assert_eq!(h.fetcher.calls(), 0, "fetcher must not be called");
    assert_eq!(h.judge.calls(), 0, "judge must not be called");
    assert_eq!(h.diffs.calls(), 0, "diff collector must not be called");
}

/// Test: report order follows extraction order, not completion order
#[tokio::test(start_paused = true)]
async fn test_order_preserved_when_later_ticket_finishes_first() {
    let judge = FakeAlignmentJudge::new(aligned(8))
        .with_delay("PROJ-1", Duration::from_millis(300))
        .with_delay("PROJ-2", Duration::from_millis(10))
        .with_delay("PROJ-3", Duration::from_millis(100));
    let h = harness(PipelineConfig::default(), three_stories(), judge);

    let report = h
        .pipeline
        .validate_commit("[PROJ-1] PROJ-2: wire up PROJ-3", &CommitRange::Staged)
        .await
        .unwrap();

    assert_eq!(
        h.judge.completion_order(),
        vec!["PROJ-2", "PROJ-3", "PROJ-1"],
        "judgments should finish out of order"
    );
    let order: Vec<&str> = report.tickets.iter().map(|t| t.identifier.as_str()).collect();
    assert_eq!(order, vec!["PROJ-1", "PROJ-2", "PROJ-3"]);
    assert_eq!(report.tickets[1].story_title.as_deref(), Some("Session expiry"));
}

/// Test: max_concurrent = 1 serialises evaluation in extraction order
#[tokio::test(start_paused = true)]
async fn test_single_slot_runs_in_order() {
    let mut config = PipelineConfig::default();
    config.max_concurrent = 1;
    let judge = FakeAlignmentJudge::new(aligned(8))
        .with_delay("PROJ-1", Duration::from_millis(300))
        .with_delay("PROJ-2", Duration::from_millis(10));
    let h = harness(config, three_stories(), judge);

    h.pipeline
        .validate_commit("PROJ-1 PROJ-2 PROJ-3", &CommitRange::Staged)
        .await
        .unwrap();

    assert_eq!(h.judge.completion_order(), vec!["PROJ-1", "PROJ-2", "PROJ-3"]);
}

/// Test: an oversized concurrency limit built without validation still runs
#[tokio::test]
async fn test_unvalidated_concurrency_limit_is_clamped() {
    let mut config = PipelineConfig::default();
    config.max_concurrent = usize::MAX;
    let h = harness(config, three_stories(), FakeAlignmentJudge::new(aligned(8)));

    let report = h
        .pipeline
        .validate_commit("PROJ-1 PROJ-2 PROJ-3", &CommitRange::Staged)
        .await
        .unwrap();

    assert_eq!(report.tickets.len(), 3);
    assert_eq!(report.overall, Decision::Pass);
}

/// Test: one failing ticket blocks without aborting the others
#[tokio::test]
async fn test_missing_story_fails_closed() {
    let fetcher = FakeStoryFetcher::new()
        .with_titled("PROJ-1", "Login form")
        .with_titled("PROJ-3", "Audit log");
    let h = harness(PipelineConfig::default(), fetcher, FakeAlignmentJudge::new(aligned(9)));

    let report = h
        .pipeline
        .validate_commit("PROJ-1 PROJ-2 PROJ-3", &CommitRange::Staged)
        .await
        .unwrap();

    assert_eq!(report.tickets.len(), 3);
    assert_eq!(report.tickets[0].decision, Decision::Pass);
    assert_eq!(report.tickets[2].decision, Decision::Pass);

    let missing = &report.tickets[1];
    assert_eq!(missing.decision, Decision::Block);
    assert!(missing.judgment.is_none());
    assert!(missing.reason.contains("not found"));
    assert!(matches!(
        missing.failure,
        Some(TicketFailure::StoryFetchFailed {
            reason: StoryFetchKind::NotFound,
            ..
        })
    ));

    assert_eq!(report.overall, Decision::Block);
    assert_eq!(report.summary.critical_issues, 1);
    assert!((report.summary.average_score - 6.0).abs() < 1e-9);
    assert_eq!(h.judge.calls(), 2, "judge runs only for fetched stories");

    let verdict = IntentGate::evaluate(&report);
    assert_eq!(verdict.exit_code(), EXIT_BLOCK);
}

/// Test: unauthorized fetch is not retried
#[tokio::test]
async fn test_unauthorized_is_not_retried() {
    let fetcher = FakeStoryFetcher::new().with_failure(
        "PROJ-1",
        StoryFetchError::Unauthorized {
            reason: "HTTP 401".to_string(),
        },
    );
    let h = harness(PipelineConfig::default(), fetcher, FakeAlignmentJudge::new(aligned(9)));

    let report = h
        .pipeline
        .validate_commit("PROJ-1", &CommitRange::Staged)
        .await
        .unwrap();

    assert_eq!(report.overall, Decision::Block);
    assert_eq!(h.fetcher.calls(), 1);
}

/// Test: transient story fetch failures are retried within bounds
#[tokio::test(start_paused = true)]
async fn test_transient_fetch_retried() {
    let fetcher = three_stories().with_transient_failures("PROJ-1", 2);
    let h = harness(PipelineConfig::default(), fetcher, FakeAlignmentJudge::new(aligned(8)));

    let report = h
        .pipeline
        .validate_commit("PROJ-1", &CommitRange::Staged)
        .await
        .unwrap();

    assert_eq!(report.overall, Decision::Pass);
    assert_eq!(h.fetcher.calls(), 3);
}

/// Test: retries are bounded; exhausting them fails closed
#[tokio::test(start_paused = true)]
async fn test_transient_fetch_exhausted() {
    let fetcher = three_stories().with_transient_failures("PROJ-1", 10);
    let h = harness(PipelineConfig::default(), fetcher, FakeAlignmentJudge::new(aligned(8)));

    let report = h
        .pipeline
        .validate_commit("PROJ-1", &CommitRange::Staged)
        .await
        .unwrap();

    assert_eq!(report.overall, Decision::Block);
    assert_eq!(h.fetcher.calls(), 3, "max_retries = 2 means 3 attempts");
    assert_eq!(h.judge.calls(), 0);
}

/// Test: a malformed judgment blocks and is not retried
#[tokio::test]
async fn test_malformed_judgment_blocks_once() {
    let judge = FakeAlignmentJudge::new(aligned(9))
        .with_response("PROJ-1", Err(JudgeError::malformed("missing field `score`")));
    let h = harness(PipelineConfig::default(), three_stories(), judge);

    let report = h
        .pipeline
        .validate_commit("PROJ-1: login", &CommitRange::Staged)
        .await
        .unwrap();

    let ticket = &report.tickets[0];
    assert_eq!(ticket.decision, Decision::Block);
    assert!(ticket.reason.contains("score"));
    assert!(matches!(
        ticket.failure,
        Some(TicketFailure::MalformedJudgment { .. })
    ));
    assert_eq!(h.judge.calls(), 1);
}

/// Test: critical-issue override blocks a mid-range score
#[tokio::test]
async fn test_scope_creep_override_blocks() {
    let creep = Judgment::new(6, 0.8, AlignmentStatus::Misaligned)
        .with_discrepancy("adds an unrelated billing migration");
    let judge = FakeAlignmentJudge::new(aligned(9)).with_response("PROJ-2", Ok(creep));
    let h = harness(PipelineConfig::default(), three_stories(), judge);

    let report = h
        .pipeline
        .validate_commit("PROJ-1 PROJ-2", &CommitRange::Staged)
        .await
        .unwrap();

    assert_eq!(report.tickets[0].decision, Decision::Pass);
    assert_eq!(report.tickets[1].decision, Decision::Block);
    assert!(report.tickets[1].reason.starts_with("critical issue"));
    assert_eq!(report.overall, Decision::Block);
}

/// Test: per-ticket decisions fold worst-wins
#[tokio::test]
async fn test_overall_decision_folds_worst() {
    let judge = FakeAlignmentJudge::new(aligned(9))
        .with_response("PROJ-2", Ok(Judgment::new(4, 0.7, AlignmentStatus::PartiallyAligned)))
        .with_response("PROJ-3", Ok(Judgment::new(1, 0.9, AlignmentStatus::Misaligned)));
    let h = harness(PipelineConfig::default(), three_stories(), judge);

    let report = h
        .pipeline
        .validate_commit("PROJ-1 PROJ-2 PROJ-3", &CommitRange::Staged)
        .await
        .unwrap();

    let decisions: Vec<Decision> = report.tickets.iter().map(|t| t.decision).collect();
    assert_eq!(decisions, vec![Decision::Pass, Decision::Warn, Decision::Block]);
    assert_eq!(report.overall, Decision::Block);
    assert_eq!(report.summary.good_alignment, 1);
    assert_eq!(report.summary.low_alignment, 1);
    assert_eq!(report.summary.critical_issues, 1);
}

/// Test: warn-only report passes the gate
#[tokio::test]
async fn test_warn_passes_gate() {
    let judge = FakeAlignmentJudge::new(Judgment::new(4, 0.6, AlignmentStatus::PartiallyAligned));
    let h = harness(PipelineConfig::default(), three_stories(), judge);

    let report = h
        .pipeline
        .validate_commit("PROJ-1 PROJ-2", &CommitRange::Staged)
        .await
        .unwrap();

    assert_eq!(report.overall, Decision::Warn);
    let verdict = IntentGate::evaluate(&report);
    assert!(verdict.passed);
    assert_eq!(verdict.exit_code(), EXIT_OK);
}

/// Test: AI disabled uses the heuristic and never calls the judge
#[tokio::test]
async fn test_heuristic_mode_never_calls_judge() {
    let mut config = PipelineConfig::default();
    config.bypass.ai_enabled = false;
    let fetcher = FakeStoryFetcher::new().with_titled("AUTH-7", "Session login timeout");
    let h = harness(config, fetcher, FakeAlignmentJudge::new(aligned(10)));

    let report = h
        .pipeline
        .validate_commit("AUTH-7 shorter sessions", &CommitRange::Staged)
        .await
        .unwrap();

    assert_eq!(h.judge.calls(), 0);
    assert_eq!(h.fetcher.calls(), 1);
    let judgment = report.tickets[0].judgment.as_ref().unwrap();
    assert_eq!(judgment.source, JudgmentSource::Heuristic);
    assert!(judgment.confidence <= 0.4);
    assert!(judgment.needs_human_review);
}

/// Test: required identifier mode blocks commits without a ticket
#[tokio::test]
async fn test_required_identifier_blocks() {
    let mut config = PipelineConfig::default();
    config.require_identifier = true;
    let h = harness(config, three_stories(), FakeAlignmentJudge::new(aligned(9)));

    let report = h
        .pipeline
        .validate_commit("quick fix", &CommitRange::Staged)
        .await
        .unwrap();

    assert_eq!(report.status, ReportStatus::IdentifierRequired);
    assert_eq!(report.overall, Decision::Block);
    assert_eq!(h.fetcher.calls(), 0);
    assert_eq!(IntentGate::evaluate(&report).exit_code(), EXIT_BLOCK);
}

/// Test: PR validation dedupes identifiers across commits
#[tokio::test]
async fn test_pr_messages_deduped_in_first_seen_order() {
    let h = harness(
        PipelineConfig::default(),
        three_stories(),
        FakeAlignmentJudge::new(aligned(8)),
    );
    let messages = vec![
        "PROJ-3: audit table".to_string(),
        "PROJ-1 login form".to_string(),
        "follow-up for PROJ-3".to_string(),
    ];

    let report = h
        .pipeline
        .validate_messages(
            &messages,
            &CommitRange::Range {
                base: "main".to_string(),
                head: "HEAD".to_string(),
            },
        )
        .await
        .unwrap();

    let order: Vec<&str> = report.tickets.iter().map(|t| t.identifier.as_str()).collect();
    assert_eq!(order, vec!["PROJ-3", "PROJ-1"]);
    assert_eq!(h.diffs.calls(), 1, "diff is collected once per run");
    assert!(render_markdown(&report).contains("### PROJ-3: Audit log"));
}

fn run_git(repo_dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_dir)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Test: staged changes from a real repository reach the judge
#[tokio::test]
async fn test_git_staged_changes_end_to_end() {
    let repo = tempfile::tempdir().unwrap();
    run_git(repo.path(), &["init"]);
    run_git(repo.path(), &["config", "user.name", "test-user"]);
    run_git(repo.path(), &["config", "user.email", "test@example.com"]);
    run_git(repo.path(), &["config", "commit.gpgsign", "false"]);
    run_git(repo.path(), &["commit", "--allow-empty", "-m", "initial"]);
    std::fs::write(repo.path().join("audit.rs"), "pub fn audit() {}\n").unwrap();
    run_git(repo.path(), &["add", "audit.rs"]);

    let fetcher = Arc::new(three_stories());
    let judge = Arc::new(FakeAlignmentJudge::new(aligned(9)));
    let pipeline = ValidationPipeline::new(
        PipelineConfig::default(),
        fetcher.clone(),
        Arc::new(GitDiffCollector::new(repo.path())),
        judge.clone(),
    );

    let report = pipeline
        .validate_commit("PROJ-3 add audit hook", &CommitRange::Staged)
        .await
        .unwrap();

    assert_eq!(report.overall, Decision::Pass);
    assert_eq!(judge.calls(), 1);
}
