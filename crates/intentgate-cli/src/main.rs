//! IntentGate CLI
//!
//! The `intentgate` command checks that commits implement the tickets they
//! reference.
//!
//! ## Commands
//!
//! - `check-commit`: validate a commit message against staged changes (commit-msg hook)
//! - `validate-pr`: validate every commit of a PR against the range diff (CI)
//! - `extract`: print the ticket identifiers found in some text
//! - `install-hooks`: install the commit-msg hook into a repository

mod hooks;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tracing::{debug, warn, Level};

use intentgate_ci::{
    render_console, write_json, write_markdown, IntentGate, ValidationPipeline, COMMENT_FILE,
    EXIT_BLOCK, EXIT_OK, EXIT_USAGE, RESULTS_FILE,
};
use intentgate_core::{
    extract_identifiers, hooks_dir, init_tracing, is_git_repo, AlignmentJudge, BypassGate,
    BypassMode, ChangeSet, CommitRange, Decision, GitDiffCollector, Identifier, JudgeError,
    Judgment, PipelineConfig, Story, StoryFetchError, StoryFetcher, ValidationReport,
};
use intentgate_jira::JiraClient;
use intentgate_judge::{AiAlignmentJudge, OpenAiTransport};

/// Config file looked up in the repository root when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "intentgate.toml";
/// Git's marker below which `commit -v` appends the diff.
const SCISSORS: &str = "# ------------------------ >8 ------------------------";

#[derive(Parser)]
#[command(name = "intentgate")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Validate that commits implement the tickets they reference", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Path to a TOML config file (default: intentgate.toml in the repository)
    #[arg(long, global = true, env = "INTENTGATE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a commit message against the staged changes
    CheckCommit {
        /// File holding the commit message (git passes it to commit-msg hooks)
        #[arg(long)]
        message_file: PathBuf,

        /// Repository to read staged changes from
        #[arg(long, default_value = ".")]
        repo: PathBuf,
    },

    /// Validate all commits of a pull request against the range diff
    ValidatePr {
        /// Base ref of the pull request
        #[arg(long, env = "GITHUB_BASE_REF")]
        base: String,

        /// Head commit of the pull request
        #[arg(long, env = "GITHUB_SHA", default_value = "HEAD")]
        head: String,

        /// Remote to prefix the base ref with, e.g. `origin`
        #[arg(long)]
        remote: Option<String>,

        /// Repository to read commits from
        #[arg(long, default_value = ".")]
        repo: PathBuf,

        /// Directory for validation_results.json and pr_comment.md
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Print the ticket identifiers found in text, one per line
    Extract {
        /// Text to scan (reads --message-file when omitted)
        text: Option<String>,

        /// File to scan instead of TEXT
        #[arg(long, conflicts_with = "text")]
        message_file: Option<PathBuf>,
    },

    /// Install the commit-msg hook into a repository
    InstallHooks {
        /// Repository to install into
        #[arg(long, default_value = ".")]
        repo: PathBuf,

        /// Command the hook runs
        #[arg(long, default_value = "intentgate")]
        binary: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    init_tracing(cli.json, level);

    let code = match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("intentgate: {err:#}");
            EXIT_USAGE
        }
    };
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

async fn run(cli: Cli) -> Result<i32> {
    let config_path = cli.config;
    match cli.command {
        Commands::CheckCommit { message_file, repo } => {
            let config = load_config(config_path.as_deref(), &repo)?;
            cmd_check_commit(config, &message_file, &repo).await
        }
        Commands::ValidatePr {
            base,
            head,
            remote,
            repo,
            output_dir,
        } => {
            let config = load_config(config_path.as_deref(), &repo)?;
            let base = match remote {
                Some(remote) => format!("{remote}/{base}"),
                None => base,
            };
            cmd_validate_pr(config, &base, &head, &repo, &output_dir).await
        }
        Commands::Extract { text, message_file } => cmd_extract(text, message_file.as_deref()),
        Commands::InstallHooks { repo, binary } => cmd_install_hooks(&repo, &binary),
    }
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

/// File (explicit or default), then environment overrides.
fn load_config(explicit: Option<&Path>, repo: &Path) -> Result<PipelineConfig> {
    let mut config = match explicit {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => {
            let path = repo.join(DEFAULT_CONFIG_FILE);
            if path.is_file() {
                PipelineConfig::load(&path)
                    .with_context(|| format!("failed to load config {}", path.display()))?
            } else {
                PipelineConfig::default()
            }
        }
    };
    config
        .apply_process_env()
        .context("invalid environment override")?;
    debug!(?config, "effective configuration");
    Ok(config)
}

/// Stands in for a collaborator that is not configured or not needed.
///
/// Any call fails, so a ticket that reaches it is blocked with `reason`.
struct Unconfigured {
    reason: String,
}

impl Unconfigured {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl StoryFetcher for Unconfigured {
    async fn fetch(&self, _id: &Identifier) -> std::result::Result<Story, StoryFetchError> {
        Err(StoryFetchError::Unauthorized {
            reason: self.reason.clone(),
        })
    }
}

#[async_trait]
impl AlignmentJudge for Unconfigured {
    async fn judge(
        &self,
        _story: &Story,
        _changeset: &ChangeSet,
    ) -> std::result::Result<Judgment, JudgeError> {
        Err(JudgeError::Unavailable {
            attempts: 0,
            reason: self.reason.clone(),
        })
    }
}

fn story_fetcher() -> Arc<dyn StoryFetcher> {
    match JiraClient::from_env() {
        Ok(client) => Arc::new(client),
        Err(err) => {
            warn!(error = %err, "Jira is not configured");
            Arc::new(Unconfigured::new(err.to_string()))
        }
    }
}

fn ai_judge(config: &PipelineConfig) -> Arc<dyn AlignmentJudge> {
    match OpenAiTransport::from_env() {
        Ok(transport) => Arc::new(AiAlignmentJudge::new(transport, config.judge)),
        Err(err) => {
            warn!(error = %err, "AI judge is not configured");
            Arc::new(Unconfigured::new(err.to_string()))
        }
    }
}

/// Collaborators are only built for the modes that use them.
fn build_pipeline(config: PipelineConfig, repo: &Path) -> ValidationPipeline {
    let mode = BypassGate::new(config.bypass).mode();

    let fetcher: Arc<dyn StoryFetcher> = match mode {
        BypassMode::Skip => Arc::new(Unconfigured::new("validation skipped")),
        _ => story_fetcher(),
    };
    let judge: Arc<dyn AlignmentJudge> = match mode {
        BypassMode::Full => ai_judge(&config),
        _ => Arc::new(Unconfigured::new("AI judging is disabled")),
    };
    let diffs = Arc::new(
        GitDiffCollector::new(repo).with_max_summary_lines(config.max_patch_lines_per_file),
    );

    ValidationPipeline::new(config, fetcher, diffs, judge)
}

/// Message text as git would record it: comment lines and anything below
/// the scissors line are dropped.
fn commit_message_body(raw: &str) -> String {
    raw.lines()
        .take_while(|line| *line != SCISSORS)
        .filter(|line| !line.starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Print the console summary and gate verdict; return the exit code.
fn finish(report: &ValidationReport) -> i32 {
    println!("{}", render_console(report));
    let verdict = IntentGate::evaluate(report);
    if !verdict.passed {
        println!("Gate: ✗ BLOCKED ({})", verdict.message);
        for violation in &verdict.violations {
            println!("  - {violation}");
        }
    } else if verdict.decision != Decision::Pass {
        println!("Gate: ✓ PASSED ({})", verdict.message);
    }
    verdict.exit_code()
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn cmd_check_commit(config: PipelineConfig, message_file: &Path, repo: &Path) -> Result<i32> {
    let raw = std::fs::read_to_string(message_file)
        .with_context(|| format!("failed to read {}", message_file.display()))?;
    let message = commit_message_body(&raw);

    let pipeline = build_pipeline(config, repo);
    match pipeline.validate_commit(&message, &CommitRange::Staged).await {
        Ok(report) => Ok(finish(&report)),
        Err(err) => {
            println!("BLOCK  intent validation could not run: {err}");
            Ok(EXIT_BLOCK)
        }
    }
}

async fn cmd_validate_pr(
    config: PipelineConfig,
    base: &str,
    head: &str,
    repo: &Path,
    output_dir: &Path,
) -> Result<i32> {
    println!("Validating PR: {base}..{head}");

    let git = GitDiffCollector::new(repo);
    let range = CommitRange::Range {
        base: base.to_string(),
        head: head.to_string(),
    };
    let pipeline = build_pipeline(config, repo);

    // A skipped run must not depend on the range being resolvable.
    let validated = if pipeline.mode() == BypassMode::Skip {
        pipeline.validate_messages(&[], &range).await
    } else {
        match git.commit_messages(base, head).await {
            Ok(messages) => pipeline.validate_messages(&messages, &range).await,
            Err(err) => Err(err),
        }
    };
    let report = match validated {
        Ok(report) => report,
        Err(err) => {
            println!("BLOCK  intent validation could not run: {err}");
            return Ok(EXIT_BLOCK);
        }
    };

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    write_json(&report, &output_dir.join(RESULTS_FILE))?;
    write_markdown(&report, &output_dir.join(COMMENT_FILE))?;

    Ok(finish(&report))
}

fn cmd_extract(text: Option<String>, message_file: Option<&Path>) -> Result<i32> {
    let text = match (text, message_file) {
        (Some(text), _) => text,
        (None, Some(path)) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            commit_message_body(&raw)
        }
        (None, None) => anyhow::bail!("provide TEXT or --message-file"),
    };

    for id in extract_identifiers(&text) {
        println!("{id}");
    }
    Ok(EXIT_OK)
}

fn cmd_install_hooks(repo: &Path, binary: &str) -> Result<i32> {
    if !is_git_repo(repo) {
        anyhow::bail!("{} is not a git repository", repo.display());
    }
    let dir = hooks_dir(repo)?;
    let installed = hooks::install_commit_msg_hook(&dir, binary)?;

    if let Some(backup) = &installed.backup {
        println!("Backed up existing hook to {}", backup.display());
    }
    println!("✓ Installed {}", installed.path.display());
    Ok(EXIT_OK)
}
