//! Git-backed [`DiffCollector`] and repository helpers.

use std::path::{Path, PathBuf};
use std::process::{Command as StdCommand, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::collaborators::{CommitRange, DiffCollector};
use crate::domain::changeset::{ChangeSet, DEFAULT_MAX_SUMMARY_LINES};
use crate::domain::error::{IntentError, Result};

const DIFF_FLAGS: &[&str] = &["--no-color", "--no-ext-diff", "-M"];

/// Runs `git` in a working tree to produce changesets and commit messages.
#[derive(Debug, Clone)]
pub struct GitDiffCollector {
    repo_dir: PathBuf,
    timeout: Duration,
    max_summary_lines: usize,
}

impl GitDiffCollector {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            timeout: Duration::from_secs(60),
            max_summary_lines: DEFAULT_MAX_SUMMARY_LINES,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_summary_lines(mut self, lines: usize) -> Self {
        self.max_summary_lines = lines;
        self
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    /// Full messages of the commits in `base..head`, oldest first.
    pub async fn commit_messages(&self, base: &str, head: &str) -> Result<Vec<String>> {
        let range = format!("{base}..{head}");
        let out = self
            .run(&["log", "--reverse", "--pretty=format:%B%x00", &range])
            .await?;
        Ok(out
            .split('\0')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        debug!(args = ?args, dir = %self.repo_dir.display(), "running git");

        let child = Command::new("git")
            .args(args)
            .current_dir(&self.repo_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| IntentError::GitError(format!("failed to run git: {e}")))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                IntentError::GitError(format!(
                    "git {} timed out after {}ms",
                    args.join(" "),
                    self.timeout.as_millis()
                ))
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(IntentError::GitError(format!(
                "git {} failed: {}",
                args.first().copied().unwrap_or_default(),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl DiffCollector for GitDiffCollector {
    async fn collect(&self, range: &CommitRange) -> Result<ChangeSet> {
        let revision = match range {
            CommitRange::Range { base, head } => format!("{base}...{head}"),
            CommitRange::Commit(sha) => sha.clone(),
            CommitRange::Staged => String::new(),
        };

        let mut args: Vec<&str> = match range {
            CommitRange::Staged => vec!["diff", "--cached"],
            CommitRange::Commit(_) => vec!["show", "--format="],
            CommitRange::Range { .. } => vec!["diff"],
        };
        args.extend(DIFF_FLAGS);
        if !revision.is_empty() {
            args.push(revision.as_str());
        }

        let diff = self.run(&args).await?;
        let changeset = ChangeSet::from_unified_diff(&diff, self.max_summary_lines);
        debug!(range = %range, files = changeset.len(), "collected changeset");
        Ok(changeset)
    }
}

/// Check whether a directory is inside a git work tree.
pub fn is_git_repo(dir: &Path) -> bool {
    StdCommand::new("git")
        .args(["rev-parse", "--is-inside-work-tree"])
        .current_dir(dir)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Resolve the hooks directory (honours `core.hooksPath` and worktrees).
pub fn hooks_dir(repo_dir: &Path) -> Result<PathBuf> {
    let output = StdCommand::new("git")
        .args(["rev-parse", "--git-path", "hooks"])
        .current_dir(repo_dir)
        .output()
        .map_err(|e| IntentError::GitError(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(IntentError::GitError(format!(
            "not a git repository: {}",
            stderr.trim()
        )));
    }

    let raw = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if raw.is_empty() {
        return Err(IntentError::GitError(
            "git rev-parse --git-path hooks returned empty output".to_string(),
        ));
    }
    let path = PathBuf::from(raw);
    Ok(if path.is_absolute() {
        path
    } else {
        repo_dir.join(path)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_git(repo_dir: &Path, args: &[&str]) -> String {
        let output = StdCommand::new("git")
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
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    fn make_git_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        run_git(dir.path(), &["init"]);
        run_git(dir.path(), &["config", "user.name", "test-user"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["config", "commit.gpgsign", "false"]);
        run_git(dir.path(), &["commit", "--allow-empty", "-m", "initial"]);
        dir
    }

    fn commit_file(repo: &Path, name: &str, body: &str, message: &str) -> String {
        std::fs::write(repo.join(name), body).unwrap();
        run_git(repo, &["add", name]);
        run_git(repo, &["commit", "-m", message]);
        run_git(repo, &["rev-parse", "HEAD"])
    }

    #[tokio::test]
    async fn staged_changes_are_collected() {
        let repo = make_git_repo();
        std::fs::write(repo.path().join("login.rs"), "fn login() {}\nfn logout() {}\n").unwrap();
        run_git(repo.path(), &["add", "login.rs"]);

        let changes = GitDiffCollector::new(repo.path())
            .collect(&CommitRange::Staged)
            .await
            .unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes.files[0].path, "login.rs");
        assert_eq!(changes.files[0].additions, 2);
    }

    #[tokio::test]
    async fn nothing_staged_is_empty_changeset() {
        let repo = make_git_repo();
        let changes = GitDiffCollector::new(repo.path())
            .collect(&CommitRange::Staged)
            .await
            .unwrap();
        assert!(changes.is_empty());
    }

    #[tokio::test]
    async fn single_commit_is_collected() {
        let repo = make_git_repo();
        let sha = commit_file(repo.path(), "a.txt", "one\n", "PROJ-1: add a");
        let changes = GitDiffCollector::new(repo.path())
            .collect(&CommitRange::Commit(sha))
            .await
            .unwrap();
        assert_eq!(changes.paths().collect::<Vec<_>>(), vec!["a.txt"]);
    }

    #[tokio::test]
    async fn range_diff_and_messages() {
        let repo = make_git_repo();
        let base = run_git(repo.path(), &["rev-parse", "HEAD"]);
        commit_file(repo.path(), "a.txt", "one\n", "PROJ-1: add a");
        commit_file(repo.path(), "b.txt", "two\n", "[OPS-7] add b\n\nbody line");

        let collector = GitDiffCollector::new(repo.path());
        let changes = collector
            .collect(&CommitRange::Range {
                base: base.clone(),
                head: "HEAD".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(changes.len(), 2);

        let messages = collector.commit_messages(&base, "HEAD").await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], "PROJ-1: add a");
        assert!(messages[1].starts_with("[OPS-7] add b"));
        assert!(messages[1].contains("body line"));
    }

    #[tokio::test]
    async fn collect_fails_outside_repo() {
        let dir = tempfile::tempdir().unwrap();
        let result = GitDiffCollector::new(dir.path())
            .collect(&CommitRange::Commit("HEAD".to_string()))
            .await;
        assert!(matches!(result, Err(IntentError::GitError(_))));
    }

    #[test]
    fn is_git_repo_detects_repo() {
        let repo = make_git_repo();
        assert!(is_git_repo(repo.path()));
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_git_repo(dir.path()));
    }

    #[test]
    fn hooks_dir_resolves_inside_repo() {
        let repo = make_git_repo();
        let hooks = hooks_dir(repo.path()).unwrap();
        assert!(hooks.ends_with("hooks"));
        assert!(hooks.starts_with(repo.path()));
    }
}
