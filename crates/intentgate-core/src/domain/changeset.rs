//! Changed-file records supplied by a [`crate::collaborators::DiffCollector`].
//!
//! A [`ChangeSet`] is read-only to the pipeline. An empty changeset is a valid
//! input and is still judged.

use serde::{Deserialize, Serialize};

/// Default cap on changed lines kept per file in a hunk summary.
pub const DEFAULT_MAX_SUMMARY_LINES: usize = 40;

/// One changed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub additions: u32,
    pub deletions: u32,
    /// Hunk headers and changed lines, truncated to a fixed line budget.
    pub hunk_summary: String,
}

impl FileChange {
    pub fn new(path: impl Into<String>, additions: u32, deletions: u32) -> Self {
        Self {
            path: path.into(),
            additions,
            deletions,
            hunk_summary: String::new(),
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.hunk_summary = summary.into();
        self
    }
}

/// Ordered sequence of changed files for a commit or range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub files: Vec<FileChange>,
}

impl ChangeSet {
    pub fn new(files: Vec<FileChange>) -> Self {
        Self { files }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn total_additions(&self) -> u32 {
        self.files.iter().map(|f| f.additions).sum()
    }

    pub fn total_deletions(&self) -> u32 {
        self.files.iter().map(|f| f.deletions).sum()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.path.as_str())
    }

    /// Parse `git diff` output into a changeset.
    ///
    /// `max_summary_lines` bounds how many hunk headers and changed lines are
    /// kept per file; the remainder is reported as a count.
    pub fn from_unified_diff(diff: &str, max_summary_lines: usize) -> Self {
        let mut files = Vec::new();
        let mut current: Option<FileAccumulator> = None;

        for line in diff.lines() {
            if let Some(rest) = line.strip_prefix("diff --git ") {
                if let Some(acc) = current.take() {
                    files.push(acc.finish());
                }
                current = Some(FileAccumulator::new(path_from_git_header(rest), max_summary_lines));
                continue;
            }

            if current.is_none() && line.starts_with("--- ") {
                current = Some(FileAccumulator::new(String::new(), max_summary_lines));
                continue;
            }

            let Some(acc) = current.as_mut() else {
                continue;
            };

            if !acc.in_hunk {
                if let Some(path) = line.strip_prefix("+++ ") {
                    if let Some(path) = strip_diff_prefix(path) {
                        acc.path = path;
                    }
                    continue;
                }
                if let Some(path) = line.strip_prefix("rename to ") {
                    acc.path = path.to_string();
                    continue;
                }
                if line.starts_with("Binary files ") {
                    acc.push_summary("binary file changed".to_string());
                    continue;
                }
            }

            if line.starts_with("@@") {
                acc.in_hunk = true;
                acc.push_summary(line.to_string());
            } else if acc.in_hunk {
                if line.starts_with('+') {
                    acc.additions += 1;
                    acc.push_summary(line.to_string());
                } else if line.starts_with('-') {
                    acc.deletions += 1;
                    acc.push_summary(line.to_string());
                }
            }
        }

        if let Some(acc) = current.take() {
            files.push(acc.finish());
        }

        files.retain(|f| !f.path.is_empty());
        Self { files }
    }
}

struct FileAccumulator {
    path: String,
    additions: u32,
    deletions: u32,
    in_hunk: bool,
    summary: Vec<String>,
    dropped: usize,
    max_lines: usize,
}

impl FileAccumulator {
    fn new(path: String, max_lines: usize) -> Self {
        Self {
            path,
            additions: 0,
            deletions: 0,
            in_hunk: false,
            summary: Vec::new(),
            dropped: 0,
            max_lines,
        }
    }

    fn push_summary(&mut self, line: String) {
        if self.summary.len() < self.max_lines {
            self.summary.push(line);
        } else {
            self.dropped += 1;
        }
    }

    fn finish(self) -> FileChange {
        let mut hunk_summary = self.summary.join("\n");
        if self.dropped > 0 {
            hunk_summary.push_str(&format!("\n... ({} more line(s) omitted)", self.dropped));
        }
        FileChange {
            path: self.path,
            additions: self.additions,
            deletions: self.deletions,
            hunk_summary,
        }
    }
}

/// `a/src/lib.rs b/src/lib.rs` -> `src/lib.rs`
fn path_from_git_header(rest: &str) -> String {
    rest.rsplit_once(" b/")
        .map(|(_, path)| path.to_string())
        .unwrap_or_else(|| rest.to_string())
}

fn strip_diff_prefix(path: &str) -> Option<String> {
    let path = path.trim_end();
    if path == "/dev/null" {
        return None;
    }
    Some(
        path.strip_prefix("b/")
            .or_else(|| path.strip_prefix("a/"))
            .unwrap_or(path)
            .to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
diff --git a/src/auth.rs b/src/auth.rs
index 1111111..2222222 100644
--- a/src/auth.rs
+++ b/src/auth.rs
@@ -1,3 +1,5 @@ mod auth
 use std::fmt;
+use oauth2::Client;
+
 fn login() {
-    todo!()
+    Client::new()
 }
diff --git a/README.md b/README.md
deleted file mode 100644
--- a/README.md
+++ /dev/null
@@ -1 +0,0 @@
-# readme
";

    #[test]
    fn test_parses_files_and_counts() {
        let cs = ChangeSet::from_unified_diff(SAMPLE, DEFAULT_MAX_SUMMARY_LINES);
        assert_eq!(cs.len(), 2);
        assert_eq!(cs.files[0].path, "src/auth.rs");
        assert_eq!(cs.files[0].additions, 3);
        assert_eq!(cs.files[0].deletions, 1);
        assert!(cs.files[0].hunk_summary.contains("+use oauth2::Client;"));
        assert_eq!(cs.files[1].path, "README.md");
        assert_eq!(cs.files[1].deletions, 1);
        assert_eq!(cs.total_additions(), 3);
        assert_eq!(cs.total_deletions(), 2);
    }

    #[test]
    fn test_header_lines_are_not_counted() {
        let cs = ChangeSet::from_unified_diff(SAMPLE, DEFAULT_MAX_SUMMARY_LINES);
        assert!(!cs.files[0].hunk_summary.contains("+++"));
        assert!(!cs.files[0].hunk_summary.contains("--- a/"));
    }

    #[test]
    fn test_summary_truncation() {
        let cs = ChangeSet::from_unified_diff(SAMPLE, 2);
        assert_eq!(cs.files[0].additions, 3);
        assert!(cs.files[0].hunk_summary.contains("more line(s) omitted"));
    }

    #[test]
    fn test_empty_diff_yields_empty_changeset() {
        let cs = ChangeSet::from_unified_diff("", DEFAULT_MAX_SUMMARY_LINES);
        assert!(cs.is_empty());
    }

    #[test]
    fn test_rename_and_binary() {
        let diff = "\
diff --git a/old.png b/new.png
similarity index 90%
rename from old.png
rename to new.png
Binary files a/old.png and b/new.png differ
";
        let cs = ChangeSet::from_unified_diff(diff, DEFAULT_MAX_SUMMARY_LINES);
        assert_eq!(cs.files[0].path, "new.png");
        assert_eq!(cs.files[0].hunk_summary, "binary file changed");
    }
}
