//! Judge prompt construction.
//!
//! The user message always carries the story title, type, description and
//! the changed files with per-file summaries, and instructs the judge to
//! (a) give an integer score 0-10, (b) flag changes the story does not
//! mention or imply as discrepancies, and (c) list matches, discrepancies
//! and suggestions separately.

use std::fmt::Write as _;

use intentgate_core::{ChangeSet, JudgmentRequest, Story};
use serde::Serialize;

/// System message sent with every request.
pub const SYSTEM_PROMPT: &str =
    "You are an expert code reviewer judging whether code changes implement a ticket. \
     Be strict. Always respond with a single valid JSON object.";

const RUBRIC: &str = "\
SCORING RUBRIC (integer 0-10):
- 0-2: the key functionality the ticket asks for is absent
- 3-4: the changes barely relate to the ticket
- 5-6: partial implementation, or significant unrelated changes
- 7-8: good implementation with minor gaps or slight scope issues
- 9-10: the changes fully implement the ticket";

const RESPONSE_SCHEMA: &str = r#"{
  "score": <integer 0-10>,
  "confidence": <number 0.0-1.0>,
  "status": "<aligned|partially_aligned|misaligned>",
  "key_functionality_present": <true|false>,
  "matches": ["what in the changes implements the ticket"],
  "discrepancies": ["missing functionality and every out-of-scope change"],
  "suggestions": ["how to close the gaps"],
  "intent_summary": "the key functionality the ticket asks for",
  "actual_changes": "what the changes actually do",
  "risk_level": "<low|medium|high>",
  "needs_human_review": <true|false>
}"#;

/// A rendered judge request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JudgePrompt {
    pub system: String,
    pub user: String,
}

/// Render the prompt for a (story, changeset) pair.
pub fn build_prompt(request: &JudgmentRequest<'_>) -> JudgePrompt {
    let mut user = String::new();
    write_story(&mut user, request.story);
    write_changes(&mut user, request.changeset);

    user.push_str("\n## Instructions\n");
    user.push_str(
        "(a) Assign an integer score from 0 to 10 reflecting how well the changes \
         implement the intent stated in the ticket.\n",
    );
    user.push_str(
        "(b) Flag every changed file or area that the ticket does not mention or imply \
         as a discrepancy.\n",
    );
    user.push_str("(c) Produce separate lists of matches, discrepancies and suggestions.\n");
    user.push_str(
        "If the key functionality is missing from the changes the score must be 0-2. \
         A low score is a valid answer.\n\n",
    );
    user.push_str(RUBRIC);
    user.push_str("\n\nRespond with JSON only, in exactly this shape:\n");
    user.push_str(RESPONSE_SCHEMA);
    user.push('\n');

    JudgePrompt {
        system: SYSTEM_PROMPT.to_string(),
        user,
    }
}

fn write_story(out: &mut String, story: &Story) {
    let _ = writeln!(out, "## Ticket {}", story.id);
    let _ = writeln!(out, "Title: {}", story.title);
    let _ = writeln!(out, "Type: {}", story.story_type);
    if !story.status.is_empty() {
        let _ = writeln!(out, "Status: {}", story.status);
    }
    if let Some(priority) = &story.priority {
        let _ = writeln!(out, "Priority: {priority}");
    }
    if !story.components.is_empty() {
        let _ = writeln!(out, "Components: {}", story.components.join(", "));
    }
    if !story.labels.is_empty() {
        let _ = writeln!(out, "Labels: {}", story.labels.join(", "));
    }

    out.push_str("\nDescription:\n");
    if story.description.trim().is_empty() {
        out.push_str("(no description)\n");
    } else {
        let _ = writeln!(out, "{}", story.description.trim());
    }

    if !story.acceptance_criteria.trim().is_empty() {
        let _ = writeln!(
            out,
            "\nAcceptance criteria:\n{}",
            story.acceptance_criteria.trim()
        );
    }
}

fn write_changes(out: &mut String, changeset: &ChangeSet) {
    out.push_str("\n## Code changes\n");
    let _ = writeln!(out, "Language detected: {}", detect_language(changeset));

    if changeset.is_empty() {
        out.push_str("No files changed.\n");
        return;
    }

    let _ = writeln!(
        out,
        "{} file(s) changed, +{} -{}",
        changeset.len(),
        changeset.total_additions(),
        changeset.total_deletions()
    );
    for file in &changeset.files {
        let _ = writeln!(out, "\n### {} (+{} -{})", file.path, file.additions, file.deletions);
        if !file.hunk_summary.is_empty() {
            out.push_str("```diff\n");
            out.push_str(&file.hunk_summary);
            if !file.hunk_summary.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("```\n");
        }
    }
}

fn language_for(path: &str) -> Option<&'static str> {
    let ext = path.rsplit_once('.')?.1.to_ascii_lowercase();
    let lang = match ext.as_str() {
        "py" => "Python",
        "js" | "jsx" => "JavaScript",
        "ts" | "tsx" => "TypeScript",
        "java" => "Java",
        "go" => "Go",
        "rs" => "Rust",
        "cpp" | "hpp" | "cc" | "h" => "C++",
        "rb" => "Ruby",
        "php" => "PHP",
        _ => return None,
    };
    Some(lang)
}

/// Most frequent language among changed files; ties go to the language seen
/// first. `"Unknown"` when nothing is recognised.
pub fn detect_language(changeset: &ChangeSet) -> &'static str {
    let mut counts: Vec<(&'static str, usize)> = Vec::new();
    for lang in changeset.paths().filter_map(language_for) {
        match counts.iter_mut().find(|(l, _)| *l == lang) {
            Some((_, n)) => *n += 1,
            None => counts.push((lang, 1)),
        }
    }

    let mut best: Option<(&'static str, usize)> = None;
    for (lang, n) in counts {
        if best.map_or(true, |(_, top)| n > top) {
            best = Some((lang, n));
        }
    }
    best.map_or("Unknown", |(lang, _)| lang)
}
