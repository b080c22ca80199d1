//! Title-keyword heuristic used when AI judging is disabled.
//!
//! Scores the share of significant title words that appear in changed paths
//! or hunk summaries. Confidence never exceeds [`MAX_HEURISTIC_CONFIDENCE`]
//! and the result never carries discrepancies, so the critical override
//! cannot fire on a heuristic judgment.

use std::collections::BTreeSet;

use crate::domain::changeset::ChangeSet;
use crate::domain::judgment::{AlignmentStatus, Judgment, JudgmentSource, MAX_SCORE};
use crate::domain::story::Story;

/// Upper bound on heuristic confidence.
pub const MAX_HEURISTIC_CONFIDENCE: f64 = 0.4;

const MIN_KEYWORD_LEN: usize = 3;

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "from", "into", "that", "this", "when", "should", "must", "add",
    "fix", "update", "new", "use", "make", "allow", "support", "can", "are", "not", "all",
];

/// Significant lowercase words of a story title, de-duplicated.
pub fn title_keywords(title: &str) -> BTreeSet<String> {
    title
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| w.len() >= MIN_KEYWORD_LEN)
        .filter(|w| !w.chars().all(|c| c.is_ascii_digit()))
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
        .collect()
}

/// Reduced-confidence judgment from keyword overlap.
pub fn heuristic_judgment(story: &Story, changeset: &ChangeSet) -> Judgment {
    if changeset.is_empty() {
        return Judgment::new(0, MAX_HEURISTIC_CONFIDENCE / 2.0, AlignmentStatus::Misaligned)
            .with_source(JudgmentSource::Heuristic)
            .with_suggestion("no files changed; nothing implements this story");
    }

    let keywords = title_keywords(&story.title);
    let haystack: String = changeset
        .files
        .iter()
        .map(|f| format!("{}\n{}\n", f.path, f.hunk_summary))
        .collect::<String>()
        .to_lowercase();

    let matched: Vec<&String> = keywords.iter().filter(|k| haystack.contains(k.as_str())).collect();

    let ratio = if keywords.is_empty() {
        0.5
    } else {
        matched.len() as f64 / keywords.len() as f64
    };
    let score = (ratio * f64::from(MAX_SCORE)).round() as u8;
    let status = if score >= 7 {
        AlignmentStatus::Aligned
    } else if score >= 4 {
        AlignmentStatus::PartiallyAligned
    } else {
        AlignmentStatus::Misaligned
    };

    let mut judgment = Judgment::new(score, 0.2 + 0.2 * ratio, status)
        .with_source(JudgmentSource::Heuristic)
        .with_key_functionality(ratio >= 0.5);
    for keyword in matched {
        judgment = judgment.with_match(format!("title keyword `{keyword}` appears in the changes"));
    }
    judgment.needs_human_review = true;
    judgment.with_suggestion("AI validation is disabled; score is a keyword-overlap estimate")
}
