//! Report sinks: Markdown PR comment, JSON artifact and console summary.

use std::path::Path;

use anyhow::{Context, Result};
use intentgate_core::{
    Decision, Judgment, JudgmentSource, ReportStatus, TicketOutcome, ValidationReport, MAX_SCORE,
};

/// Default file name of the JSON artifact.
pub const RESULTS_FILE: &str = "validation_results.json";
/// Default file name of the PR comment.
pub const COMMENT_FILE: &str = "pr_comment.md";

const HEADING: &str = "## Intent Validation Report";
/// List items shown per section in the PR comment.
const MAX_ITEMS: usize = 3;

fn decision_badge(decision: Decision) -> &'static str {
    match decision {
        Decision::Pass => "✅ PASS",
        Decision::Warn => "⚠️ WARN",
        Decision::Block => "❌ BLOCK",
    }
}

fn push_list(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push_str(&format!("**{title}:**\n"));
    for item in items.iter().take(MAX_ITEMS) {
        out.push_str(&format!("- {item}\n"));
    }
    out.push('\n');
}

fn push_judged(out: &mut String, ticket: &TicketOutcome, judgment: &Judgment) {
    out.push_str(&format!(
        "**Alignment Score:** {}/{} (Confidence: {:.0}%)\n",
        judgment.score,
        MAX_SCORE,
        judgment.confidence * 100.0
    ));
    out.push_str(&format!("**Status:** {}\n", judgment.status));
    out.push_str(&format!("**Decision:** {}\n", decision_badge(ticket.decision)));
    out.push_str(&format!(
        "**Key Functionality Present:** {}\n",
        if judgment.key_functionality_present {
            "Yes"
        } else {
            "No"
        }
    ));
    if let Some(risk) = judgment.risk_level {
        out.push_str(&format!("**Risk:** {risk}\n"));
    }
    if judgment.source == JudgmentSource::Heuristic {
        out.push_str("_Scored from story title keywords; AI judging is disabled._\n");
    }
    if judgment.needs_human_review {
        out.push_str("_Needs human review._\n");
    }
    out.push('\n');

    if ticket.decision != Decision::Pass {
        out.push_str(&format!("> {}\n\n", ticket.reason));
    }

    push_list(out, "What Aligns", &judgment.matches);
    push_list(out, "Discrepancies", &judgment.discrepancies);
    push_list(out, "Suggestions", &judgment.suggestions);
}

fn push_ticket(out: &mut String, ticket: &TicketOutcome) {
    match &ticket.story_title {
        Some(title) if !title.is_empty() => {
            out.push_str(&format!("### {}: {}\n", ticket.identifier, title))
        }
        _ => out.push_str(&format!("### {}\n", ticket.identifier)),
    }

    match &ticket.judgment {
        Some(judgment) => push_judged(out, ticket, judgment),
        None => {
            out.push_str(&format!("**Decision:** {}\n", decision_badge(ticket.decision)));
            out.push_str(&format!("**Error:** {}\n\n", ticket.reason));
        }
    }
}

/// Render the report as a Markdown PR comment.
pub fn render_markdown(report: &ValidationReport) -> String {
    let mut out = format!("{HEADING}\n\n");

    match &report.status {
        ReportStatus::Bypassed { reason } => {
            out.push_str(&format!("**Not validated.** {reason}\n"));
            return out;
        }
        ReportStatus::NoIdentifiers => {
            out.push_str("No ticket identifiers found in commit messages.\n");
            return out;
        }
        ReportStatus::IdentifierRequired => {
            out.push_str(&format!(
                "**Blocked.** {}\n",
                intentgate_core::IDENTIFIER_REQUIRED_REASON
            ));
            return out;
        }
        ReportStatus::Validated => {}
    }

    for ticket in &report.tickets {
        push_ticket(&mut out, ticket);
    }

    let summary = &report.summary;
    out.push_str("---\n### Summary\n");
    out.push_str(&format!(
        "- **Average Score:** {:.1}/{}\n",
        summary.average_score, MAX_SCORE
    ));
    out.push_str(&format!("- **Stories Validated:** {}\n", summary.count));
    out.push_str(&format!("- **Critical Issues:** {}\n", summary.critical_issues));
    out.push_str(&format!("- **Needs Attention:** {}\n", summary.low_alignment));
    out.push_str(&format!("- **Well Aligned:** {}\n", summary.good_alignment));
    out.push_str(&format!("- **Overall:** {}\n", decision_badge(report.overall)));
    out
}

/// One line per ticket plus an overall line, for terminals and hook output.
pub fn render_console(report: &ValidationReport) -> String {
    let mut lines = Vec::new();

    match &report.status {
        ReportStatus::Bypassed { reason } => lines.push(format!("intent validation skipped: {reason}")),
        ReportStatus::NoIdentifiers => {
            lines.push("no ticket identifiers found; skipping intent validation".to_string())
        }
        ReportStatus::IdentifierRequired => {
            lines.push(format!("BLOCK  {}", intentgate_core::IDENTIFIER_REQUIRED_REASON))
        }
        ReportStatus::Validated => {
            for ticket in &report.tickets {
                let score = match &ticket.judgment {
                    Some(j) => format!("{:>2}/{}", j.score, MAX_SCORE),
                    None => " -/10".to_string(),
                };
                lines.push(format!(
                    "{:<5}  {}  {:<12}  {}",
                    ticket.decision.to_string(),
                    score,
                    ticket.identifier.as_str(),
                    ticket.reason
                ));
            }
            lines.push(format!(
                "overall: {} (average {:.1}/{}, {} ticket(s))",
                report.overall, report.summary.average_score, MAX_SCORE, report.summary.count
            ));
        }
    }

    lines.join("\n")
}

/// Pretty-printed JSON of the whole report.
pub fn to_json_pretty(report: &ValidationReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize validation report")
}

/// Write the JSON artifact to `path`.
pub fn write_json(report: &ValidationReport, path: &Path) -> Result<()> {
    let json = to_json_pretty(report)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

/// Write the Markdown comment to `path`.
pub fn write_markdown(report: &ValidationReport, path: &Path) -> Result<()> {
    std::fs::write(path, render_markdown(report))
        .with_context(|| format!("failed to write {}", path.display()))
}
