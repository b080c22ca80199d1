//! Report aggregation over per-ticket outcomes.

use crate::domain::decision::Decision;
use crate::domain::report::{ReportStatus, ReportSummary, TicketOutcome, ValidationReport};
use crate::policy::ThresholdConfig;

/// Build a [`ValidationReport`] from per-ticket outcomes.
///
/// Output ticket order equals input order. An empty input is valid and
/// yields an average of 0 and an overall `Pass`.
pub fn aggregate(outcomes: Vec<TicketOutcome>, thresholds: &ThresholdConfig) -> ValidationReport {
    let summary = summarize(&outcomes, thresholds);
    let overall = Decision::fold(outcomes.iter().map(|o| o.decision));

    let mut report = ValidationReport::with_status(ReportStatus::Validated, overall);
    report.tickets = outcomes;
    report.summary = summary;
    report
}

/// Summary statistics; unvalidated tickets contribute a score of 0.
pub fn summarize(outcomes: &[TicketOutcome], thresholds: &ThresholdConfig) -> ReportSummary {
    let count = outcomes.len();
    if count == 0 {
        return ReportSummary::empty();
    }

    let total: u64 = outcomes.iter().map(|o| u64::from(o.score())).sum();
    let critical_issues = outcomes.iter().filter(|o| o.decision.is_blocking()).count();
    let low_alignment = outcomes
        .iter()
        .filter(|o| !o.decision.is_blocking() && o.score() < thresholds.warn_below)
        .count();
    let good_alignment = outcomes
        .iter()
        .filter(|o| !o.decision.is_blocking() && o.score() >= thresholds.warn_below)
        .count();

    ReportSummary {
        average_score: total as f64 / count as f64,
        count,
        critical_issues,
        low_alignment,
        good_alignment,
    }
}
