//! Gate evaluation: turns a validation report into a verdict and exit code.

use intentgate_core::{Decision, ReportStatus, ValidationReport, IDENTIFIER_REQUIRED_REASON};
use serde::{Deserialize, Serialize};

/// Exit code for Pass and Warn.
pub const EXIT_OK: i32 = 0;
/// Exit code for Block.
pub const EXIT_BLOCK: i32 = 1;
/// Exit code for configuration or usage errors.
pub const EXIT_USAGE: i32 = 2;

/// Gate evaluation verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateVerdict {
    /// Whether the guarded operation may proceed.
    pub passed: bool,

    /// Overall decision of the report.
    pub decision: Decision,

    /// Why the gate failed, one line per blocking ticket (empty if passed).
    pub violations: Vec<String>,

    /// Summary message.
    pub message: String,
}

impl GateVerdict {
    pub fn exit_code(&self) -> i32 {
        if self.passed {
            EXIT_OK
        } else {
            EXIT_BLOCK
        }
    }
}

/// Intent gate rules.
pub struct IntentGate;

impl IntentGate {
    /// Evaluate a report.
    ///
    /// Gate rule:
    /// - `Block` fails the gate; `Pass` and `Warn` let it through
    /// - A bypassed report passes but says it was not validated
    pub fn evaluate(report: &ValidationReport) -> GateVerdict {
        let violations: Vec<String> = match &report.status {
            ReportStatus::IdentifierRequired => {
                vec![IDENTIFIER_REQUIRED_REASON.to_string()]
            }
            _ => report
                .tickets
                .iter()
                .filter(|t| t.decision.is_blocking())
                .map(|t| format!("{}: {}", t.identifier, t.reason))
                .collect(),
        };

        let passed = !report.overall.is_blocking();
        let message = match &report.status {
            ReportStatus::Bypassed { reason } => format!("not validated: {reason}"),
            ReportStatus::NoIdentifiers => {
                "no ticket identifiers found; nothing to validate".to_string()
            }
            ReportStatus::IdentifierRequired => "blocked: no ticket identifier".to_string(),
            ReportStatus::Validated => match report.overall {
                Decision::Pass => format!("all {} ticket(s) aligned", report.summary.count),
                Decision::Warn => format!(
                    "passed with warnings: {} ticket(s) need attention",
                    report.summary.low_alignment
                ),
                Decision::Block => format!(
                    "blocked: {} of {} ticket(s) failed validation",
                    report.summary.critical_issues, report.summary.count
                ),
            },
        };

        GateVerdict {
            passed,
            decision: report.overall,
            violations,
            message,
        }
    }
}
