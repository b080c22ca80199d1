//! Structured lifecycle events for validation runs.
//!
//! Every event is emitted at `info!` (failures at `warn!`) with an
//! `event = "..."` field so JSON logs can be filtered by kind.

use tracing::{info, warn};

use crate::domain::decision::Decision;
use crate::domain::identifier::Identifier;
use crate::domain::judgment::Judgment;
use crate::domain::report::TicketFailure;

/// Run-scoped span; instrument the run's futures with it so every event
/// inside carries the run id.
pub fn validation_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("intentgate.validation", run_id = %run_id)
}

pub fn emit_validation_started(run_id: &str, identifiers: usize, mode: &str) {
    info!(
        event = "validation.started",
        run_id = %run_id,
        identifiers = identifiers,
        mode = %mode,
    );
}

pub fn emit_validation_bypassed(run_id: &str, reason: &str) {
    info!(event = "validation.bypassed", run_id = %run_id, reason = %reason);
}

pub fn emit_ticket_judged(id: &Identifier, judgment: &Judgment, decision: Decision) {
    info!(
        event = "ticket.judged",
        ticket = %id,
        score = judgment.score,
        confidence = judgment.confidence,
        status = %judgment.status,
        decision = %decision,
    );
}

pub fn emit_ticket_failed(id: &Identifier, failure: &TicketFailure) {
    warn!(event = "ticket.failed", ticket = %id, failure = %failure);
}

/// Emit event: validation finished with the overall decision.
pub fn emit_validation_finished(
    run_id: &str,
    duration_ms: u64,
    tickets: usize,
    average_score: f64,
    overall: Decision,
) {
    info!(
        event = "validation.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        tickets = tickets,
        average_score = average_score,
        overall = %overall,
    );
}
