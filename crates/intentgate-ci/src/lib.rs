//! IntentGate CI
//!
//! Runs a validation over injected collaborators and turns the report into
//! something a hook or CI job can act on:
//! - `pipeline`: bypass, extract, fan-out fetch/judge, policy, aggregate
//! - `gate`: pass/fail verdict and process exit code
//! - `report`: Markdown PR comment, JSON artifact, console summary

pub mod gate;
pub mod pipeline;
pub mod report;

pub use gate::{GateVerdict, IntentGate, EXIT_BLOCK, EXIT_OK, EXIT_USAGE};
pub use pipeline::ValidationPipeline;
pub use report::{
    render_console, render_markdown, to_json_pretty, write_json, write_markdown, COMMENT_FILE,
    RESULTS_FILE,
};
