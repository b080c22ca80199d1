//! IntentGate alignment judge.
//!
//! - `prompt`: renders a (story, changeset) pair into a judge request
//! - `parse`: strict validation of the judge's JSON answer
//! - `judge`: [`AiAlignmentJudge`], retrying transport failures only
//! - `openai`: chat-completions transport

pub mod judge;
pub mod openai;
pub mod parse;
pub mod prompt;

pub use judge::{AiAlignmentJudge, JudgeTransport};
pub use openai::{OpenAiConfig, OpenAiError, OpenAiTransport};
pub use parse::parse_judgment;
pub use prompt::{build_prompt, detect_language, JudgePrompt};
