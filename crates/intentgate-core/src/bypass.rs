//! Bypass gate: overrides checked before any network call.
//!
//! Two independent flags, read once at pipeline entry:
//! - `skip_validation` short-circuits the whole pipeline with a bypassed report
//! - `ai_enabled = false` keeps story fetching and the threshold policy but
//!   replaces the AI judge with the title-keyword heuristic

use serde::{Deserialize, Serialize};

/// Env var that skips all validation when truthy.
pub const SKIP_ENV: &str = "SKIP_INTENT_VALIDATION";
/// Env var that disables the AI judge when falsy.
pub const AI_ENABLED_ENV: &str = "ENABLE_AI_VALIDATION";

/// Override flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BypassConfig {
    pub skip_validation: bool,
    pub ai_enabled: bool,
}

impl Default for BypassConfig {
    fn default() -> Self {
        Self {
            skip_validation: false,
            ai_enabled: true,
        }
    }
}

/// How the pipeline should run given the flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BypassMode {
    /// Skip everything; report "not validated".
    Skip,
    /// Fetch stories, score with the heuristic, never call the AI judge.
    HeuristicOnly,
    /// Full validation.
    Full,
}

/// Snapshot of the override flags taken at pipeline construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BypassGate {
    flags: BypassConfig,
}

impl BypassGate {
    pub fn new(flags: BypassConfig) -> Self {
        Self { flags }
    }

    pub fn should_bypass(&self) -> bool {
        should_bypass(&self.flags)
    }

    pub fn mode(&self) -> BypassMode {
        if self.flags.skip_validation {
            BypassMode::Skip
        } else if !self.flags.ai_enabled {
            BypassMode::HeuristicOnly
        } else {
            BypassMode::Full
        }
    }

    /// Marker text carried by a bypassed report.
    pub fn reason(&self) -> String {
        format!("validation skipped by override ({SKIP_ENV})")
    }
}

/// `true` when the skip flag is set.
pub fn should_bypass(flags: &BypassConfig) -> bool {
    flags.skip_validation
}

/// Parse a boolean env value. `1/true/yes/on` and `0/false/no/off`,
/// case-insensitive; anything else is `None`.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl BypassConfig {
    /// Apply env overrides through `lookup`; unrecognised values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(skip) = lookup(SKIP_ENV).as_deref().and_then(parse_flag) {
            self.skip_validation = skip;
        }
        if let Some(enabled) = lookup(AI_ENABLED_ENV).as_deref().and_then(parse_flag) {
            self.ai_enabled = enabled;
        }
    }
}
