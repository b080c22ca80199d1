//! Pipeline configuration.
//!
//! Loaded once at process start from an optional TOML file, then environment
//! overrides, then validated. Read-only afterwards.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bypass::BypassConfig;
use crate::domain::changeset::DEFAULT_MAX_SUMMARY_LINES;
use crate::domain::error::{IntentError, Result};
use crate::execution::ExecutionControls;
use crate::policy::ThresholdConfig;

pub const BLOCK_BELOW_ENV: &str = "INTENTGATE_BLOCK_BELOW";
pub const WARN_BELOW_ENV: &str = "INTENTGATE_WARN_BELOW";

/// Upper bound for `max_retries` on any collaborator.
pub const MAX_RETRIES_LIMIT: u32 = 10;
/// Upper bound for `max_concurrent`.
pub const MAX_CONCURRENT_LIMIT: usize = 64;

/// Everything the pipeline needs besides its collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub thresholds: ThresholdConfig,
    pub bypass: BypassConfig,
    /// Controls around each story fetch.
    pub story_fetch: ExecutionControls,
    /// Controls around each AI judge transport call.
    pub judge: ExecutionControls,
    /// Maximum tickets evaluated at once.
    pub max_concurrent: usize,
    /// Block commits that reference no ticket.
    pub require_identifier: bool,
    /// Patch lines kept per file in hunk summaries.
    pub max_patch_lines_per_file: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            thresholds: ThresholdConfig::default(),
            bypass: BypassConfig::default(),
            story_fetch: ExecutionControls {
                timeout_ms: 10_000,
                ..ExecutionControls::default()
            },
            judge: ExecutionControls::default(),
            max_concurrent: 4,
            require_identifier: false,
            max_patch_lines_per_file: DEFAULT_MAX_SUMMARY_LINES,
        }
    }
}

impl PipelineConfig {
    /// Parse from TOML; missing keys take defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Apply environment overrides through `lookup`, then re-validate.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.bypass.apply_env(&lookup);

        if let Some(raw) = lookup(BLOCK_BELOW_ENV) {
            self.thresholds.block_below = parse_threshold(BLOCK_BELOW_ENV, &raw)?;
        }
        if let Some(raw) = lookup(WARN_BELOW_ENV) {
            self.thresholds.warn_below = parse_threshold(WARN_BELOW_ENV, &raw)?;
        }

        self.validate()
    }

    /// Apply overrides from the process environment.
    pub fn apply_process_env(&mut self) -> Result<()> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        if !(1..=MAX_CONCURRENT_LIMIT).contains(&self.max_concurrent) {
            return Err(IntentError::InvalidConfig(format!(
                "max_concurrent must be between 1 and {MAX_CONCURRENT_LIMIT}"
            )));
        }
        for (name, controls) in [("story_fetch", &self.story_fetch), ("judge", &self.judge)] {
            if controls.timeout_ms == 0 {
                return Err(IntentError::InvalidConfig(format!(
                    "{name}.timeout_ms must be greater than 0"
                )));
            }
            if controls.max_retries > MAX_RETRIES_LIMIT {
                return Err(IntentError::InvalidConfig(format!(
                    "{name}.max_retries must be at most {MAX_RETRIES_LIMIT}"
                )));
            }
        }
        Ok(())
    }
}

fn parse_threshold(key: &str, raw: &str) -> Result<u8> {
    raw.trim()
        .parse::<u8>()
        .map_err(|_| IntentError::InvalidConfig(format!("{key}={raw:?} is not a score")))
}
