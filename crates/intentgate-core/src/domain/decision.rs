//! Pass / warn / block decisions.

use serde::{Deserialize, Serialize};

/// Outcome of applying the threshold policy to a judgment.
///
/// Ordering is by severity (`Pass < Warn < Block`), so folding a set of
/// decisions is a `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Pass,
    Warn,
    Block,
}

impl Decision {
    /// Fold per-ticket decisions into one: worst decision wins.
    /// An empty input folds to `Pass`.
    pub fn fold<I>(decisions: I) -> Decision
    where
        I: IntoIterator<Item = Decision>,
    {
        decisions.into_iter().max().unwrap_or(Decision::Pass)
    }

    pub fn is_blocking(self) -> bool {
        self == Decision::Block
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Decision::Pass => "PASS",
            Decision::Warn => "WARN",
            Decision::Block => "BLOCK",
        };
        f.write_str(s)
    }
}
