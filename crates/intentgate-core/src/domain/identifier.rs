//! Ticket identifiers of the form `PROJECTKEY-NUMBER`.

use serde::{Deserialize, Serialize};

use super::error::IntentError;

/// A ticket key such as `PROJ-123`.
///
/// The inner field is private: an `Identifier` is only produced by the
/// extractor or by the validating `TryFrom<String>`, so the key is always an
/// uppercase project key of at least two letters followed by a positive number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The project key part (`PROJ` for `PROJ-123`).
    pub fn project_key(&self) -> &str {
        self.0.split_once('-').map(|(key, _)| key).unwrap_or(&self.0)
    }

    /// The numeric part (`123` for `PROJ-123`).
    pub fn number(&self) -> u64 {
        self.0
            .split_once('-')
            .and_then(|(_, n)| n.parse().ok())
            .unwrap_or(0)
    }

    pub(crate) fn new_unchecked(raw: &str) -> Self {
        Identifier(raw.to_string())
    }
}

/// Check the `PROJECTKEY-NUMBER` shape without a regex.
pub(crate) fn is_valid_key(raw: &str) -> bool {
    let Some((key, number)) = raw.split_once('-') else {
        return false;
    };
    key.len() >= 2
        && key.chars().all(|c| c.is_ascii_uppercase())
        && !number.is_empty()
        && number.chars().all(|c| c.is_ascii_digit())
        && number.parse::<u64>().map(|n| n > 0).unwrap_or(false)
}

impl TryFrom<String> for Identifier {
    type Error = IntentError;

    fn try_from(raw: String) -> std::result::Result<Self, Self::Error> {
        if is_valid_key(&raw) {
            Ok(Identifier(raw))
        } else {
            Err(IntentError::InvalidIdentifier(raw))
        }
    }
}

impl TryFrom<&str> for Identifier {
    type Error = IntentError;

    fn try_from(raw: &str) -> std::result::Result<Self, Self::Error> {
        Identifier::try_from(raw.to_string())
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
