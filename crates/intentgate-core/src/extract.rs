//! Ticket identifier extraction from free-form commit text.
//!
//! Recognises bare (`PROJ-123: msg`), bracketed (`[PROJ-123] msg`), trailing
//! (`msg (PROJ-123)`) and embedded (`PROJ-123 msg`) forms against one
//! case-sensitive pattern. Zero matches is a valid result.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::domain::identifier::{is_valid_key, Identifier};

/// Pattern for a ticket key bounded by non-word characters.
pub const IDENTIFIER_PATTERN: &str = r"\b[A-Z]{2,}-[0-9]+\b";

fn identifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(IDENTIFIER_PATTERN).expect("identifier pattern is valid"))
}

/// Extract all distinct identifiers in order of first appearance.
pub fn extract_identifiers(text: &str) -> Vec<Identifier> {
    let mut seen = HashSet::new();
    identifier_regex()
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|raw| is_valid_key(raw))
        .filter(|raw| seen.insert(*raw))
        .map(Identifier::new_unchecked)
        .collect()
}

/// Extract identifiers across several commit messages, de-duplicated in
/// first-appearance order over the whole sequence.
pub fn extract_from_messages<'a, I>(messages: I) -> Vec<Identifier>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    messages
        .into_iter()
        .flat_map(extract_identifiers)
        .filter(|id| seen.insert(id.clone()))
        .collect()
}
