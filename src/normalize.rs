use crate::error::{Error, Result};
use std::fmt;

/// A package term reduced to lowercase ASCII letters and digits.
///
/// Lets `Raindrop.io`, `raindrop-io` and `raindropio` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedTerm(String);

impl NormalizedTerm {
    pub fn new(term: &str) -> Result<Self> {
        let normalized = normalize(term);
        if normalized.is_empty() {
            return Err(Error::Normalization {
                term: term.to_string(),
            });
        }
        Ok(Self(normalized))
    }
}

impl fmt::Display for NormalizedTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keeps ASCII alphanumerics, lowercased, in their original order.
pub fn normalize(term: &str) -> String {
    term.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
