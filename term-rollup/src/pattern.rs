//! The name rule deciding whether a numeric column is averaged or summed.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, RollupError};

/// Source of the default mean-name pattern.
///
/// Matches names beginning with `avg` or `percent`, ending in `Rate` or
/// `Per`, or equal to one of the rate-like abbreviations.
pub const DEFAULT_MEAN_PATTERN: &str =
    "^avg|^percent|Rate$|^CPC$|^CTR$|^CPM$|^RPC$|^ROI$|^ROAS$|Per$";

const MAX_PATTERN_LENGTH: usize = 1000;

#[allow(clippy::expect_used)]
static DEFAULT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(DEFAULT_MEAN_PATTERN).expect("default mean pattern should be valid")
});

/// A compiled mean-name pattern.
///
/// Columns whose name matches are reduced with the arithmetic mean, all other
/// numeric columns with the sum. Serializes as its source string.
#[derive(Clone)]
pub struct MeanNamePattern {
    regex: Regex,
}

impl MeanNamePattern {
    /// Compiles a pattern.
    ///
    /// Empty patterns, patterns longer than 1000 characters, patterns with
    /// NUL bytes and invalid regular expressions are rejected.
    pub fn new(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(RollupError::configuration("mean pattern cannot be empty"));
        }
        if pattern.len() > MAX_PATTERN_LENGTH {
            return Err(RollupError::configuration(format!(
                "mean pattern too long (max {MAX_PATTERN_LENGTH} characters)"
            )));
        }
        if pattern.contains('\0') {
            return Err(RollupError::configuration(
                "mean pattern cannot contain null bytes",
            ));
        }

        let regex = Regex::new(pattern)
            .map_err(|e| RollupError::configuration(format!("invalid mean pattern: {e}")))?;
        Ok(Self { regex })
    }

    /// Returns whether `column` should be averaged.
    pub fn is_match(&self, column: &str) -> bool {
        self.regex.is_match(column)
    }

    /// Returns the source of the pattern.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl Default for MeanNamePattern {
    fn default() -> Self {
        Self {
            regex: DEFAULT_REGEX.clone(),
        }
    }
}

impl fmt::Debug for MeanNamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MeanNamePattern").field(&self.as_str()).finish()
    }
}

impl fmt::Display for MeanNamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq for MeanNamePattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for MeanNamePattern {}

impl Serialize for MeanNamePattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MeanNamePattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        MeanNamePattern::new(&source).map_err(serde::de::Error::custom)
    }
}
