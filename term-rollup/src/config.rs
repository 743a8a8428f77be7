//! Serializable options for configuration-driven roll-ups.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::pattern::MeanNamePattern;

/// Options for an [`Aggregator`](crate::aggregate::Aggregator).
///
/// # Examples
///
/// ```rust
/// use term_rollup::config::AggregateOptions;
///
/// let options = AggregateOptions::from_json(r#"{ "group_by": ["hour"] }"#).unwrap();
/// assert_eq!(options.group_by, vec!["hour"]);
/// assert!(options.mean_pattern.is_match("bounceRate"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AggregateOptions {
    /// Grouping columns; empty rolls the whole table into one row
    pub group_by: Vec<String>,
    /// Rule selecting the numeric columns that are averaged
    pub mean_pattern: MeanNamePattern,
}

impl AggregateOptions {
    /// Creates options with no grouping and the default mean pattern.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the grouping columns.
    pub fn with_group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the mean-name pattern.
    pub fn with_mean_pattern(mut self, pattern: MeanNamePattern) -> Self {
        self.mean_pattern = pattern;
        self
    }

    /// Parses options from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the options to a JSON document.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
