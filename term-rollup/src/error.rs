//! Error types for term-rollup.
//!
//! Every fallible operation in the crate returns [`Result`], whose error side
//! is the [`RollupError`] enum. Validation happens before any computation, so
//! an error always means no output was produced.

use thiserror::Error;

/// The main error type for roll-up operations.
#[derive(Error, Debug)]
pub enum RollupError {
    /// The input is not a valid table, or an argument has the wrong shape.
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// What the operation required
        expected: String,
        /// What it was given
        found: String,
    },

    /// A requested column is not present in the table.
    #[error("Column '{column}' not found in table")]
    UnknownColumn { column: String },

    /// An integer sum no longer fits in 64 bits.
    #[error("Arithmetic overflow while summing column '{column}'")]
    ArithmeticOverflow { column: String },

    /// Invalid mean-name pattern or malformed options document.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error from Arrow kernels.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

/// A type alias for `Result<T, RollupError>`.
///
/// # Examples
///
/// ```rust
/// use term_rollup::error::Result;
///
/// fn roll_up() -> Result<()> {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, RollupError>;

impl RollupError {
    /// Creates a new type mismatch error.
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Creates a new unknown column error.
    pub fn unknown_column(column: impl Into<String>) -> Self {
        Self::UnknownColumn {
            column: column.into(),
        }
    }

    /// Creates a new configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

impl From<serde_json::Error> for RollupError {
    fn from(err: serde_json::Error) -> Self {
        Self::Configuration(format!("invalid options document: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_column() {
        let err = RollupError::unknown_column("hour");
        assert_eq!(err.to_string(), "Column 'hour' not found in table");
    }

    #[test]
    fn test_type_mismatch() {
        let err = RollupError::type_mismatch("a set of column names", "'hour' listed twice");
        assert_eq!(
            err.to_string(),
            "Type mismatch: expected a set of column names, found 'hour' listed twice"
        );
    }

    #[test]
    fn test_arrow_error_conversion() {
        let arrow_err = arrow::error::ArrowError::ComputeError("boom".to_string());
        let err: RollupError = arrow_err.into();
        assert!(matches!(err, RollupError::Arrow(_)));
        assert!(err.to_string().starts_with("Arrow error:"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: RollupError = json_err.into();
        assert!(matches!(err, RollupError::Configuration(_)));
    }
}
