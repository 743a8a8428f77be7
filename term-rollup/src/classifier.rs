//! Column classification by semantic type.
//!
//! Each column of a [`Table`] carries exactly one [`SemanticType`]. The tag
//! comes from the field metadata key [`SEMANTIC_TYPE_KEY`] when present and
//! is otherwise derived from the Arrow storage type. Classification is an
//! exact match on that tag: a `timestamp` column is never returned for
//! `date`.
//!
//! # Example
//!
//! ```rust
//! use arrow::array::{ArrayRef, Float64Array, Int64Array};
//! use arrow::datatypes::{DataType, Field, Schema};
//! use arrow::record_batch::RecordBatch;
//! use std::sync::Arc;
//! use term_rollup::classifier::{columns_with_type, with_semantic_type, SemanticType};
//! use term_rollup::table::Table;
//!
//! # fn main() -> term_rollup::error::Result<()> {
//! let schema = Schema::new(vec![
//!     with_semantic_type(Field::new("hour", DataType::Int64, false), SemanticType::Categorical),
//!     Field::new("sessions", DataType::Float64, true),
//! ]);
//! let batch = RecordBatch::try_new(
//!     Arc::new(schema),
//!     vec![
//!         Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef,
//!         Arc::new(Float64Array::from(vec![10.0, 5.0])) as ArrayRef,
//!     ],
//! )?;
//! let table = Table::new(batch)?;
//!
//! assert_eq!(columns_with_type(&table, SemanticType::Numeric), vec!["sessions"]);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use arrow::datatypes::{DataType, Field};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RollupError};
use crate::table::Table;

/// Field metadata key holding an explicit semantic type label.
pub const SEMANTIC_TYPE_KEY: &str = "term.semantic_type";

/// Semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    /// Integer, floating point or decimal measurements
    Numeric,
    /// Calendar dates
    Date,
    /// Points in time with sub-day precision
    Timestamp,
    /// Free text
    Text,
    /// Values drawn from a small set of labels
    Categorical,
    /// True/false flags
    Boolean,
    /// Anything the other tags do not describe
    Other,
}

impl SemanticType {
    /// All semantic types, in declaration order.
    pub const ALL: [SemanticType; 7] = [
        SemanticType::Numeric,
        SemanticType::Date,
        SemanticType::Timestamp,
        SemanticType::Text,
        SemanticType::Categorical,
        SemanticType::Boolean,
        SemanticType::Other,
    ];

    /// Returns the lower-case label of this type.
    pub fn label(&self) -> &'static str {
        match self {
            SemanticType::Numeric => "numeric",
            SemanticType::Date => "date",
            SemanticType::Timestamp => "timestamp",
            SemanticType::Text => "text",
            SemanticType::Categorical => "categorical",
            SemanticType::Boolean => "boolean",
            SemanticType::Other => "other",
        }
    }

    /// Derives the semantic type from Arrow storage alone.
    pub fn from_data_type(data_type: &DataType) -> Self {
        match data_type {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float16
            | DataType::Float32
            | DataType::Float64
            | DataType::Decimal128(_, _)
            | DataType::Decimal256(_, _) => SemanticType::Numeric,
            DataType::Date32 | DataType::Date64 => SemanticType::Date,
            DataType::Timestamp(_, _) => SemanticType::Timestamp,
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => SemanticType::Text,
            DataType::Dictionary(_, _) => SemanticType::Categorical,
            DataType::Boolean => SemanticType::Boolean,
            _ => SemanticType::Other,
        }
    }

    /// Returns whether a column stored as `data_type` may carry this tag.
    pub fn accepts(&self, data_type: &DataType) -> bool {
        match self {
            SemanticType::Numeric => {
                SemanticType::from_data_type(data_type) == SemanticType::Numeric
            }
            SemanticType::Date => matches!(
                data_type,
                DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _)
            ),
            SemanticType::Timestamp => matches!(data_type, DataType::Timestamp(_, _)),
            SemanticType::Boolean => matches!(data_type, DataType::Boolean),
            SemanticType::Text | SemanticType::Categorical | SemanticType::Other => true,
        }
    }

    /// Resolves the semantic type of a field.
    ///
    /// An explicit metadata tag wins over the storage type, but it must be a
    /// known label and compatible with the storage.
    pub fn of_field(field: &Field) -> Result<Self> {
        let Some(label) = field.metadata().get(SEMANTIC_TYPE_KEY) else {
            return Ok(SemanticType::from_data_type(field.data_type()));
        };

        let declared: SemanticType = label.parse()?;
        if !declared.accepts(field.data_type()) {
            return Err(RollupError::type_mismatch(
                format!("storage compatible with '{declared}' for column '{}'", field.name()),
                field.data_type().to_string(),
            ));
        }
        Ok(declared)
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SemanticType {
    type Err = RollupError;

    fn from_str(s: &str) -> Result<Self> {
        SemanticType::ALL
            .into_iter()
            .find(|t| t.label() == s)
            .ok_or_else(|| {
                RollupError::type_mismatch(
                    "one of numeric, date, timestamp, text, categorical, boolean, other",
                    format!("'{s}'"),
                )
            })
    }
}

/// Tags a field with an explicit semantic type.
///
/// Existing metadata is preserved; a previous tag is replaced.
pub fn with_semantic_type(field: Field, semantic_type: SemanticType) -> Field {
    let mut metadata: HashMap<String, String> = field.metadata().clone();
    metadata.insert(
        SEMANTIC_TYPE_KEY.to_string(),
        semantic_type.label().to_string(),
    );
    field.with_metadata(metadata)
}

/// Returns the names of the columns whose semantic type equals `semantic_type`.
///
/// The order follows the table's column order. The list is empty when no
/// column has the type.
pub fn columns_with_type(table: &Table, semantic_type: SemanticType) -> Vec<String> {
    table
        .semantic_types()
        .iter()
        .zip(table.schema().fields().iter())
        .filter(|(t, _)| **t == semantic_type)
        .map(|(_, field)| field.name().clone())
        .collect()
}

/// Same as [`columns_with_type`], taking the type as its label.
///
/// Fails with [`RollupError::TypeMismatch`] when the label is unknown.
pub fn columns_of_type(table: &Table, label: &str) -> Result<Vec<String>> {
    let semantic_type: SemanticType = label.parse()?;
    Ok(columns_with_type(table, semantic_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::TimeUnit;

    #[test]
    fn test_storage_mapping() {
        assert_eq!(
            SemanticType::from_data_type(&DataType::Int32),
            SemanticType::Numeric
        );
        assert_eq!(
            SemanticType::from_data_type(&DataType::Decimal128(10, 2)),
            SemanticType::Numeric
        );
        assert_eq!(
            SemanticType::from_data_type(&DataType::Date32),
            SemanticType::Date
        );
        assert_eq!(
            SemanticType::from_data_type(&DataType::Timestamp(TimeUnit::Second, None)),
            SemanticType::Timestamp
        );
        assert_eq!(
            SemanticType::from_data_type(&DataType::Utf8),
            SemanticType::Text
        );
        assert_eq!(
            SemanticType::from_data_type(&DataType::Dictionary(
                Box::new(DataType::Int32),
                Box::new(DataType::Utf8)
            )),
            SemanticType::Categorical
        );
        assert_eq!(
            SemanticType::from_data_type(&DataType::Boolean),
            SemanticType::Boolean
        );
        assert_eq!(
            SemanticType::from_data_type(&DataType::Binary),
            SemanticType::Other
        );
    }

    #[test]
    fn test_label_round_trip() {
        for t in SemanticType::ALL {
            assert_eq!(t.label().parse::<SemanticType>().unwrap(), t);
        }
        assert!(matches!(
            "Numeric".parse::<SemanticType>(),
            Err(RollupError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_metadata_override() {
        let field = with_semantic_type(
            Field::new("hour", DataType::Int64, false),
            SemanticType::Categorical,
        );
        assert_eq!(
            SemanticType::of_field(&field).unwrap(),
            SemanticType::Categorical
        );

        let timestamp_as_date = with_semantic_type(
            Field::new("day", DataType::Timestamp(TimeUnit::Millisecond, None), true),
            SemanticType::Date,
        );
        assert_eq!(
            SemanticType::of_field(&timestamp_as_date).unwrap(),
            SemanticType::Date
        );
    }

    #[test]
    fn test_incompatible_override() {
        let field = with_semantic_type(
            Field::new("name", DataType::Utf8, true),
            SemanticType::Numeric,
        );
        let err = SemanticType::of_field(&field).unwrap_err();
        assert!(err.to_string().contains("'name'"));
    }

    #[test]
    fn test_unknown_override_label() {
        let mut metadata = HashMap::new();
        metadata.insert(SEMANTIC_TYPE_KEY.to_string(), "currency".to_string());
        let field = Field::new("cost", DataType::Float64, true).with_metadata(metadata);
        assert!(matches!(
            SemanticType::of_field(&field),
            Err(RollupError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_with_semantic_type_keeps_metadata() {
        let mut metadata = HashMap::new();
        metadata.insert("source".to_string(), "ga".to_string());
        let field = Field::new("hour", DataType::Int64, false).with_metadata(metadata);
        let tagged = with_semantic_type(field, SemanticType::Categorical);
        assert_eq!(tagged.metadata().get("source").map(String::as_str), Some("ga"));
        assert_eq!(
            tagged.metadata().get(SEMANTIC_TYPE_KEY).map(String::as_str),
            Some("categorical")
        );
    }
}
