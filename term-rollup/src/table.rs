//! The in-memory table consumed and produced by roll-ups.

use std::collections::HashSet;

use arrow::array::ArrayRef;
use arrow::compute::concat_batches;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;

use crate::classifier::SemanticType;
use crate::error::{Result, RollupError};

/// An ordered collection of named, typed columns with aligned rows.
///
/// A `Table` is a validated Arrow [`RecordBatch`]: column names are unique and
/// every column resolves to a [`SemanticType`].
#[derive(Debug, Clone)]
pub struct Table {
    batch: RecordBatch,
    semantic_types: Vec<SemanticType>,
}

impl Table {
    /// Validates a record batch as a table.
    pub fn new(batch: RecordBatch) -> Result<Self> {
        let schema = batch.schema();
        let mut seen = HashSet::with_capacity(schema.fields().len());
        for field in schema.fields() {
            if !seen.insert(field.name().as_str()) {
                return Err(RollupError::type_mismatch(
                    "unique column names",
                    format!("column '{}' appears more than once", field.name()),
                ));
            }
        }

        let semantic_types = schema
            .fields()
            .iter()
            .map(|field| SemanticType::of_field(field))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            batch,
            semantic_types,
        })
    }

    /// Builds a table from batches that share one schema.
    pub fn try_from_batches(batches: &[RecordBatch]) -> Result<Self> {
        let Some(first) = batches.first() else {
            return Err(RollupError::type_mismatch(
                "at least one record batch",
                "no batches",
            ));
        };

        let schema = first.schema();
        if let Some(other) = batches.iter().find(|b| b.schema() != schema) {
            return Err(RollupError::type_mismatch(
                format!("schema {schema}"),
                format!("schema {}", other.schema()),
            ));
        }

        Self::new(concat_batches(&schema, batches)?)
    }

    /// Returns the schema.
    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    /// Returns the number of rows.
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Returns the number of columns.
    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    /// Returns the column names in table order.
    pub fn column_names(&self) -> Vec<&str> {
        self.batch
            .schema_ref()
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect()
    }

    /// Returns the position of a column.
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.batch
            .schema_ref()
            .index_of(name)
            .map_err(|_| RollupError::unknown_column(name))
    }

    /// Returns a column by name.
    pub fn column(&self, name: &str) -> Result<&ArrayRef> {
        let index = self.index_of(name)?;
        Ok(self.batch.column(index))
    }

    /// Returns the semantic type of a column by name.
    pub fn semantic_type(&self, name: &str) -> Result<SemanticType> {
        let index = self.index_of(name)?;
        Ok(self.semantic_types[index])
    }

    /// Returns the semantic type of every column, in table order.
    pub fn semantic_types(&self) -> &[SemanticType] {
        &self.semantic_types
    }

    /// Returns the underlying record batch.
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Consumes the table, returning the underlying record batch.
    pub fn into_batch(self) -> RecordBatch {
        self.batch
    }
}

impl TryFrom<RecordBatch> for Table {
    type Error = RollupError;

    fn try_from(batch: RecordBatch) -> Result<Self> {
        Self::new(batch)
    }
}

impl From<Table> for RecordBatch {
    fn from(table: Table) -> Self {
        table.batch
    }
}
