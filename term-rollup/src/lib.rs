//! # Term Rollup - Automatic group-by summaries for Arrow tables
//!
//! Term Rollup collapses analytics-style tables (one row per observation,
//! one typed column per field) into per-group summaries without asking for
//! an aggregation function per column. It decides how to reduce each column
//! from its semantic type and its name:
//!
//! - numeric columns are **summed**
//! - numeric columns named like a rate or ratio (`bounceRate`,
//!   `avgSessionDuration`, `CTR`, ...) are **averaged**
//! - date columns keep their **earliest** value
//!
//! Missing values never propagate: nulls (and NaN in floating point columns)
//! are ignored by every reduction.
//!
//! ## Quick Start
//!
//! ```rust
//! use term_rollup::prelude::*;
//! use arrow::array::{ArrayRef, AsArray, Float64Array, Int64Array};
//! use arrow::datatypes::{DataType, Field, Float64Type, Int64Type, Schema};
//! use arrow::record_batch::RecordBatch;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<()> {
//! let schema = Schema::new(vec![
//!     with_semantic_type(Field::new("hour", DataType::Int64, false), SemanticType::Categorical),
//!     Field::new("sessions", DataType::Int64, true),
//!     Field::new("bounceRate", DataType::Float64, true),
//! ]);
//! let table = Table::new(RecordBatch::try_new(
//!     Arc::new(schema),
//!     vec![
//!         Arc::new(Int64Array::from(vec![1, 1, 2])) as ArrayRef,
//!         Arc::new(Int64Array::from(vec![10, 20, 5])) as ArrayRef,
//!         Arc::new(Float64Array::from(vec![0.5, 0.7, 0.9])) as ArrayRef,
//!     ],
//! )?)?;
//!
//! // One row per hour
//! let hourly = aggregate(&table, &["hour"])?;
//! let sessions = hourly.column("sessions")?.as_primitive::<Int64Type>();
//! assert_eq!(sessions.values().to_vec(), vec![30, 5]);
//!
//! // One row for the whole table
//! let total = aggregate::<&str>(&table, &[])?;
//! let bounce = total.column("bounceRate")?.as_primitive::<Float64Type>();
//! assert!((bounce.value(0) - 0.7).abs() < 1e-12);
//! # Ok(())
//! # }
//! ```
//!
//! ## Semantic Types
//!
//! Every column carries one [`SemanticType`](classifier::SemanticType),
//! derived from its Arrow type or set explicitly through the
//! `term.semantic_type` field metadata key (see
//! [`with_semantic_type`](classifier::with_semantic_type)). Tagging an integer
//! `hour` column as `categorical` keeps it out of the sums.
//!
//! ## Architecture
//!
//! - **`table`**: the validated [`Table`](table::Table) wrapper around a `RecordBatch`
//! - **`classifier`**: semantic types and column selection by type
//! - **`pattern`**: the mean-name rule
//! - **`aggregate`**: planning, grouping, reductions and merging
//! - **`config`**: serializable options for configuration-driven roll-ups
//! - **`logging`**: `tracing` configuration and subscriber setup
//! - **`error`**: the crate error type

pub mod aggregate;
pub mod classifier;
pub mod config;
pub mod error;
pub mod logging;
pub mod pattern;
pub mod prelude;
pub mod table;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;
