//! Prelude for commonly used types and functions in term-rollup.

pub use crate::aggregate::{aggregate, aggregate_with_pattern, plan, Aggregator, RollupPlan};
pub use crate::classifier::{columns_of_type, columns_with_type, with_semantic_type, SemanticType};
pub use crate::config::AggregateOptions;
pub use crate::error::{Result, RollupError};
pub use crate::logging::LogConfig;
pub use crate::pattern::MeanNamePattern;
pub use crate::table::Table;
