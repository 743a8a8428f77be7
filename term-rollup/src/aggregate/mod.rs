//! Group-by roll-ups with automatic reduction selection.
//!
//! Non-key columns are sorted into three buckets before anything is computed:
//!
//! - **sum**: numeric columns whose name does not match the mean pattern
//! - **mean**: numeric columns whose name matches the mean pattern
//! - **earliest**: date columns, reduced to their minimum
//!
//! Columns of any other semantic type are left out of the result. Grouping
//! columns are removed before classification and are never aggregated.
//!
//! # Example
//!
//! ```rust
//! use arrow::array::{ArrayRef, AsArray, Float64Array, Int64Array};
//! use arrow::datatypes::{DataType, Field, Float64Type, Schema};
//! use arrow::record_batch::RecordBatch;
//! use std::sync::Arc;
//! use term_rollup::aggregate::aggregate;
//! use term_rollup::classifier::{with_semantic_type, SemanticType};
//! use term_rollup::table::Table;
//!
//! # fn main() -> term_rollup::error::Result<()> {
//! let schema = Schema::new(vec![
//!     with_semantic_type(Field::new("hour", DataType::Int64, false), SemanticType::Categorical),
//!     Field::new("sessions", DataType::Float64, true),
//!     Field::new("bounceRate", DataType::Float64, true),
//! ]);
//! let table = Table::new(RecordBatch::try_new(
//!     Arc::new(schema),
//!     vec![
//!         Arc::new(Int64Array::from(vec![1, 1, 2])) as ArrayRef,
//!         Arc::new(Float64Array::from(vec![10.0, 20.0, 5.0])) as ArrayRef,
//!         Arc::new(Float64Array::from(vec![0.5, 0.7, 0.9])) as ArrayRef,
//!     ],
//! )?)?;
//!
//! let hourly = aggregate(&table, &["hour"])?;
//! assert_eq!(hourly.num_rows(), 2);
//! assert_eq!(hourly.column_names(), vec!["hour", "sessions", "bounceRate"]);
//!
//! let sessions = hourly.column("sessions")?.as_primitive::<Float64Type>();
//! assert_eq!(sessions.value(0), 30.0);
//! # Ok(())
//! # }
//! ```

mod grouping;
mod merge;
mod reduce;

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::classifier::{columns_with_type, SemanticType};
use crate::config::AggregateOptions;
use crate::error::{Result, RollupError};
use crate::logging::{truncate_field, LogConfig};
use crate::pattern::MeanNamePattern;
use crate::table::Table;
use crate::{log_plan, perf_debug};

/// Reduction applied to the columns of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reduction {
    /// Sum of non-missing values
    Sum,
    /// Arithmetic mean of non-missing values
    Mean,
    /// Minimum (earliest) non-missing value
    Min,
}

impl fmt::Display for Reduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reduction::Sum => f.write_str("sum"),
            Reduction::Mean => f.write_str("mean"),
            Reduction::Min => f.write_str("min"),
        }
    }
}

/// Non-key columns sharing one reduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationBucket {
    /// The reduction applied to every column
    pub reduction: Reduction,
    /// Column names in table order
    pub columns: Vec<String>,
}

impl AggregationBucket {
    fn new(reduction: Reduction, columns: Vec<String>) -> Self {
        Self { reduction, columns }
    }

    /// Returns whether the bucket has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// How a table will be rolled up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupPlan {
    /// Grouping columns, in caller order
    pub group_by: Vec<String>,
    /// Numeric columns that are summed
    pub sum: AggregationBucket,
    /// Numeric columns that are averaged
    pub mean: AggregationBucket,
    /// Date columns reduced to their earliest value
    pub earliest: AggregationBucket,
    /// Non-key columns that appear in no bucket and are dropped
    pub unaggregated: Vec<String>,
}

impl RollupPlan {
    /// Returns the buckets in output order.
    pub fn buckets(&self) -> [&AggregationBucket; 3] {
        [&self.sum, &self.mean, &self.earliest]
    }

    /// Returns the names of the output columns, in order.
    pub fn output_columns(&self) -> Vec<&str> {
        self.group_by
            .iter()
            .chain(self.buckets().into_iter().flat_map(|b| b.columns.iter()))
            .map(String::as_str)
            .collect()
    }

    /// Returns the number of output columns.
    pub fn output_width(&self) -> usize {
        self.group_by.len() + self.buckets().iter().map(|b| b.columns.len()).sum::<usize>()
    }
}

/// Rolls `table` up by `group_by` with the default mean-name pattern.
///
/// An empty `group_by` collapses the whole table into exactly one row.
pub fn aggregate<S: AsRef<str>>(table: &Table, group_by: &[S]) -> Result<Table> {
    aggregate_with_pattern(table, group_by, &MeanNamePattern::default())
}

/// Rolls `table` up by `group_by`, averaging the numeric columns whose name
/// matches `pattern` and summing the others.
pub fn aggregate_with_pattern<S: AsRef<str>>(
    table: &Table,
    group_by: &[S],
    pattern: &MeanNamePattern,
) -> Result<Table> {
    let keys = key_names(group_by);
    run(table, &keys, pattern, &LogConfig::default())
}

/// Validates the grouping columns and classifies the rest without computing
/// anything.
pub fn plan<S: AsRef<str>>(
    table: &Table,
    group_by: &[S],
    pattern: &MeanNamePattern,
) -> Result<RollupPlan> {
    build_plan(table, &key_names(group_by), pattern)
}

/// Configuration-driven front end for roll-ups.
///
/// # Examples
///
/// ```rust
/// use term_rollup::aggregate::Aggregator;
/// use term_rollup::config::AggregateOptions;
/// use term_rollup::logging::LogConfig;
///
/// let aggregator = Aggregator::new(AggregateOptions::new().with_group_by(["date"]))
///     .with_log_config(LogConfig::verbose());
/// assert_eq!(aggregator.options().group_by, vec!["date"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    options: AggregateOptions,
    log_config: LogConfig,
}

impl Aggregator {
    /// Creates an aggregator from options.
    pub fn new(options: AggregateOptions) -> Self {
        Self {
            options,
            log_config: LogConfig::default(),
        }
    }

    /// Sets the logging configuration.
    pub fn with_log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    /// Returns the options.
    pub fn options(&self) -> &AggregateOptions {
        &self.options
    }

    /// Plans a roll-up of `table`.
    pub fn plan(&self, table: &Table) -> Result<RollupPlan> {
        plan(
            table,
            self.options.group_by.as_slice(),
            &self.options.mean_pattern,
        )
    }

    /// Rolls `table` up.
    pub fn aggregate(&self, table: &Table) -> Result<Table> {
        let keys = key_names(self.options.group_by.as_slice());
        run(table, &keys, &self.options.mean_pattern, &self.log_config)
    }
}

fn key_names<S: AsRef<str>>(group_by: &[S]) -> Vec<&str> {
    group_by.iter().map(AsRef::as_ref).collect()
}

#[instrument(skip(table, pattern, log_config), fields(rows = table.num_rows(), columns = table.num_columns()))]
fn run(
    table: &Table,
    keys: &[&str],
    pattern: &MeanNamePattern,
    log_config: &LogConfig,
) -> Result<Table> {
    let plan = build_plan(table, keys, pattern)?;
    log_plan!(
        log_config,
        sum = %truncate_field(&plan.sum.columns.join(", "), log_config.max_field_length),
        mean = %truncate_field(&plan.mean.columns.join(", "), log_config.max_field_length),
        earliest = %truncate_field(&plan.earliest.columns.join(", "), log_config.max_field_length),
        "planned roll-up"
    );
    if !plan.unaggregated.is_empty() {
        debug!(
            dropped = %truncate_field(&plan.unaggregated.join(", "), log_config.max_field_length),
            "columns without a reduction are left out"
        );
    }

    let groups = grouping::group_rows(table, keys)?;
    perf_debug!(log_config, groups = groups.len(), "partitioned rows");

    merge::merge(table, &plan, &groups)
}

fn build_plan(table: &Table, keys: &[&str], pattern: &MeanNamePattern) -> Result<RollupPlan> {
    let mut seen = HashSet::with_capacity(keys.len());
    for &key in keys {
        let semantic_type = table.semantic_type(key)?;
        if !seen.insert(key) {
            return Err(RollupError::type_mismatch(
                "a set of grouping columns",
                format!("'{key}' listed more than once"),
            ));
        }
        if matches!(semantic_type, SemanticType::Numeric | SemanticType::Date) {
            warn!(column = key, %semantic_type, "grouping column is not aggregated");
        }
    }
    let is_key = |name: &str| seen.contains(name);

    let (mean_columns, sum_columns): (Vec<String>, Vec<String>) =
        columns_with_type(table, SemanticType::Numeric)
            .into_iter()
            .filter(|name| !is_key(name.as_str()))
            .partition(|name| pattern.is_match(name));

    let date_columns: Vec<String> = columns_with_type(table, SemanticType::Date)
        .into_iter()
        .filter(|name| !is_key(name.as_str()))
        .collect();

    let unaggregated = table
        .column_names()
        .into_iter()
        .zip(table.semantic_types())
        .filter(|(name, t)| {
            !is_key(*name) && !matches!(t, SemanticType::Numeric | SemanticType::Date)
        })
        .map(|(name, _)| name.to_string())
        .collect();

    Ok(RollupPlan {
        group_by: keys.iter().map(|k| k.to_string()).collect(),
        sum: AggregationBucket::new(Reduction::Sum, sum_columns),
        mean: AggregationBucket::new(Reduction::Mean, mean_columns),
        earliest: AggregationBucket::new(Reduction::Min, date_columns),
        unaggregated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::analytics_table;

    #[test]
    fn test_plan_buckets() {
        let table = analytics_table();
        let plan = plan(&table, &["date"], &MeanNamePattern::default()).unwrap();

        assert_eq!(plan.group_by, vec!["date"]);
        assert_eq!(plan.sum.columns, vec!["sessions", "pageviews"]);
        assert_eq!(plan.mean.columns, vec!["bounceRate", "avgSessionDuration"]);
        assert!(plan.earliest.is_empty());
        assert_eq!(plan.unaggregated, vec!["hour", "deviceCategory", "landingPage"]);
        assert_eq!(
            plan.output_columns(),
            vec!["date", "sessions", "pageviews", "bounceRate", "avgSessionDuration"]
        );
        assert_eq!(plan.output_width(), 5);
    }

    #[test]
    fn test_plan_without_keys_keeps_dates() {
        let table = analytics_table();
        let plan = plan::<&str>(&table, &[], &MeanNamePattern::default()).unwrap();

        assert!(plan.group_by.is_empty());
        assert_eq!(plan.earliest.columns, vec!["date"]);
        assert_eq!(plan.earliest.reduction, Reduction::Min);
    }

    #[test]
    fn test_plan_custom_pattern() {
        let table = analytics_table();
        let pattern = MeanNamePattern::new("^pageviews$").unwrap();
        let plan = plan(&table, &["hour"], &pattern).unwrap();

        assert_eq!(
            plan.sum.columns,
            vec!["sessions", "bounceRate", "avgSessionDuration"]
        );
        assert_eq!(plan.mean.columns, vec!["pageviews"]);
    }

    #[test]
    fn test_plan_unknown_column() {
        let table = analytics_table();
        match plan(&table, &["hour", "country"], &MeanNamePattern::default()) {
            Err(RollupError::UnknownColumn { column }) => assert_eq!(column, "country"),
            other => panic!("expected UnknownColumn, got {other:?}"),
        }
    }

    #[test]
    fn test_plan_duplicate_key() {
        let table = analytics_table();
        let err = plan(&table, &["hour", "hour"], &MeanNamePattern::default()).unwrap_err();
        assert!(matches!(err, RollupError::TypeMismatch { .. }));
        assert!(err.to_string().contains("'hour'"));
    }

    #[test]
    fn test_numeric_key_is_not_aggregated() {
        let table = analytics_table();
        let plan = plan(&table, &["sessions"], &MeanNamePattern::default()).unwrap();
        assert_eq!(plan.sum.columns, vec!["pageviews"]);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_numeric_key_warns() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_max_level(tracing::Level::WARN)
            .finish();

        let table = analytics_table();
        tracing::subscriber::with_default(subscriber, || {
            plan(&table, &["sessions", "landingPage"], &MeanNamePattern::default()).unwrap();
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"), "{output}");
        assert!(output.contains("grouping column is not aggregated"));
        assert!(output.contains("sessions"));
        assert!(!output.contains("landingPage"));
    }

    #[test]
    fn test_aggregator_uses_options() {
        let table = analytics_table();
        let options = AggregateOptions::from_json(r#"{ "group_by": ["deviceCategory"] }"#).unwrap();
        let aggregator = Aggregator::new(options).with_log_config(LogConfig::verbose());

        let plan = aggregator.plan(&table).unwrap();
        assert_eq!(plan.group_by, vec!["deviceCategory"]);

        let result = aggregator.aggregate(&table).unwrap();
        assert_eq!(result.num_rows(), 2);
        assert_eq!(result.column_names(), plan.output_columns());
    }

    #[test]
    fn test_reduction_display() {
        assert_eq!(Reduction::Sum.to_string(), "sum");
        assert_eq!(Reduction::Mean.to_string(), "mean");
        assert_eq!(Reduction::Min.to_string(), "min");
    }
}
