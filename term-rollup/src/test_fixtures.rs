//! Sample tables shaped like web analytics exports.
//!
//! These fixtures back the crate's own tests and are available to downstream
//! crates through the `test-utils` feature.

use std::sync::Arc;

use arrow::array::{ArrayRef, Date32Array, DictionaryArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Int32Type, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;

use crate::classifier::{with_semantic_type, SemanticType};
use crate::table::Table;

/// Days since the Unix epoch, the `Date32` representation.
///
/// # Panics
///
/// Panics if `year`, `month` and `day` do not form a calendar date.
#[allow(clippy::expect_used)]
pub fn date32(year: i32, month: u32, day: u32) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).expect("epoch is a valid date");
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .unwrap_or_else(|| panic!("invalid fixture date {year}-{month:02}-{day:02}"));
    (date - epoch).num_days() as i32
}

/// A two-day export mixing every column role.
///
/// Columns, in order: `date`, `hour` (categorical), `deviceCategory`
/// (dictionary), `landingPage` (text), `sessions`, `pageviews`,
/// `bounceRate`, `avgSessionDuration`. Contains nulls in `pageviews` and
/// `bounceRate`.
pub fn analytics_table() -> Table {
    let schema = Schema::new(vec![
        Field::new("date", DataType::Date32, true),
        with_semantic_type(
            Field::new("hour", DataType::Int64, false),
            SemanticType::Categorical,
        ),
        Field::new(
            "deviceCategory",
            DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8)),
            false,
        ),
        Field::new("landingPage", DataType::Utf8, true),
        Field::new("sessions", DataType::Int64, true),
        Field::new("pageviews", DataType::Int64, true),
        Field::new("bounceRate", DataType::Float64, true),
        Field::new("avgSessionDuration", DataType::Float64, true),
    ]);

    let day_one = date32(2024, 3, 1);
    let day_two = date32(2024, 3, 2);
    let devices: DictionaryArray<Int32Type> = vec![
        "desktop", "mobile", "desktop", "mobile", "desktop", "mobile",
    ]
    .into_iter()
    .collect();

    build(
        schema,
        vec![
            Arc::new(Date32Array::from(vec![
                day_one, day_one, day_one, day_two, day_two, day_two,
            ])) as ArrayRef,
            Arc::new(Int64Array::from(vec![0, 0, 1, 0, 1, 1])) as ArrayRef,
            Arc::new(devices) as ArrayRef,
            Arc::new(StringArray::from(vec![
                Some("/"),
                Some("/pricing"),
                None,
                Some("/"),
                Some("/blog"),
                Some("/"),
            ])) as ArrayRef,
            Arc::new(Int64Array::from(vec![12, 30, 7, 18, 4, 25])) as ArrayRef,
            Arc::new(Int64Array::from(vec![
                Some(40),
                Some(61),
                None,
                Some(55),
                Some(9),
                Some(70),
            ])) as ArrayRef,
            Arc::new(Float64Array::from(vec![
                Some(0.25),
                Some(0.5),
                Some(0.75),
                None,
                Some(0.5),
                Some(0.4),
            ])) as ArrayRef,
            Arc::new(Float64Array::from(vec![
                120.0, 45.0, 300.0, 90.0, 10.0, 60.0,
            ])) as ArrayRef,
        ],
    )
}

#[allow(clippy::expect_used)]
fn build(schema: Schema, columns: Vec<ArrayRef>) -> Table {
    let batch =
        RecordBatch::try_new(Arc::new(schema), columns).expect("fixture columns match schema");
    Table::new(batch).expect("fixture is a valid table")
}
