//! Per-group reductions: sum, mean and earliest value.
//!
//! Every reduction ignores missing values. Nulls are skipped everywhere and
//! NaN counts as missing in floating point columns.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, Float64Array, Int64Array, UInt64Array};
use arrow::compute::{cast_with_options, take, CastOptions};
use arrow::datatypes::{
    DataType, Date32Type, Date64Type, Float64Type, Int64Type, TimeUnit, TimestampMicrosecondType,
    TimestampMillisecondType, TimestampNanosecondType, TimestampSecondType, UInt64Type,
};

use super::grouping::Groups;
use crate::error::{Result, RollupError};

fn strict_cast<'a>() -> CastOptions<'a> {
    CastOptions {
        safe: false,
        ..Default::default()
    }
}

/// Output type of a summed column.
pub(crate) fn sum_type(input: &DataType) -> DataType {
    if input.is_integer() {
        DataType::Int64
    } else {
        DataType::Float64
    }
}

/// Sums each group. Integer columns sum into `Int64`, everything else into
/// `Float64`; a group without values sums to zero. An integer total outside
/// the `Int64` range is an [`RollupError::ArithmeticOverflow`].
pub(crate) fn sum(column: &str, array: &ArrayRef, groups: &Groups) -> Result<ArrayRef> {
    let data_type = array.data_type();
    if data_type.is_unsigned_integer() {
        let values = cast_with_options(array.as_ref(), &DataType::UInt64, &strict_cast())?;
        let values = values.as_primitive::<UInt64Type>();
        let sums = integer_sums(column, groups, |row| {
            values.is_valid(row).then(|| i128::from(values.value(row)))
        })?;
        return Ok(Arc::new(Int64Array::from(sums)));
    }
    if data_type.is_integer() {
        let values = cast_with_options(array.as_ref(), &DataType::Int64, &strict_cast())?;
        let values = values.as_primitive::<Int64Type>();
        let sums = integer_sums(column, groups, |row| {
            values.is_valid(row).then(|| i128::from(values.value(row)))
        })?;
        return Ok(Arc::new(Int64Array::from(sums)));
    }

    let values = float_values(array)?;
    let values = values.as_primitive::<Float64Type>();
    let sums: Vec<f64> = groups
        .members
        .iter()
        .map(|rows| present(values, rows).sum())
        .collect();
    Ok(Arc::new(Float64Array::from(sums)))
}

/// Averages each group; null when a group has no values.
pub(crate) fn mean(array: &ArrayRef, groups: &Groups) -> Result<ArrayRef> {
    let values = float_values(array)?;
    let values = values.as_primitive::<Float64Type>();

    let means: Vec<Option<f64>> = groups
        .members
        .iter()
        .map(|rows| {
            let (total, count) =
                present(values, rows).fold((0.0, 0usize), |(t, c), v| (t + v, c + 1));
            (count > 0).then(|| total / count as f64)
        })
        .collect();
    Ok(Arc::new(Float64Array::from(means)))
}

/// Picks the earliest value of each group, keeping the column's own type;
/// null when a group has no values.
pub(crate) fn earliest(column: &str, array: &ArrayRef, groups: &Groups) -> Result<ArrayRef> {
    let ordinals = temporal_ordinals(column, array)?;

    let picks: Vec<Option<u64>> = groups
        .members
        .iter()
        .map(|rows| {
            rows.iter()
                .filter_map(|&row| ordinals[row].map(|ordinal| (ordinal, row)))
                .min()
                .map(|(_, row)| row as u64)
        })
        .collect();

    Ok(take(array.as_ref(), &UInt64Array::from(picks), None)?)
}

// Accumulates in i128 so only the final total has to fit in i64.
fn integer_sums(
    column: &str,
    groups: &Groups,
    value: impl Fn(usize) -> Option<i128>,
) -> Result<Vec<i64>> {
    let overflow = || RollupError::ArithmeticOverflow {
        column: column.to_string(),
    };
    groups
        .members
        .iter()
        .map(|rows| {
            let total = rows
                .iter()
                .filter_map(|&row| value(row))
                .try_fold(0i128, i128::checked_add)
                .ok_or_else(overflow)?;
            i64::try_from(total).map_err(|_| overflow())
        })
        .collect()
}

fn float_values(array: &ArrayRef) -> Result<ArrayRef> {
    Ok(cast_with_options(
        array.as_ref(),
        &DataType::Float64,
        &strict_cast(),
    )?)
}

fn present<'a>(
    values: &'a Float64Array,
    rows: &'a [usize],
) -> impl Iterator<Item = f64> + 'a {
    rows.iter()
        .filter(|&&row| values.is_valid(row))
        .map(|&row| values.value(row))
        .filter(|v| !v.is_nan())
}

fn temporal_ordinals(column: &str, array: &ArrayRef) -> Result<Vec<Option<i64>>> {
    let ordinals = match array.data_type() {
        DataType::Date32 => array
            .as_primitive::<Date32Type>()
            .iter()
            .map(|v| v.map(i64::from))
            .collect(),
        DataType::Date64 => array.as_primitive::<Date64Type>().iter().collect(),
        DataType::Timestamp(TimeUnit::Second, _) => {
            array.as_primitive::<TimestampSecondType>().iter().collect()
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => array
            .as_primitive::<TimestampMillisecondType>()
            .iter()
            .collect(),
        DataType::Timestamp(TimeUnit::Microsecond, _) => array
            .as_primitive::<TimestampMicrosecondType>()
            .iter()
            .collect(),
        DataType::Timestamp(TimeUnit::Nanosecond, _) => array
            .as_primitive::<TimestampNanosecondType>()
            .iter()
            .collect(),
        other => {
            return Err(RollupError::type_mismatch(
                format!("date storage for column '{column}'"),
                other.to_string(),
            ))
        }
    };
    Ok(ordinals)
}
