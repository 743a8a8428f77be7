//! Partitioning rows into groups by key columns.

use std::collections::BTreeMap;
use std::sync::Arc;

use arrow::array::{ArrayRef, AsArray, UInt64Array};
use arrow::compute::kernels::arity::unary;
use arrow::compute::{take, SortOptions};
use arrow::datatypes::{ArrowPrimitiveType, DataType, Float16Type, Float32Type, Float64Type};
use arrow::row::{OwnedRow, RowConverter, SortField};

use crate::error::Result;
use crate::table::Table;

type F16 = <Float16Type as ArrowPrimitiveType>::Native;

// Groups come out in ascending key order, null keys last.
const KEY_ORDER: SortOptions = SortOptions {
    descending: false,
    nulls_first: false,
};

/// Rows of a table partitioned by distinct key combinations.
#[derive(Debug)]
pub(crate) struct Groups {
    /// One array per key column holding one value per group.
    pub keys: Vec<ArrayRef>,
    /// Input row indices of each group, in input order.
    pub members: Vec<Vec<usize>>,
}

impl Groups {
    pub fn len(&self) -> usize {
        self.members.len()
    }
}

/// Groups the rows of `table` by `key_columns`.
///
/// Without key columns every row, including none at all, forms a single
/// group.
pub(crate) fn group_rows(table: &Table, key_columns: &[&str]) -> Result<Groups> {
    if key_columns.is_empty() {
        return Ok(Groups {
            keys: Vec::new(),
            members: vec![(0..table.num_rows()).collect()],
        });
    }

    let arrays = key_columns
        .iter()
        .map(|name| table.column(name).map(canonical_floats))
        .collect::<Result<Vec<_>>>()?;

    let converter = RowConverter::new(
        arrays
            .iter()
            .map(|a| SortField::new_with_options(a.data_type().clone(), KEY_ORDER))
            .collect(),
    )?;
    let rows = converter.convert_columns(&arrays)?;

    let mut partitions: BTreeMap<OwnedRow, Vec<usize>> = BTreeMap::new();
    for (index, row) in rows.iter().enumerate() {
        partitions.entry(row.owned()).or_default().push(index);
    }

    let first_rows =
        UInt64Array::from_iter_values(partitions.values().map(|members| members[0] as u64));
    let keys = arrays
        .iter()
        .map(|a| take(a.as_ref(), &first_rows, None))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Groups {
        keys,
        members: partitions.into_values().collect(),
    })
}

/// Rewrites `-0.0` as `0.0` and every NaN as the canonical NaN, so float
/// keys that compare equal land in one group. Other arrays pass through.
fn canonical_floats(array: &ArrayRef) -> ArrayRef {
    match array.data_type() {
        DataType::Float16 => Arc::new(unary::<_, _, Float16Type>(
            array.as_primitive::<Float16Type>(),
            |v| {
                if v.is_nan() {
                    F16::NAN
                } else if v == F16::ZERO {
                    F16::ZERO
                } else {
                    v
                }
            },
        )),
        DataType::Float32 => Arc::new(unary::<_, _, Float32Type>(
            array.as_primitive::<Float32Type>(),
            |v| {
                if v.is_nan() {
                    f32::NAN
                } else if v == 0.0 {
                    0.0
                } else {
                    v
                }
            },
        )),
        DataType::Float64 => Arc::new(unary::<_, _, Float64Type>(
            array.as_primitive::<Float64Type>(),
            |v| {
                if v.is_nan() {
                    f64::NAN
                } else if v == 0.0 {
                    0.0
                } else {
                    v
                }
            },
        )),
        _ => Arc::clone(array),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, AsArray, Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Int64Type, Schema};
    use arrow::record_batch::RecordBatch;
    use std::sync::Arc;

    fn table() -> Table {
        let batch = RecordBatch::try_new(
            Arc::new(Schema::new(vec![
                Field::new("hour", DataType::Int64, true),
                Field::new("device", DataType::Utf8, true),
                Field::new("sessions", DataType::Float64, true),
            ])),
            vec![
                Arc::new(Int64Array::from(vec![Some(2), Some(1), None, Some(1), Some(2)]))
                    as ArrayRef,
                Arc::new(StringArray::from(vec!["web", "app", "web", "app", "app"])) as ArrayRef,
                Arc::new(Float64Array::from(vec![1.0, 2.0, 3.0, 4.0, 5.0])) as ArrayRef,
            ],
        )
        .unwrap();
        Table::new(batch).unwrap()
    }

    #[test]
    fn test_no_keys_single_group() {
        let groups = group_rows(&table(), &[]).unwrap();
        assert_eq!(groups.len(), 1);
        assert!(groups.keys.is_empty());
        assert_eq!(groups.members[0], vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_single_key_sorted_nulls_last() {
        let groups = group_rows(&table(), &["hour"]).unwrap();
        assert_eq!(groups.len(), 3);

        let hours = groups.keys[0].as_primitive::<Int64Type>();
        assert_eq!(hours.value(0), 1);
        assert_eq!(hours.value(1), 2);
        assert!(hours.is_null(2));

        assert_eq!(groups.members, vec![vec![1, 3], vec![0, 4], vec![2]]);
    }

    #[test]
    fn test_signed_zero_and_nan_keys_share_groups() {
        let batch = RecordBatch::try_new(
            Arc::new(Schema::new(vec![
                Field::new("ratio", DataType::Float64, true),
                Field::new("sessions", DataType::Int64, false),
            ])),
            vec![
                Arc::new(Float64Array::from(vec![
                    0.0,
                    -0.0,
                    f64::NAN,
                    1.5,
                    -f64::NAN,
                ])) as ArrayRef,
                Arc::new(Int64Array::from(vec![1, 2, 3, 4, 5])) as ArrayRef,
            ],
        )
        .unwrap();
        let groups = group_rows(&Table::new(batch).unwrap(), &["ratio"]).unwrap();

        assert_eq!(groups.members, vec![vec![0, 1], vec![3], vec![2, 4]]);
        let ratios = groups.keys[0].as_primitive::<Float64Type>();
        assert_eq!(ratios.value(0).to_bits(), 0.0f64.to_bits());
        assert_eq!(ratios.value(1), 1.5);
        assert!(ratios.value(2).is_nan());
    }

    #[test]
    fn test_composite_key() {
        let groups = group_rows(&table(), &["hour", "device"]).unwrap();
        assert_eq!(groups.len(), 4);

        let devices = groups.keys[1].as_string::<i32>();
        let hours = groups.keys[0].as_primitive::<Int64Type>();
        assert_eq!((hours.value(0), devices.value(0)), (1, "app"));
        assert_eq!((hours.value(1), devices.value(1)), (2, "app"));
        assert_eq!((hours.value(2), devices.value(2)), (2, "web"));
        assert_eq!(groups.members[1], vec![4]);
    }

    #[test]
    fn test_empty_table_with_keys() {
        let batch = RecordBatch::new_empty(table().schema());
        let groups = group_rows(&Table::new(batch).unwrap(), &["hour"]).unwrap();
        assert_eq!(groups.len(), 0);
        assert_eq!(groups.keys[0].len(), 0);
    }
}
