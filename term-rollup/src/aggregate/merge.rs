//! Assembling key columns and bucket results into the output table.

use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::datatypes::{Field, FieldRef, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};

use super::grouping::Groups;
use super::reduce;
use super::{AggregationBucket, Reduction, RollupPlan};
use crate::error::Result;
use crate::table::Table;

/// Builds the output table: key columns first, then the sum, mean and date
/// buckets. Empty buckets add no columns, and every bucket shares the row
/// layout of `groups`.
pub(crate) fn merge(table: &Table, plan: &RollupPlan, groups: &Groups) -> Result<Table> {
    let schema = table.schema();
    let mut fields: Vec<FieldRef> = Vec::with_capacity(plan.output_width());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(plan.output_width());

    for (name, keys) in plan.group_by.iter().zip(&groups.keys) {
        let index = table.index_of(name)?;
        fields.push(Arc::clone(&schema.fields()[index]));
        columns.push(Arc::clone(keys));
    }

    for bucket in plan.buckets() {
        for name in &bucket.columns {
            let (field, column) = reduce_column(table, bucket, name, groups)?;
            fields.push(field);
            columns.push(column);
        }
    }

    let batch = RecordBatch::try_new_with_options(
        Arc::new(Schema::new(fields)),
        columns,
        &RecordBatchOptions::new().with_row_count(Some(groups.len())),
    )?;
    Table::new(batch)
}

fn reduce_column(
    table: &Table,
    bucket: &AggregationBucket,
    name: &str,
    groups: &Groups,
) -> Result<(FieldRef, ArrayRef)> {
    let index = table.index_of(name)?;
    let input = table.batch().column(index);
    let schema = table.schema();
    let metadata = schema.field(index).metadata().clone();

    let (column, nullable) = match bucket.reduction {
        Reduction::Sum => (reduce::sum(name, input, groups)?, false),
        Reduction::Mean => (reduce::mean(input, groups)?, true),
        Reduction::Min => (reduce::earliest(name, input, groups)?, true),
    };

    let field = Field::new(name, column.data_type().clone(), nullable)
        .with_metadata(metadata);
    Ok((Arc::new(field), column))
}
