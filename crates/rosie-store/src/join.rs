//! Left join of reimbursements against the company registry.

use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{Array, UInt32Array};
use arrow::compute::take;
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use rosie_core::frame;
use tracing::debug;

use crate::StoreError;

/// Left-join `right` onto `left` where `left[left_on] == right[right_on]`.
///
/// Every left row is kept exactly once and in order. When several right rows
/// share a key the first one wins. Right columns whose names already exist on
/// the left are skipped, so the left value always wins.
pub fn left_join(
    left: &RecordBatch,
    right: &RecordBatch,
    left_on: &str,
    right_on: &str,
) -> Result<RecordBatch, StoreError> {
    let right_keys = frame::strings(right, right_on)?;
    let mut index: HashMap<&str, u32> = HashMap::with_capacity(right_keys.len());
    for (row, key) in right_keys.iter().enumerate() {
        if let Some(key) = key {
            index.entry(key).or_insert(row as u32);
        }
    }

    let left_keys = frame::strings(left, left_on)?;
    let indices: UInt32Array = left_keys
        .iter()
        .map(|key| key.and_then(|k| index.get(k).copied()))
        .collect();
    let matched = indices.len() - indices.null_count();

    let left_schema = left.schema();
    let mut fields: Vec<Field> = left_schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    let mut columns = left.columns().to_vec();

    let right_schema = right.schema();
    for (field, col) in right_schema.fields().iter().zip(right.columns()) {
        if left_schema.index_of(field.name()).is_ok() {
            continue;
        }
        fields.push(Field::new(field.name(), field.data_type().clone(), true));
        columns.push(take(col.as_ref(), &indices, None)?);
    }

    debug!(rows = left.num_rows(), matched, "joined companies");
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}
