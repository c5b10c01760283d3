//! Column-level reshaping of Arrow batches: renames, replacements, stacking.

use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, new_null_array};
use arrow::compute::{concat_batches, filter_record_batch};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use crate::StoreError;

/// Rename columns per `(from, to)` pairs. Absent `from` columns are ignored.
pub fn rename_columns(batch: &RecordBatch, renames: &[(&str, &str)]) -> Result<RecordBatch, StoreError> {
    let lookup: HashMap<&str, &str> = renames.iter().copied().collect();
    let schema = batch.schema();
    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .map(|f| {
            let name = lookup.get(f.name().as_str()).copied().unwrap_or(f.name());
            Field::new(name, f.data_type().clone(), f.is_nullable())
        })
        .collect();
    Ok(RecordBatch::try_new(
        Arc::new(Schema::new(fields)),
        batch.columns().to_vec(),
    )?)
}

/// Replace column `name`, or append it when absent.
pub fn set_column(batch: &RecordBatch, name: &str, array: ArrayRef) -> Result<RecordBatch, StoreError> {
    let schema = batch.schema();
    let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    let mut columns = batch.columns().to_vec();
    let field = Field::new(name, array.data_type().clone(), true);

    match schema.index_of(name) {
        Ok(idx) => {
            fields[idx] = field;
            columns[idx] = array;
        }
        Err(_) => {
            fields.push(field);
            columns.push(array);
        }
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

/// Stack batches whose columns may differ, e.g. yearly extracts that gained
/// a column over time.
///
/// The result has the union of all columns in first-seen order; batches
/// lacking a column get nulls there. Columns sharing a name must share a type.
pub fn concat_aligned(batches: &[RecordBatch]) -> Result<RecordBatch, StoreError> {
    let mut fields: Vec<Field> = Vec::new();
    for batch in batches {
        for field in batch.schema().fields() {
            if !fields.iter().any(|f| f.name() == field.name()) {
                fields.push(Field::new(field.name(), field.data_type().clone(), true));
            }
        }
    }
    let schema = Arc::new(Schema::new(fields));

    let aligned = batches
        .iter()
        .map(|batch| {
            let columns = schema
                .fields()
                .iter()
                .map(|field| match batch.column_by_name(field.name()) {
                    Some(col) => Arc::clone(col),
                    None => new_null_array(field.data_type(), batch.num_rows()),
                })
                .collect();
            RecordBatch::try_new(Arc::clone(&schema), columns)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(concat_batches(&schema, &aligned)?)
}

/// Keep only rows where `column` is non-null and non-empty.
pub fn drop_null_rows(batch: &RecordBatch, column: &str) -> Result<RecordBatch, StoreError> {
    let values = rosie_core::frame::strings(batch, column)?;
    let keep: BooleanArray = values.iter().map(|v| Some(v.is_some())).collect();
    Ok(filter_record_batch(batch, &keep)?)
}

/// A `Utf8` column holding `value` in every row.
pub fn constant_string(value: &str, rows: usize) -> ArrayRef {
    Arc::new(arrow::array::StringArray::from(vec![value; rows]))
}

/// Whether `batch` has a column named `name` of type `data_type`.
pub fn has_column(batch: &RecordBatch, name: &str, data_type: &DataType) -> bool {
    batch
        .schema()
        .field_with_name(name)
        .is_ok_and(|f| f.data_type() == data_type)
}

#[cfg(test)]
mod tests {
    use arrow::array::{Array, StringArray};

    use super::*;

    fn strings_batch(columns: &[(&str, Vec<Option<&str>>)]) -> RecordBatch {
        let fields: Vec<Field> = columns
            .iter()
            .map(|(name, _)| Field::new(*name, DataType::Utf8, true))
            .collect();
        let arrays: Vec<ArrayRef> = columns
            .iter()
            .map(|(_, values)| Arc::new(StringArray::from(values.clone())) as ArrayRef)
            .collect();
        RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).unwrap()
    }

    #[test]
    fn rename_keeps_data() {
        let batch = strings_batch(&[("cnpj_cpf", vec![Some("1")]), ("supplier", vec![Some("A")])]);
        let renamed = rename_columns(&batch, &[("cnpj_cpf", "recipient_id"), ("missing", "x")]).unwrap();
        let schema = renamed.schema();
        assert_eq!(schema.field(0).name(), "recipient_id");
        assert_eq!(schema.field(1).name(), "supplier");
    }

    #[test]
    fn set_column_replaces_or_appends() {
        let batch = strings_batch(&[("a", vec![Some("1"), Some("2")])]);
        let replaced = set_column(&batch, "a", constant_string("x", 2)).unwrap();
        assert_eq!(replaced.num_columns(), 1);
        let appended = set_column(&batch, "b", constant_string("y", 2)).unwrap();
        assert_eq!(appended.num_columns(), 2);
        assert_eq!(appended.schema().field(1).name(), "b");
    }

    #[test]
    fn concat_fills_missing_columns_with_nulls() {
        let older = strings_batch(&[("a", vec![Some("1")])]);
        let newer = strings_batch(&[("b", vec![Some("x")]), ("a", vec![Some("2")])]);
        let stacked = concat_aligned(&[older, newer]).unwrap();
        assert_eq!(stacked.num_rows(), 2);
        assert_eq!(stacked.num_columns(), 2);
        let b = stacked.column_by_name("b").unwrap();
        assert!(b.is_null(0));
        assert!(!b.is_null(1));
    }

    #[test]
    fn drop_null_rows_filters() {
        let batch = strings_batch(&[("id", vec![Some("1"), None, Some("")])]);
        let kept = drop_null_rows(&batch, "id").unwrap();
        assert_eq!(kept.num_rows(), 1);
    }

    #[test]
    fn has_column_checks_type() {
        let batch = strings_batch(&[("id", vec![Some("1")])]);
        assert!(has_column(&batch, "id", &DataType::Utf8));
        assert!(!has_column(&batch, "id", &DataType::Int64));
        assert!(!has_column(&batch, "other", &DataType::Utf8));
    }
}
