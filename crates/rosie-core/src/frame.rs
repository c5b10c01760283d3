//! Typed column access over Arrow `RecordBatch`es.
//!
//! Classifiers read the analysis frame column by column. These helpers look
//! a column up by name, check its type and return owned-or-borrowed Rust
//! values with nulls as `None`.

use arrow::array::{
    Array, BooleanArray, Date32Array, Float64Array, Int64Array, LargeStringArray, StringArray,
};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("missing '{0}' column")]
    MissingColumn(String),

    #[error("column '{column}' has type {found}, expected {expected}")]
    UnexpectedType {
        column: String,
        expected: &'static str,
        found: DataType,
    },
}

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a dyn Array, FrameError> {
    batch
        .column_by_name(name)
        .map(|col| col.as_ref())
        .ok_or_else(|| FrameError::MissingColumn(name.to_string()))
}

fn unexpected(name: &str, expected: &'static str, col: &dyn Array) -> FrameError {
    FrameError::UnexpectedType {
        column: name.to_string(),
        expected,
        found: col.data_type().clone(),
    }
}

/// String values of a Utf8 or LargeUtf8 column. Empty strings read as `None`.
pub fn strings<'a>(batch: &'a RecordBatch, name: &str) -> Result<Vec<Option<&'a str>>, FrameError> {
    let col = column(batch, name)?;
    let values: Vec<Option<&str>> = if let Some(arr) = col.as_any().downcast_ref::<StringArray>() {
        arr.iter().collect()
    } else if let Some(arr) = col.as_any().downcast_ref::<LargeStringArray>() {
        arr.iter().collect()
    } else {
        return Err(unexpected(name, "Utf8", col));
    };
    Ok(values
        .into_iter()
        .map(|v| v.filter(|s| !s.is_empty()))
        .collect())
}

/// Like [`strings`] but an absent column reads as all-null.
pub fn optional_strings<'a>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<Vec<Option<&'a str>>, FrameError> {
    match strings(batch, name) {
        Err(FrameError::MissingColumn(_)) => Ok(vec![None; batch.num_rows()]),
        other => other,
    }
}

/// Float values; Int64 columns are widened.
pub fn floats(batch: &RecordBatch, name: &str) -> Result<Vec<Option<f64>>, FrameError> {
    let col = column(batch, name)?;
    if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
        return Ok(arr.iter().collect());
    }
    if let Some(arr) = col.as_any().downcast_ref::<Int64Array>() {
        return Ok(arr.iter().map(|v| v.map(|v| v as f64)).collect());
    }
    Err(unexpected(name, "Float64", col))
}

/// Integer values of an Int64 column.
pub fn ints(batch: &RecordBatch, name: &str) -> Result<Vec<Option<i64>>, FrameError> {
    let col = column(batch, name)?;
    col.as_any()
        .downcast_ref::<Int64Array>()
        .map(|arr| arr.iter().collect())
        .ok_or_else(|| unexpected(name, "Int64", col))
}

/// Date values of a Date32 column.
pub fn dates(batch: &RecordBatch, name: &str) -> Result<Vec<Option<NaiveDate>>, FrameError> {
    let col = column(batch, name)?;
    let arr = col
        .as_any()
        .downcast_ref::<Date32Array>()
        .ok_or_else(|| unexpected(name, "Date32", col))?;
    Ok((0..arr.len())
        .map(|i| if arr.is_null(i) { None } else { arr.value_as_date(i) })
        .collect())
}

/// Boolean values of a Boolean column.
pub fn bools(batch: &RecordBatch, name: &str) -> Result<Vec<Option<bool>>, FrameError> {
    let col = column(batch, name)?;
    col.as_any()
        .downcast_ref::<BooleanArray>()
        .map(|arr| arr.iter().collect())
        .ok_or_else(|| unexpected(name, "Boolean", col))
}
