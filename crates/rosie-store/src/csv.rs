//! CSV loading with transparent xz decompression.
//!
//! Every column is read as `Utf8` first. [`coerce_types`] then converts the
//! handful of numeric and date columns, turning unparsable values into nulls.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Date32Array, StringArray};
use arrow::compute::{cast, concat_batches};
use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::datatypes::{DataType, Date32Type, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use rosie_core::{FrameError, columns};
use rosie_core::schema::reimbursements;
use tracing::debug;
use xz2::read::XzDecoder;

use crate::StoreError;

const BATCH_SIZE: usize = 8192;

/// Open a file for reading, decompressing it when the name ends in `.xz`.
pub fn open(path: &Path) -> Result<Box<dyn Read>, StoreError> {
    if !path.exists() {
        return Err(StoreError::DatasetNotFound(path.to_path_buf()));
    }
    let file = BufReader::new(File::open(path)?);
    if path.extension().is_some_and(|ext| ext == "xz") {
        Ok(Box::new(XzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

/// Read a CSV file with a header row into a single all-`Utf8` batch.
pub fn read_csv(path: &Path) -> Result<RecordBatch, StoreError> {
    let mut bytes = Vec::new();
    open(path)?.read_to_end(&mut bytes)?;

    let csv_err = |source| StoreError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let format = Format::default().with_header(true);
    let (header, _) = format
        .infer_schema(bytes.as_slice(), Some(0))
        .map_err(csv_err)?;
    let schema = Arc::new(Schema::new(
        header
            .fields()
            .iter()
            .map(|f| Field::new(f.name(), DataType::Utf8, true))
            .collect::<Vec<_>>(),
    ));

    let reader = ReaderBuilder::new(Arc::clone(&schema))
        .with_format(format)
        .with_batch_size(BATCH_SIZE)
        .build(bytes.as_slice())
        .map_err(csv_err)?;
    let batches = reader.collect::<Result<Vec<_>, _>>().map_err(csv_err)?;
    let batch = concat_batches(&schema, &batches)?;

    debug!(path = %path.display(), rows = batch.num_rows(), "read csv");
    Ok(batch)
}

/// Convert the typed columns of the analysis frame from `Utf8`.
///
/// Columns that are already typed, or that the frame keeps as strings, are
/// passed through untouched.
pub fn coerce_types(batch: &RecordBatch) -> Result<RecordBatch, StoreError> {
    let schema = batch.schema();
    let mut fields = Vec::with_capacity(schema.fields().len());
    let mut arrays = Vec::with_capacity(schema.fields().len());

    for (field, col) in schema.fields().iter().zip(batch.columns()) {
        let target = reimbursements::column_type(field.name());
        let col = if col.data_type() == &DataType::Utf8 && target != DataType::Utf8 {
            convert(field.name(), col, &target)?
        } else {
            Arc::clone(col)
        };
        fields.push(Field::new(field.name(), col.data_type().clone(), true));
        arrays.push(col);
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

fn convert(name: &str, col: &ArrayRef, target: &DataType) -> Result<ArrayRef, StoreError> {
    if target != &DataType::Date32 {
        // Safe cast: values that do not parse become null.
        return Ok(cast(col.as_ref(), target)?);
    }
    let strings = col
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| FrameError::UnexpectedType {
            column: name.to_string(),
            expected: "Utf8",
            found: col.data_type().clone(),
        })?;
    let formats = date_formats(name);
    let days: Date32Array = strings
        .iter()
        .map(|v| v.and_then(|s| parse_date(s, formats)).map(Date32Type::from_naive_date))
        .collect();
    Ok(Arc::new(days))
}

/// Accepted layouts per date column, tried in order.
fn date_formats(column: &str) -> &'static [&'static str] {
    match column {
        columns::SITUATION_DATE => &["%d/%m/%Y", "%Y-%m-%d"],
        _ => &["%Y-%m-%d"],
    }
}

/// Parse a date, ignoring any time-of-day suffix (`2016-01-01T00:00:00`).
pub fn parse_date(value: &str, formats: &[&str]) -> Option<NaiveDate> {
    let value = value.trim();
    let day = value.split(['T', ' ']).next().unwrap_or(value);
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(day, fmt).ok())
}
