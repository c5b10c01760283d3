//! Run summary printed after a successful run.

use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use rosie_driver::RunReport;

// ── Public API ──

/// Print one line per classifier: where its model came from and how many
/// rows it flagged.
pub fn print_summary(report: &RunReport) -> anyhow::Result<()> {
    println!("=== {} ===", report.module);
    println!("{} reimbursements -> {}", report.rows, report.output.display());
    println!("{}", pretty_format_batches(&[summary_batch(report)?])?);
    Ok(())
}

// ── Table building ──

fn summary_batch(report: &RunReport) -> anyhow::Result<RecordBatch> {
    let schema = Schema::new(vec![
        Field::new("classifier", DataType::Utf8, false),
        Field::new("model", DataType::Utf8, false),
        Field::new("flagged", DataType::UInt64, false),
    ]);
    let names: ArrayRef = Arc::new(StringArray::from_iter_values(
        report.classifiers.iter().map(|c| c.name),
    ));
    let sources: ArrayRef = Arc::new(StringArray::from_iter_values(
        report.classifiers.iter().map(|c| c.source.to_string()),
    ));
    let flagged: ArrayRef = Arc::new(UInt64Array::from_iter_values(
        report.classifiers.iter().map(|c| c.flagged as u64),
    ));
    Ok(RecordBatch::try_new(Arc::new(schema), vec![names, sources, flagged])?)
}
