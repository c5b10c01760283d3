//! Atomic file output: xz-compressed CSV tables and whole-file rewrites.

use std::io::{BufWriter, Write};
use std::path::Path;

use arrow::csv::WriterBuilder;
use arrow::record_batch::RecordBatch;
use tempfile::NamedTempFile;
use tracing::info;
use xz2::write::XzEncoder;

use crate::StoreError;

const XZ_LEVEL: u32 = 6;

/// Write through `write` into a temp file next to `path`, then rename it
/// into place. On any error the destination is left untouched.
pub fn write_atomic<F>(path: &Path, write: F) -> Result<(), StoreError>
where
    F: FnOnce(&mut dyn Write) -> Result<(), StoreError>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut out = BufWriter::new(tmp.as_file_mut());
        write(&mut out)?;
        out.flush()?;
    }
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

/// Write `batch` as a UTF-8 CSV with a header row, xz-compressed.
pub fn write_csv_xz(path: &Path, batch: &RecordBatch) -> Result<(), StoreError> {
    write_atomic(path, |out| {
        let encoder = XzEncoder::new(out, XZ_LEVEL);
        let mut writer = WriterBuilder::new().with_header(true).build(encoder);
        writer.write(batch)?;
        writer.into_inner().finish()?;
        Ok(())
    })?;
    info!(path = %path.display(), rows = batch.num_rows(), "wrote compressed csv");
    Ok(())
}
