use std::path::PathBuf;

use rosie_core::FrameError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("dataset file not found: {0}")]
    DatasetNotFound(PathBuf),

    #[error("no reimbursement files in {0}")]
    NoReimbursements(PathBuf),

    #[error("reading {path}: {source}")]
    Csv {
        path: PathBuf,
        source: arrow::error::ArrowError,
    },

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Frame(#[from] FrameError),
}
