use std::path::PathBuf;

use arrow::error::ArrowError;
use rosie_classify::ClassifyError;
use rosie_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("{classifier}: {source}")]
    Classify {
        classifier: &'static str,
        #[source]
        source: ClassifyError,
    },

    #[error("reading model cache {path}: {source}")]
    CacheRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{classifier} returned {got} verdicts for {expected} rows")]
    VerdictCount {
        classifier: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("verdict column {0} belongs to a different dataset")]
    ForeignKeys(String),

    #[error("duplicate suspicion column {0}")]
    DuplicateColumn(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Arrow(#[from] ArrowError),
}
