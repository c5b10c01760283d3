//! The analysis frame paired with its unique-key projection.

use std::sync::Arc;

use arrow::record_batch::RecordBatch;

use crate::frame::FrameError;

/// A loaded reimbursement frame.
///
/// `keys` is the projection of the unique-id columns, computed once. Verdict
/// columns are tied to this exact projection (by `Arc` identity), which is
/// how the suspicions table knows every column shares one row order.
#[derive(Debug, Clone)]
pub struct Dataset {
    batch: RecordBatch,
    keys: Arc<RecordBatch>,
}

impl Dataset {
    /// Pair `batch` with the projection of `unique_ids`.
    ///
    /// An empty `unique_ids` keeps every column as key.
    pub fn new(batch: RecordBatch, unique_ids: &[&str]) -> Result<Self, FrameError> {
        let keys = if unique_ids.is_empty() {
            batch.clone()
        } else {
            let schema = batch.schema();
            let indices = unique_ids
                .iter()
                .map(|name| {
                    schema
                        .index_of(name)
                        .map_err(|_| FrameError::MissingColumn(name.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            batch
                .project(&indices)
                .map_err(|_| FrameError::MissingColumn(unique_ids.join(",")))?
        };
        Ok(Self {
            batch,
            keys: Arc::new(keys),
        })
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn keys(&self) -> &Arc<RecordBatch> {
        &self.keys
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }
}
