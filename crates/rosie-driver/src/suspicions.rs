//! The suspicions table, built by folding verdict columns into the dataset's
//! key projection.

use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray};
use arrow::record_batch::RecordBatch;
use rosie_core::Verdict;
use rosie_core::schema::suspicions::suspicions_schema;

use crate::DriverError;

/// Verdicts of one classifier, tied to the key projection they were
/// computed for.
#[derive(Debug, Clone)]
pub struct VerdictColumn {
    keys: Arc<RecordBatch>,
    flags: BooleanArray,
}

impl VerdictColumn {
    pub fn new(
        classifier: &'static str,
        keys: &Arc<RecordBatch>,
        verdicts: &[Verdict],
    ) -> Result<Self, DriverError> {
        if verdicts.len() != keys.num_rows() {
            return Err(DriverError::VerdictCount {
                classifier,
                expected: keys.num_rows(),
                got: verdicts.len(),
            });
        }
        let flags: BooleanArray = verdicts.iter().map(|v| Some(v.is_flagged())).collect();
        Ok(Self {
            keys: Arc::clone(keys),
            flags,
        })
    }

    pub fn flagged(&self) -> usize {
        self.flags.true_count()
    }
}

/// Key columns plus one Boolean column per classifier, in fold order.
#[derive(Debug, Clone)]
pub struct SuspicionTable {
    keys: Arc<RecordBatch>,
    columns: Vec<(String, ArrayRef)>,
}

impl SuspicionTable {
    pub fn new(keys: &Arc<RecordBatch>) -> Self {
        Self {
            keys: Arc::clone(keys),
            columns: Vec::new(),
        }
    }

    /// Append `column` under `name`. The column must come from this table's
    /// key projection, not merely one with the same length.
    pub fn with_column(mut self, name: &str, column: VerdictColumn) -> Result<Self, DriverError> {
        if !Arc::ptr_eq(&self.keys, &column.keys) {
            return Err(DriverError::ForeignKeys(name.to_string()));
        }
        if self.columns.iter().any(|(existing, _)| existing == name) {
            return Err(DriverError::DuplicateColumn(name.to_string()));
        }
        self.columns.push((name.to_string(), Arc::new(column.flags)));
        Ok(self)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn to_record_batch(&self) -> Result<RecordBatch, DriverError> {
        let keys: Vec<_> = self
            .keys
            .schema()
            .fields()
            .iter()
            .map(|f| f.as_ref().clone())
            .collect();
        let names: Vec<&str> = self.names().collect();
        let schema = suspicions_schema(&keys, &names);

        let mut arrays: Vec<ArrayRef> = self.keys.columns().to_vec();
        arrays.extend(self.columns.iter().map(|(_, array)| Arc::clone(array)));
        Ok(RecordBatch::try_new(Arc::new(schema), arrays)?)
    }
}
