//! Expenses with companies that were already closed or suspended.

use arrow::record_batch::RecordBatch;
use rosie_core::{Verdict, columns, frame};
use serde::{Deserialize, Serialize};

use crate::{Classifier, ClassifyError};

/// Registry situations under which a company cannot issue receipts.
const IRREGULAR_SITUATIONS: [&str; 4] = ["BAIXADA", "NULA", "INAPTA", "SUSPENSA"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrregularCompaniesClassifier {
    situations: Vec<String>,
}

impl Default for IrregularCompaniesClassifier {
    fn default() -> Self {
        Self {
            situations: IRREGULAR_SITUATIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Classifier for IrregularCompaniesClassifier {
    fn fit(&mut self, _batch: &RecordBatch) -> Result<(), ClassifyError> {
        Ok(())
    }

    /// Flags expenses issued after the company entered an irregular situation.
    fn predict(&self, batch: &RecordBatch) -> Result<Vec<Verdict>, ClassifyError> {
        let situations = frame::strings(batch, columns::SITUATION)?;
        let situation_dates = frame::dates(batch, columns::SITUATION_DATE)?;
        let issue_dates = frame::dates(batch, columns::ISSUE_DATE)?;

        Ok(situations
            .iter()
            .zip(&situation_dates)
            .zip(&issue_dates)
            .map(|((situation, since), issued)| {
                let irregular = situation.is_some_and(|s| self.situations.iter().any(|i| i == s));
                let after = matches!((since, issued), (Some(since), Some(issued)) if since < issued);
                Verdict::from(irregular && after)
            })
            .collect())
    }
}
