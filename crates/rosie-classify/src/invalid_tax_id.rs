//! Receipts whose recipient id fails the CPF/CNPJ check digits.

use arrow::record_batch::RecordBatch;
use rosie_core::tax_id::is_valid_cpf_or_cnpj;
use rosie_core::{Verdict, columns, frame};
use serde::{Deserialize, Serialize};

use crate::{Classifier, ClassifyError};

/// Document types that must name a Brazilian taxpayer. `unknown` is what the
/// federal senate adapter assigns to every row.
const VALIDATED_DOCUMENT_TYPES: [&str; 3] = ["bill_of_sale", "simple_receipt", "unknown"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvalidCnpjCpfClassifier {
    document_types: Vec<String>,
}

impl Default for InvalidCnpjCpfClassifier {
    fn default() -> Self {
        Self {
            document_types: VALIDATED_DOCUMENT_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Classifier for InvalidCnpjCpfClassifier {
    fn fit(&mut self, _batch: &RecordBatch) -> Result<(), ClassifyError> {
        Ok(())
    }

    fn predict(&self, batch: &RecordBatch) -> Result<Vec<Verdict>, ClassifyError> {
        let document_types = frame::strings(batch, columns::DOCUMENT_TYPE)?;
        let recipients = frame::strings(batch, columns::RECIPIENT_ID)?;

        Ok(document_types
            .iter()
            .zip(&recipients)
            .map(|(doc_type, recipient)| {
                let validated =
                    doc_type.is_some_and(|t| self.document_types.iter().any(|d| d == t));
                // A missing id on a receipt that needs one is as bad as a wrong one.
                let valid = recipient.is_some_and(is_valid_cpf_or_cnpj);
                Verdict::from(validated && !valid)
            })
            .collect())
    }
}
