//! Expenses paid to companies registered as electoral campaigns.

use std::sync::LazyLock;

use arrow::record_batch::RecordBatch;
use regex::Regex;
use rosie_core::settings::ElectionSettings;
use rosie_core::text::normalize;
use rosie_core::{Verdict, columns, frame};
use serde::{Deserialize, Serialize};

use crate::{Classifier, ClassifyError};

/// Legal entity code of a candidacy registered for an election.
pub const CANDIDACY_LEGAL_ENTITY: &str = "409-0 - CANDIDATO A CARGO POLITICO ELETIVO";

static ELECTION_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"eleic(ao|oes)").expect("valid pattern"));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElectionExpensesClassifier {
    match_supplier_name: bool,
}

impl ElectionExpensesClassifier {
    pub fn new(settings: &ElectionSettings) -> Self {
        Self {
            match_supplier_name: settings.match_supplier_name,
        }
    }

    pub fn matches_supplier_name(&self) -> bool {
        self.match_supplier_name
    }
}

impl Classifier for ElectionExpensesClassifier {
    fn fit(&mut self, _batch: &RecordBatch) -> Result<(), ClassifyError> {
        Ok(())
    }

    fn predict(&self, batch: &RecordBatch) -> Result<Vec<Verdict>, ClassifyError> {
        let legal_entities = frame::strings(batch, columns::LEGAL_ENTITY)?;
        let names = if self.match_supplier_name {
            frame::optional_strings(batch, columns::NAME)?
        } else {
            vec![None; batch.num_rows()]
        };

        Ok(legal_entities
            .iter()
            .zip(&names)
            .map(|(entity, name)| {
                let candidacy = *entity == Some(CANDIDACY_LEGAL_ENTITY);
                let named = name.is_some_and(|n| ELECTION_NAME.is_match(&normalize(n)));
                Verdict::from(candidacy || named)
            })
            .collect())
    }
}
