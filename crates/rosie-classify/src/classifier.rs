//! The classifier contract and the closed set of classifiers a run can use.
//!
//! Every classifier follows the same lifecycle: `fit` on the full dataset,
//! an optional `transform`, then `predict` one [`Verdict`] per row. Fitted
//! state round-trips through JSON so the driver can cache it between runs.

use std::fmt;

use arrow::record_batch::RecordBatch;
use rosie_core::{Settings, Verdict};
use serde::{Deserialize, Serialize};

use crate::ClassifyError;
use crate::election::ElectionExpensesClassifier;
use crate::invalid_tax_id::InvalidCnpjCpfClassifier;
use crate::irregular_companies::IrregularCompaniesClassifier;
use crate::meal_price::MealPriceOutlierClassifier;
use crate::monthly_limit::MonthlySubquotaLimitClassifier;
use crate::traveled_speeds::TraveledSpeedsClassifier;

pub trait Classifier {
    fn fit(&mut self, batch: &RecordBatch) -> Result<(), ClassifyError>;

    /// Preparation between fit and predict. Most classifiers need none.
    fn transform(&mut self, _batch: &RecordBatch) -> Result<(), ClassifyError> {
        Ok(())
    }

    /// One verdict per row of `batch`, in row order.
    fn predict(&self, batch: &RecordBatch) -> Result<Vec<Verdict>, ClassifyError>;
}

// ── Kinds ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassifierKind {
    ElectionExpenses,
    IrregularCompanies,
    InvalidCnpjCpf,
    MealPriceOutlier,
    TraveledSpeeds,
    MonthlySubquotaLimit,
}

impl ClassifierKind {
    pub const ALL: [ClassifierKind; 6] = [
        Self::ElectionExpenses,
        Self::IrregularCompanies,
        Self::InvalidCnpjCpf,
        Self::MealPriceOutlier,
        Self::TraveledSpeeds,
        Self::MonthlySubquotaLimit,
    ];

    /// Type name; also the stem of the model cache file once lowercased.
    pub fn class_name(&self) -> &'static str {
        match self {
            Self::ElectionExpenses => "ElectionExpensesClassifier",
            Self::IrregularCompanies => "IrregularCompaniesClassifier",
            Self::InvalidCnpjCpf => "InvalidCnpjCpfClassifier",
            Self::MealPriceOutlier => "MealPriceOutlierClassifier",
            Self::TraveledSpeeds => "TraveledSpeedsClassifier",
            Self::MonthlySubquotaLimit => "MonthlySubquotaLimitClassifier",
        }
    }

    /// Column name of this classifier's verdicts in the suspicions table.
    pub fn key(&self) -> &'static str {
        match self {
            Self::ElectionExpenses => "election_expenses",
            Self::IrregularCompanies => "irregular_companies_classifier",
            Self::InvalidCnpjCpf => "invalid_cnpj_cpf",
            Self::MealPriceOutlier => "meal_price_outlier",
            Self::TraveledSpeeds => "suspicious_traveled_speed_day",
            Self::MonthlySubquotaLimit => "over_monthly_subquota_limit",
        }
    }

    /// The monthly limit model is bound to the rows it was fitted on.
    pub fn cacheable(&self) -> bool {
        !matches!(self, Self::MonthlySubquotaLimit)
    }

    /// A fresh, unfitted model configured from `settings`.
    pub fn instantiate(&self, settings: &Settings) -> Result<Model, ClassifyError> {
        Ok(match self {
            Self::ElectionExpenses => {
                Model::ElectionExpenses(ElectionExpensesClassifier::new(&settings.election))
            }
            Self::IrregularCompanies => Model::IrregularCompanies(Default::default()),
            Self::InvalidCnpjCpf => Model::InvalidCnpjCpf(Default::default()),
            Self::MealPriceOutlier => {
                Model::MealPriceOutlier(MealPriceOutlierClassifier::new(&settings.meal_price))
            }
            Self::TraveledSpeeds => {
                Model::TraveledSpeeds(TraveledSpeedsClassifier::new(&settings.traveled_speeds)?)
            }
            Self::MonthlySubquotaLimit => Model::MonthlySubquotaLimit(Default::default()),
        })
    }
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

// ── Models ──

/// A classifier instance of any kind, tagged by kind in its JSON form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "classifier", rename_all = "snake_case")]
pub enum Model {
    ElectionExpenses(ElectionExpensesClassifier),
    IrregularCompanies(IrregularCompaniesClassifier),
    InvalidCnpjCpf(InvalidCnpjCpfClassifier),
    MealPriceOutlier(MealPriceOutlierClassifier),
    TraveledSpeeds(TraveledSpeedsClassifier),
    MonthlySubquotaLimit(MonthlySubquotaLimitClassifier),
}

impl Model {
    pub fn kind(&self) -> ClassifierKind {
        match self {
            Self::ElectionExpenses(_) => ClassifierKind::ElectionExpenses,
            Self::IrregularCompanies(_) => ClassifierKind::IrregularCompanies,
            Self::InvalidCnpjCpf(_) => ClassifierKind::InvalidCnpjCpf,
            Self::MealPriceOutlier(_) => ClassifierKind::MealPriceOutlier,
            Self::TraveledSpeeds(_) => ClassifierKind::TraveledSpeeds,
            Self::MonthlySubquotaLimit(_) => ClassifierKind::MonthlySubquotaLimit,
        }
    }

    /// Whether this model was built with the parameters `settings` asks for.
    /// A cached model that fails this check is stale.
    pub fn configured_by(&self, settings: &Settings) -> bool {
        match self {
            Self::ElectionExpenses(c) => {
                c.matches_supplier_name() == settings.election.match_supplier_name
            }
            Self::MealPriceOutlier(c) => c.settings() == &settings.meal_price,
            Self::TraveledSpeeds(c) => c.settings() == &settings.traveled_speeds,
            Self::IrregularCompanies(_) | Self::InvalidCnpjCpf(_) | Self::MonthlySubquotaLimit(_) => {
                true
            }
        }
    }

    pub fn to_json(&self) -> Result<String, ClassifyError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ClassifyError> {
        Ok(serde_json::from_str(json)?)
    }

    fn inner(&self) -> &dyn Classifier {
        match self {
            Self::ElectionExpenses(c) => c,
            Self::IrregularCompanies(c) => c,
            Self::InvalidCnpjCpf(c) => c,
            Self::MealPriceOutlier(c) => c,
            Self::TraveledSpeeds(c) => c,
            Self::MonthlySubquotaLimit(c) => c,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Classifier {
        match self {
            Self::ElectionExpenses(c) => c,
            Self::IrregularCompanies(c) => c,
            Self::InvalidCnpjCpf(c) => c,
            Self::MealPriceOutlier(c) => c,
            Self::TraveledSpeeds(c) => c,
            Self::MonthlySubquotaLimit(c) => c,
        }
    }
}

impl Classifier for Model {
    fn fit(&mut self, batch: &RecordBatch) -> Result<(), ClassifyError> {
        self.inner_mut().fit(batch)
    }

    fn transform(&mut self, batch: &RecordBatch) -> Result<(), ClassifyError> {
        self.inner_mut().transform(batch)
    }

    fn predict(&self, batch: &RecordBatch) -> Result<Vec<Verdict>, ClassifyError> {
        self.inner().predict(batch)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn keys_and_class_names_are_unique() {
        let keys: HashSet<_> = ClassifierKind::ALL.iter().map(|k| k.key()).collect();
        let names: HashSet<_> = ClassifierKind::ALL.iter().map(|k| k.class_name()).collect();
        assert_eq!(keys.len(), ClassifierKind::ALL.len());
        assert_eq!(names.len(), ClassifierKind::ALL.len());
    }

    #[test]
    fn only_monthly_limit_skips_the_cache() {
        let uncached: Vec<_> = ClassifierKind::ALL
            .into_iter()
            .filter(|k| !k.cacheable())
            .collect();
        assert_eq!(uncached, vec![ClassifierKind::MonthlySubquotaLimit]);
    }

    #[test]
    fn instantiated_models_report_their_kind() {
        let settings = Settings::default();
        for kind in ClassifierKind::ALL {
            assert_eq!(kind.instantiate(&settings).unwrap().kind(), kind);
        }
    }

    #[test]
    fn bad_contamination_fails_instantiation() {
        let mut settings = Settings::default();
        settings.traveled_speeds.contamination = 1.5;
        assert!(matches!(
            ClassifierKind::TraveledSpeeds.instantiate(&settings),
            Err(ClassifyError::InvalidContamination(_))
        ));
    }

    #[test]
    fn json_keeps_the_kind_and_parameters() {
        let mut settings = Settings::default();
        settings.election.match_supplier_name = true;
        for kind in ClassifierKind::ALL {
            let model = kind.instantiate(&settings).unwrap();
            let json = model.to_json().unwrap();
            assert_eq!(Model::from_json(&json).unwrap(), model, "{json}");
        }
    }

    #[test]
    fn models_know_the_settings_they_were_built_with() {
        let settings = Settings::default();
        let mut changed = settings.clone();
        changed.traveled_speeds.contamination = 0.01;
        changed.meal_price.supplier_std_factor = 2.5;

        for kind in ClassifierKind::ALL {
            let model = kind.instantiate(&settings).unwrap();
            assert!(model.configured_by(&settings), "{kind}");
            let stale = matches!(
                kind,
                ClassifierKind::TraveledSpeeds | ClassifierKind::MealPriceOutlier
            );
            assert_eq!(model.configured_by(&changed), !stale, "{kind}");
        }
    }

    #[test]
    fn stored_traveled_speeds_with_bad_contamination_is_rejected() {
        let json = r#"{"classifier":"traveled_speeds","settings":{"contamination":1.0,"max_daily_expenses":8,"polynomial_degree":3,"threshold_step":50},"polynomial":null}"#;
        assert!(matches!(Model::from_json(json), Err(ClassifyError::Serde(_))));
    }

    #[test]
    fn json_is_tagged() {
        let model = ClassifierKind::InvalidCnpjCpf
            .instantiate(&Settings::default())
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&model.to_json().unwrap()).unwrap();
        assert_eq!(value["classifier"], "invalid_cnpj_cpf");
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert!(matches!(
            Model::from_json(r#"{"classifier":"coin_flip"}"#),
            Err(ClassifyError::Serde(_))
        ));
    }
}
