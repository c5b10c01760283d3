//! Reimbursement classifiers.
//!
//! Each classifier turns the analysis frame into one [`Verdict`] per row.
//! Rule-based classifiers ignore `fit`; the statistical ones learn
//! thresholds from the whole dataset before predicting.
//!
//! [`Verdict`]: rosie_core::Verdict

mod error;
pub use error::ClassifyError;

pub mod classifier;
pub mod election;
pub mod geodesic;
pub mod invalid_tax_id;
pub mod irregular_companies;
pub mod kmeans;
pub mod meal_price;
pub mod monthly_limit;
pub mod polyfit;
pub mod traveled_speeds;

pub use classifier::{Classifier, ClassifierKind, Model};
pub use election::ElectionExpensesClassifier;
pub use invalid_tax_id::InvalidCnpjCpfClassifier;
pub use irregular_companies::IrregularCompaniesClassifier;
pub use meal_price::MealPriceOutlierClassifier;
pub use monthly_limit::MonthlySubquotaLimitClassifier;
pub use traveled_speeds::TraveledSpeedsClassifier;
