//! Which classifiers run for each module, and in what order.

use rosie_classify::ClassifierKind;
use rosie_core::Module;

/// A classifier and the suspicion column its verdicts are written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    pub name: &'static str,
    pub kind: ClassifierKind,
}

impl Registration {
    pub const fn new(kind: ClassifierKind, name: &'static str) -> Self {
        Self { name, kind }
    }
}

const CHAMBER_OF_DEPUTIES: [Registration; 6] = [
    Registration::new(ClassifierKind::ElectionExpenses, "election_expenses"),
    Registration::new(
        ClassifierKind::IrregularCompanies,
        "irregular_companies_classifier",
    ),
    Registration::new(ClassifierKind::InvalidCnpjCpf, "invalid_cnpj_cpf"),
    Registration::new(ClassifierKind::MealPriceOutlier, "meal_price_outlier"),
    Registration::new(
        ClassifierKind::TraveledSpeeds,
        "suspicious_traveled_speed_day",
    ),
    Registration::new(
        ClassifierKind::MonthlySubquotaLimit,
        "over_monthly_subquota_limit",
    ),
];

const FEDERAL_SENATE: [Registration; 1] = [Registration::new(
    ClassifierKind::InvalidCnpjCpf,
    "invalid_cnpj_cpf",
)];

pub fn registry(module: Module) -> &'static [Registration] {
    match module {
        Module::ChamberOfDeputies => &CHAMBER_OF_DEPUTIES,
        Module::FederalSenate => &FEDERAL_SENATE,
    }
}
