//! Reimbursements that push a subquota past its legal monthly limit.
//!
//! Some subquotas have a cap per congressperson and reimbursement month.
//! Expenses are accumulated in issue-date order; once the running total for
//! a month goes over the cap, that expense and every later one in the same
//! month are flagged.

use std::collections::HashMap;

use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use rosie_core::{Verdict, columns, frame};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Classifier, ClassifyError};

/// A monthly cap valid for an inclusive range of reimbursement months.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyLimit {
    pub subquota: &'static str,
    /// `(year, month)` of the first month the cap applies to.
    pub from: (i64, i64),
    /// Last month, or `None` while still in force.
    pub until: Option<(i64, i64)>,
    pub cents: i64,
}

impl MonthlyLimit {
    const fn new(subquota: &'static str, from: (i64, i64), until: Option<(i64, i64)>, cents: i64) -> Self {
        Self {
            subquota,
            from,
            until,
            cents,
        }
    }

    fn applies(&self, subquota: &str, year: i64, month: i64) -> bool {
        self.subquota == subquota
            && (year, month) >= self.from
            && self.until.is_none_or(|until| (year, month) <= until)
    }
}

pub const MONTHLY_LIMITS: [MonthlyLimit; 12] = [
    // Automotive vehicle renting or charter.
    MonthlyLimit::new("120", (2013, 12), Some((2015, 3)), 1_000_000),
    MonthlyLimit::new("120", (2015, 4), Some((2017, 4)), 1_090_000),
    MonthlyLimit::new("120", (2017, 5), None, 1_271_300),
    // Taxi, toll and parking.
    MonthlyLimit::new("122", (2013, 12), Some((2015, 3)), 250_000),
    MonthlyLimit::new("122", (2015, 4), None, 270_000),
    // Fuels and lubricants.
    MonthlyLimit::new("3", (2009, 7), Some((2015, 3)), 450_000),
    MonthlyLimit::new("3", (2015, 4), Some((2015, 8)), 490_000),
    MonthlyLimit::new("3", (2015, 9), None, 600_000),
    // Security service provided by specialized company.
    MonthlyLimit::new("8", (2009, 7), Some((2014, 4)), 450_000),
    MonthlyLimit::new("8", (2014, 5), Some((2015, 3)), 800_000),
    MonthlyLimit::new("8", (2015, 4), None, 870_000),
    // Participation in course, talk or similar event.
    MonthlyLimit::new("137", (2015, 10), None, 769_716),
];

/// Whole cents, truncating any fraction of a cent.
fn to_cents(value: f64) -> i64 {
    (value * 100.0).trunc() as i64
}

#[derive(Debug, Clone, PartialEq)]
struct LedgerEntry {
    applicant: Option<String>,
    subquota: Option<String>,
    year: Option<i64>,
    month: Option<i64>,
    issue_date: Option<NaiveDate>,
    cents: Option<i64>,
}

impl LedgerEntry {
    /// Index into [`MONTHLY_LIMITS`] of the cap this expense counts towards.
    fn rule(&self) -> Option<usize> {
        let subquota = self.subquota.as_deref()?.trim();
        let (year, month) = (self.year?, self.month?);
        self.cents?;
        self.applicant.as_ref()?;
        MONTHLY_LIMITS
            .iter()
            .position(|limit| limit.applies(subquota, year, month))
    }
}

/// Holds the fitted rows; nothing here is worth caching between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlySubquotaLimitClassifier {
    #[serde(skip)]
    ledger: Option<Vec<LedgerEntry>>,
    #[serde(skip)]
    rules: Option<Vec<Option<usize>>>,
}

impl MonthlySubquotaLimitClassifier {
    fn ledger(&self) -> Result<&[LedgerEntry], ClassifyError> {
        self.ledger
            .as_deref()
            .ok_or(ClassifyError::NotFitted("MonthlySubquotaLimitClassifier"))
    }
}

impl Classifier for MonthlySubquotaLimitClassifier {
    fn fit(&mut self, batch: &RecordBatch) -> Result<(), ClassifyError> {
        let applicants = frame::strings(batch, columns::APPLICANT_ID)?;
        let subquotas = frame::strings(batch, columns::SUBQUOTA_NUMBER)?;
        let years = frame::ints(batch, columns::YEAR)?;
        let months = frame::ints(batch, columns::MONTH)?;
        let issue_dates = frame::dates(batch, columns::ISSUE_DATE)?;
        let values = frame::floats(batch, columns::NET_VALUE)?;

        let ledger: Vec<LedgerEntry> = (0..batch.num_rows())
            .map(|i| LedgerEntry {
                applicant: applicants[i].map(str::to_string),
                subquota: subquotas[i].map(str::to_string),
                year: years[i],
                month: months[i],
                issue_date: issue_dates[i],
                cents: values[i].map(to_cents),
            })
            .collect();
        info!(rows = ledger.len(), "captured monthly subquota ledger");
        self.ledger = Some(ledger);
        self.rules = None;
        Ok(())
    }

    /// Resolve which monthly cap, if any, each fitted row counts towards.
    fn transform(&mut self, _batch: &RecordBatch) -> Result<(), ClassifyError> {
        let rules: Vec<Option<usize>> = self.ledger()?.iter().map(LedgerEntry::rule).collect();
        debug!(
            capped = rules.iter().filter(|r| r.is_some()).count(),
            "resolved monthly limits"
        );
        self.rules = Some(rules);
        Ok(())
    }

    fn predict(&self, batch: &RecordBatch) -> Result<Vec<Verdict>, ClassifyError> {
        let ledger = self.ledger()?;
        if batch.num_rows() != ledger.len() {
            return Err(ClassifyError::LengthMismatch {
                fitted: ledger.len(),
                given: batch.num_rows(),
            });
        }
        let resolved;
        let rules = match &self.rules {
            Some(rules) => rules,
            None => {
                resolved = ledger.iter().map(LedgerEntry::rule).collect::<Vec<_>>();
                &resolved
            }
        };

        // Stable: expenses on the same day keep their dataset order.
        let mut order: Vec<usize> = (0..ledger.len()).collect();
        order.sort_by_key(|&i| (ledger[i].issue_date.is_none(), ledger[i].issue_date));

        let mut totals: HashMap<(usize, &str, i64, i64), i64> = HashMap::new();
        let mut verdicts = vec![Verdict::NotFlagged; ledger.len()];
        for i in order {
            let entry = &ledger[i];
            let (Some(rule), Some(applicant), Some(year), Some(month), Some(cents)) = (
                rules[i],
                entry.applicant.as_deref(),
                entry.year,
                entry.month,
                entry.cents,
            ) else {
                continue;
            };
            let total = totals.entry((rule, applicant, year, month)).or_insert(0);
            *total += cents;
            verdicts[i] = Verdict::from(*total > MONTHLY_LIMITS[rule].cents);
        }
        Ok(verdicts)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{Date32Array, Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Date32Type, Field, Schema};

    use super::*;

    struct Expense {
        applicant: &'static str,
        subquota: &'static str,
        year: i64,
        month: i64,
        day: Option<u32>,
        value: f64,
    }

    fn expense(applicant: &'static str, subquota: &'static str, (year, month): (i64, i64), day: u32, value: f64) -> Expense {
        Expense {
            applicant,
            subquota,
            year,
            month,
            day: Some(day),
            value,
        }
    }

    fn batch(expenses: &[Expense]) -> RecordBatch {
        let schema = Schema::new(vec![
            Field::new(columns::APPLICANT_ID, DataType::Utf8, true),
            Field::new(columns::SUBQUOTA_NUMBER, DataType::Utf8, true),
            Field::new(columns::YEAR, DataType::Int64, true),
            Field::new(columns::MONTH, DataType::Int64, true),
            Field::new(columns::ISSUE_DATE, DataType::Date32, true),
            Field::new(columns::NET_VALUE, DataType::Float64, true),
        ]);
        let dates: Date32Array = expenses
            .iter()
            .map(|e| {
                e.day
                    .and_then(|d| NaiveDate::from_ymd_opt(e.year as i32, e.month as u32, d))
                    .map(Date32Type::from_naive_date)
            })
            .collect();
        RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(StringArray::from_iter_values(expenses.iter().map(|e| e.applicant))),
                Arc::new(StringArray::from_iter_values(expenses.iter().map(|e| e.subquota))),
                Arc::new(Int64Array::from_iter_values(expenses.iter().map(|e| e.year))),
                Arc::new(Int64Array::from_iter_values(expenses.iter().map(|e| e.month))),
                Arc::new(dates),
                Arc::new(Float64Array::from_iter_values(expenses.iter().map(|e| e.value))),
            ],
        )
        .unwrap()
    }

    fn run(expenses: &[Expense]) -> Vec<Verdict> {
        let data = batch(expenses);
        let mut classifier = MonthlySubquotaLimitClassifier::default();
        classifier.fit(&data).unwrap();
        classifier.transform(&data).unwrap();
        classifier.predict(&data).unwrap()
    }

    fn flagged(verdicts: &[Verdict]) -> Vec<usize> {
        (0..verdicts.len()).filter(|&i| verdicts[i].is_flagged()).collect()
    }

    #[test]
    fn flags_the_crossing_expense_and_everything_after() {
        const MARCH: (i64, i64) = (2016, 3);
        let verdicts = run(&[
            expense("1", "3", MARCH, 20, 1000.0),
            expense("1", "3", MARCH, 1, 3000.0),
            expense("1", "3", MARCH, 25, 10.0),
            expense("1", "3", MARCH, 10, 2500.0),
            // Other congressperson, other month.
            expense("2", "3", MARCH, 12, 5000.0),
            expense("1", "3", (2016, 4), 2, 4000.0),
        ]);
        assert_eq!(flagged(&verdicts), vec![0, 2]);
    }

    #[test]
    fn reaching_the_limit_exactly_is_allowed() {
        let verdicts = run(&[
            expense("1", "122", (2016, 1), 5, 1700.0),
            expense("1", "122", (2016, 1), 6, 1000.0),
        ]);
        assert!(flagged(&verdicts).is_empty());
    }

    #[test]
    fn fractions_of_a_cent_are_dropped() {
        assert_eq!(to_cents(10.019), 1001);
        // 270000.9 cents counts as exactly the taxi limit.
        let verdicts = run(&[expense("1", "122", (2016, 1), 5, 2700.009)]);
        assert!(flagged(&verdicts).is_empty());
    }

    #[test]
    fn limit_depends_on_the_reimbursement_month() {
        let verdicts = run(&[
            expense("1", "120", (2015, 3), 5, 10_500.0),
            expense("2", "120", (2015, 4), 5, 10_500.0),
            expense("3", "120", (2017, 5), 5, 12_713.01),
        ]);
        assert_eq!(flagged(&verdicts), vec![0, 2]);
    }

    #[test]
    fn uncapped_subquotas_never_flag() {
        let verdicts = run(&[
            expense("1", "13", (2016, 1), 5, 1_000_000.0),
            // Course participation is only capped from October 2015.
            expense("1", "137", (2015, 9), 5, 1_000_000.0),
            expense("1", "137", (2015, 10), 5, 7697.17),
        ]);
        assert_eq!(flagged(&verdicts), vec![2]);
    }

    #[test]
    fn undated_expenses_count_last() {
        let verdicts = run(&[
            Expense {
                day: None,
                ..expense("1", "3", (2016, 3), 1, 1000.0)
            },
            expense("1", "3", (2016, 3), 31, 5500.0),
        ]);
        assert_eq!(flagged(&verdicts), vec![0]);
    }

    #[test]
    fn predict_without_transform_resolves_rules() {
        let data = batch(&[
            expense("1", "3", (2016, 3), 1, 7000.0),
            expense("1", "3", (2016, 3), 2, 1.0),
        ]);
        let mut classifier = MonthlySubquotaLimitClassifier::default();
        classifier.fit(&data).unwrap();
        assert_eq!(flagged(&classifier.predict(&data).unwrap()), vec![0, 1]);
    }

    #[test]
    fn predict_requires_fit_on_the_same_rows() {
        let data = batch(&[expense("1", "3", (2016, 3), 1, 10.0)]);
        let mut classifier = MonthlySubquotaLimitClassifier::default();
        assert!(matches!(
            classifier.predict(&data),
            Err(ClassifyError::NotFitted(_))
        ));

        classifier.fit(&data).unwrap();
        let other = batch(&[]);
        assert!(matches!(
            classifier.predict(&other),
            Err(ClassifyError::LengthMismatch { fitted: 1, given: 0 })
        ));
    }

    #[test]
    fn every_rule_has_a_sane_range() {
        for limit in MONTHLY_LIMITS {
            assert!(limit.cents > 0);
            if let Some(until) = limit.until {
                assert!(limit.from <= until, "{limit:?}");
            }
        }
    }
}
