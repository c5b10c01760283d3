//! Days on which a congressperson ate in places too far apart.
//!
//! Meals are grouped per applicant and day. For each group the pairwise
//! distances between restaurants are summed; a polynomial fitted on
//! `(meal count, distance)` gives the expected distance for a day with that
//! many meals. A day is an outlier when its distance deviates from the
//! expectation by more than a threshold tuned to hit the configured
//! contamination, or when it has too many meals outright.

use std::collections::BTreeMap;

use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use rosie_core::settings::TraveledSpeedsSettings;
use rosie_core::{Verdict, columns, frame};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::geodesic::{Coordinates, distance_km};
use crate::polyfit::{polyfit, polyval};
use crate::{Classifier, ClassifyError};

const MEAL: &str = "Meal";

/// Brazil's bounding box, exclusive on every side.
const MIN_LATITUDE: f64 = -33.742222;
const MAX_LATITUDE: f64 = 5.2722222;
const MIN_LONGITUDE: f64 = -73.992222;
const MAX_LONGITUDE: f64 = -34.7916667;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredModel")]
pub struct TraveledSpeedsClassifier {
    settings: TraveledSpeedsSettings,
    /// Lowest order first. `None` until fitted.
    polynomial: Option<Vec<f64>>,
}

/// Serialized form, checked through [`TraveledSpeedsClassifier::new`] on load.
#[derive(Deserialize)]
struct StoredModel {
    settings: TraveledSpeedsSettings,
    polynomial: Option<Vec<f64>>,
}

impl TryFrom<StoredModel> for TraveledSpeedsClassifier {
    type Error = ClassifyError;

    fn try_from(stored: StoredModel) -> Result<Self, Self::Error> {
        Ok(Self {
            polynomial: stored.polynomial,
            ..Self::new(&stored.settings)?
        })
    }
}

type GroupKey<'a> = (&'a str, NaiveDate);

#[derive(Debug, Clone, PartialEq)]
struct DayGroup {
    expenses: usize,
    distance_km: f64,
}

/// A day after comparing it with the fitted expectation.
#[derive(Debug, Clone, PartialEq)]
struct ScoredDay {
    expected_km: f64,
    deviation_km: f64,
    too_many_expenses: bool,
}

impl TraveledSpeedsClassifier {
    /// Rejects a contamination outside the open interval `(0, 1)`.
    pub fn new(settings: &TraveledSpeedsSettings) -> Result<Self, ClassifyError> {
        let contamination = settings.contamination;
        if !(contamination > 0.0 && contamination < 1.0) {
            return Err(ClassifyError::InvalidContamination(contamination));
        }
        Ok(Self {
            settings: settings.clone(),
            polynomial: None,
        })
    }

    pub fn settings(&self) -> &TraveledSpeedsSettings {
        &self.settings
    }

    pub fn polynomial(&self) -> Option<&[f64]> {
        self.polynomial.as_deref()
    }

    fn score(&self, polynomial: &[f64], group: &DayGroup) -> ScoredDay {
        let expected_km = polyval(polynomial, group.expenses as f64);
        ScoredDay {
            expected_km,
            deviation_km: (expected_km - group.distance_km).abs(),
            too_many_expenses: group.expenses > self.settings.max_daily_expenses,
        }
    }

    /// Distance threshold whose resulting contamination is closest to the
    /// configured one. Candidates run from 1 km in `threshold_step` km steps
    /// up to the largest expected distance; the first best candidate wins.
    fn threshold_for_contamination(&self, days: &[ScoredDay]) -> f64 {
        let expense_outliers = days.iter().filter(|d| d.too_many_expenses).count();
        let denominator = days.len() - expense_outliers;
        if denominator == 0 {
            return f64::INFINITY;
        }
        let max_expected = days
            .iter()
            .map(|d| d.expected_km)
            .fold(f64::NEG_INFINITY, f64::max);
        if !max_expected.is_finite() {
            return f64::INFINITY;
        }
        // Truncation toward zero, as the upper bound is exclusive.
        let upper = max_expected.trunc() as i64;
        let step = self.settings.threshold_step.max(1);

        let mut best: Option<(f64, f64)> = None;
        for t in (1..upper).step_by(step) {
            let threshold = t as f64;
            let over = days.iter().filter(|d| d.deviation_km > threshold).count();
            let gap = (over as f64 / denominator as f64 - self.settings.contamination).abs();
            if best.is_none_or(|(best_gap, _)| gap < best_gap) {
                best = Some((gap, threshold));
            }
        }
        best.map_or(f64::INFINITY, |(_, threshold)| threshold)
    }
}

impl Classifier for TraveledSpeedsClassifier {
    fn fit(&mut self, batch: &RecordBatch) -> Result<(), ClassifyError> {
        let (groups, _) = day_groups(batch)?;
        let x: Vec<f64> = groups.values().map(|g| g.expenses as f64).collect();
        let y: Vec<f64> = groups.values().map(|g| g.distance_km.trunc()).collect();
        let polynomial = polyfit(&x, &y, self.settings.polynomial_degree);
        info!(days = groups.len(), ?polynomial, "fitted traveled speeds model");
        self.polynomial = Some(polynomial);
        Ok(())
    }

    fn predict(&self, batch: &RecordBatch) -> Result<Vec<Verdict>, ClassifyError> {
        let polynomial = self
            .polynomial
            .as_deref()
            .ok_or(ClassifyError::NotFitted("TraveledSpeedsClassifier"))?;

        let (groups, row_keys) = day_groups(batch)?;
        let keys: Vec<GroupKey> = groups.keys().copied().collect();
        let scored: Vec<ScoredDay> = groups.values().map(|g| self.score(polynomial, g)).collect();
        let threshold = self.threshold_for_contamination(&scored);
        debug!(days = scored.len(), threshold, "traveled speeds threshold");

        let outliers: BTreeMap<GroupKey, bool> = keys
            .into_iter()
            .zip(&scored)
            .map(|(key, day)| (key, day.too_many_expenses || day.deviation_km > threshold))
            .collect();

        Ok(row_keys
            .iter()
            .map(|key| {
                let flagged = key.is_some_and(|k| outliers.get(&k).copied().unwrap_or(false));
                Verdict::from(flagged)
            })
            .collect())
    }
}

fn in_brazil((lat, lon): Coordinates) -> bool {
    MIN_LATITUDE < lat && lat < MAX_LATITUDE && MIN_LONGITUDE < lon && lon < MAX_LONGITUDE
}

/// Applicable day groups, plus each row's group key (`None` for rows the
/// model ignores).
type DayGroups<'a> = (BTreeMap<GroupKey<'a>, DayGroup>, Vec<Option<GroupKey<'a>>>);

/// Group applicable meals per (applicant, day).
fn day_groups(batch: &RecordBatch) -> Result<DayGroups<'_>, ClassifyError> {
    let applicants = frame::strings(batch, columns::APPLICANT_ID)?;
    let categories = frame::strings(batch, columns::CATEGORY)?;
    let party = frame::bools(batch, columns::IS_PARTY_EXPENSE)?;
    let dates = frame::dates(batch, columns::ISSUE_DATE)?;
    let latitudes = frame::floats(batch, columns::LATITUDE)?;
    let longitudes = frame::floats(batch, columns::LONGITUDE)?;

    let mut places: BTreeMap<GroupKey, Vec<Coordinates>> = BTreeMap::new();
    let mut row_keys = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let meal = categories[i] == Some(MEAL) && party[i] == Some(false);
        let place = match (latitudes[i], longitudes[i]) {
            (Some(lat), Some(lon)) if in_brazil((lat, lon)) => Some((lat, lon)),
            _ => None,
        };
        let key = match (meal, place, applicants[i], dates[i]) {
            (true, Some(place), Some(applicant), Some(date)) => {
                let key = (applicant, date);
                places.entry(key).or_default().push(place);
                Some(key)
            }
            _ => None,
        };
        row_keys.push(key);
    }

    let groups = places
        .into_iter()
        .map(|(key, coordinates)| {
            let mut total = 0.0;
            for (i, a) in coordinates.iter().enumerate() {
                for b in &coordinates[i + 1..] {
                    total += distance_km(*a, *b);
                }
            }
            let group = DayGroup {
                expenses: coordinates.len(),
                distance_km: total,
            };
            (key, group)
        })
        .collect();

    Ok((groups, row_keys))
}
