//! Meals priced far above what a restaurant usually charges.
//!
//! Suppliers are summarised by the mean and (population) standard deviation
//! of their meal prices. Clusters over `(mean, std)` of the well-observed
//! suppliers are learned at fit time. When predicting, statistics are taken
//! from the dataset being judged: a supplier well observed there gets its own
//! threshold (`mean + 3·std`), every other supplier inherits the threshold of
//! its nearest cluster (`mean + 4·std` of the cluster members).

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use arrow::record_batch::RecordBatch;
use regex::Regex;
use rosie_core::settings::MealPriceSettings;
use rosie_core::text::normalize;
use rosie_core::{Verdict, columns, frame};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::kmeans::{self, Point};
use crate::{Classifier, ClassifyError};

const MEAL: &str = "Meal";
const CNPJ_LEN: usize = 14;

/// Hotels bill meals together with lodging, so their prices are not comparable.
static HOTEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"hote(?:(?:ls?)|is)").expect("valid pattern"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterThreshold {
    /// `(mean, std)` centroid.
    pub centroid: Point,
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPriceOutlierClassifier {
    settings: MealPriceSettings,
    clusters: Vec<ClusterThreshold>,
}

#[derive(Debug, Clone, PartialEq)]
struct SupplierStats {
    mean: f64,
    std: f64,
    congresspeople: usize,
    records: usize,
}

impl SupplierStats {
    fn point(&self) -> Point {
        [self.mean, self.std]
    }
}

/// Rows the model applies to, with their supplier id and price.
struct MealRows<'a> {
    rows: Vec<Option<(&'a str, f64)>>,
    applicants: Vec<Option<&'a str>>,
}

impl MealPriceOutlierClassifier {
    pub fn new(settings: &MealPriceSettings) -> Self {
        Self {
            settings: settings.clone(),
            clusters: Vec::new(),
        }
    }

    pub fn settings(&self) -> &MealPriceSettings {
        &self.settings
    }

    pub fn clusters(&self) -> &[ClusterThreshold] {
        &self.clusters
    }

    fn well_observed(&self, stats: &SupplierStats) -> bool {
        stats.congresspeople > self.settings.min_congresspeople
            && stats.records > self.settings.min_records
    }

    /// `stats` describe the supplier in the dataset being predicted.
    fn threshold_for(&self, stats: &SupplierStats) -> Option<f64> {
        if self.well_observed(stats) {
            return Some(stats.mean + self.settings.supplier_std_factor * stats.std);
        }
        let centroids: Vec<Point> = self.clusters.iter().map(|c| c.centroid).collect();
        kmeans::nearest(&centroids, stats.point()).map(|i| self.clusters[i].threshold)
    }
}

impl Classifier for MealPriceOutlierClassifier {
    fn fit(&mut self, batch: &RecordBatch) -> Result<(), ClassifyError> {
        let meals = meal_rows(batch)?;
        let stats = supplier_stats(&meals);
        let known: Vec<(&str, &SupplierStats)> = stats
            .iter()
            .filter(|(_, s)| self.well_observed(s))
            .map(|(id, s)| (*id, s))
            .collect();

        let points: Vec<Point> = known.iter().map(|(_, s)| s.point()).collect();
        let clustering = kmeans::fit(&points, self.settings.clusters);

        let mut members = vec![Vec::new(); clustering.centroids.len()];
        for ((_, s), &label) in known.iter().zip(&clustering.labels) {
            members[label].push(*s);
        }
        self.clusters = clustering
            .centroids
            .iter()
            .zip(&members)
            .map(|(centroid, members)| {
                let n = members.len() as f64;
                let mean = members.iter().map(|s| s.mean).sum::<f64>() / n;
                let std = members.iter().map(|s| s.std).sum::<f64>() / n;
                ClusterThreshold {
                    centroid: *centroid,
                    threshold: mean + self.settings.cluster_std_factor * std,
                }
            })
            .collect();

        info!(
            suppliers = stats.len(),
            well_observed = known.len(),
            clusters = self.clusters.len(),
            "fitted meal price model"
        );
        Ok(())
    }

    fn predict(&self, batch: &RecordBatch) -> Result<Vec<Verdict>, ClassifyError> {
        let meals = meal_rows(batch)?;
        let thresholds: BTreeMap<&str, Option<f64>> = supplier_stats(&meals)
            .iter()
            .map(|(id, s)| (*id, self.threshold_for(s)))
            .collect();
        debug!(suppliers = thresholds.len(), "resolved meal thresholds");

        Ok(meals
            .rows
            .iter()
            .map(|row| {
                let flagged = row.is_some_and(|(supplier, value)| {
                    thresholds
                        .get(supplier)
                        .copied()
                        .flatten()
                        .is_some_and(|t| value > t)
                });
                Verdict::from(flagged)
            })
            .collect())
    }
}

/// Meals paid to a company (14-character id) that is not a hotel.
fn meal_rows(batch: &RecordBatch) -> Result<MealRows<'_>, ClassifyError> {
    let categories = frame::strings(batch, columns::CATEGORY)?;
    let recipient_ids = frame::strings(batch, columns::RECIPIENT_ID)?;
    let recipients = frame::strings(batch, columns::RECIPIENT)?;
    let values = frame::floats(batch, columns::NET_VALUE)?;
    let applicants = frame::strings(batch, columns::APPLICANT_ID)?;

    let rows = (0..batch.num_rows())
        .map(|i| {
            let meal = categories[i] == Some(MEAL);
            let company = recipient_ids[i].filter(|id| id.chars().count() == CNPJ_LEN)?;
            let hotel = recipients[i].is_some_and(|name| HOTEL.is_match(&normalize(name)));
            let value = values[i]?;
            (meal && !hotel).then_some((company, value))
        })
        .collect();

    Ok(MealRows { rows, applicants })
}

fn supplier_stats<'a>(meals: &MealRows<'a>) -> BTreeMap<&'a str, SupplierStats> {
    let mut grouped: BTreeMap<&str, (Vec<f64>, HashSet<Option<&str>>)> = BTreeMap::new();
    for (row, applicant) in meals.rows.iter().zip(&meals.applicants) {
        if let Some((supplier, value)) = row {
            let entry = grouped.entry(*supplier).or_default();
            entry.0.push(*value);
            entry.1.insert(*applicant);
        }
    }

    grouped
        .into_iter()
        .map(|(supplier, (values, applicants))| {
            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let stats = SupplierStats {
                mean,
                std: variance.sqrt(),
                congresspeople: applicants.len(),
                records: values.len(),
            };
            (supplier, stats)
        })
        .collect()
}
