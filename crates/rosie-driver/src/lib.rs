//! Classifier orchestration: fit or load each registered model, predict over
//! the whole dataset and persist the suspicions table.

mod error;
pub use error::DriverError;

pub mod cache;
pub mod registry;
pub mod suspicions;

use std::fmt;
use std::path::{Path, PathBuf};

use rosie_classify::{Classifier, ClassifyError, Model};
use rosie_core::{Dataset, Module, Settings};
use rosie_store::write_csv_xz;
use tracing::{info, warn};

pub use cache::ModelCache;
pub use registry::{Registration, registry};
pub use suspicions::{SuspicionTable, VerdictColumn};

/// Where a classifier's model came from in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSource {
    Cached,
    Fitted,
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cached => "cached",
            Self::Fitted => "fitted",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierReport {
    pub name: &'static str,
    pub source: ModelSource,
    pub flagged: usize,
}

/// Outcome of one successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub module: Module,
    pub output: PathBuf,
    pub rows: usize,
    pub classifiers: Vec<ClassifierReport>,
}

impl RunReport {
    pub fn classifier(&self, name: &str) -> Option<&ClassifierReport> {
        self.classifiers.iter().find(|c| c.name == name)
    }
}

pub struct Driver {
    module: Module,
    settings: Settings,
}

impl Driver {
    pub fn new(module: Module, settings: Settings) -> Self {
        Self { module, settings }
    }

    /// Run every registered classifier over `dataset`, caching models and
    /// writing the suspicions table into `target`.
    ///
    /// Any failure aborts the run before the output file is touched.
    pub fn run(&self, dataset: &Dataset, target: &Path) -> Result<RunReport, DriverError> {
        let cache = ModelCache::new(target);
        let batch = dataset.batch();
        info!(module = %self.module, rows = dataset.num_rows(), "running classifiers");

        let mut table = SuspicionTable::new(dataset.keys());
        let mut reports = Vec::new();
        for registration in registry(self.module) {
            let kind = registration.kind;
            let in_classifier = |source: ClassifyError| DriverError::Classify {
                classifier: kind.class_name(),
                source,
            };

            let (mut model, source) = match self.cached(&cache, registration)? {
                Some(model) => (model, ModelSource::Cached),
                None => {
                    let mut model = kind.instantiate(&self.settings).map_err(in_classifier)?;
                    info!(classifier = %kind, "fitting");
                    model.fit(batch).map_err(in_classifier)?;
                    if kind.cacheable() {
                        cache.store(&model)?;
                    }
                    (model, ModelSource::Fitted)
                }
            };

            model.transform(batch).map_err(in_classifier)?;
            let verdicts = model.predict(batch).map_err(in_classifier)?;
            let column = VerdictColumn::new(kind.class_name(), dataset.keys(), &verdicts)?;
            let flagged = column.flagged();
            info!(classifier = %kind, %source, flagged, "predicted");

            table = table.with_column(registration.name, column)?;
            reports.push(ClassifierReport {
                name: registration.name,
                source,
                flagged,
            });
        }

        let output = target.join(&self.settings.output_file);
        write_csv_xz(&output, &table.to_record_batch()?)?;
        Ok(RunReport {
            module: self.module,
            output,
            rows: dataset.num_rows(),
            classifiers: reports,
        })
    }

    fn cached(
        &self,
        cache: &ModelCache,
        registration: &Registration,
    ) -> Result<Option<Model>, DriverError> {
        if !registration.kind.cacheable() {
            return Ok(None);
        }
        let cached = cache.load(registration.kind)?;
        Ok(cached.filter(|model| {
            let current = model.configured_by(&self.settings);
            if !current {
                warn!(classifier = %registration.kind, "cached model has stale settings, refitting");
            }
            current
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;
    use std::sync::Arc;

    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;
    use rosie_store::adapter::prepare_chamber;
    use tempfile::TempDir;
    use xz2::read::XzDecoder;

    use super::*;

    /// A single congressperson meal as read from the chamber CSV.
    fn one_meal() -> RecordBatch {
        let utf8 = |name: &str| Field::new(name, DataType::Utf8, true);
        let schema = Schema::new(vec![
            utf8("applicant_id"),
            utf8("document_id"),
            utf8("year"),
            utf8("month"),
            utf8("issue_date"),
            utf8("subquota_description"),
            utf8("subquota_number"),
            utf8("cnpj_cpf"),
            utf8("supplier"),
            utf8("total_net_value"),
            utf8("document_type"),
            utf8("congressperson_id"),
        ]);
        let column = |v: &str| -> arrow::array::ArrayRef { Arc::new(StringArray::from(vec![v])) };
        RecordBatch::try_new(
            Arc::new(schema),
            vec![
                column("444"),
                column("999"),
                column("2016"),
                column("1"),
                column("2016-01-14T00:00:00"),
                column("Congressperson meal"),
                column("13"),
                column("02989654001197"),
                column("RESTAURANTE"),
                column("178"),
                column("0"),
                column("444"),
            ],
        )
        .unwrap()
    }

    fn chamber_dataset() -> Dataset {
        let batch = prepare_chamber(&one_meal(), None).unwrap();
        Dataset::new(batch, Module::ChamberOfDeputies.unique_ids()).unwrap()
    }

    fn decompress(path: &Path) -> String {
        let mut text = String::new();
        XzDecoder::new(std::fs::File::open(path).unwrap())
            .read_to_string(&mut text)
            .unwrap();
        text
    }

    #[test]
    fn one_row_runs_every_chamber_classifier() {
        let dir = TempDir::new().unwrap();
        let driver = Driver::new(Module::ChamberOfDeputies, Settings::default());
        let report = driver.run(&chamber_dataset(), dir.path()).unwrap();

        assert_eq!(report.rows, 1);
        assert_eq!(report.classifiers.len(), 6);
        assert!(report.classifiers.iter().all(|c| c.source == ModelSource::Fitted));

        let text = decompress(&report.output);
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some(
                "applicant_id,year,document_id,election_expenses,irregular_companies_classifier,\
                 invalid_cnpj_cpf,meal_price_outlier,suspicious_traveled_speed_day,\
                 over_monthly_subquota_limit"
            )
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("444,2016,999,"), "{row}");
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn second_run_reuses_cached_models() {
        let dir = TempDir::new().unwrap();
        let driver = Driver::new(Module::ChamberOfDeputies, Settings::default());
        let dataset = chamber_dataset();
        let first = driver.run(&dataset, dir.path()).unwrap();
        let second = driver.run(&dataset, dir.path()).unwrap();

        for report in &second.classifiers {
            let expected = if report.name == "over_monthly_subquota_limit" {
                ModelSource::Fitted
            } else {
                ModelSource::Cached
            };
            assert_eq!(report.source, expected, "{}", report.name);
        }
        assert_eq!(
            first.classifiers.iter().map(|c| c.flagged).collect::<Vec<_>>(),
            second.classifiers.iter().map(|c| c.flagged).collect::<Vec<_>>()
        );
        assert!(dir.path().join("mealpriceoutlierclassifier.json").exists());
        assert!(!dir.path().join("monthlysubquotalimitclassifier.json").exists());
    }

    #[test]
    fn changed_settings_refit_the_affected_model() {
        let dir = TempDir::new().unwrap();
        let dataset = chamber_dataset();
        Driver::new(Module::ChamberOfDeputies, Settings::default())
            .run(&dataset, dir.path())
            .unwrap();

        let mut settings = Settings::default();
        settings.traveled_speeds.contamination = 0.2;
        let driver = Driver::new(Module::ChamberOfDeputies, settings.clone());
        let report = driver.run(&dataset, dir.path()).unwrap();

        for c in &report.classifiers {
            let expected = match c.name {
                "suspicious_traveled_speed_day" | "over_monthly_subquota_limit" => ModelSource::Fitted,
                _ => ModelSource::Cached,
            };
            assert_eq!(c.source, expected, "{}", c.name);
        }
        let stored = std::fs::read_to_string(dir.path().join("traveledspeedsclassifier.json")).unwrap();
        assert!(Model::from_json(&stored).unwrap().configured_by(&settings));

        let again = driver.run(&dataset, dir.path()).unwrap();
        assert_eq!(
            again.classifier("suspicious_traveled_speed_day").unwrap().source,
            ModelSource::Cached
        );
    }

    #[test]
    fn senate_writes_one_verdict_column() {
        let dir = TempDir::new().unwrap();
        let schema = Schema::new(vec![
            Field::new("year", DataType::Int64, true),
            Field::new("document_id", DataType::Utf8, true),
            Field::new("recipient_id", DataType::Utf8, true),
            Field::new("document_type", DataType::Utf8, true),
            Field::new("net_value", DataType::Float64, true),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Int64Array::from(vec![2017, 2017])),
                Arc::new(StringArray::from(vec!["a", "b"])),
                Arc::new(StringArray::from(vec!["02989654001197", "11111111111111"])),
                Arc::new(StringArray::from(vec!["unknown", "unknown"])),
                Arc::new(Float64Array::from(vec![10.0, 20.0])),
            ],
        )
        .unwrap();
        let dataset = Dataset::new(batch, Module::FederalSenate.unique_ids()).unwrap();

        let driver = Driver::new(Module::FederalSenate, Settings::default());
        let report = driver.run(&dataset, dir.path()).unwrap();
        assert_eq!(report.classifier("invalid_cnpj_cpf").unwrap().flagged, 1);
        assert_eq!(
            decompress(&report.output),
            "year,document_id,invalid_cnpj_cpf\n2017,a,false\n2017,b,true\n"
        );
    }

    #[test]
    fn failing_classifier_leaves_no_output() {
        let dir = TempDir::new().unwrap();
        let schema = Schema::new(vec![Field::new("year", DataType::Int64, true)]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(Int64Array::from(vec![2017]))],
        )
        .unwrap();
        let dataset = Dataset::new(batch, &["year"]).unwrap();

        let driver = Driver::new(Module::FederalSenate, Settings::default());
        let err = driver.run(&dataset, dir.path()).unwrap_err();
        assert!(matches!(err, DriverError::Classify { classifier: "InvalidCnpjCpfClassifier", .. }));
        assert!(!dir.path().join("suspicions.xz").exists());
    }
}
