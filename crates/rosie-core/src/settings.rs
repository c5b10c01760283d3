//! Run configuration: file names and classifier parameters.
//!
//! Every field has a default, so an absent or partial TOML file is fine:
//!
//! ```toml
//! output_file = "suspicions.xz"
//!
//! [traveled_speeds]
//! contamination = 0.001
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("reading settings file {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("parsing settings file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Company registry extract, looked up in the data directory.
    pub companies_dataset: String,
    /// Name of the compressed suspicions CSV written at the end of a run.
    pub output_file: String,
    pub meal_price: MealPriceSettings,
    pub traveled_speeds: TraveledSpeedsSettings,
    pub election: ElectionSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            companies_dataset: "2016-09-03-companies.xz".to_string(),
            output_file: "suspicions.xz".to_string(),
            meal_price: MealPriceSettings::default(),
            traveled_speeds: TraveledSpeedsSettings::default(),
            election: ElectionSettings::default(),
        }
    }
}

impl Settings {
    /// Parse settings from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(text)?)
    }

    /// Load settings from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml(&text)?;
        info!(path = %path.display(), "loaded settings");
        Ok(settings)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MealPriceSettings {
    pub clusters: usize,
    /// Suppliers need strictly more distinct congresspeople than this...
    pub min_congresspeople: usize,
    /// ...and strictly more records than this to count as well observed.
    pub min_records: usize,
    pub cluster_std_factor: f64,
    pub supplier_std_factor: f64,
}

impl Default for MealPriceSettings {
    fn default() -> Self {
        Self {
            clusters: 3,
            min_congresspeople: 3,
            min_records: 20,
            cluster_std_factor: 4.0,
            supplier_std_factor: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraveledSpeedsSettings {
    /// Target fraction of (applicant, day) groups flagged by distance alone.
    pub contamination: f64,
    /// Days with more meal expenses than this are always flagged.
    pub max_daily_expenses: usize,
    pub polynomial_degree: usize,
    /// Step between candidate distance thresholds, in km.
    pub threshold_step: usize,
}

impl Default for TraveledSpeedsSettings {
    fn default() -> Self {
        Self {
            contamination: 0.001,
            max_daily_expenses: 8,
            polynomial_degree: 3,
            threshold_step: 50,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElectionSettings {
    /// Also flag suppliers whose name mentions an election.
    pub match_supplier_name: bool,
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.output_file, "suspicions.xz");
        assert_eq!(settings.meal_price.clusters, 3);
        assert_eq!(settings.traveled_speeds.contamination, 0.001);
        assert!(!settings.election.match_supplier_name);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let settings = Settings::from_toml(
            r#"
            output_file = "irregularities.xz"

            [traveled_speeds]
            contamination = 0.01
            "#,
        )
        .unwrap();
        assert_eq!(settings.output_file, "irregularities.xz");
        assert_eq!(settings.traveled_speeds.contamination, 0.01);
        assert_eq!(settings.traveled_speeds.max_daily_expenses, 8);
        assert_eq!(settings.companies_dataset, "2016-09-03-companies.xz");
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[election]\nmatch_supplier_name = true").unwrap();
        let settings = Settings::load(Some(file.path())).unwrap();
        assert!(settings.election.match_supplier_name);
    }

    #[test]
    fn load_without_path_is_default() {
        assert_eq!(Settings::load(None).unwrap(), Settings::default());
    }

    #[test]
    fn invalid_toml_errors() {
        assert!(matches!(
            Settings::from_toml("output_file = ["),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_errors() {
        let result = Settings::load(Some(Path::new("/nonexistent/rosie.toml")));
        assert!(matches!(result, Err(SettingsError::Read { .. })));
    }
}
