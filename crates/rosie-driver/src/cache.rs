//! Fitted models persisted as JSON next to the suspicions output.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rosie_classify::{ClassifierKind, Model};
use rosie_store::write_atomic;
use tracing::debug;

use crate::DriverError;

/// One `<lowercase class name>.json` file per classifier in `dir`.
#[derive(Debug, Clone)]
pub struct ModelCache {
    dir: PathBuf,
}

impl ModelCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, kind: ClassifierKind) -> PathBuf {
        self.dir
            .join(format!("{}.json", kind.class_name().to_lowercase()))
    }

    /// The cached model for `kind`, or `None` when nothing was stored yet.
    pub fn load(&self, kind: ClassifierKind) -> Result<Option<Model>, DriverError> {
        let path = self.path(kind);
        let json = match std::fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(DriverError::CacheRead { path, source }),
        };
        let model = Model::from_json(&json).map_err(|source| DriverError::Classify {
            classifier: kind.class_name(),
            source,
        })?;
        debug!(path = %path.display(), "loaded cached model");
        Ok(Some(model))
    }

    pub fn store(&self, model: &Model) -> Result<PathBuf, DriverError> {
        let kind = model.kind();
        let json = model.to_json().map_err(|source| DriverError::Classify {
            classifier: kind.class_name(),
            source,
        })?;
        let path = self.path(kind);
        write_atomic(&path, |out| {
            out.write_all(json.as_bytes())?;
            Ok(())
        })?;
        debug!(path = %path.display(), bytes = json.len(), "stored model");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use rosie_core::Settings;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn file_name_is_the_lowercase_class_name() {
        let cache = ModelCache::new("/data");
        assert_eq!(
            cache.path(ClassifierKind::MealPriceOutlier),
            PathBuf::from("/data/mealpriceoutlierclassifier.json")
        );
    }

    #[test]
    fn missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let cache = ModelCache::new(dir.path());
        assert!(cache.load(ClassifierKind::ElectionExpenses).unwrap().is_none());
    }

    #[test]
    fn stored_model_loads_back() {
        let dir = TempDir::new().unwrap();
        let cache = ModelCache::new(dir.path());
        let model = ClassifierKind::TraveledSpeeds
            .instantiate(&Settings::default())
            .unwrap();
        let path = cache.store(&model).unwrap();
        assert!(path.exists());
        assert_eq!(cache.load(ClassifierKind::TraveledSpeeds).unwrap(), Some(model));
    }

    #[test]
    fn corrupt_cache_is_an_error() {
        let dir = TempDir::new().unwrap();
        let cache = ModelCache::new(dir.path());
        std::fs::write(cache.path(ClassifierKind::InvalidCnpjCpf), "{not json").unwrap();
        assert!(matches!(
            cache.load(ClassifierKind::InvalidCnpjCpf),
            Err(DriverError::Classify { .. })
        ));
    }
}
