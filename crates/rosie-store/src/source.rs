//! Locating dataset files in the data directory.
//!
//! Downloading and converting the raw government extracts is someone else's
//! job. A [`DatasetSource`] only has to make sure a named file is present
//! before the adapter reads it.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::StoreError;

static REIMBURSEMENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^reimbursements(?:-\d{4})?\.(?:csv|csv\.xz|xz)$").expect("valid pattern")
});

static COMPANIES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}-companies\.xz$").expect("valid pattern"));

/// Ensures dataset files exist in a local directory.
pub trait DatasetSource {
    /// Make `name` available under `dir` and return its full path.
    fn ensure(&self, dir: &Path, name: &str) -> Result<PathBuf, StoreError>;
}

/// Uses whatever is already on disk; never fetches anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFiles;

impl DatasetSource for LocalFiles {
    fn ensure(&self, dir: &Path, name: &str) -> Result<PathBuf, StoreError> {
        let path = dir.join(name);
        if path.is_file() {
            debug!(path = %path.display(), "dataset present");
            Ok(path)
        } else {
            Err(StoreError::DatasetNotFound(path))
        }
    }
}

fn file_names(dir: &Path) -> Result<Vec<String>, StoreError> {
    if !dir.is_dir() {
        return Err(StoreError::DatasetNotFound(dir.to_path_buf()));
    }
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file()
            && let Some(name) = entry.file_name().to_str()
        {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Reimbursement files in `dir`, in sorted name order.
///
/// Accepts yearly extracts (`reimbursements-2016.csv`, optionally `.xz`) and
/// a single combined `reimbursements.xz` / `reimbursements.csv`.
pub fn reimbursement_files(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let files: Vec<PathBuf> = file_names(dir)?
        .into_iter()
        .filter(|name| REIMBURSEMENTS.is_match(name))
        .map(|name| dir.join(name))
        .collect();
    if files.is_empty() {
        return Err(StoreError::NoReimbursements(dir.to_path_buf()));
    }
    Ok(files)
}

/// The most recent `YYYY-MM-DD-companies.xz` in `dir`, if any.
pub fn latest_companies_file(dir: &Path) -> Result<Option<String>, StoreError> {
    Ok(file_names(dir)?
        .into_iter()
        .filter(|name| COMPANIES.is_match(name))
        .max())
}
