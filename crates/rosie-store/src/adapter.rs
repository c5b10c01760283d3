//! Turns the raw extracts of each module into the analysis frame.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, StringArray, new_null_array};
use arrow::record_batch::RecordBatch;
use rosie_core::schema::reimbursements::analysis_schema;
use rosie_core::tax_id::digits_only;
use rosie_core::{Dataset, Module, Settings, columns, frame};
use tracing::{info, warn};

use crate::csv::{coerce_types, read_csv};
use crate::join::left_join;
use crate::source::{DatasetSource, LocalFiles, latest_companies_file, reimbursement_files};
use crate::table::{concat_aligned, constant_string, drop_null_rows, rename_columns, set_column};
use crate::StoreError;

const CHAMBER_RENAMES: &[(&str, &str)] = &[
    ("subquota_description", columns::CATEGORY),
    ("total_net_value", columns::NET_VALUE),
    ("cnpj_cpf", columns::RECIPIENT_ID),
    ("supplier", columns::RECIPIENT),
];

const SENATE_RENAMES: &[(&str, &str)] = &[
    ("reimbursement_value", columns::NET_VALUE),
    ("cnpj_cpf", columns::RECIPIENT_ID),
    ("supplier", columns::RECIPIENT),
];

/// Codes `0`, `1` and `2` of the chamber's `document_type`. Codes `3` to `5`
/// are undocumented and read as null.
const DOCUMENT_TYPES: [&str; 3] = ["bill_of_sale", "simple_receipt", "expense_made_abroad"];

const SENATE_FILES: [&str; 2] = [
    "federal-senate-reimbursements.xz",
    "federal-senate-reimbursements.csv",
];

/// Loads one module's dataset from a data directory.
pub trait Adapter {
    fn module(&self) -> Module;

    /// Read, join and normalise everything into one batch.
    fn load(&self, dir: &Path) -> Result<RecordBatch, StoreError>;

    /// [`load`](Self::load) paired with the module's unique-id projection.
    fn dataset(&self, dir: &Path) -> Result<Dataset, StoreError> {
        let batch = self.load(dir)?;
        Ok(Dataset::new(batch, self.module().unique_ids())?)
    }
}

/// The adapter for `module`, reading files already present on disk.
pub fn adapter_for(module: Module, settings: &Settings) -> Box<dyn Adapter> {
    match module {
        Module::ChamberOfDeputies => Box::new(ChamberOfDeputiesAdapter::new(
            Box::new(LocalFiles),
            &settings.companies_dataset,
        )),
        Module::FederalSenate => Box::new(FederalSenateAdapter::new(Box::new(LocalFiles))),
    }
}

// ── Chamber of Deputies ──

pub struct ChamberOfDeputiesAdapter {
    source: Box<dyn DatasetSource>,
    companies_dataset: String,
}

impl ChamberOfDeputiesAdapter {
    pub fn new(source: Box<dyn DatasetSource>, companies_dataset: &str) -> Self {
        Self {
            source,
            companies_dataset: companies_dataset.to_string(),
        }
    }

    fn companies_path(&self, dir: &Path) -> Result<PathBuf, StoreError> {
        match self.source.ensure(dir, &self.companies_dataset) {
            Ok(path) => Ok(path),
            Err(StoreError::DatasetNotFound(missing)) => {
                let Some(latest) = latest_companies_file(dir)? else {
                    return Err(StoreError::DatasetNotFound(missing));
                };
                warn!(
                    configured = %self.companies_dataset,
                    using = %latest,
                    "configured companies dataset missing, using latest extract"
                );
                self.source.ensure(dir, &latest)
            }
            Err(e) => Err(e),
        }
    }

    fn reimbursements(&self, dir: &Path) -> Result<RecordBatch, StoreError> {
        let mut batches = Vec::new();
        for path in reimbursement_files(dir)? {
            info!(path = %path.display(), "loading reimbursements");
            batches.push(read_csv(&path)?);
        }
        concat_aligned(&batches)
    }

    fn companies(&self, dir: &Path) -> Result<RecordBatch, StoreError> {
        let path = self.companies_path(dir)?;
        info!(path = %path.display(), "loading companies");
        let batch = read_csv(&path)?;
        normalize_cnpj(&batch)
    }
}

impl Adapter for ChamberOfDeputiesAdapter {
    fn module(&self) -> Module {
        Module::ChamberOfDeputies
    }

    fn load(&self, dir: &Path) -> Result<RecordBatch, StoreError> {
        let reimbursements = self.reimbursements(dir)?;
        let companies = self.companies(dir)?;
        let batch = prepare_chamber(&reimbursements, Some(&companies))?;
        info!(rows = batch.num_rows(), columns = batch.num_columns(), "chamber of deputies dataset ready");
        Ok(batch)
    }
}

/// Strip punctuation from company tax ids (`02.989.654/0011-97`).
fn normalize_cnpj(companies: &RecordBatch) -> Result<RecordBatch, StoreError> {
    let cnpj: StringArray = frame::strings(companies, columns::CNPJ)?
        .into_iter()
        .map(|v| v.map(digits_only))
        .collect();
    set_column(companies, columns::CNPJ, Arc::new(cnpj))
}

/// Rename, type, join and recode raw chamber reimbursements.
///
/// `reimbursements` and `companies` are all-`Utf8` batches as read from CSV.
/// Columns of the analysis schema that neither input provides are added as
/// nulls, so classifiers can rely on them being present.
pub fn prepare_chamber(
    reimbursements: &RecordBatch,
    companies: Option<&RecordBatch>,
) -> Result<RecordBatch, StoreError> {
    let batch = coerce_types(&rename_columns(reimbursements, CHAMBER_RENAMES)?)?;
    let batch = match companies {
        Some(companies) => {
            let companies = coerce_types(companies)?;
            left_join(&batch, &companies, columns::RECIPIENT_ID, columns::CNPJ)?
        }
        None => batch,
    };

    info!("categorizing reimbursements");
    let document_types: StringArray = frame::optional_strings(&batch, columns::DOCUMENT_TYPE)?
        .into_iter()
        .map(|code| code.and_then(document_type))
        .collect();
    let categories: StringArray = frame::optional_strings(&batch, columns::CATEGORY)?
        .into_iter()
        .map(|c| c.map(|c| if c == "Congressperson meal" { "Meal" } else { c }))
        .collect();
    let party: BooleanArray = frame::optional_strings(&batch, columns::CONGRESSPERSON_ID)?
        .into_iter()
        .map(|id| Some(id.is_none()))
        .collect();

    let batch = set_column(&batch, columns::DOCUMENT_TYPE, Arc::new(document_types))?;
    let batch = set_column(&batch, columns::CATEGORY, Arc::new(categories))?;
    let batch = set_column(&batch, columns::IS_PARTY_EXPENSE, Arc::new(party))?;
    fill_missing(batch)
}

fn document_type(code: &str) -> Option<&'static str> {
    match code.trim() {
        "0" => Some(DOCUMENT_TYPES[0]),
        "1" => Some(DOCUMENT_TYPES[1]),
        "2" => Some(DOCUMENT_TYPES[2]),
        _ => None,
    }
}

fn fill_missing(mut batch: RecordBatch) -> Result<RecordBatch, StoreError> {
    for field in analysis_schema().fields() {
        if batch.column_by_name(field.name()).is_none() {
            let nulls: ArrayRef = new_null_array(field.data_type(), batch.num_rows());
            batch = set_column(&batch, field.name(), nulls)?;
        }
    }
    Ok(batch)
}

// ── Federal Senate ──

pub struct FederalSenateAdapter {
    source: Box<dyn DatasetSource>,
}

impl FederalSenateAdapter {
    pub fn new(source: Box<dyn DatasetSource>) -> Self {
        Self { source }
    }

    fn reimbursements_path(&self, dir: &Path) -> Result<PathBuf, StoreError> {
        let mut missing = None;
        for name in SENATE_FILES {
            match self.source.ensure(dir, name) {
                Ok(path) => return Ok(path),
                Err(StoreError::DatasetNotFound(path)) => missing = missing.or(Some(path)),
                Err(e) => return Err(e),
            }
        }
        Err(StoreError::DatasetNotFound(
            missing.unwrap_or_else(|| dir.join(SENATE_FILES[0])),
        ))
    }
}

impl Adapter for FederalSenateAdapter {
    fn module(&self) -> Module {
        Module::FederalSenate
    }

    fn load(&self, dir: &Path) -> Result<RecordBatch, StoreError> {
        let path = self.reimbursements_path(dir)?;
        info!(path = %path.display(), "loading reimbursements");
        let batch = prepare_senate(&read_csv(&path)?)?;
        info!(rows = batch.num_rows(), "federal senate dataset ready");
        Ok(batch)
    }
}

/// Drop rows without a recipient, rename and type senate reimbursements.
///
/// The senate publishes no document type, so every row gets `unknown`.
pub fn prepare_senate(reimbursements: &RecordBatch) -> Result<RecordBatch, StoreError> {
    let batch = drop_null_rows(reimbursements, "cnpj_cpf")?;
    let batch = coerce_types(&rename_columns(&batch, SENATE_RENAMES)?)?;
    let rows = batch.num_rows();
    set_column(&batch, columns::DOCUMENT_TYPE, constant_string("unknown", rows))
}
