//! Bulk import of donors, donations and pledges from CSV or XLSX:
//! parse → validate → simulate → commit.

pub mod columns;
pub mod commit;
pub mod parse;
pub mod simulate;
pub mod validate;
pub mod values;

use serde::Serialize;
use std::str::FromStr;
use strum_macros::{Display, EnumString};
use thiserror::Error;
use uuid::Uuid;

use crate::config::CONFIG;
use crate::database::DatabaseError;

pub use commit::{commit, ImportOutcome, ResultLine, RowStatus};
pub use parse::{parse, ImportRow, ParseWarning, Parsed};
pub use simulate::{simulate, Simulation};
pub use validate::{validate, PlannedRecord, PlannedRow, RowIssue, ValidationReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ImportKind {
    #[strum(to_string = "donors", serialize = "donor")]
    Donors,
    #[strum(to_string = "donations", serialize = "donation")]
    Donations,
    #[strum(to_string = "pledges", serialize = "pledge")]
    Pledges,
}

impl ImportKind {
    pub fn parse(raw: &str) -> Result<Self, ImportError> {
        ImportKind::from_str(raw.trim()).map_err(|_| ImportError::UnknownKind(raw.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ImportFormat {
    #[default]
    Csv,
    #[strum(to_string = "xlsx", serialize = "xls", serialize = "excel")]
    Xlsx,
}

impl ImportFormat {
    pub fn parse(raw: &str) -> Result<Self, ImportError> {
        ImportFormat::from_str(raw.trim()).map_err(|_| ImportError::UnsupportedFormat(raw.to_string()))
    }

    /// Guess from a file name; anything that is not a spreadsheet is read as CSV
    pub fn from_path(path: &str) -> Self {
        let lower = path.to_ascii_lowercase();
        if lower.ends_with(".xlsx") || lower.ends_with(".xlsm") {
            ImportFormat::Xlsx
        } else {
            ImportFormat::Csv
        }
    }
}

/// Per-run settings; defaults come from the `import` config section
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub organization_id: Uuid,
    pub default_currency: String,
    pub max_rows: usize,
}

impl ImportOptions {
    pub fn new(organization_id: Uuid) -> Self {
        Self {
            organization_id,
            default_currency: CONFIG.import.default_currency.clone(),
            max_rows: CONFIG.import.max_rows,
        }
    }
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Unknown import kind: {0}")]
    UnknownKind(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("The file has no header row")]
    MissingHeader,

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("File has {rows} rows, the limit is {max}")]
    TooManyRows { rows: usize, max: usize },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}
