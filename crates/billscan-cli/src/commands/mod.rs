//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod process;

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use billscan_core::{BillRecord, BillscanConfig, Extraction, ValidationResult};

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("billscan")
        .join("config.json")
}

/// Load the configuration from `--config`, else from the default location
/// when a file exists there, else the built-in defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<BillscanConfig> {
    if let Some(path) = config_path {
        return Ok(BillscanConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Loading configuration from {}", default_path.display());
        Ok(BillscanConfig::from_file(&default_path)?)
    } else {
        Ok(BillscanConfig::default())
    }
}

/// What the CLI prints for one bill.
#[derive(Debug, Serialize)]
pub struct BillReport {
    pub record: BillRecord,
    pub validation: ValidationResult,
    pub invoice_no: Option<String>,
    pub bill_date: Option<NaiveDate>,
    pub confidence: f32,
    pub warnings: Vec<String>,
}

impl BillReport {
    pub fn new(extraction: &Extraction, validation: ValidationResult) -> Self {
        Self {
            record: extraction.record(),
            validation,
            invoice_no: extraction.invoice_no.as_ref().map(|m| m.value.clone()),
            bill_date: extraction.bill_date.as_ref().map(|m| m.value),
            confidence: extraction.confidence,
            warnings: extraction.warnings.clone(),
        }
    }
}
