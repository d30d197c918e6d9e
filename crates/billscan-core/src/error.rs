//! Error types for the billscan-core library.
//!
//! Extraction and validation never fail: a field that cannot be found is
//! `None`, an inconsistent bill is reported through
//! [`ValidationResult`](crate::models::bill::ValidationResult). Only loading
//! configuration and compiling the label pattern table can return an error.

use thiserror::Error;

use crate::models::bill::BillField;

/// Main error type for the billscan library.
#[derive(Error, Debug)]
pub enum BillscanError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A label pattern in the configuration is not a valid regex.
    #[error("invalid label pattern for {field}: {pattern}")]
    Pattern {
        field: BillField,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for the billscan library.
pub type Result<T> = std::result::Result<T, BillscanError>;
