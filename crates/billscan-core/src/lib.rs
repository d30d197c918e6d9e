//! Core library for GST bill processing.
//!
//! This crate provides:
//! - Text normalization for noisy OCR output (currency markers, thousands separators)
//! - Label-table driven field extraction (buyer, taxable value, CGST, SGST, grand total)
//! - Tally header extraction (invoice number, bill date)
//! - Arithmetic consistency validation of the extracted record

pub mod bill;
pub mod error;
pub mod models;

pub use bill::rules::normalize::normalize;
pub use bill::{
    BillParser, Extraction, ExtractionMatch, MatchSource, TallyBillParser, Validator, extract,
    validate,
};
pub use error::{BillscanError, Result};
pub use models::bill::{BillField, BillRecord, Discrepancy, RawText, ValidationResult};
pub use models::config::{
    Adjacency, BillscanConfig, ExtractionConfig, LabelPatternSpec, ValidationConfig,
    ValuePosition,
};
