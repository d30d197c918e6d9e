//! GST bill field extraction and consistency validation.

mod parser;
pub mod rules;
mod validator;

pub use parser::{Extraction, TallyBillParser};
pub use rules::{ExtractionMatch, MatchSource};
pub use validator::Validator;

use crate::models::bill::{BillRecord, RawText, ValidationResult};

/// Trait for bill parsing.
pub trait BillParser {
    /// Parse a bill, keeping confidence and provenance for every field.
    fn parse(&self, text: &RawText) -> Extraction;

    /// Parse a bill down to the plain record.
    fn extract(&self, text: &RawText) -> BillRecord {
        self.parse(text).record()
    }
}

/// Extract a record with the built-in label table and default settings.
pub fn extract(text: &RawText) -> BillRecord {
    TallyBillParser::new().extract(text)
}

/// Validate a record with the default tolerances.
pub fn validate(record: &BillRecord) -> ValidationResult {
    Validator::default().validate(record)
}
