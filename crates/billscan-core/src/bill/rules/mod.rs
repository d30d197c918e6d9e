//! Rule-based field extractors for GST bills.
//!
//! Every extractor works on normalized lines (see [`normalize`]).

pub mod amounts;
pub mod buyer;
pub mod dates;
pub mod invoice_number;
pub mod normalize;
pub mod patterns;
pub mod table;

pub use amounts::{AmountExtractor, first_amount, parse_amount, round_currency};
pub use buyer::BuyerExtractor;
pub use dates::{DateExtractor, extract_bill_date};
pub use invoice_number::extract_invoice_number;
pub use normalize::{normalize, normalize_line};
pub use table::{LabelPattern, PatternTable, default_label_patterns};

use serde::{Deserialize, Serialize};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the first occurrence of the field, in text order.
    fn extract(&self, lines: &[String]) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, lines: &[String]) -> Vec<Self::Output>;
}

/// How a value was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchSource {
    /// A label from the table matched on `line`.
    Label { pattern: String, line: usize },
    /// Picked by position rather than by label.
    Heuristic { line: usize },
    /// Computed from other fields.
    Derived,
}

impl MatchSource {
    /// Line the match was anchored on, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            MatchSource::Label { line, .. } | MatchSource::Heuristic { line } => Some(*line),
            MatchSource::Derived => None,
        }
    }
}

/// An extracted value with its confidence score and provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Where the value came from.
    pub source: MatchSource,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, source: MatchSource) -> Self {
        Self {
            value,
            confidence: confidence.clamp(0.0, 1.0),
            source,
        }
    }

    pub fn is_derived(&self) -> bool {
        self.source == MatchSource::Derived
    }
}
