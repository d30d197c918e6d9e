//! The label table: which label variants exist for each field and which
//! beat which.

use lazy_static::lazy_static;
use regex::{Match, Regex};

use crate::error::{BillscanError, Result};
use crate::models::bill::BillField;
use crate::models::config::{Adjacency, LabelPatternSpec, ValuePosition};

// Shared label fragments. Dots and single spaces between letters are OCR
// variants of the same abbreviation (C.G.S.T, C G S T).
const CGST: &str = r"\bc\.?\s?g\.?\s?s\.?\s?t\b\.?";
const SGST: &str = r"\bs\.?\s?g\.?\s?s\.?\s?t\b\.?(?:\s*/\s*ut\s?gst\b)?";
const UTGST: &str = r"\bu\.?\s?t\.?\s?g\.?\s?s\.?\s?t\b\.?";
// "@ 9%", "Rate 9%", "9 %": the rate is part of the label, not the value.
// The `%` is required; "@ 402.42" is an amount.
const RATE: &str = r"\s*(?:(?:@|rate)\s*:?\s*)?\d+(?:\.\d+)?\s*%";
const AMOUNT_WORD: &str = r"\s*(?:amt|amount)\b\.?";

/// The built-in label table for Tally bills.
pub fn default_label_patterns() -> Vec<LabelPatternSpec> {
    use BillField::*;

    vec![
        // Buyer
        LabelPatternSpec::new(Buyer, r"\bbuyer\s*\(\s*bill(?:ed)?\s*to\s*\)\s*:?", 1, 0.9),
        LabelPatternSpec::new(Buyer, r"\bbuyer\s*:", 2, 0.9),
        LabelPatternSpec::new(Buyer, r"\bbill(?:ed)?\s*to\s*:?", 3, 0.85),
        LabelPatternSpec::new(Buyer, r"\bparty(?:'s)?(?:\s*name)?\s*:", 4, 0.8),
        // Total before tax
        LabelPatternSpec::new(TotalBeforeTax, r"\btaxable\s*value\b", 1, 0.9),
        LabelPatternSpec::new(
            TotalBeforeTax,
            r"\btotal\s*(?:before|without|excl(?:uding)?\.?)\s*tax\b",
            2,
            0.9,
        ),
        LabelPatternSpec::new(TotalBeforeTax, r"\bsub\s*-?\s*total\b", 3, 0.85),
        // CGST
        LabelPatternSpec::new(Cgst, format!("{CGST}{RATE}(?:{AMOUNT_WORD})?"), 1, 0.95),
        LabelPatternSpec::new(Cgst, format!("{CGST}{AMOUNT_WORD}"), 2, 0.95),
        LabelPatternSpec::new(Cgst, CGST, 3, 0.9),
        LabelPatternSpec::new(Cgst, r"\bcentral\s*(?:gst|tax)\b", 4, 0.85),
        // SGST
        LabelPatternSpec::new(Sgst, format!("{SGST}{RATE}(?:{AMOUNT_WORD})?"), 1, 0.95),
        LabelPatternSpec::new(Sgst, format!("{SGST}{AMOUNT_WORD}"), 2, 0.95),
        LabelPatternSpec::new(Sgst, SGST, 3, 0.9),
        LabelPatternSpec::new(Sgst, UTGST, 4, 0.85),
        LabelPatternSpec::new(Sgst, r"\bstate\s*(?:gst|tax)\b", 5, 0.85),
        // Grand total
        LabelPatternSpec::new(GrandTotal, r"\bgrand\s*total\b", 1, 0.95),
        LabelPatternSpec::new(
            GrandTotal,
            r"\b(?:total\s*amount|invoice\s*total|bill\s*amount|net\s*payable|amount\s*payable|total\s*payable)\b",
            2,
            0.9,
        ),
        LabelPatternSpec::new(
            GrandTotal,
            r"\bamount\s*chargeable\b(?:\s*\(\s*in\s*words\s*\))?",
            3,
            0.85,
        )
        .with_lookahead(3),
        LabelPatternSpec::new(GrandTotal, r"^total\b\.?", 4, 0.8)
            .immediate()
            .at_line_end(),
    ]
}

/// A compiled table row.
#[derive(Debug, Clone)]
pub struct LabelPattern {
    pub field: BillField,
    pub priority: u8,
    pub adjacency: Adjacency,
    pub position: ValuePosition,
    pub confidence: f32,
    pub lookahead_lines: Option<usize>,
    source: String,
    regex: Regex,
}

impl LabelPattern {
    /// The pattern as written in the configuration.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Leftmost occurrence of the label on a normalized line.
    pub fn find<'h>(&self, line: &'h str) -> Option<Match<'h>> {
        self.regex.find(line)
    }
}

/// Label table compiled once and shared by every extraction call.
#[derive(Debug, Clone)]
pub struct PatternTable {
    patterns: Vec<LabelPattern>,
}

lazy_static! {
    static ref DEFAULT_TABLE: PatternTable = PatternTable::compile(&default_label_patterns())
        .expect("built-in label patterns are valid");
}

impl PatternTable {
    /// Compile a table, ordering rows by field then priority. Rows with the
    /// same priority keep their table order.
    pub fn compile(specs: &[LabelPatternSpec]) -> Result<Self> {
        let mut patterns = specs
            .iter()
            .map(|spec| {
                let regex = Regex::new(&format!("(?i){}", spec.pattern)).map_err(|source| {
                    BillscanError::Pattern {
                        field: spec.field,
                        pattern: spec.pattern.clone(),
                        source,
                    }
                })?;
                Ok(LabelPattern {
                    field: spec.field,
                    priority: spec.priority,
                    adjacency: spec.adjacency,
                    position: spec.position,
                    confidence: spec.confidence.clamp(0.0, 1.0),
                    lookahead_lines: spec.lookahead_lines,
                    source: spec.pattern.clone(),
                    regex,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        patterns.sort_by_key(|p| (p.field, p.priority));
        Ok(Self { patterns })
    }

    /// The built-in table.
    pub fn builtin() -> Self {
        DEFAULT_TABLE.clone()
    }

    /// Rows for one field, in the order they are tried.
    pub fn for_field(&self, field: BillField) -> impl Iterator<Item = &LabelPattern> + '_ {
        self.patterns.iter().filter(move |p| p.field == field)
    }

    /// True when any monetary label occurs on the line.
    pub fn has_amount_label(&self, line: &str) -> bool {
        self.patterns
            .iter()
            .filter(|p| p.field.is_amount())
            .any(|p| p.find(line).is_some())
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
