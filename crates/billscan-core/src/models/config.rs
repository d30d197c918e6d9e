//! Configuration structures for extraction and validation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::bill::rules::table::default_label_patterns;
use crate::error::{BillscanError, Result};
use crate::models::bill::BillField;

/// Main configuration for billscan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillscanConfig {
    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Consistency validation configuration.
    pub validation: ValidationConfig,
}

/// Field extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// How many non-blank lines after a label are searched for its value
    /// when the label line itself carries none.
    pub lookahead_lines: usize,

    /// Compute a missing grand total from the other three amounts.
    pub derive_grand_total: bool,

    /// Try explicit buyer labels ("Buyer (Bill to)") before the positional heuristic.
    pub use_buyer_labels: bool,

    /// Ordered label table; see [`LabelPatternSpec`].
    pub patterns: Vec<LabelPatternSpec>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            lookahead_lines: 1,
            derive_grand_total: true,
            use_buyer_labels: true,
            patterns: default_label_patterns(),
        }
    }
}

/// Consistency validation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Largest accepted |cgst - sgst|.
    pub symmetry_tolerance: Decimal,

    /// Largest accepted |total_before_tax + cgst + sgst - grand_total|.
    pub closure_tolerance: Decimal,

    /// Also require an invoice number and bill date when validating a full extraction.
    pub require_invoice_details: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            symmetry_tolerance: Decimal::new(1, 2),
            closure_tolerance: Decimal::new(2, 2),
            require_invoice_details: false,
        }
    }
}

/// Where the value may sit relative to its label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Adjacency {
    /// First number anywhere after the label on the line, else in the lookahead window.
    #[default]
    Anywhere,
    /// Only separators may sit between label and value, or the label ends the line.
    Immediate,
}

/// Which number on the label line is the value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuePosition {
    /// First number after the label.
    #[default]
    First,
    /// The number that ends the line; earlier numbers are quantities or
    /// counts (`Total 120 Nos 16,991.70`).
    LineEnd,
}

/// One row of the label table.
///
/// Patterns are regexes matched case-insensitively against normalized lines.
/// Within a field, lower `priority` is tried first; equal priorities keep
/// table order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelPatternSpec {
    pub field: BillField,
    pub pattern: String,
    pub priority: u8,
    #[serde(default)]
    pub adjacency: Adjacency,
    #[serde(default)]
    pub position: ValuePosition,
    pub confidence: f32,
    /// Overrides `lookahead_lines` for this label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookahead_lines: Option<usize>,
}

impl LabelPatternSpec {
    pub fn new(field: BillField, pattern: impl Into<String>, priority: u8, confidence: f32) -> Self {
        Self {
            field,
            pattern: pattern.into(),
            priority,
            adjacency: Adjacency::Anywhere,
            position: ValuePosition::First,
            confidence: confidence.clamp(0.0, 1.0),
            lookahead_lines: None,
        }
    }

    pub fn immediate(mut self) -> Self {
        self.adjacency = Adjacency::Immediate;
        self
    }

    pub fn at_line_end(mut self) -> Self {
        self.position = ValuePosition::LineEnd;
        self
    }

    pub fn with_lookahead(mut self, lines: usize) -> Self {
        self.lookahead_lines = Some(lines);
        self
    }
}

impl BillscanConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.check()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values that would make extraction or validation meaningless.
    pub fn check(&self) -> Result<()> {
        if self.validation.symmetry_tolerance.is_sign_negative() {
            return Err(BillscanError::Config(
                "validation.symmetry_tolerance must not be negative".to_string(),
            ));
        }
        if self.validation.closure_tolerance.is_sign_negative() {
            return Err(BillscanError::Config(
                "validation.closure_tolerance must not be negative".to_string(),
            ));
        }
        if let Some(spec) = self
            .extraction
            .patterns
            .iter()
            .find(|p| p.pattern.trim().is_empty())
        {
            return Err(BillscanError::Config(format!(
                "empty label pattern for {}",
                spec.field
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = BillscanConfig::default();
        assert_eq!(config.extraction.lookahead_lines, 1);
        assert!(config.extraction.derive_grand_total);
        assert_eq!(config.validation.symmetry_tolerance, Decimal::new(1, 2));
        assert_eq!(config.validation.closure_tolerance, Decimal::new(2, 2));
        assert!(!config.extraction.patterns.is_empty());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: BillscanConfig =
            serde_json::from_str(r#"{ "validation": { "closure_tolerance": 0.05 } }"#).unwrap();
        assert_eq!(config.validation.closure_tolerance, Decimal::new(5, 2));
        assert_eq!(config.validation.symmetry_tolerance, Decimal::new(1, 2));
        assert_eq!(config.extraction, ExtractionConfig::default());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = BillscanConfig::default();
        config.validation.require_invoice_details = true;
        config.extraction.lookahead_lines = 2;
        config.save(&path).unwrap();

        let loaded = BillscanConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let mut config = BillscanConfig::default();
        config.validation.closure_tolerance = Decimal::new(-1, 2);
        assert!(matches!(config.check(), Err(BillscanError::Config(_))));
    }

    #[test]
    fn test_label_spec_clamps_confidence() {
        let spec = LabelPatternSpec::new(BillField::Cgst, r"\bcgst\b", 1, 1.7);
        assert_eq!(spec.confidence, 1.0);
        assert_eq!(spec.adjacency, Adjacency::Anywhere);
        assert_eq!(spec.position, ValuePosition::First);
        let spec = spec.immediate().at_line_end();
        assert_eq!(spec.adjacency, Adjacency::Immediate);
        assert_eq!(spec.position, ValuePosition::LineEnd);
    }

    #[test]
    fn test_label_spec_position_defaults_to_first() {
        let json = r#"{"field": "grand_total", "pattern": "^total", "priority": 1, "confidence": 0.8}"#;
        let spec: LabelPatternSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.position, ValuePosition::First);
        assert_eq!(spec.adjacency, Adjacency::Anywhere);
    }
}
