//! Tally bill parser: runs every field extractor over normalized text.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::models::bill::{BillField, BillRecord, RawText};
use crate::models::config::ExtractionConfig;

use super::BillParser;
use super::rules::{
    AmountExtractor, BuyerExtractor, ExtractionMatch, FieldExtractor, MatchSource, PatternTable,
    extract_bill_date, extract_invoice_number, normalize, round_currency,
};

const DERIVED_CONFIDENCE: f32 = 0.8;

// Share of each field in the aggregate confidence.
const FIELD_WEIGHTS: [(BillField, f32); 5] = [
    (BillField::Buyer, 0.2),
    (BillField::TotalBeforeTax, 0.2),
    (BillField::Cgst, 0.15),
    (BillField::Sgst, 0.15),
    (BillField::GrandTotal, 0.3),
];

/// Result of bill extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub buyer: Option<ExtractionMatch<String>>,
    pub total_before_tax: Option<ExtractionMatch<Decimal>>,
    pub cgst: Option<ExtractionMatch<Decimal>>,
    pub sgst: Option<ExtractionMatch<Decimal>>,
    pub grand_total: Option<ExtractionMatch<Decimal>>,
    /// Invoice number from the bill header.
    pub invoice_no: Option<ExtractionMatch<String>>,
    /// Bill date from the bill header.
    pub bill_date: Option<ExtractionMatch<NaiveDate>>,
    /// Weighted confidence over the five record fields, absent fields
    /// counting as zero.
    pub confidence: f32,
    /// Extraction warnings.
    pub warnings: Vec<String>,
}

impl Extraction {
    /// The plain record, without provenance.
    pub fn record(&self) -> BillRecord {
        let value = |m: &Option<ExtractionMatch<Decimal>>| m.as_ref().map(|m| m.value);
        BillRecord {
            buyer: self.buyer.as_ref().map(|m| m.value.clone()),
            total_before_tax: value(&self.total_before_tax),
            cgst: value(&self.cgst),
            sgst: value(&self.sgst),
            grand_total: value(&self.grand_total),
        }
    }

    fn amount_match(&self, field: BillField) -> Option<&ExtractionMatch<Decimal>> {
        match field {
            BillField::Buyer => None,
            BillField::TotalBeforeTax => self.total_before_tax.as_ref(),
            BillField::Cgst => self.cgst.as_ref(),
            BillField::Sgst => self.sgst.as_ref(),
            BillField::GrandTotal => self.grand_total.as_ref(),
        }
    }

    /// Provenance of a field, if it was found.
    pub fn source(&self, field: BillField) -> Option<&MatchSource> {
        match field {
            BillField::Buyer => self.buyer.as_ref().map(|m| &m.source),
            other => self.amount_match(other).map(|m| &m.source),
        }
    }

    /// True when the field was computed rather than read from the bill.
    pub fn is_derived(&self, field: BillField) -> bool {
        self.source(field) == Some(&MatchSource::Derived)
    }

    /// Confidence of one field; zero when absent.
    pub fn field_confidence(&self, field: BillField) -> f32 {
        match field {
            BillField::Buyer => self.buyer.as_ref().map_or(0.0, |m| m.confidence),
            other => self.amount_match(other).map_or(0.0, |m| m.confidence),
        }
    }

    fn aggregate_confidence(&self) -> f32 {
        FIELD_WEIGHTS
            .iter()
            .map(|(field, weight)| weight * self.field_confidence(*field))
            .sum::<f32>()
            .clamp(0.0, 1.0)
    }
}

/// Rule-based parser for Tally-style GST bills.
///
/// Holds the compiled label table only, so one parser can be shared across
/// threads.
#[derive(Debug, Clone)]
pub struct TallyBillParser {
    table: PatternTable,
    config: ExtractionConfig,
}

impl TallyBillParser {
    /// Create a parser with the built-in label table.
    pub fn new() -> Self {
        Self {
            table: PatternTable::builtin(),
            config: ExtractionConfig::default(),
        }
    }

    /// Create a parser from configuration, compiling its label table.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        Ok(Self {
            table: PatternTable::compile(&config.patterns)?,
            config: config.clone(),
        })
    }

    pub fn table(&self) -> &PatternTable {
        &self.table
    }

    fn amount(&self, field: BillField, lines: &[String]) -> Option<ExtractionMatch<Decimal>> {
        AmountExtractor::new(field, &self.table, self.config.lookahead_lines).extract(lines)
    }
}

impl Default for TallyBillParser {
    fn default() -> Self {
        Self::new()
    }
}

/// `grand_total = round2(total_before_tax + cgst + sgst)`, only when all
/// three operands were found and their sum fits in a `Decimal`.
fn derive_grand_total(
    total_before_tax: Option<&ExtractionMatch<Decimal>>,
    cgst: Option<&ExtractionMatch<Decimal>>,
    sgst: Option<&ExtractionMatch<Decimal>>,
) -> Option<ExtractionMatch<Decimal>> {
    let (total_before_tax, cgst, sgst) = (total_before_tax?.value, cgst?.value, sgst?.value);
    let Some(sum) = total_before_tax
        .checked_add(cgst)
        .and_then(|partial| partial.checked_add(sgst))
    else {
        debug!("grand_total operands overflow, not deriving");
        return None;
    };
    let value = round_currency(sum);
    debug!(value = %value, "derived grand_total from its operands");
    Some(ExtractionMatch::new(value, DERIVED_CONFIDENCE, MatchSource::Derived))
}

impl BillParser for TallyBillParser {
    fn parse(&self, text: &RawText) -> Extraction {
        let normalized = normalize(text);
        let lines = normalized.lines();

        info!("Parsing bill from {} lines of text", lines.len());

        let buyer = BuyerExtractor::new(&self.table, self.config.use_buyer_labels).extract(lines);
        let total_before_tax = self.amount(BillField::TotalBeforeTax, lines);
        let cgst = self.amount(BillField::Cgst, lines);
        let sgst = self.amount(BillField::Sgst, lines);
        let mut grand_total = self.amount(BillField::GrandTotal, lines);

        if grand_total.is_none() && self.config.derive_grand_total {
            grand_total =
                derive_grand_total(total_before_tax.as_ref(), cgst.as_ref(), sgst.as_ref());
        }

        let mut extraction = Extraction {
            buyer,
            total_before_tax,
            cgst,
            sgst,
            grand_total,
            invoice_no: extract_invoice_number(lines),
            bill_date: extract_bill_date(lines),
            confidence: 0.0,
            warnings: Vec::new(),
        };

        for field in BillField::ALL {
            if extraction.source(field).is_none() {
                extraction
                    .warnings
                    .push(format!("Could not extract {field}"));
            }
        }
        if extraction.is_derived(BillField::GrandTotal) {
            extraction
                .warnings
                .push("grand_total derived from total_before_tax + cgst + sgst".to_string());
        }
        if extraction.invoice_no.is_none() {
            extraction
                .warnings
                .push("Could not extract invoice number".to_string());
        }
        if extraction.bill_date.is_none() {
            extraction
                .warnings
                .push("Could not extract bill date".to_string());
        }

        extraction.confidence = extraction.aggregate_confidence();

        debug!(
            "Extracted bill with {} missing fields and confidence {:.2}",
            extraction.record().missing_fields().len(),
            extraction.confidence
        );

        extraction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn parse(text: &str) -> Extraction {
        TallyBillParser::new().parse(&RawText::from(text))
    }

    #[test]
    fn test_empty_text_yields_empty_record() {
        let extraction = parse("");
        assert_eq!(extraction.record(), BillRecord::default());
        assert_eq!(extraction.confidence, 0.0);
        assert!(extraction.warnings.iter().any(|w| w == "Could not extract buyer"));
    }

    #[test]
    fn test_garbage_does_not_panic() {
        let extraction = parse("₹₹₹ ,,, /-/- -.- %%% \u{0} CGST @ % Total -\n\n\t");
        assert_eq!(extraction.record().cgst, None);
    }

    #[test]
    fn test_derives_missing_grand_total() {
        let extraction = parse(
            "Buyer (Bill to)\nACME TRADERS\nTaxable Value 14,399.74\nCGST @ 9% 402.42\nSGST @ 9% 402.42",
        );
        let record = extraction.record();
        assert_eq!(record.grand_total, Some(dec("15204.58")));
        assert!(extraction.is_derived(BillField::GrandTotal));
        assert_eq!(extraction.field_confidence(BillField::GrandTotal), DERIVED_CONFIDENCE);
        assert!(extraction.warnings.iter().any(|w| w.contains("derived")));
    }

    #[test]
    fn test_derivation_needs_all_operands() {
        let record = parse("Taxable Value 100.00\nCGST 9.00").record();
        assert_eq!(record.grand_total, None);
    }

    #[test]
    fn test_derivation_can_be_disabled() {
        let config = ExtractionConfig {
            derive_grand_total: false,
            ..Default::default()
        };
        let parser = TallyBillParser::from_config(&config).unwrap();
        let record = parser.extract(&RawText::from(
            "Taxable Value 100.00\nCGST 9.00\nSGST 9.00",
        ));
        assert_eq!(record.grand_total, None);
    }

    #[test]
    fn test_stated_grand_total_is_not_overridden() {
        let extraction = parse("Taxable Value 100.00\nCGST 9.00\nSGST 9.00\nGrand Total 120.00");
        assert_eq!(extraction.record().grand_total, Some(dec("120.00")));
        assert!(!extraction.is_derived(BillField::GrandTotal));
    }

    #[test]
    fn test_first_cgst_occurrence_wins() {
        let record = parse("CGST 402.42\nItems\nCGST 999.99").record();
        assert_eq!(record.cgst, Some(dec("402.42")));
    }

    #[test]
    fn test_first_cgst_occurrence_wins_when_larger() {
        let record = parse("CGST 999.99\nItems\nCGST 402.42").record();
        assert_eq!(record.cgst, Some(dec("999.99")));
    }

    #[test]
    fn test_overflowing_operands_are_not_derived() {
        let extraction = parse(
            "Taxable Value 70000000000000000000000000000\nCGST 70000000000000000000000000000\nSGST 70000000000000000000000000000",
        );
        let record = extraction.record();
        assert_eq!(record.cgst, Some(dec("70000000000000000000000000000")));
        assert_eq!(record.grand_total, None);
        assert!(!extraction.is_derived(BillField::GrandTotal));
    }

    #[test]
    fn test_negative_cgst_is_absent() {
        let record = parse("CGST -50.00").record();
        assert_eq!(record.cgst, None);
    }

    #[test]
    fn test_extract_is_idempotent_over_normalization() {
        let raw = RawText::from(
            "Buyer:  Rs. Kumar & Co.\nTaxable Value Rs.1,43,999.50/-\nCGST @ 9%  ₹ 12,959.96\nSGST @ 9% INR 12,959.96\nTotal : ₹ 1,69,919.42",
        );
        let parser = TallyBillParser::new();
        assert_eq!(parser.extract(&normalize(&raw)), parser.extract(&raw));
        assert_eq!(parser.extract(&raw).grand_total, Some(dec("169919.42")));
    }

    #[test]
    fn test_header_fields() {
        let extraction = parse("Invoice No. Dated\n123 14-Oct-25\nTotal 10.00");
        assert_eq!(extraction.invoice_no.unwrap().value, "123");
        assert_eq!(
            extraction.bill_date.unwrap().value,
            NaiveDate::from_ymd_opt(2025, 10, 14).unwrap()
        );
    }

    #[test]
    fn test_confidence_is_weighted() {
        let extraction = parse("Grand Total 100.00");
        let expected = 0.3 * 0.95;
        assert!((extraction.confidence - expected).abs() < 1e-6);
    }

    #[test]
    fn test_custom_table() {
        let mut config = ExtractionConfig::default();
        config.patterns.push(crate::models::config::LabelPatternSpec::new(
            BillField::TotalBeforeTax,
            r"\bassessable\s*value\b",
            9,
            0.7,
        ));
        let parser = TallyBillParser::from_config(&config).unwrap();
        let record = parser.extract(&RawText::from("Assessable Value 500.00"));
        assert_eq!(record.total_before_tax, Some(dec("500.00")));
    }

    #[test]
    fn test_invalid_custom_pattern_is_an_error() {
        let mut config = ExtractionConfig::default();
        config.patterns.push(crate::models::config::LabelPatternSpec::new(
            BillField::Cgst,
            "[",
            1,
            0.5,
        ));
        assert!(TallyBillParser::from_config(&config).is_err());
    }

    #[test]
    fn test_parser_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TallyBillParser>();
    }
}
