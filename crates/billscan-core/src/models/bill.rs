//! Bill data models: OCR input, extracted record and validation verdict.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OCR output as an ordered sequence of lines, top to bottom.
///
/// Lines are kept verbatim: blank lines, stray symbols and duplicated headers
/// are all preserved so that line indices reported by the extractor refer to
/// the text the OCR engine produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawText {
    lines: Vec<String>,
}

impl RawText {
    /// Build from already split lines.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// True when there is no line with visible content.
    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Join the lines back into a single blob.
    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }
}

impl From<&str> for RawText {
    fn from(text: &str) -> Self {
        Self::from_lines(text.lines())
    }
}

impl From<String> for RawText {
    fn from(text: String) -> Self {
        Self::from(text.as_str())
    }
}

impl From<Vec<String>> for RawText {
    fn from(lines: Vec<String>) -> Self {
        Self { lines }
    }
}

/// The fields a bill record is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillField {
    Buyer,
    TotalBeforeTax,
    Cgst,
    Sgst,
    GrandTotal,
}

impl BillField {
    /// Every field, in record order.
    pub const ALL: [BillField; 5] = [
        BillField::Buyer,
        BillField::TotalBeforeTax,
        BillField::Cgst,
        BillField::Sgst,
        BillField::GrandTotal,
    ];

    /// The four monetary fields.
    pub const AMOUNTS: [BillField; 4] = [
        BillField::TotalBeforeTax,
        BillField::Cgst,
        BillField::Sgst,
        BillField::GrandTotal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BillField::Buyer => "buyer",
            BillField::TotalBeforeTax => "total_before_tax",
            BillField::Cgst => "cgst",
            BillField::Sgst => "sgst",
            BillField::GrandTotal => "grand_total",
        }
    }

    pub fn is_amount(&self) -> bool {
        !matches!(self, BillField::Buyer)
    }
}

impl fmt::Display for BillField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BillField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buyer" => Ok(BillField::Buyer),
            "total_before_tax" => Ok(BillField::TotalBeforeTax),
            "cgst" => Ok(BillField::Cgst),
            "sgst" => Ok(BillField::Sgst),
            "grand_total" => Ok(BillField::GrandTotal),
            other => Err(format!("Unknown bill field: '{other}'")),
        }
    }
}

/// Structured fields recovered from one bill.
///
/// `None` means no label matched; it is never used as a stand-in for zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillRecord {
    /// Buyer / party name.
    pub buyer: Option<String>,

    /// Taxable value before GST.
    pub total_before_tax: Option<Decimal>,

    /// Central GST component.
    pub cgst: Option<Decimal>,

    /// State (or union territory) GST component.
    pub sgst: Option<Decimal>,

    /// Amount payable including tax.
    pub grand_total: Option<Decimal>,
}

impl BillRecord {
    /// Value of a monetary field; `None` for `Buyer`.
    pub fn amount(&self, field: BillField) -> Option<Decimal> {
        match field {
            BillField::Buyer => None,
            BillField::TotalBeforeTax => self.total_before_tax,
            BillField::Cgst => self.cgst,
            BillField::Sgst => self.sgst,
            BillField::GrandTotal => self.grand_total,
        }
    }

    pub fn is_present(&self, field: BillField) -> bool {
        match field {
            BillField::Buyer => self.buyer.is_some(),
            other => self.amount(other).is_some(),
        }
    }

    /// Fields that were not found.
    pub fn missing_fields(&self) -> Vec<BillField> {
        BillField::ALL
            .into_iter()
            .filter(|f| !self.is_present(*f))
            .collect()
    }
}

/// A semantic inconsistency between the fields of a record.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Discrepancy {
    #[error("missing required field: {field}")]
    MissingField { field: BillField },

    #[error("{present} is present but {missing} is missing")]
    UnpairedTax { present: BillField, missing: BillField },

    #[error("cgst ({cgst}) and sgst ({sgst}) differ by {difference}")]
    TaxAsymmetry {
        cgst: Decimal,
        sgst: Decimal,
        difference: Decimal,
    },

    #[error(
        "total_before_tax + cgst + sgst = {computed} but grand_total is {stated} (off by {difference})"
    )]
    ArithmeticMismatch {
        computed: Decimal,
        stated: Decimal,
        difference: Decimal,
    },

    /// The check's arithmetic leaves the decimal range, so it cannot be
    /// evaluated.
    #[error("{check} is out of range")]
    Overflow { check: String },

    #[error("{field} is negative: {value}")]
    NegativeAmount { field: BillField, value: Decimal },

    #[error("missing invoice number")]
    MissingInvoiceNumber,

    #[error("missing bill date")]
    MissingBillDate,
}

/// Verdict of the consistency validator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn from_discrepancies(discrepancies: &[Discrepancy]) -> Self {
        Self {
            is_valid: discrepancies.is_empty(),
            errors: discrepancies.iter().map(ToString::to_string).collect(),
        }
    }
}
