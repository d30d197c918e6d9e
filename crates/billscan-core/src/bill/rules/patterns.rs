//! Common regex patterns for GST bill extraction.
//!
//! Monetary labels live in the configurable label table (see `table.rs`);
//! this module holds the fixed patterns used for tokenising and for
//! recognising transaction metadata.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Currency markers, checked for word boundaries in `normalize`
    pub static ref CURRENCY_MARKER: Regex = Regex::new(
        r"(?i)₹|rs\.?|inr"
    ).unwrap();

    // Indian "only" suffix on amounts: 500/-
    pub static ref RUPEE_SUFFIX: Regex = Regex::new(
        r"(\d)(?:\s*/-)+"
    ).unwrap();

    // Unsigned decimal token; sign and context are checked by the scanner
    pub static ref NUMBER: Regex = Regex::new(
        r"\d+(?:\.\d+)?"
    ).unwrap();

    // Value directly after an `Immediate` label
    pub static ref IMMEDIATE_VALUE: Regex = Regex::new(
        r"^[\s:=]*(?:-?\s?\d|$)"
    ).unwrap();

    // Dates: 14-Oct-25, 14 Oct 2025, 14-October-2025
    pub static ref DATE_TEXT_MONTH: Regex = Regex::new(
        r"(?i)\b(\d{1,2})[-/. ]?(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?[-/. ,]*(\d{4}|\d{2})\b"
    ).unwrap();

    // Dates: 14/10/2025, 14-10-25, 14.10.2025 (day first)
    pub static ref DATE_NUMERIC: Regex = Regex::new(
        r"\b(\d{1,2})[-/.](\d{1,2})[-/.](\d{4}|\d{2})\b"
    ).unwrap();

    // Dates: 2025-10-14
    pub static ref DATE_ISO: Regex = Regex::new(
        r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b"
    ).unwrap();

    // Labeled date
    pub static ref DATED_LABEL: Regex = Regex::new(
        r"(?i)\b(?:dated|date)\b\.?\s*[:\-]?"
    ).unwrap();

    // Invoice number labels
    pub static ref INVOICE_NUMBER_LABEL: Regex = Regex::new(
        r"(?i)\binv(?:oice)?\.?\s*(?:no\b\.?|number\b|#)\s*[:\-]?"
    ).unwrap();

    pub static ref BILL_NUMBER_LABEL: Regex = Regex::new(
        r"(?i)\b(?:e-?\s?way\s+)?bill\s*(?:no\b\.?|number\b|#)\s*[:\-]?"
    ).unwrap();

    // Reference token carrying at least one digit: 123, TI/2025/045, A-17
    pub static ref REFERENCE_TOKEN: Regex = Regex::new(
        r"[A-Za-z0-9][A-Za-z0-9/\-]*"
    ).unwrap();

    // Document headings printed above the parties
    pub static ref DOCUMENT_HEADING: Regex = Regex::new(
        r"(?i)^[^\w]*(?:tax\s+invoice|retail\s+invoice|e-?\s?invoice|invoice|bill\s+of\s+supply|cash\s+(?:memo|bill)|estimate|receipt|(?:original|duplicate|triplicate)\s+for\b)"
    ).unwrap();

    // Lines that open with registration or contact metadata
    pub static ref METADATA_PREFIX: Regex = Regex::new(
        r"(?i)^[^\w]*(?:(?:gstin|gst\s*no|state\s+name|state\s+code|place\s+of\s+supply|e-?mail|website|ack\s*(?:no|date)|irn|e-?way|delivery\s+note|reference|buyer'?s\s+order|dispatch|terms\s+of)\b|(?:uin|pan|cin|contact|mobile|phone|ph|tel|fax)\b\.?\s*(?:no\b\.?)?\s*[:\-/+\d])"
    ).unwrap();

    // "Date", "Dated" opening a line; inside a name ("Up-to-Date") it is not a label
    pub static ref DATED_PREFIX: Regex = Regex::new(
        r"(?i)^[^\w]*(?:dated|date)\b"
    ).unwrap();

    // Contact details trailing a name on the same line
    pub static ref CONTACT_MARKER: Regex = Regex::new(
        r"(?i)\b(?:contact|mobile|mob|phone|ph|tel)\b"
    ).unwrap();

    // Indian mobile/landline numbers
    pub static ref PHONE: Regex = Regex::new(
        r"(?:\+91[\s\-]?)?(?:\d{5}[\s\-]?\d{5}|\d{3,4}[\s\-]\d{6,8})"
    ).unwrap();

    pub static ref EMAIL: Regex = Regex::new(
        r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}"
    ).unwrap();
}
