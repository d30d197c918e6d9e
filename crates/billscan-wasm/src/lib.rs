//! WASM bindings for GST bill extraction.
//!
//! Browser-side OCR hands its text to these functions; everything runs in
//! the page, nothing is uploaded.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use billscan_core::bill::rules::parse_amount as parse_bill_amount;
use billscan_core::{
    BillParser, BillRecord, BillscanConfig, RawText, TallyBillParser, ValidationResult, Validator,
};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Extract the bill record from OCR text with the default settings.
#[wasm_bindgen]
pub fn extract_bill_from_text(text: &str) -> Result<JsValue, JsValue> {
    to_js(&billscan_core::extract(&RawText::from(text)))
}

/// Validate a bill record (as returned by `extract_bill_from_text`).
#[wasm_bindgen]
pub fn validate_bill(record: JsValue) -> Result<JsValue, JsValue> {
    let record: BillRecord = serde_wasm_bindgen::from_value(record).map_err(js_error)?;
    to_js(&billscan_core::validate(&record))
}

/// Parse an amount as printed on a bill (e.g., "₹ 1,43,999.50/-").
/// Returned as a decimal string to keep paise exact.
#[wasm_bindgen]
pub fn parse_amount(amount: &str) -> Option<String> {
    parse_bill_amount(amount).map(|d| d.to_string())
}

/// Extraction and validation of one bill.
#[derive(Debug, Serialize)]
struct ScanReport {
    record: BillRecord,
    validation: ValidationResult,
    invoice_no: Option<String>,
    bill_date: Option<String>,
    confidence: f32,
    warnings: Vec<String>,
}

/// Bill scanner class for browser use.
#[wasm_bindgen]
pub struct BillScanner {
    parser: TallyBillParser,
    validator: Validator,
}

impl BillScanner {
    fn from_config(config: &BillscanConfig) -> billscan_core::Result<Self> {
        config.check()?;
        Ok(Self {
            parser: TallyBillParser::from_config(&config.extraction)?,
            validator: Validator::new(config.validation.clone()),
        })
    }

    fn report(&self, text: &str) -> ScanReport {
        let extraction = self.parser.parse(&RawText::from(text));
        let validation = self.validator.validate_extraction(&extraction);

        ScanReport {
            record: extraction.record(),
            validation,
            invoice_no: extraction.invoice_no.map(|m| m.value),
            bill_date: extraction.bill_date.map(|m| m.value.to_string()),
            confidence: extraction.confidence,
            warnings: extraction.warnings,
        }
    }
}

#[wasm_bindgen]
impl BillScanner {
    /// Create a scanner, optionally from a JSON configuration.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<BillScanner, JsValue> {
        let config = match config_json {
            Some(json) => serde_json::from_str(&json).map_err(js_error)?,
            None => BillscanConfig::default(),
        };

        let scanner = Self::from_config(&config).map_err(js_error)?;
        web_sys::console::debug_1(&JsValue::from_str(&format!(
            "billscan {}: {} label patterns",
            version(),
            scanner.parser.table().len()
        )));
        Ok(scanner)
    }

    /// Extract the bill record.
    #[wasm_bindgen]
    pub fn extract(&self, text: &str) -> Result<JsValue, JsValue> {
        to_js(&self.parser.extract(&RawText::from(text)))
    }

    /// Validate a bill record with this scanner's tolerances.
    #[wasm_bindgen]
    pub fn validate(&self, record: JsValue) -> Result<JsValue, JsValue> {
        let record: BillRecord = serde_wasm_bindgen::from_value(record).map_err(js_error)?;
        to_js(&self.validator.validate(&record))
    }

    /// Extract and validate in one call, with header fields, confidence
    /// and warnings.
    #[wasm_bindgen]
    pub fn scan(&self, text: &str) -> Result<JsValue, JsValue> {
        to_js(&self.report(text))
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(js_error)
}

fn js_error<E: ToString>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}
