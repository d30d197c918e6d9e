//! Arithmetic consistency checks over an extracted record.

use tracing::debug;

use crate::models::bill::{BillField, BillRecord, Discrepancy, ValidationResult};
use crate::models::config::ValidationConfig;

use super::parser::Extraction;

/// Consistency validator.
///
/// Every rule runs; discrepancies accumulate in rule order. Rules whose
/// operands are missing are skipped, except required-field presence.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// All discrepancies found in a record.
    pub fn discrepancies(&self, record: &BillRecord) -> Vec<Discrepancy> {
        let mut found = Vec::new();
        self.check_presence(record, &mut found);
        self.check_symmetry(record, &mut found);
        self.check_closure(record, &mut found);
        self.check_non_negative(record, &mut found);

        debug!("Validation found {} discrepancies", found.len());
        found
    }

    pub fn validate(&self, record: &BillRecord) -> ValidationResult {
        ValidationResult::from_discrepancies(&self.discrepancies(record))
    }

    /// Validate the record of an extraction, plus the header fields when
    /// `require_invoice_details` is set.
    pub fn validate_extraction(&self, extraction: &Extraction) -> ValidationResult {
        let mut found = self.discrepancies(&extraction.record());

        if self.config.require_invoice_details {
            if extraction.invoice_no.is_none() {
                found.push(Discrepancy::MissingInvoiceNumber);
            }
            if extraction.bill_date.is_none() {
                found.push(Discrepancy::MissingBillDate);
            }
        }

        ValidationResult::from_discrepancies(&found)
    }

    fn check_presence(&self, record: &BillRecord, found: &mut Vec<Discrepancy>) {
        if record.buyer.as_deref().is_none_or(|b| b.trim().is_empty()) {
            found.push(Discrepancy::MissingField {
                field: BillField::Buyer,
            });
        }
        for field in [BillField::TotalBeforeTax, BillField::GrandTotal] {
            if !record.is_present(field) {
                found.push(Discrepancy::MissingField { field });
            }
        }

        match (record.cgst, record.sgst) {
            (Some(_), None) => found.push(Discrepancy::UnpairedTax {
                present: BillField::Cgst,
                missing: BillField::Sgst,
            }),
            (None, Some(_)) => found.push(Discrepancy::UnpairedTax {
                present: BillField::Sgst,
                missing: BillField::Cgst,
            }),
            _ => {}
        }
    }

    fn check_symmetry(&self, record: &BillRecord, found: &mut Vec<Discrepancy>) {
        let (Some(cgst), Some(sgst)) = (record.cgst, record.sgst) else {
            return;
        };

        let Some(difference) = cgst.checked_sub(sgst).map(|d| d.abs()) else {
            debug!("cgst - sgst overflows");
            found.push(Discrepancy::Overflow {
                check: "cgst - sgst".to_string(),
            });
            return;
        };
        if difference > self.config.symmetry_tolerance {
            found.push(Discrepancy::TaxAsymmetry {
                cgst,
                sgst,
                difference,
            });
        }
    }

    fn check_closure(&self, record: &BillRecord, found: &mut Vec<Discrepancy>) {
        let (Some(total_before_tax), Some(cgst), Some(sgst), Some(stated)) = (
            record.total_before_tax,
            record.cgst,
            record.sgst,
            record.grand_total,
        ) else {
            return;
        };

        let sums = total_before_tax
            .checked_add(cgst)
            .and_then(|partial| partial.checked_add(sgst))
            .and_then(|computed| Some((computed, computed.checked_sub(stated)?.abs())));
        let Some((computed, difference)) = sums else {
            debug!("closure arithmetic overflows");
            found.push(Discrepancy::Overflow {
                check: "total_before_tax + cgst + sgst - grand_total".to_string(),
            });
            return;
        };
        if difference > self.config.closure_tolerance {
            found.push(Discrepancy::ArithmeticMismatch {
                computed,
                stated,
                difference,
            });
        }
    }

    fn check_non_negative(&self, record: &BillRecord, found: &mut Vec<Discrepancy>) {
        for field in BillField::AMOUNTS {
            match record.amount(field) {
                Some(value) if value.is_sign_negative() && !value.is_zero() => {
                    found.push(Discrepancy::NegativeAmount { field, value });
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn record(tbt: &str, cgst: &str, sgst: &str, total: &str) -> BillRecord {
        BillRecord {
            buyer: Some("ACME TRADERS".to_string()),
            total_before_tax: Some(dec(tbt)),
            cgst: Some(dec(cgst)),
            sgst: Some(dec(sgst)),
            grand_total: Some(dec(total)),
        }
    }

    #[test]
    fn test_consistent_record_is_valid() {
        let result = Validator::default().validate(&record("14399.74", "402.42", "402.42", "15204.58"));
        assert_eq!(result, ValidationResult { is_valid: true, errors: vec![] });
    }

    #[test]
    fn test_asymmetric_tax_is_the_only_error() {
        let validator = Validator::default();
        let found = validator.discrepancies(&record("14399.74", "402.42", "450.00", "15252.16"));
        assert_eq!(
            found,
            vec![Discrepancy::TaxAsymmetry {
                cgst: dec("402.42"),
                sgst: dec("450.00"),
                difference: dec("47.58"),
            }]
        );
        let result = validator.validate(&record("14399.74", "402.42", "450.00", "15252.16"));
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_missing_buyer_is_reported() {
        let mut rec = record("14399.74", "402.42", "402.42", "15204.58");
        rec.buyer = None;
        let result = Validator::default().validate(&rec);
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("buyer"));
    }

    #[test]
    fn test_blank_buyer_counts_as_missing() {
        let mut rec = record("100.00", "9.00", "9.00", "118.00");
        rec.buyer = Some("  ".to_string());
        assert!(!Validator::default().validate(&rec).is_valid);
    }

    #[test]
    fn test_closure_mismatch_names_amounts() {
        let result = Validator::default().validate(&record("100.00", "9.00", "9.00", "120.00"));
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("118.00"));
        assert!(result.errors[0].contains("120.00"));
        assert!(result.errors[0].contains("2.00"));
    }

    #[test]
    fn test_tolerances() {
        let validator = Validator::default();
        assert!(validator.validate(&record("100.00", "9.00", "9.01", "118.01")).is_valid);
        assert!(validator.validate(&record("100.00", "9.00", "9.00", "118.02")).is_valid);
        assert!(!validator.validate(&record("100.00", "9.00", "9.00", "118.03")).is_valid);

        let strict = Validator::new(ValidationConfig {
            symmetry_tolerance: Decimal::ZERO,
            closure_tolerance: Decimal::ZERO,
            ..Default::default()
        });
        assert!(!strict.validate(&record("100.00", "9.00", "9.01", "118.01")).is_valid);
    }

    #[test]
    fn test_all_rules_accumulate() {
        let rec = BillRecord {
            buyer: None,
            total_before_tax: Some(dec("100.00")),
            cgst: Some(dec("-9.00")),
            sgst: Some(dec("9.00")),
            grand_total: Some(dec("200.00")),
        };
        let found = Validator::default().discrepancies(&rec);
        assert!(matches!(found[0], Discrepancy::MissingField { field: BillField::Buyer }));
        assert!(matches!(found[1], Discrepancy::TaxAsymmetry { .. }));
        assert!(matches!(found[2], Discrepancy::ArithmeticMismatch { .. }));
        assert!(matches!(
            found[3],
            Discrepancy::NegativeAmount { field: BillField::Cgst, .. }
        ));
        assert_eq!(found.len(), 4);
    }

    #[test]
    fn test_overflowing_closure_is_reported() {
        let huge = "70000000000000000000000000000";
        let found = Validator::default().discrepancies(&record(huge, huge, huge, huge));
        assert_eq!(
            found,
            vec![Discrepancy::Overflow {
                check: "total_before_tax + cgst + sgst - grand_total".to_string(),
            }]
        );
        assert!(!Validator::default().validate(&record(huge, huge, huge, huge)).is_valid);
    }

    #[test]
    fn test_overflowing_symmetry_is_reported() {
        let found = Validator::default().discrepancies(&record(
            "0",
            "70000000000000000000000000000",
            "-70000000000000000000000000000",
            "0",
        ));
        assert_eq!(
            found[0],
            Discrepancy::Overflow {
                check: "cgst - sgst".to_string(),
            }
        );
        assert!(matches!(
            found.last(),
            Some(Discrepancy::NegativeAmount { field: BillField::Sgst, .. })
        ));
    }

    #[test]
    fn test_unpaired_tax() {
        let mut rec = record("100.00", "9.00", "9.00", "109.00");
        rec.sgst = None;
        let found = Validator::default().discrepancies(&rec);
        assert_eq!(
            found,
            vec![Discrepancy::UnpairedTax {
                present: BillField::Cgst,
                missing: BillField::Sgst,
            }]
        );
    }

    #[test]
    fn test_zero_rated_bill_is_valid() {
        let rec = BillRecord {
            buyer: Some("ACME".to_string()),
            total_before_tax: Some(dec("500.00")),
            cgst: None,
            sgst: None,
            grand_total: Some(dec("500.00")),
        };
        assert!(Validator::default().validate(&rec).is_valid);
    }

    #[test]
    fn test_empty_record_reports_required_fields() {
        let result = Validator::default().validate(&BillRecord::default());
        assert_eq!(result.errors.len(), 3);
    }

    #[test]
    fn test_invoice_details_required_on_request() {
        let extraction = Extraction {
            buyer: None,
            ..Default::default()
        };
        let lenient = Validator::default().validate_extraction(&extraction);
        assert_eq!(lenient.errors.len(), 3);

        let strict = Validator::new(ValidationConfig {
            require_invoice_details: true,
            ..Default::default()
        });
        let result = strict.validate_extraction(&extraction);
        assert_eq!(result.errors.len(), 5);
        assert_eq!(result.errors[3], "missing invoice number");
        assert_eq!(result.errors[4], "missing bill date");
    }
}
