//! Buyer (party) name extraction.
//!
//! Labeled first ("Buyer (Bill to)", "Bill to:"). Without a label the name
//! is picked by position: the first plain text line above the amounts block
//! that is not transaction metadata.

use crate::models::bill::BillField;

use super::dates::parse_date;
use super::patterns::{
    BILL_NUMBER_LABEL, CONTACT_MARKER, DATED_PREFIX, DOCUMENT_HEADING, EMAIL, INVOICE_NUMBER_LABEL,
    METADATA_PREFIX, PHONE,
};
use super::table::PatternTable;
use super::{ExtractionMatch, FieldExtractor, MatchSource};

const HEURISTIC_CONFIDENCE: f32 = 0.6;

/// Buyer extractor.
pub struct BuyerExtractor<'t> {
    table: &'t PatternTable,
    use_labels: bool,
}

impl<'t> BuyerExtractor<'t> {
    pub fn new(table: &'t PatternTable, use_labels: bool) -> Self {
        Self { table, use_labels }
    }

    fn labeled(&self, lines: &[String], idx: usize) -> Option<ExtractionMatch<String>> {
        let line = &lines[idx];
        self.table.for_field(BillField::Buyer).find_map(|pattern| {
            let label = pattern.find(line)?;
            let source = MatchSource::Label {
                pattern: pattern.source().to_string(),
                line: idx,
            };

            if let Some(name) = clean_candidate(&line[label.end()..]) {
                return Some(ExtractionMatch::new(name, pattern.confidence, source));
            }

            let next = lines.iter().skip(idx + 1).find(|l| !l.is_empty())?;
            if self.is_metadata(next) {
                return None;
            }
            clean_candidate(next).map(|name| ExtractionMatch::new(name, pattern.confidence, source))
        })
    }

    /// Lines that may hold the buyer when no label is printed.
    fn heuristic_candidates<'a>(
        &'a self,
        lines: &'a [String],
    ) -> impl Iterator<Item = ExtractionMatch<String>> + 'a {
        let boundary = lines
            .iter()
            .position(|l| self.table.has_amount_label(l))
            .unwrap_or(lines.len());

        lines[..boundary]
            .iter()
            .enumerate()
            .filter(|(_, l)| !l.is_empty() && !self.is_metadata(l))
            .filter_map(|(i, l)| {
                clean_candidate(l).map(|name| {
                    ExtractionMatch::new(name, HEURISTIC_CONFIDENCE, MatchSource::Heuristic { line: i })
                })
            })
    }

    fn is_metadata(&self, line: &str) -> bool {
        !line.chars().any(char::is_alphabetic)
            || DOCUMENT_HEADING.is_match(line)
            || METADATA_PREFIX.is_match(line)
            || DATED_PREFIX.is_match(line)
            || INVOICE_NUMBER_LABEL.is_match(line)
            || BILL_NUMBER_LABEL.is_match(line)
            || PHONE.is_match(line)
            || EMAIL.is_match(line)
            || parse_date(line).is_some()
            || self
                .table
                .for_field(BillField::Buyer)
                .any(|p| p.find(line).is_some())
    }
}

impl FieldExtractor for BuyerExtractor<'_> {
    type Output = ExtractionMatch<String>;

    fn extract(&self, lines: &[String]) -> Option<Self::Output> {
        let labeled = if self.use_labels {
            (0..lines.len()).find_map(|idx| self.labeled(lines, idx))
        } else {
            None
        };
        labeled.or_else(|| self.heuristic_candidates(lines).next())
    }

    fn extract_all(&self, lines: &[String]) -> Vec<Self::Output> {
        let mut all = Vec::new();
        if self.use_labels {
            all.extend((0..lines.len()).filter_map(|idx| self.labeled(lines, idx)));
        }
        all.extend(self.heuristic_candidates(lines));
        all
    }
}

/// Cut trailing contact details and surrounding symbols; `None` when no
/// name is left.
fn clean_candidate(text: &str) -> Option<String> {
    let text = match CONTACT_MARKER.find(text) {
        Some(m) => &text[..m.start()],
        None => text,
    };

    let name = text
        .trim_start_matches(|c: char| !c.is_alphanumeric() && c != '(')
        .trim_end_matches(|c: char| !c.is_alphanumeric() && !matches!(c, ')' | '.'));

    if name.chars().any(char::is_alphabetic) {
        Some(name.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(super::super::normalize::normalize_line).collect()
    }

    fn buyer(text: &str) -> Option<ExtractionMatch<String>> {
        let table = PatternTable::builtin();
        BuyerExtractor::new(&table, true).extract(&lines(text))
    }

    #[test]
    fn test_label_with_name_on_next_line() {
        let m = buyer("Tax Invoice\nBuyer (Bill to)\nSHREE GANESH TRADERS\nCGST 10").unwrap();
        assert_eq!(m.value, "SHREE GANESH TRADERS");
        assert_eq!(m.source.line(), Some(1));
        assert!(m.confidence >= 0.9);
    }

    #[test]
    fn test_label_with_name_on_same_line() {
        let m = buyer("Buyer: Patel Stores, Contact 9876543210").unwrap();
        assert_eq!(m.value, "Patel Stores");
    }

    #[test]
    fn test_contact_marker_cut() {
        let m = buyer("Bill to: Om Sai Agencies Mobile 98250 12345").unwrap();
        assert_eq!(m.value, "Om Sai Agencies");
    }

    #[test]
    fn test_heuristic_skips_metadata() {
        let text = "TAX INVOICE\nInvoice No. 123\nDated 14-Oct-25\nGSTIN: 24AAACR5055K1Z5\n** Mehta & Sons (P) Ltd. **\nTaxable Value 100.00";
        let m = buyer(text).unwrap();
        assert_eq!(m.value, "Mehta & Sons (P) Ltd.");
        assert_eq!(m.source, MatchSource::Heuristic { line: 4 });
        assert_eq!(m.confidence, HEURISTIC_CONFIDENCE);
    }

    #[test]
    fn test_heuristic_keeps_names_that_look_like_labels() {
        let m = buyer("TAX INVOICE\nDated\nUp-to-Date Stores\nTaxable Value 100.00").unwrap();
        assert_eq!(m.value, "Up-to-Date Stores");
        assert_eq!(m.source, MatchSource::Heuristic { line: 2 });

        let m = buyer("TAX INVOICE\nPAN: ABCDE1234F\nPh. 98250 12345\nPan India Traders\nTaxable Value 100.00")
            .unwrap();
        assert_eq!(m.value, "Pan India Traders");
        assert_eq!(m.source, MatchSource::Heuristic { line: 3 });
    }

    #[test]
    fn test_heuristic_stops_at_amounts_block() {
        assert!(buyer("14/10/2025\nCGST 10.00\nSome Name").is_none());
    }

    #[test]
    fn test_labels_can_be_disabled() {
        let table = PatternTable::builtin();
        let extractor = BuyerExtractor::new(&table, false);
        let m = extractor
            .extract(&lines("Seller Name\nBuyer (Bill to)\nOther Name\nCGST 10"))
            .unwrap();
        assert_eq!(m.value, "Seller Name");
    }

    #[test]
    fn test_symbols_only_is_absent() {
        assert!(buyer("*** --- ***\n12345").is_none());
        assert!(buyer("").is_none());
    }
}
