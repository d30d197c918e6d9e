//! Amount capture after a matched label.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

use crate::models::bill::BillField;
use crate::models::config::{Adjacency, ValuePosition};

use super::patterns::{IMMEDIATE_VALUE, NUMBER};
use super::table::{LabelPattern, PatternTable};
use super::{ExtractionMatch, FieldExtractor, MatchSource};

/// Round to paise, half away from zero (round-half-up for amounts on a bill).
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// First amount on a normalized line, signed.
///
/// Tokens glued to letters (GSTIN fragments, HSN codes such as `27AAB`) and
/// tokens followed by `%` (tax rates) are not amounts. A leading `-` counts
/// as a sign only when it does not join two words or numbers (`14-10-2025`).
pub fn first_amount(text: &str) -> Option<Decimal> {
    amounts(text).next().map(|(_, value)| value)
}

/// The amount that ends a normalized line, if the line ends with one.
///
/// Same token rules as [`first_amount`]; anything but whitespace after the
/// last amount means the line has no trailing value.
pub fn line_end_amount(text: &str) -> Option<Decimal> {
    let (end, value) = amounts(text).last()?;
    text[end..].trim().is_empty().then_some(value)
}

/// Amounts on a line with the byte offset where each one ends.
fn amounts(text: &str) -> impl Iterator<Item = (usize, Decimal)> + '_ {
    NUMBER.find_iter(text).filter_map(move |m| {
        let before = text[..m.start()].chars().next_back();
        if before.is_some_and(|c| c.is_alphanumeric() || c == '.') {
            return None;
        }

        let rest = &text[m.end()..];
        if rest.chars().next().is_some_and(char::is_alphabetic) {
            return None;
        }
        if rest.trim_start().starts_with('%') {
            return None;
        }

        let value = Decimal::from_str(m.as_str()).ok()?;
        let negative = before == Some('-') && {
            let ahead = text[..m.start() - 1].chars().next_back();
            ahead.is_none_or(|c| c.is_whitespace() || matches!(c, ':' | '=' | '('))
        };

        Some((m.end(), if negative { -value } else { value }))
    })
}

/// Parse a free-standing amount string as printed on a bill.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let normalized = super::normalize::normalize_line(s);
    first_amount(&normalized).map(round_currency)
}

/// Value captured for one label occurrence.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Capture {
    pub value: Decimal,
    /// Line the value was read from.
    pub line: usize,
}

/// Read the value belonging to a label that ends at `label_end` on line `idx`.
///
/// Looks at the rest of the label line, then at up to `lookahead` following
/// non-blank lines. With [`ValuePosition::LineEnd`] a label line that carries
/// numbers but does not end with one has no value. Returns the signed value;
/// callers decide what to do with negatives.
pub(crate) fn capture_after(
    lines: &[String],
    idx: usize,
    label_end: usize,
    adjacency: Adjacency,
    position: ValuePosition,
    lookahead: usize,
) -> Option<Capture> {
    let rest = &lines[idx][label_end..];

    if adjacency == Adjacency::Immediate && !IMMEDIATE_VALUE.is_match(rest) {
        return None;
    }

    let read: fn(&str) -> Option<Decimal> = match position {
        ValuePosition::First => first_amount,
        ValuePosition::LineEnd => line_end_amount,
    };

    if first_amount(rest).is_some() {
        return read(rest).map(|value| Capture { value, line: idx });
    }

    lines
        .iter()
        .enumerate()
        .skip(idx + 1)
        .filter(|(_, l)| !l.is_empty())
        .take(lookahead)
        .find_map(|(i, l)| read(l).map(|value| Capture { value, line: i }))
}

/// Labeled amount extractor for one monetary field.
///
/// Works on normalized lines. Lines are visited top to bottom; on each line
/// the field's labels are tried in priority order and the first label that
/// yields a non-negative value wins that line. `extract` returns the first
/// line that produced a value.
pub struct AmountExtractor<'t> {
    field: BillField,
    table: &'t PatternTable,
    lookahead: usize,
}

impl<'t> AmountExtractor<'t> {
    pub fn new(field: BillField, table: &'t PatternTable, lookahead: usize) -> Self {
        Self {
            field,
            table,
            lookahead,
        }
    }

    fn capture_line(&self, lines: &[String], idx: usize) -> Option<ExtractionMatch<Decimal>> {
        let line = &lines[idx];
        self.table.for_field(self.field).find_map(|pattern| {
            let label = pattern.find(line)?;
            let capture = capture_after(
                lines,
                idx,
                label.end(),
                pattern.adjacency,
                pattern.position,
                pattern.lookahead_lines.unwrap_or(self.lookahead),
            )?;
            self.accept(pattern, idx, capture)
        })
    }

    fn accept(
        &self,
        pattern: &LabelPattern,
        label_line: usize,
        capture: Capture,
    ) -> Option<ExtractionMatch<Decimal>> {
        if capture.value.is_sign_negative() && !capture.value.is_zero() {
            debug!(
                field = %self.field,
                value = %capture.value,
                line = label_line,
                "refusing negative capture"
            );
            return None;
        }

        let value = round_currency(capture.value);
        debug!(
            field = %self.field,
            value = %value,
            line = label_line,
            value_line = capture.line,
            pattern = pattern.source(),
            "captured amount"
        );
        Some(ExtractionMatch::new(
            value,
            pattern.confidence,
            MatchSource::Label {
                pattern: pattern.source().to_string(),
                line: label_line,
            },
        ))
    }
}

impl FieldExtractor for AmountExtractor<'_> {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, lines: &[String]) -> Option<Self::Output> {
        (0..lines.len()).find_map(|idx| self.capture_line(lines, idx))
    }

    fn extract_all(&self, lines: &[String]) -> Vec<Self::Output> {
        (0..lines.len())
            .filter_map(|idx| self.capture_line(lines, idx))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(super::super::normalize::normalize_line).collect()
    }

    #[test]
    fn test_first_amount_basic() {
        assert_eq!(first_amount("402.42"), Some(dec("402.42")));
        assert_eq!(first_amount(": 500"), Some(dec("500")));
        assert_eq!(first_amount("no digits"), None);
    }

    #[test]
    fn test_first_amount_skips_rates() {
        assert_eq!(first_amount("@ 9% 402.42"), Some(dec("402.42")));
        assert_eq!(first_amount("2.5 % 359.99"), Some(dec("359.99")));
    }

    #[test]
    fn test_first_amount_skips_codes() {
        assert_eq!(first_amount("27AAACR5055K1Z5 1200.00"), Some(dec("1200.00")));
        assert_eq!(first_amount("HSN9983 10.00"), Some(dec("10.00")));
    }

    #[test]
    fn test_first_amount_sign() {
        assert_eq!(first_amount(" -50.00"), Some(dec("-50.00")));
        assert_eq!(first_amount(":-50.00"), Some(dec("-50.00")));
        assert_eq!(first_amount("14-10-2025"), Some(dec("14")));
        assert_eq!(first_amount("Sub-50"), Some(dec("50")));
    }

    #[test]
    fn test_line_end_amount() {
        assert_eq!(line_end_amount("120 Nos 16991.70"), Some(dec("16991.70")));
        assert_eq!(line_end_amount(" 16991.70 "), Some(dec("16991.70")));
        assert_eq!(line_end_amount("120 Nos"), None);
        assert_eq!(line_end_amount("120 Nos 18 %"), None);
        assert_eq!(line_end_amount("no digits"), None);
    }

    #[test]
    fn test_round_currency_half_up() {
        assert_eq!(round_currency(dec("10.005")), dec("10.01"));
        assert_eq!(round_currency(dec("10.015")), dec("10.02"));
        assert_eq!(round_currency(dec("10.0049")), dec("10.00"));
        assert_eq!(round_currency(dec("7")), dec("7.00"));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("₹ 1,43,999.50"), Some(dec("143999.50")));
        assert_eq!(parse_amount("Rs.15,204.58/-"), Some(dec("15204.58")));
        assert_eq!(parse_amount("abc"), None);
    }

    #[test]
    fn test_capture_same_line() {
        let table = PatternTable::builtin();
        let extractor = AmountExtractor::new(BillField::Cgst, &table, 1);
        let m = extractor.extract(&lines("CGST @ 9% ₹ 402.42")).unwrap();
        assert_eq!(m.value, dec("402.42"));
        assert_eq!(m.source.line(), Some(0));
    }

    #[test]
    fn test_capture_next_non_blank_line() {
        let table = PatternTable::builtin();
        let extractor = AmountExtractor::new(BillField::Cgst, &table, 1);
        let m = extractor.extract(&lines("CGST\n\n\n402.42")).unwrap();
        assert_eq!(m.value, dec("402.42"));
    }

    #[test]
    fn test_lookahead_window_is_bounded() {
        let table = PatternTable::builtin();
        let extractor = AmountExtractor::new(BillField::Cgst, &table, 1);
        assert!(extractor.extract(&lines("CGST\nnine percent\n402.42")).is_none());

        let wider = AmountExtractor::new(BillField::Cgst, &table, 2);
        assert_eq!(
            wider.extract(&lines("CGST\nnine percent\n402.42")).unwrap().value,
            dec("402.42")
        );
    }

    #[test]
    fn test_first_occurrence_in_text_order_wins() {
        let table = PatternTable::builtin();
        let extractor = AmountExtractor::new(BillField::Cgst, &table, 1);
        let text = lines("CGST 100.00\nSomething\nCGST @ 9% 900.00");
        assert_eq!(extractor.extract(&text).unwrap().value, dec("100.00"));
        assert_eq!(extractor.extract_all(&text).len(), 2);
    }

    #[test]
    fn test_first_occurrence_wins_when_it_is_larger() {
        let table = PatternTable::builtin();
        let extractor = AmountExtractor::new(BillField::Cgst, &table, 1);
        let m = extractor.extract(&lines("CGST 999.99\nItems\nCGST 402.42")).unwrap();
        assert_eq!(m.value, dec("999.99"));
        assert_eq!(m.source.line(), Some(0));
    }

    #[test]
    fn test_at_sign_without_rate_is_not_consumed() {
        let table = PatternTable::builtin();
        let text = lines("CGST @ 402.42\nSGST @ 9% 400.00");
        let cgst = AmountExtractor::new(BillField::Cgst, &table, 1);
        let sgst = AmountExtractor::new(BillField::Sgst, &table, 1);
        assert_eq!(cgst.extract(&text).unwrap().value, dec("402.42"));
        assert_eq!(sgst.extract(&text).unwrap().value, dec("400.00"));
    }

    #[test]
    fn test_negative_capture_refused() {
        let table = PatternTable::builtin();
        let extractor = AmountExtractor::new(BillField::Cgst, &table, 1);
        assert!(extractor.extract(&lines("CGST -50.00")).is_none());
    }

    #[test]
    fn test_negative_capture_does_not_block_later_occurrence() {
        let table = PatternTable::builtin();
        let extractor = AmountExtractor::new(BillField::Cgst, &table, 1);
        let m = extractor.extract(&lines("CGST -50.00\nCGST 50.00")).unwrap();
        assert_eq!(m.value, dec("50.00"));
        assert_eq!(m.source.line(), Some(1));
    }

    #[test]
    fn test_immediate_total_rejects_qualified_labels() {
        let table = PatternTable::builtin();
        let extractor = AmountExtractor::new(BillField::GrandTotal, &table, 1);
        assert!(extractor.extract(&lines("Total before tax 100.00")).is_none());
        assert!(extractor.extract(&lines("Total Tax Amount 18.00")).is_none());
        assert_eq!(
            extractor.extract(&lines("Total: ₹ 118.00")).unwrap().value,
            dec("118.00")
        );
        assert_eq!(
            extractor.extract(&lines("Total\n118.00")).unwrap().value,
            dec("118.00")
        );
    }

    #[test]
    fn test_generic_total_skips_quantity_column() {
        let table = PatternTable::builtin();
        let extractor = AmountExtractor::new(BillField::GrandTotal, &table, 1);
        let text = lines(
            "Total 120 Nos ₹ 16,991.70\nAmount Chargeable (in words)\nINR Sixteen Thousand Nine Hundred Ninety One and Seventy paise Only",
        );
        let m = extractor.extract(&text).unwrap();
        assert_eq!(m.value, dec("16991.70"));
        assert_eq!(m.source.line(), Some(0));
    }

    #[test]
    fn test_generic_total_without_trailing_amount_is_refused() {
        let table = PatternTable::builtin();
        let extractor = AmountExtractor::new(BillField::GrandTotal, &table, 1);
        assert!(extractor.extract(&lines("Total 120 Nos\n16,991.70")).is_none());
    }

    #[test]
    fn test_zero_is_a_value() {
        let table = PatternTable::builtin();
        let extractor = AmountExtractor::new(BillField::Cgst, &table, 1);
        assert_eq!(extractor.extract(&lines("CGST 0.00")).unwrap().value, Decimal::ZERO);
    }
}
