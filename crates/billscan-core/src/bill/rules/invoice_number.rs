//! Invoice number extraction.

use regex::Regex;

use super::dates::parse_date;
use super::patterns::{BILL_NUMBER_LABEL, INVOICE_NUMBER_LABEL, REFERENCE_TOKEN};
use super::{ExtractionMatch, MatchSource};

/// Find the invoice number.
///
/// "Invoice No." labels are tried before "Bill No." labels; e-way bill
/// numbers are ignored. The number is read from the rest of the label line,
/// else from the next non-blank line (Tally prints the label row above the
/// value row).
pub fn extract_invoice_number(lines: &[String]) -> Option<ExtractionMatch<String>> {
    labeled_number(lines, &INVOICE_NUMBER_LABEL, 0.9)
        .or_else(|| labeled_number(lines, &BILL_NUMBER_LABEL, 0.85))
}

fn labeled_number(
    lines: &[String],
    label: &Regex,
    confidence: f32,
) -> Option<ExtractionMatch<String>> {
    lines.iter().enumerate().find_map(|(idx, line)| {
        label
            .find_iter(line)
            .filter(|m| !m.as_str().to_lowercase().contains("way"))
            .find_map(|m| {
                let source = MatchSource::Label {
                    pattern: label.as_str().to_string(),
                    line: idx,
                };

                if let Some(number) = reference_token(&line[m.end()..]) {
                    return Some(ExtractionMatch::new(number, confidence, source));
                }

                let next = lines.iter().skip(idx + 1).find(|l| !l.is_empty())?;
                reference_token(next)
                    .map(|number| ExtractionMatch::new(number, confidence - 0.05, source))
            })
    })
}

/// First token carrying a digit that is not itself a date.
fn reference_token(text: &str) -> Option<String> {
    REFERENCE_TOKEN
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches(['/', '-']))
        .find(|token| token.chars().any(|c| c.is_ascii_digit()) && parse_date(token).is_none())
        .map(str::to_string)
}
