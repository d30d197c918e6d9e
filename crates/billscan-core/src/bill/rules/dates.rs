//! Bill date extraction. Indian bills print the day first.

use chrono::NaiveDate;

use super::patterns::{DATE_ISO, DATE_NUMERIC, DATE_TEXT_MONTH, DATED_LABEL};
use super::{ExtractionMatch, FieldExtractor, MatchSource};

/// Unlabeled date extractor.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<NaiveDate>;

    fn extract(&self, lines: &[String]) -> Option<Self::Output> {
        lines.iter().enumerate().find_map(|(i, l)| heuristic_match(i, l))
    }

    fn extract_all(&self, lines: &[String]) -> Vec<Self::Output> {
        lines
            .iter()
            .enumerate()
            .filter_map(|(i, l)| heuristic_match(i, l))
            .collect()
    }
}

fn heuristic_match(line: usize, text: &str) -> Option<ExtractionMatch<NaiveDate>> {
    parse_date(text).map(|d| ExtractionMatch::new(d, 0.7, MatchSource::Heuristic { line }))
}

/// Earliest valid date in `text`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text_month = DATE_TEXT_MONTH.captures_iter(text).find_map(|c| {
        let day: u32 = c[1].parse().ok()?;
        let month = month_abbr_to_number(&c[2])?;
        let year = expand_year(c[3].parse().ok()?);
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        Some((c.get(0)?.start(), date))
    });

    let numeric = DATE_NUMERIC.captures_iter(text).find_map(|c| {
        let day: u32 = c[1].parse().ok()?;
        let month: u32 = c[2].parse().ok()?;
        let year = expand_year(c[3].parse().ok()?);
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        Some((c.get(0)?.start(), date))
    });

    let iso = DATE_ISO.captures_iter(text).find_map(|c| {
        let year: i32 = c[1].parse().ok()?;
        let month: u32 = c[2].parse().ok()?;
        let day: u32 = c[3].parse().ok()?;
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        Some((c.get(0)?.start(), date))
    });

    [text_month, numeric, iso]
        .into_iter()
        .flatten()
        .min_by_key(|(start, _)| *start)
        .map(|(_, date)| date)
}

/// Find the bill date: a date after "Dated"/"Date" (same line or the next
/// non-blank one), else the first date anywhere.
pub fn extract_bill_date(lines: &[String]) -> Option<ExtractionMatch<NaiveDate>> {
    labeled_date(lines).or_else(|| DateExtractor::new().extract(lines))
}

fn labeled_date(lines: &[String]) -> Option<ExtractionMatch<NaiveDate>> {
    lines.iter().enumerate().find_map(|(idx, line)| {
        let label = DATED_LABEL.find(line)?;
        let source = MatchSource::Label {
            pattern: DATED_LABEL.as_str().to_string(),
            line: idx,
        };

        if let Some(date) = parse_date(&line[label.end()..]) {
            return Some(ExtractionMatch::new(date, 0.95, source));
        }

        let next = lines.iter().skip(idx + 1).find(|l| !l.is_empty())?;
        parse_date(next).map(|date| ExtractionMatch::new(date, 0.9, source))
    })
}

fn expand_year(year: i32) -> i32 {
    if year < 100 { 2000 + year } else { year }
}

fn month_abbr_to_number(name: &str) -> Option<u32> {
    match name.to_lowercase().as_str() {
        "jan" => Some(1),
        "feb" => Some(2),
        "mar" => Some(3),
        "apr" => Some(4),
        "may" => Some(5),
        "jun" => Some(6),
        "jul" => Some(7),
        "aug" => Some(8),
        "sep" => Some(9),
        "oct" => Some(10),
        "nov" => Some(11),
        "dec" => Some(12),
        _ => None,
    }
}
