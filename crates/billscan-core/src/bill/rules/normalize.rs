//! Text normalization applied once before any field is looked up.
//!
//! Currency is always INR and the locale is fixed: `,` groups thousands
//! (including lakh grouping) and `.` is the decimal point.

use crate::models::bill::RawText;

use super::patterns::{CURRENCY_MARKER, RUPEE_SUFFIX};

/// Normalize every line of `text`. Line count and order are preserved.
///
/// The result is a fixed point: `normalize(&normalize(t)) == normalize(t)`.
pub fn normalize(text: &RawText) -> RawText {
    RawText::from_lines(text.lines().iter().map(|l| normalize_line(l)))
}

/// Normalize a single line.
pub fn normalize_line(line: &str) -> String {
    let line = strip_currency(line);
    let line = RUPEE_SUFFIX.replace_all(&line, "$1");
    let line = strip_thousands_separators(&line);
    collapse_whitespace(&line)
}

/// Replace currency markers standing on their own with a space.
///
/// `Rs`/`INR` only count when not glued to letters, so names such as
/// "Mrs" or "Hrs" survive.
fn strip_currency(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut last = 0;

    for m in CURRENCY_MARKER.find_iter(line) {
        let is_symbol = m.as_str() == "₹";
        let before = line[..m.start()].chars().next_back();
        let after = line[m.end()..].chars().next();
        let free_standing = !before.is_some_and(char::is_alphabetic)
            && !after.is_some_and(char::is_alphabetic);

        if is_symbol || free_standing {
            out.push_str(&line[last..m.start()]);
            out.push(' ');
            last = m.end();
        }
    }

    out.push_str(&line[last..]);
    out
}

/// Drop every `,` that sits between two digits.
fn strip_thousands_separators(line: &str) -> String {
    let chars: Vec<char> = line.chars().collect();
    let mut out = String::with_capacity(line.len());

    for (i, c) in chars.iter().enumerate() {
        if *c == ',' && i > 0 {
            let prev_digit = chars[i - 1].is_ascii_digit();
            let next_digit = chars.get(i + 1).is_some_and(char::is_ascii_digit);
            if prev_digit && next_digit {
                continue;
            }
        }
        out.push(*c);
    }

    out
}

fn collapse_whitespace(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}
