//! Lenient numeric parsing for user-typed amounts.
//!
//! Thousands separators and a single leading currency glyph are stripped
//! generically; the currency table in [`crate::format`] is never consulted.

#[cfg(test)]
#[path = "parse_test.rs"]
mod parse_test;

/// Glyphs stripped from the front of an amount (after an optional minus sign).
const STRIPPED_GLYPHS: [char; 3] = ['£', '$', '\u{20AC}'];

/// Outcome of reading a number out of free text.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NumberInput {
    /// Empty or whitespace-only input. Means "unset", never zero.
    Blank,
    /// A finite number.
    Number(f64),
    /// Something was typed but it is not a number.
    Invalid,
}

/// Parse free text as a number after stripping `,` separators and a leading
/// `£`/`$`/`€` glyph. `-£5` and `£-5` both read as `-5`; a second sign
/// (`--5`, `-£+5`) is bad input.
#[must_use]
pub fn parse_number(text: &str) -> NumberInput {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return NumberInput::Blank;
    }
    let without_commas: String = trimmed.chars().filter(|c| *c != ',').collect();
    let (negative, rest) = match without_commas.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, without_commas.as_str()),
    };
    let rest = rest
        .strip_prefix(STRIPPED_GLYPHS.as_slice())
        .unwrap_or(rest)
        .trim();
    if negative && rest.starts_with(['-', '+']) {
        return NumberInput::Invalid;
    }
    if rest.is_empty() || !looks_numeric(rest) {
        return NumberInput::Invalid;
    }
    match rest.parse::<f64>() {
        Ok(v) if v.is_finite() => NumberInput::Number(if negative { -v } else { v }),
        _ => NumberInput::Invalid,
    }
}

/// Convenience over [`parse_number`] for callers that do not care why a value
/// is missing.
#[must_use]
pub fn as_num(text: &str) -> Option<f64> {
    match parse_number(text) {
        NumberInput::Number(v) => Some(v),
        NumberInput::Blank | NumberInput::Invalid => None,
    }
}

/// Infer a currency code from the first character of a typed amount.
#[must_use]
pub fn currency_from_glyph(text: &str) -> Option<&'static str> {
    match text.chars().next()? {
        '$' => Some("USD"),
        '£' => Some("GBP"),
        _ => None,
    }
}

/// Rust's float parser also accepts `inf`, `NaN` and friends; only plain
/// decimal notation (with an optional exponent) is allowed here.
fn looks_numeric(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
        && s.chars().any(|c| c.is_ascii_digit())
}
