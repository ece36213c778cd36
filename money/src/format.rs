//! Display helpers: currency glyphs and locale-aware amount strings.
//!
//! The glyph table is for display only. Parsing strips glyphs generically
//! (see [`crate::parse`]) and never looks codes up here.

use std::str::FromStr;

use crate::{Money, MoneyError};

#[cfg(test)]
#[path = "format_test.rs"]
mod format_test;

/// Currency code to everyday symbol.
pub const CURRENCY: [(&str, &str); 4] = [("GBP", "£"), ("USD", "$"), ("AUD", "A$"), ("EUR", "\u{20AC}")];

/// ISO 3166 two-letter country code to currency code. `UK` is not an ISO
/// code but shows up in real data.
pub const CURRENCY_FOR_COUNTRY: [(&str, &str); 4] = [("GB", "GBP"), ("UK", "GBP"), ("US", "USD"), ("AU", "AUD")];

#[must_use]
pub fn currency_symbol(code: &str) -> Option<&'static str> {
    CURRENCY
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, symbol)| *symbol)
}

#[must_use]
pub fn currency_for_country(country: &str) -> Option<&'static str> {
    CURRENCY_FOR_COUNTRY
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(country))
        .map(|(_, code)| *code)
}

/// Number formatting conventions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    EnGb,
    EnUs,
    DeDe,
    FrFr,
}

impl Locale {
    /// `(grouping separator, decimal separator)`.
    #[must_use]
    pub fn separators(self) -> (&'static str, char) {
        match self {
            Self::EnGb | Self::EnUs => (",", '.'),
            Self::DeDe => (".", ','),
            Self::FrFr => ("\u{202F}", ','),
        }
    }

    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::EnGb => "en-GB",
            Self::EnUs => "en-US",
            Self::DeDe => "de-DE",
            Self::FrFr => "fr-FR",
        }
    }
}

impl FromStr for Locale {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().replace('_', "-").to_ascii_lowercase().as_str() {
            "en-gb" | "en" => Ok(Self::EnGb),
            "en-us" => Ok(Self::EnUs),
            "de-de" | "de" => Ok(Self::DeDe),
            "fr-fr" | "fr" => Ok(Self::FrFr),
            _ => Err(MoneyError::UnknownLocale(s.to_owned())),
        }
    }
}

/// Options for [`pretty_string`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrettyOptions {
    pub locale: Locale,
    /// When set, trailing `.0`/`.00` are kept down to this many digits.
    pub min_fraction_digits: Option<u8>,
    pub max_fraction_digits: u8,
    /// Takes precedence over the fraction-digit limits when set.
    pub max_significant_digits: Option<u8>,
}

impl Default for PrettyOptions {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            min_fraction_digits: None,
            max_fraction_digits: 2,
            max_significant_digits: None,
        }
    }
}

/// Render a monetary amount, e.g. `29049` as `29,049` and `12.5` as `12.50`.
#[must_use]
pub fn pretty_string(amount: &Money, options: &PrettyOptions) -> String {
    pretty_major(amount.value(), options)
}

/// [`pretty_string`] for a bare major-unit value.
#[must_use]
pub fn pretty_major(value: f64, options: &PrettyOptions) -> String {
    let mut value = if value.is_finite() { value } else { 0.0 };
    if options.max_fraction_digits == 0 {
        value = value.round();
    }

    let plain = match options.max_significant_digits {
        Some(digits) => significant(value, digits.max(1)),
        None => {
            let min = options.min_fraction_digits.unwrap_or(0);
            let max = options.max_fraction_digits.max(min);
            trim_fraction(&format!("{:.*}", usize::from(max), value), usize::from(min))
        }
    };

    let (negative, digits) = match plain.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, plain.as_str()),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
    let (group_sep, decimal_sep) = options.locale.separators();

    let mut out = String::new();
    let is_zero = int_part.chars().chain(frac_part.chars()).all(|c| c == '0');
    if negative && !is_zero {
        out.push('-');
    }
    out.push_str(&group_digits(int_part, group_sep));
    if !frac_part.is_empty() {
        out.push(decimal_sep);
        out.push_str(frac_part);
        // pad .1 to .10
        if frac_part.len() == 1 {
            out.push('0');
        }
    }
    out
}

/// Drop trailing zeros from the fraction, keeping at least `min` digits.
fn trim_fraction(plain: &str, min: usize) -> String {
    let Some((int_part, frac_part)) = plain.split_once('.') else {
        return plain.to_owned();
    };
    let mut frac = frac_part.trim_end_matches('0').to_owned();
    while frac.len() < min {
        frac.push('0');
    }
    if frac.is_empty() {
        int_part.to_owned()
    } else {
        format!("{int_part}.{frac}")
    }
}

#[allow(clippy::cast_possible_truncation)]
fn significant(value: f64, digits: u8) -> String {
    if value == 0.0 {
        return "0".to_owned();
    }
    let magnitude = value.abs().log10().floor() as i32;
    let decimals = i32::from(digits) - 1 - magnitude;
    if decimals >= 0 {
        let decimals = usize::try_from(decimals).unwrap_or(0);
        trim_fraction(&format!("{value:.decimals$}"), 0)
    } else {
        let factor = 10f64.powi(-decimals);
        format!("{:.0}", (value / factor).round() * factor)
    }
}

fn group_digits(int_part: &str, separator: &str) -> String {
    let len = int_part.len();
    let mut out = String::with_capacity(len + len / 3 * separator.len());
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(ch);
    }
    out
}
