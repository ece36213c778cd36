//! Canonical monetary amounts.
//!
//! DESIGN
//! ======
//! An amount is held as an integer count of 1/10000ths of the major currency
//! unit (`£1 == 10_000`), so repeated arithmetic never drifts. Payloads from
//! older backends carry several overlapping fields (`value100`, `value100p`,
//! `value`, `raw`); they are folded into [`Money`] exactly once by
//! [`wire::migrate`] at ingestion and the superseded fields are never
//! written back out.
//!
//! Arithmetic lives in [`ops`] and always returns a fresh value. Two amounts
//! may only be combined when their currencies agree, or when one side has no
//! currency at all, in which case the set currency wins.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod error;
pub mod format;
pub mod ops;
pub mod parse;
pub mod wire;

pub use error::MoneyError;
pub use format::{
    CURRENCY, CURRENCY_FOR_COUNTRY, Locale, PrettyOptions, currency_for_country, currency_symbol, pretty_major, pretty_string,
};
pub use ops::{add, compare, divide, mul, same_amount, sub, sum, total};
pub use parse::{NumberInput, as_num, parse_number};
pub use wire::{Migration, MigrationReport, WireMoney, ingest, ingest_with_report, is_money_like, migrate};

/// Subunits per major currency unit.
pub const SUBUNITS_PER_MAJOR: i64 = 10_000;

/// Where an amount currently stands.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Amount {
    /// Nothing entered. Reads as zero.
    #[default]
    Unset,
    /// Text that could not be read as a number. Kept verbatim so the user's
    /// input is not lost; reads as zero and carries an error marker.
    RawText(String),
    /// A canonical amount, optionally with the text it was parsed from.
    Parsed { subunits: i64, raw: Option<String> },
}

/// A currency amount, e.g. `Money::from_major(10.0)?.with_currency("GBP")` is £10.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireMoney", into = "WireMoney")]
pub struct Money {
    currency: Option<String>,
    amount: Amount,
    name: Option<String>,
    /// Transient explanation text; never serialized.
    explain: Option<String>,
}

impl Money {
    /// An unset amount with no currency.
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_subunits(subunits: i64) -> Self {
        Self {
            amount: Amount::Parsed { subunits, raw: None },
            ..Self::default()
        }
    }

    /// Build from a major-unit value, e.g. `12.5` for £12.50.
    ///
    /// # Errors
    ///
    /// Returns `NonFinite` for NaN/infinite input and `Overflow` when the
    /// scaled amount does not fit the subunit range.
    pub fn from_major(value: f64) -> Result<Self, MoneyError> {
        Ok(Self::from_subunits(subunits_from_major(value)?))
    }

    /// Build from typed text such as `"£1,234.50"`. A leading `$`/`£` sets the
    /// currency. Unparseable text is kept as [`Amount::RawText`].
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self {
            currency: parse::currency_from_glyph(text).map(str::to_owned),
            amount: amount_from_text(text),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_currency(mut self, code: impl Into<String>) -> Self {
        self.currency = non_empty(Some(code.into()));
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub(crate) fn with_currency_opt(mut self, code: Option<String>) -> Self {
        self.currency = non_empty(code);
        self
    }

    pub(crate) fn from_parts(currency: Option<String>, amount: Amount, name: Option<String>) -> Self {
        Self {
            currency: non_empty(currency),
            amount,
            name,
            explain: None,
        }
    }

    #[must_use]
    pub fn currency(&self) -> Option<&str> {
        self.currency.as_deref()
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn amount(&self) -> &Amount {
        &self.amount
    }

    /// Canonical amount in 1/10000ths of the major unit. Zero when unset or
    /// unparseable.
    #[must_use]
    pub fn subunits(&self) -> i64 {
        match &self.amount {
            Amount::Parsed { subunits, .. } => *subunits,
            Amount::Unset | Amount::RawText(_) => 0,
        }
    }

    /// Major-unit value, e.g. `12.5` for £12.50.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn value(&self) -> f64 {
        self.subunits() as f64 / SUBUNITS_PER_MAJOR as f64
    }

    /// The literal text this amount came from, if any.
    #[must_use]
    pub fn raw(&self) -> Option<&str> {
        match &self.amount {
            Amount::RawText(raw) => Some(raw),
            Amount::Parsed { raw, .. } => raw.as_deref(),
            Amount::Unset => None,
        }
    }

    /// Error marker for text that could not be parsed.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        match &self.amount {
            Amount::RawText(raw) => Some(format!("Cannot parse: {raw}")),
            Amount::Unset | Amount::Parsed { .. } => None,
        }
    }

    /// True once a canonical amount is set, including zero.
    #[must_use]
    pub fn has_value(&self) -> bool {
        matches!(self.amount, Amount::Parsed { .. })
    }

    /// Replace the amount with a major-unit value, dropping any raw text so it
    /// cannot override the new value on the next ingestion. `None` unsets.
    ///
    /// # Errors
    ///
    /// Same as [`Money::from_major`].
    pub fn set_value(&mut self, value: Option<f64>) -> Result<(), MoneyError> {
        self.amount = match value {
            Some(v) => Amount::Parsed {
                subunits: subunits_from_major(v)?,
                raw: None,
            },
            None => Amount::Unset,
        };
        Ok(())
    }

    /// A copy of this amount re-read from freshly typed text, keeping currency
    /// and name. The typed text is retained so partial input survives.
    #[must_use]
    pub fn with_text(&self, text: &str) -> Self {
        let currency = self
            .currency
            .clone()
            .or_else(|| parse::currency_from_glyph(text).map(str::to_owned));
        Self {
            currency,
            amount: amount_from_text(text),
            name: self.name.clone(),
            explain: self.explain.clone(),
        }
    }

    /// Text to show in an input box: the raw text when present, so users can
    /// type incomplete answers, else the major value.
    #[must_use]
    pub fn input_text(&self) -> String {
        match &self.amount {
            Amount::Unset => String::new(),
            Amount::RawText(raw) | Amount::Parsed { raw: Some(raw), .. } => raw.clone(),
            Amount::Parsed { raw: None, .. } => self.value().to_string(),
        }
    }

    #[must_use]
    pub fn explain(&self) -> Option<&str> {
        self.explain.as_deref()
    }

    pub fn set_explain(&mut self, text: impl Into<String>) {
        self.explain = Some(text.into());
    }

    /// Display glyph for this amount's currency, e.g. `£`.
    #[must_use]
    pub fn symbol(&self) -> Option<&'static str> {
        self.currency.as_deref().and_then(currency_symbol)
    }

    /// Canonical wire object (`@type`, `currency`, `value`, `value100p`, `raw`).
    #[must_use]
    pub fn to_value(&self) -> Value {
        WireMoney::from(self.clone()).to_json()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.symbol().unwrap_or_default(), self.value())
    }
}

impl FromStr for Money {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_text(s))
    }
}

impl From<WireMoney> for Money {
    fn from(wire: WireMoney) -> Self {
        migrate(wire).0
    }
}

/// Scale a major-unit value to subunits, rounding half away from zero.
pub(crate) fn subunits_from_major(value: f64) -> Result<i64, MoneyError> {
    if !value.is_finite() {
        return Err(MoneyError::NonFinite(value));
    }
    scaled_to_subunits(value * 10_000.0)
}

/// Round an already-scaled float into the subunit range.
pub(crate) fn scaled_to_subunits(scaled: f64) -> Result<i64, MoneyError> {
    if !scaled.is_finite() {
        return Err(MoneyError::NonFinite(scaled));
    }
    let rounded = scaled.round();
    if rounded.abs() >= 9.0e18 {
        return Err(MoneyError::Overflow);
    }
    #[allow(clippy::cast_possible_truncation)]
    Ok(rounded as i64)
}

fn amount_from_text(text: &str) -> Amount {
    match parse_number(text) {
        NumberInput::Blank => Amount::Unset,
        NumberInput::Number(v) => match subunits_from_major(v) {
            Ok(subunits) => Amount::Parsed {
                subunits,
                raw: Some(text.to_owned()),
            },
            Err(_) => Amount::RawText(text.to_owned()),
        },
        NumberInput::Invalid => Amount::RawText(text.to_owned()),
    }
}

fn non_empty(code: Option<String>) -> Option<String> {
    code.filter(|c| !c.trim().is_empty())
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
