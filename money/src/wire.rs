//! Monetary wire shapes and the one-time migration into [`Money`].
//!
//! DESIGN
//! ======
//! A payload may carry any subset of four amount fields. They are resolved
//! in a fixed order and the result is canonical:
//!
//! 1. `value100` (hundredths of the major unit, oldest format) becomes the
//!    canonical amount when neither `value100p` nor `raw` is present. It is
//!    never written back out.
//! 2. `raw` (the literal text a user typed) is re-parsed and wins over every
//!    numeric field. Unparseable text is kept with an error marker.
//! 3. `value100p` (canonical subunits) is used as-is.
//! 4. `value` (major units, number or numeric string) is scaled.
//! 5. Otherwise the amount is unset and reads as zero.
//!
//! TRADE-OFFS
//! ==========
//! Step 2 lets typed text silently replace a numerically set amount. That
//! is the behaviour existing data depends on, so it is preserved, but every
//! override of a different canonical amount is recorded in the
//! [`MigrationReport`] and logged at `warn`.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::parse::{NumberInput, parse_number};
use crate::{Amount, Money, MoneyError, scaled_to_subunits, subunits_from_major};

#[cfg(test)]
#[path = "wire_test.rs"]
mod wire_test;

/// Type tags that mark an object as monetary regardless of its fields.
const MONEY_TYPE_TAGS: [&str; 2] = ["Money", "MonetaryAmount"];

/// A monetary payload as it appears on the wire, old formats included.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WireMoney {
    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    pub type_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Major units. Older backends send a numeric string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<WireNumber>,
    /// Hundredths of the major unit. Read once, never written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value100: Option<Number>,
    /// Canonical subunits (1/10000 of the major unit).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value100p: Option<Number>,
    /// Literal text, kept as an audit trail and for partial input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A number that may arrive as a JSON number or a numeric string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireNumber {
    Number(Number),
    Text(String),
}

impl WireMoney {
    /// Render as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        // Every field is a string or a finite number, so this cannot fail.
        serde_json::to_value(self).unwrap_or_default()
    }
}

impl From<Money> for WireMoney {
    fn from(money: Money) -> Self {
        let (value, value100p) = match money.amount() {
            Amount::Parsed { subunits, .. } => (
                Some(WireNumber::Number(major_number(money.value()))),
                Some(Number::from(*subunits)),
            ),
            Amount::Unset | Amount::RawText(_) => (None, None),
        };
        Self {
            type_tag: Some(MONEY_TYPE_TAGS[0].to_owned()),
            currency: money.currency().map(str::to_owned),
            name: money.name().map(str::to_owned),
            value,
            value100: None,
            value100p,
            raw: money.raw().map(str::to_owned),
            error: money.error(),
        }
    }
}

/// One decision taken while migrating a payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Migration {
    /// A `value100` field was consumed. `applied` is false when a newer
    /// field took precedence and the legacy amount was only discarded.
    LegacyHundredths { hundredths: f64, applied: bool },
    /// An empty `raw` string was dropped.
    EmptyRawDropped,
    /// `raw` was re-parsed and agreed with (or stood in for) the canonical amount.
    RawReparsed { subunits: i64 },
    /// `raw` was re-parsed and replaced a different canonical amount.
    RawOverrodeCanonical { previous: i64, subunits: i64 },
    /// `raw` (or a string `value`) could not be parsed.
    RawUnparseable { raw: String },
    /// The canonical amount was derived from the major-unit `value`.
    MajorValueDerived { subunits: i64 },
}

/// Every decision [`migrate`] took, in order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MigrationReport {
    pub steps: Vec<Migration>,
}

impl MigrationReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// True when the payload carried a legacy field or a raw override, i.e.
    /// writing the canonical shape back changes the stored data.
    #[must_use]
    pub fn changed_canonical(&self) -> bool {
        self.steps.iter().any(|step| {
            matches!(
                step,
                Migration::LegacyHundredths { .. }
                    | Migration::EmptyRawDropped
                    | Migration::RawOverrodeCanonical { .. }
                    | Migration::MajorValueDerived { .. }
            )
        })
    }

    fn push(&mut self, step: Migration) {
        self.steps.push(step);
    }
}

/// Fold a wire payload into canonical [`Money`]. Pure: the input is consumed
/// and the legacy fields have no counterpart in the result.
#[must_use]
pub fn migrate(wire: WireMoney) -> (Money, MigrationReport) {
    let mut report = MigrationReport::default();
    let WireMoney {
        currency,
        name,
        value,
        value100,
        value100p,
        raw,
        ..
    } = wire;

    let raw = match raw {
        Some(text) if text.trim().is_empty() => {
            report.push(Migration::EmptyRawDropped);
            None
        }
        other => other,
    };

    let mut canonical = value100p
        .as_ref()
        .and_then(Number::as_f64)
        .and_then(|v| scaled_to_subunits(v).ok());

    if let Some(hundredths) = value100.as_ref().and_then(Number::as_f64) {
        let applied = canonical.is_none() && raw.is_none();
        if applied {
            canonical = scaled_to_subunits(hundredths * 100.0).ok();
        }
        tracing::info!(hundredths, applied, "migrated legacy value100 field");
        report.push(Migration::LegacyHundredths { hundredths, applied });
    }

    let amount = if let Some(raw) = raw {
        reparse_raw(raw, canonical, &mut report)
    } else if let Some(subunits) = canonical {
        Amount::Parsed { subunits, raw: None }
    } else if let Some(value) = value {
        amount_from_major(value, &mut report)
    } else {
        Amount::Unset
    };

    (Money::from_parts(currency, amount, name), report)
}

fn reparse_raw(raw: String, canonical: Option<i64>, report: &mut MigrationReport) -> Amount {
    let parsed = match parse_number(&raw) {
        NumberInput::Number(v) => subunits_from_major(v).ok(),
        NumberInput::Blank | NumberInput::Invalid => None,
    };
    let Some(subunits) = parsed else {
        tracing::debug!(%raw, "raw monetary text is not a number");
        report.push(Migration::RawUnparseable { raw: raw.clone() });
        return Amount::RawText(raw);
    };
    match canonical {
        Some(previous) if previous != subunits => {
            tracing::warn!(previous, subunits, %raw, "raw text overrides canonical monetary amount");
            report.push(Migration::RawOverrodeCanonical { previous, subunits });
        }
        _ => report.push(Migration::RawReparsed { subunits }),
    }
    Amount::Parsed {
        subunits,
        raw: Some(raw),
    }
}

fn amount_from_major(value: WireNumber, report: &mut MigrationReport) -> Amount {
    let major = match value {
        WireNumber::Number(n) => n.as_f64(),
        WireNumber::Text(text) => match parse_number(&text) {
            NumberInput::Blank => return Amount::Unset,
            NumberInput::Number(v) => Some(v),
            NumberInput::Invalid => {
                report.push(Migration::RawUnparseable { raw: text.clone() });
                return Amount::RawText(text);
            }
        },
    };
    match major.map(subunits_from_major) {
        Some(Ok(subunits)) => {
            report.push(Migration::MajorValueDerived { subunits });
            Amount::Parsed { subunits, raw: None }
        }
        _ => Amount::Unset,
    }
}

/// Whether a JSON value has one of the known monetary shapes.
#[must_use]
pub fn is_money_like(value: &Value) -> bool {
    let Some(map) = value.as_object() else {
        return false;
    };
    if map
        .get("@type")
        .and_then(Value::as_str)
        .is_some_and(|tag| MONEY_TYPE_TAGS.contains(&tag))
    {
        return true;
    }
    if map.get("value100p").is_some_and(Value::is_number) || map.get("value100").is_some_and(Value::is_number) {
        return true;
    }
    let numeric_value = match map.get("value") {
        Some(Value::Number(_)) => true,
        Some(Value::String(s)) => !matches!(parse_number(s), NumberInput::Invalid),
        _ => false,
    };
    numeric_value
        || map.get("raw").is_some_and(Value::is_string)
        || map
            .get("currency")
            .and_then(Value::as_str)
            .is_some_and(|c| !c.is_empty())
}

/// Coerce a stored value into [`Money`]: numbers are major units, strings
/// are typed text, objects are wire payloads, null is unset.
///
/// # Errors
///
/// Returns `NotMonetary` for other shapes and `InvalidWire` when a monetary
/// object has fields of the wrong type.
pub fn ingest(value: &Value) -> Result<Money, MoneyError> {
    ingest_with_report(value).map(|(money, _)| money)
}

/// [`ingest`], also returning the migration decisions taken.
///
/// # Errors
///
/// See [`ingest`].
pub fn ingest_with_report(value: &Value) -> Result<(Money, MigrationReport), MoneyError> {
    match value {
        Value::Null => Ok((Money::zero(), MigrationReport::default())),
        Value::Number(n) => {
            let major = n.as_f64().ok_or_else(|| MoneyError::NotMonetary(n.to_string()))?;
            Ok((Money::from_major(major)?, MigrationReport::default()))
        }
        Value::String(text) => Ok((Money::from_text(text), MigrationReport::default())),
        Value::Object(_) if is_money_like(value) => {
            let wire: WireMoney = serde_json::from_value(value.clone())?;
            Ok(migrate(wire))
        }
        other => Err(MoneyError::NotMonetary(preview(other))),
    }
}

fn major_number(value: f64) -> Number {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        #[allow(clippy::cast_possible_truncation)]
        return Number::from(value as i64);
    }
    Number::from_f64(value).unwrap_or_else(|| Number::from(0))
}

fn preview(value: &Value) -> String {
    let mut text = value.to_string();
    if text.len() > 80 {
        let cut = (0..=80).rev().find(|i| text.is_char_boundary(*i)).unwrap_or(0);
        text.truncate(cut);
        text.push_str("...");
    }
    text
}
