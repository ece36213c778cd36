//! The `Money` control: a monetary amount edited as text.
//!
//! The stored value is the canonical money object. Typed text is kept inside
//! it as `raw`, so a half-typed amount survives without a separate shadow
//! entry. Writes must force a store notification because the object is
//! replaced with an equal-looking one while typing.

use std::sync::Arc;

use money::{MigrationReport, Money, MoneyError};
use serde_json::Value;

use crate::control::{ControlKind, DefaultCheck, ParseContext, Parsed, RawInput, Registry};

#[cfg(test)]
#[path = "money_control_test.rs"]
mod money_control_test;

pub(crate) fn register(registry: &mut Registry) {
    registry.register(ControlKind::Money.descriptor());
}

/// Re-read the current amount from freshly typed text. Currency and name
/// carry over; a brand-new amount takes the configured default currency.
#[must_use]
pub fn parse_money(raw: &RawInput, cx: &ParseContext<'_>) -> Parsed {
    let current = match cx.current {
        None | Some(Value::Null) => Money::zero(),
        Some(value) => money::ingest(value).unwrap_or_else(|err| {
            tracing::debug!(%err, "stored money value unreadable; starting fresh");
            Money::zero()
        }),
    };
    let mut edited = current.with_text(&raw.literal());
    if edited.currency().is_none() {
        if let Some(code) = cx.default_currency {
            edited = edited.with_currency(code);
        }
    }
    Parsed::Value(edited.to_value())
}

/// Surfaces the error marker of an amount whose text did not parse.
pub(crate) fn check() -> DefaultCheck {
    DefaultCheck::Custom(Arc::new(|value: Option<&Value>, _raw: Option<&str>| {
        value
            .and_then(|v| v.get("error"))
            .and_then(Value::as_str)
            .map(str::to_owned)
    }))
}

/// Fold a stored monetary value into canonical form.
///
/// # Errors
///
/// Whatever [`money::ingest_with_report`] rejects.
pub fn canonicalize(value: &Value) -> Result<(Value, MigrationReport), MoneyError> {
    let (money, report) = money::ingest_with_report(value)?;
    Ok((money.to_value(), report))
}
