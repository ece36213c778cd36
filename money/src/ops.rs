//! Currency-safe arithmetic. Every operation returns a fresh value; inputs
//! are never mutated.

use std::cmp::Ordering;

use serde_json::Value;

use crate::wire::ingest;
use crate::{Money, MoneyError, scaled_to_subunits};

#[cfg(test)]
#[path = "ops_test.rs"]
mod ops_test;

/// `a + b`. The result takes whichever currency is set.
///
/// # Errors
///
/// `CurrencyMismatch` when both sides carry different currencies.
pub fn add(a: &Money, b: &Money) -> Result<Money, MoneyError> {
    let currency = merged_currency(a, b, "add")?;
    let subunits = a
        .subunits()
        .checked_add(b.subunits())
        .ok_or(MoneyError::Overflow)?;
    Ok(Money::from_subunits(subunits).with_currency_opt(currency))
}

/// `a - b`.
///
/// # Errors
///
/// `CurrencyMismatch` when both sides carry different currencies.
pub fn sub(a: &Money, b: &Money) -> Result<Money, MoneyError> {
    let currency = merged_currency(a, b, "sub")?;
    let subunits = a
        .subunits()
        .checked_sub(b.subunits())
        .ok_or(MoneyError::Overflow)?;
    Ok(Money::from_subunits(subunits).with_currency_opt(currency))
}

/// `amount * multiplier`, rounded back to whole subunits.
///
/// # Errors
///
/// `NonFinite` for a NaN/infinite multiplier, `Overflow` when the product
/// leaves the subunit range.
#[allow(clippy::cast_precision_loss)]
pub fn mul(amount: &Money, multiplier: f64) -> Result<Money, MoneyError> {
    if !multiplier.is_finite() {
        return Err(MoneyError::NonFinite(multiplier));
    }
    let subunits = scaled_to_subunits(amount.subunits() as f64 * multiplier)?;
    Ok(Money::from_subunits(subunits).with_currency_opt(amount.currency().map(str::to_owned)))
}

/// `total / part` as a plain ratio.
///
/// # Errors
///
/// `CurrencyMismatch` on differing currencies, `ZeroDivisor` when `part` is zero.
#[allow(clippy::cast_precision_loss)]
pub fn divide(total: &Money, part: &Money) -> Result<f64, MoneyError> {
    merged_currency(total, part, "divide")?;
    if part.subunits() == 0 {
        return Err(MoneyError::ZeroDivisor);
    }
    Ok(total.subunits() as f64 / part.subunits() as f64)
}

/// Sort order by amount.
///
/// # Errors
///
/// `CurrencyMismatch` when both sides carry different currencies.
pub fn compare(a: &Money, b: &Money) -> Result<Ordering, MoneyError> {
    merged_currency(a, b, "compare")?;
    Ok(a.subunits().cmp(&b.subunits()))
}

/// Equal amounts, with currencies equal or at least one missing.
/// `£1 == £1`, `£1 != $1`, `£1 != £1.50`.
#[must_use]
pub fn same_amount(a: &Money, b: &Money) -> bool {
    a.subunits() == b.subunits() && currencies_compatible(a, b)
}

/// Fold [`add`] over typed amounts.
///
/// # Errors
///
/// The first error [`add`] raises.
pub fn sum<'a>(amounts: impl IntoIterator<Item = &'a Money>) -> Result<Money, MoneyError> {
    amounts
        .into_iter()
        .try_fold(Money::zero(), |acc, m| add(&acc, m))
}

/// Total a heterogeneous list of stored values. Numbers are major units and
/// strings are typed text, as [`ingest`] reads them. Nulls are skipped
/// silently; entries that are not monetary are logged and skipped.
///
/// # Errors
///
/// `CurrencyMismatch` when two entries carry different currencies.
pub fn total<'a>(amounts: impl IntoIterator<Item = &'a Value>) -> Result<Money, MoneyError> {
    let mut acc = Money::zero();
    for entry in amounts {
        if entry.is_null() {
            continue;
        }
        match ingest(entry) {
            Ok(money) => acc = add(&acc, &money)?,
            Err(MoneyError::NotMonetary(_)) => tracing::warn!(%entry, "total: skipping non-monetary entry"),
            Err(err) => tracing::warn!(%entry, %err, "total: skipping unreadable entry"),
        }
    }
    Ok(acc)
}

fn currencies_compatible(a: &Money, b: &Money) -> bool {
    match (a.currency(), b.currency()) {
        (Some(left), Some(right)) => left.eq_ignore_ascii_case(right),
        _ => true,
    }
}

/// Currency for the result of combining `a` and `b`. Comparison ignores case.
fn merged_currency(a: &Money, b: &Money, op: &'static str) -> Result<Option<String>, MoneyError> {
    match (a.currency(), b.currency()) {
        (Some(left), Some(right)) if !currencies_compatible(a, b) => {
            tracing::error!(op, left, right, "currency mismatch");
            Err(MoneyError::CurrencyMismatch {
                op,
                left: left.to_owned(),
                right: right.to_owned(),
            })
        }
        (Some(code), _) | (None, Some(code)) => Ok(Some(code.to_owned())),
        (None, None) => Ok(None),
    }
}
