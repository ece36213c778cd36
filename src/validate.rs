//! Field validation.
//!
//! A caller-supplied validator wins; otherwise the type's default check
//! runs. Messages never block a write: drafts may be invalid, and it is up
//! to the caller to refuse a submit while any field reports an error.

use serde_json::Value;

use crate::control::{DefaultCheck, ValidateFn};
use crate::normalize::is_valid_date;

#[cfg(test)]
#[path = "validate_test.rs"]
mod validate_test;

pub const DATE_FORMAT_MESSAGE: &str = "Please use the date format yyyy-mm-dd";
pub const SECURE_URL_MESSAGE: &str = "Please use https for secure urls";
pub const REQUIRED_MESSAGE: &str = "This field is required";

/// Error message for a field's current `(value, raw)` pair, if any.
/// `require_https` gates [`DefaultCheck::SecureUrl`].
#[must_use]
pub fn validate(
    custom: Option<&ValidateFn>,
    check: &DefaultCheck,
    require_https: bool,
    value: Option<&Value>,
    raw: Option<&str>,
) -> Option<String> {
    let value = value.filter(|v| !v.is_null());
    if let Some(validator) = custom {
        return validator(value, raw);
    }
    match check {
        DefaultCheck::None => None,
        DefaultCheck::DateFormat => check_date(value, raw),
        DefaultCheck::SecureUrl if require_https => check_secure_url(value),
        DefaultCheck::SecureUrl => None,
        DefaultCheck::Custom(validator) => validator(value, raw),
    }
}

/// A missing date with leftover raw text means the text did not parse.
#[must_use]
pub fn check_date(value: Option<&Value>, raw: Option<&str>) -> Option<String> {
    match value {
        None | Some(Value::Null) => raw
            .filter(|r| !r.trim().is_empty())
            .map(|_| DATE_FORMAT_MESSAGE.to_owned()),
        Some(Value::String(s)) if s.is_empty() || is_valid_date(s) => None,
        Some(_) => Some(DATE_FORMAT_MESSAGE.to_owned()),
    }
}

#[must_use]
pub fn check_secure_url(value: Option<&Value>) -> Option<String> {
    let url = value.and_then(Value::as_str)?;
    let insecure = url.get(..5).is_some_and(|scheme| scheme.eq_ignore_ascii_case("http:"));
    insecure.then(|| SECURE_URL_MESSAGE.to_owned())
}

/// Whether a value counts as not filled in for a required field.
#[must_use]
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null | Value::Bool(false)) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(object @ Value::Object(map)) => {
            if money::is_money_like(object) {
                return money::ingest(object).map_or(true, |m| !m.has_value());
            }
            map.is_empty()
        }
        Some(Value::Bool(true) | Value::Number(_)) => false,
    }
}
