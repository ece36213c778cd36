//! Parsers for the free-input control kinds: text, numbers, dates, urls,
//! checkboxes and the structured text kinds.
//!
//! Every parser is a pure function of the raw input and its
//! [`ParseContext`]. Aggressive rewrites (adding a url scheme) wait for a
//! terminal edit so they do not fight the user mid-keystroke.

use serde_json::{Number, Value};
use time::Date;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

use crate::control::{ControlKind, ParseContext, Parsed, RawInput, Registry};

#[cfg(test)]
#[path = "normalize_test.rs"]
mod normalize_test;

const KINDS: [ControlKind; 19] = [
    ControlKind::Text,
    ControlKind::Textarea,
    ControlKind::Password,
    ControlKind::Email,
    ControlKind::Color,
    ControlKind::Url,
    ControlKind::Img,
    ControlKind::ImgUpload,
    ControlKind::Autocomplete,
    ControlKind::Location,
    ControlKind::Address,
    ControlKind::Postcode,
    ControlKind::Number,
    ControlKind::Year,
    ControlKind::Date,
    ControlKind::Checkbox,
    ControlKind::YesNo,
    ControlKind::ArrayText,
    ControlKind::Json,
];

pub(crate) fn register(registry: &mut Registry) {
    for kind in KINDS {
        registry.register(kind.descriptor());
    }
}

// =============================================================================
// TEXT
// =============================================================================

/// Fold look-alike punctuation onto plain ASCII: curly quotes, primes and
/// guillemets to `'`/`"`, the dash family to `-`, odd spaces to a space.
#[must_use]
pub fn normalize_punctuation(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '`' | '\u{2018}' | '\u{2019}' | '\u{02BC}' => '\'',
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{275B}' | '\u{275C}' | '\u{275D}'
            | '\u{275E}' | '\u{00AB}' | '\u{00BB}' => '"',
            '\u{2010}'..='\u{2015}' => '-',
            '\u{00A0}' | '\u{2007}' | '\u{202F}' | '\u{200B}' => ' ',
            other => other,
        })
        .collect()
}

#[must_use]
pub fn parse_text(raw: &RawInput, _cx: &ParseContext<'_>) -> Parsed {
    Parsed::Value(Value::String(normalize_punctuation(&raw.literal())))
}

/// Stored exactly as typed.
#[must_use]
pub fn parse_plain(raw: &RawInput, _cx: &ParseContext<'_>) -> Parsed {
    Parsed::Value(Value::String(raw.literal()))
}

#[must_use]
pub fn parse_url(raw: &RawInput, cx: &ParseContext<'_>) -> Parsed {
    let text = raw.literal();
    if cx.kind.is_terminal() && needs_scheme(&text) {
        return Parsed::Value(Value::String(format!("https://{text}")));
    }
    Parsed::Value(Value::String(text))
}

/// No scheme, not a site-relative path, and not on its way to typing `http`.
fn needs_scheme(text: &str) -> bool {
    !text.is_empty()
        && !text.contains("://")
        && !text.starts_with('/')
        && !text.starts_with("http")
        && !"http".starts_with(text)
}

// =============================================================================
// NUMBERS
// =============================================================================

#[must_use]
pub fn parse_number(raw: &RawInput, _cx: &ParseContext<'_>) -> Parsed {
    let text = raw.literal();
    match money::parse_number(&text) {
        money::NumberInput::Blank => Parsed::Unset,
        money::NumberInput::Number(v) => Parsed::Value(number_value(v)),
        money::NumberInput::Invalid => Parsed::invalid(&text, "a number"),
    }
}

/// Leading integer, as `parseInt` reads it: `"2020s"` is 2020. Separators
/// are not stripped.
#[must_use]
pub fn parse_year(raw: &RawInput, _cx: &ParseContext<'_>) -> Parsed {
    let text = raw.literal();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Parsed::Unset;
    }
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    match digits[..end].parse::<i64>() {
        Ok(year) => Parsed::Value(Value::from(sign * year)),
        Err(_) => Parsed::invalid(&text, "a year"),
    }
}

/// Integral values are stored as integers so `5` round-trips as `5`, not `5.0`.
fn number_value(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < 9.0e15 {
        #[allow(clippy::cast_possible_truncation)]
        return Value::from(v as i64);
    }
    Number::from_f64(v).map_or(Value::Null, Value::Number)
}

// =============================================================================
// DATES
// =============================================================================

/// Strict `yyyy-mm-dd`, or a full RFC 3339 timestamp. Anything else is a
/// parse error, so the literal survives in the raw shadow.
#[must_use]
pub fn parse_date(raw: &RawInput, _cx: &ParseContext<'_>) -> Parsed {
    let text = raw.literal();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Parsed::Unset;
    }
    if let Some(date) = parse_calendar_date(trimmed) {
        return Parsed::Value(Value::String(date));
    }
    match time::OffsetDateTime::parse(trimmed, &Rfc3339) {
        Ok(_) => Parsed::Value(Value::String(trimmed.to_owned())),
        Err(_) => Parsed::invalid(&text, "a date (yyyy-mm-dd)"),
    }
}

pub(crate) fn parse_calendar_date(text: &str) -> Option<String> {
    let format = format_description!("[year]-[month]-[day]");
    let date = Date::parse(text, format).ok()?;
    date.format(format).ok()
}

/// Whether a stored date value is readable.
pub(crate) fn is_valid_date(text: &str) -> bool {
    parse_calendar_date(text.trim()).is_some() || time::OffsetDateTime::parse(text.trim(), &Rfc3339).is_ok()
}

// =============================================================================
// CHOICES
// =============================================================================

#[must_use]
pub fn parse_checkbox(raw: &RawInput, cx: &ParseContext<'_>) -> Parsed {
    match raw {
        RawInput::Checked(checked) => Parsed::Value(Value::Bool(*checked)),
        RawInput::Toggle(_) => {
            let on = cx.current.and_then(Value::as_bool).unwrap_or(false);
            Parsed::Value(Value::Bool(!on))
        }
        RawInput::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => Parsed::Value(Value::Bool(true)),
            "false" | "off" | "no" | "0" | "" => Parsed::Value(Value::Bool(false)),
            _ => Parsed::invalid(text, "a checkbox state"),
        },
    }
}

/// Yes/no radio pair. `"false"` or an empty token is no; any other token is
/// yes. There is no default: an untouched field stays unset.
#[must_use]
pub fn parse_yes_no(raw: &RawInput, _cx: &ParseContext<'_>) -> Parsed {
    match raw {
        RawInput::Checked(checked) => Parsed::Value(Value::Bool(*checked)),
        RawInput::Text(token) | RawInput::Toggle(token) => {
            let token = token.trim();
            Parsed::Value(Value::Bool(!token.is_empty() && token != "false"))
        }
    }
}

// =============================================================================
// STRUCTURED
// =============================================================================

/// Space-separated tokens stored as an array. Empty tokens survive while
/// typing forwards (so `"one "` keeps its trailing slot) but are dropped
/// when the new text is a deletion of the old.
#[must_use]
pub fn parse_arraytext(raw: &RawInput, cx: &ParseContext<'_>) -> Parsed {
    let text = raw.literal();
    let previous = cx.current.map(joined_tokens).unwrap_or_default();
    let deleting = previous.contains(text.as_str());
    let tokens: Vec<Value> = text
        .split(' ')
        .filter(|token| !deleting || !token.is_empty())
        .map(|token| Value::String(token.to_owned()))
        .collect();
    Parsed::Value(Value::Array(tokens))
}

/// The display form of a stored token array.
#[must_use]
pub fn joined_tokens(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map_or_else(|| item.to_string(), str::to_owned))
            .collect::<Vec<_>>()
            .join(" "),
        Value::String(s) => s.clone(),
        _ => String::new(),
    }
}

#[must_use]
pub fn parse_json(raw: &RawInput, _cx: &ParseContext<'_>) -> Parsed {
    let text = raw.literal();
    if text.trim().is_empty() {
        return Parsed::Unset;
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(value) => Parsed::Value(value),
        Err(err) => {
            tracing::debug!(%err, "json control input does not parse");
            Parsed::invalid(&text, "JSON")
        }
    }
}
