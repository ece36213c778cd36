//! Parsers for option-backed controls: single choice (radio, select) and
//! multi-select in array or map form.

use serde_json::{Map, Value};

use crate::control::{ControlKind, ParseContext, Parsed, RawInput, Registry, token_of};

#[cfg(test)]
#[path = "selection_test.rs"]
mod selection_test;

const KINDS: [ControlKind; 5] = [
    ControlKind::Radio,
    ControlKind::Select,
    ControlKind::Checkboxes,
    ControlKind::CheckboxArray,
    ControlKind::CheckboxObject,
];

pub(crate) fn register(registry: &mut Registry) {
    for kind in KINDS {
        registry.register(kind.descriptor());
    }
}

/// Map a token onto its option. Without an options set the token is taken
/// as-is.
fn choose(token: &str, cx: &ParseContext<'_>) -> Result<Value, Parsed> {
    match cx.options {
        Some(options) => options
            .coerce(token)
            .ok_or_else(|| Parsed::invalid(token, "one of the options")),
        None => Ok(Value::String(token.to_owned())),
    }
}

/// Radio/select. An empty token is "no selection".
#[must_use]
pub fn parse_single(raw: &RawInput, cx: &ParseContext<'_>) -> Parsed {
    let token = raw.literal();
    if token.trim().is_empty() {
        return Parsed::Unset;
    }
    match choose(&token, cx) {
        Ok(value) => Parsed::Value(value),
        Err(invalid) => invalid,
    }
}

/// Flip one option's membership in the current array.
#[must_use]
pub fn parse_toggle_array(raw: &RawInput, cx: &ParseContext<'_>) -> Parsed {
    let mut selected = cx.current.and_then(Value::as_array).cloned().unwrap_or_default();
    let token = raw.literal();
    if token.is_empty() {
        return Parsed::Value(Value::Array(selected));
    }
    let option = match choose(&token, cx) {
        Ok(option) => option,
        Err(invalid) => return invalid,
    };
    let key = token_of(&option);
    match selected.iter().position(|item| token_of(item) == key) {
        Some(index) => {
            selected.remove(index);
        }
        None => selected.push(option),
    }
    Parsed::Value(Value::Array(selected))
}

/// Flip `map[option]` between true and false.
#[must_use]
pub fn parse_toggle_object(raw: &RawInput, cx: &ParseContext<'_>) -> Parsed {
    let mut flags = cx.current.and_then(Value::as_object).cloned().unwrap_or_else(Map::new);
    let token = raw.literal();
    if token.is_empty() {
        return Parsed::Value(Value::Object(flags));
    }
    let option = match choose(&token, cx) {
        Ok(option) => option,
        Err(invalid) => return invalid,
    };
    let key = token_of(&option);
    let on = flags.get(&key).and_then(Value::as_bool).unwrap_or(false);
    flags.insert(key, Value::Bool(!on));
    Parsed::Value(Value::Object(flags))
}
