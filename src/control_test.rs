use serde_json::json;

use super::*;
use crate::error::ErrorCode;

#[test]
fn tags_round_trip_for_every_kind() {
    for kind in ControlKind::ALL {
        assert_eq!(ControlKind::from_tag(kind.tag()), Some(kind));
    }
    assert_eq!(ControlKind::from_tag("Money"), Some(ControlKind::Money));
    assert_eq!(ControlKind::from_tag("money"), None);
}

#[test]
fn builtins_cover_every_kind() {
    let registry = Registry::with_builtins();
    assert_eq!(registry.len(), ControlKind::ALL.len());
    for kind in ControlKind::ALL {
        let descriptor = registry.resolve(kind.tag()).unwrap();
        assert_eq!(descriptor.category, kind.category());
    }
}

#[test]
fn unknown_tag_is_an_error() {
    let err = Registry::with_builtins().resolve("slider").unwrap_err();
    assert!(matches!(err, BindError::UnknownType(ref tag) if tag == "slider"));
    assert_eq!(err.error_code(), "E_UNKNOWN_TYPE");
}

#[test]
fn empty_registry_resolves_nothing() {
    let registry = Registry::empty();
    assert!(registry.is_empty());
    assert!(registry.resolve("text").is_err());
}

fn shout(raw: &RawInput, _cx: &ParseContext<'_>) -> Parsed {
    Parsed::Value(Value::String(raw.literal().to_uppercase()))
}

#[test]
fn hosts_can_register_and_replace_types() {
    let mut registry = Registry::with_builtins();
    assert!(registry.register(TypeDescriptor::new("shout", Category::Text, shout)).is_none());
    let descriptor = registry.resolve("shout").unwrap();
    let parsed = descriptor.parse(&"hi".into(), &ParseContext::new("shout", EditKind::Change));
    assert_eq!(parsed, Parsed::Value(json!("HI")));

    let replaced = registry.register(TypeDescriptor::new("text", Category::Text, shout));
    assert_eq!(replaced.map(|d| d.tag.clone()), Some("text".to_owned()));
    assert!(registry.tags().contains(&"shout"));
}

#[test]
fn category_defaults() {
    assert_eq!(Category::Binary.default_value(), Some(json!(false)));
    assert_eq!(Category::Text.default_value(), Some(json!("")));
    assert_eq!(Category::Numeric.default_value(), None);
    assert_eq!(Category::Categorical.default_value(), None);
    assert_eq!(ControlKind::YesNo.category(), Category::Categorical);
}

#[test]
fn option_backed_kinds_require_options() {
    for kind in ControlKind::ALL {
        let expected = matches!(
            kind,
            ControlKind::Radio
                | ControlKind::Select
                | ControlKind::Checkboxes
                | ControlKind::CheckboxArray
                | ControlKind::CheckboxObject
        );
        assert_eq!(kind.descriptor().requires_options, expected, "{kind}");
    }
}

#[test]
fn default_checks() {
    assert!(matches!(ControlKind::Date.descriptor().check, DefaultCheck::DateFormat));
    assert!(matches!(ControlKind::Url.descriptor().check, DefaultCheck::SecureUrl));
    assert!(matches!(ControlKind::ImgUpload.descriptor().check, DefaultCheck::SecureUrl));
    assert!(matches!(ControlKind::Money.descriptor().check, DefaultCheck::Custom(_)));
    assert!(matches!(ControlKind::Text.descriptor().check, DefaultCheck::None));
}

#[test]
fn edit_kinds() {
    assert!(!EditKind::Change.is_terminal());
    assert!(EditKind::Blur.is_terminal());
    assert!(EditKind::Commit.is_terminal());
    assert_eq!("blur".parse::<EditKind>(), Ok(EditKind::Blur));
    assert!("keyup".parse::<EditKind>().is_err());
}

#[test]
fn options_coerce_tokens_to_option_values() {
    let options = Options::List(vec![json!(1), json!(2), json!("three")]);
    assert_eq!(options.coerce("2"), Some(json!(2)));
    assert_eq!(options.coerce("three"), Some(json!("three")));
    assert_eq!(options.coerce("4"), None);

    let even = Options::predicate(|token| token.parse::<u32>().is_ok_and(|n| n % 2 == 0));
    assert_eq!(even.coerce("8"), Some(json!("8")));
    assert_eq!(even.coerce("7"), None);
}

#[test]
fn raw_input_literals() {
    assert_eq!(RawInput::from("abc").literal(), "abc");
    assert_eq!(RawInput::from(true).literal(), "true");
    assert_eq!(RawInput::Toggle("x".into()).literal(), "x");
}

#[test]
fn builtin_registry_is_shared() {
    let a = Registry::builtin();
    let b = Registry::builtin();
    assert!(Arc::ptr_eq(&a, &b));
    assert!(a.contains("Money"));
}
