use std::cell::RefCell;
use std::rc::Rc;

use futures::FutureExt;
use futures::channel::oneshot;
use serde_json::json;

use super::*;
use crate::error::ErrorCode;
use crate::path;
use crate::store::MemoryStore;
use crate::validate::{DATE_FORMAT_MESSAGE, SECURE_URL_MESSAGE};

fn binder() -> Binder<MemoryStore> {
    Binder::new(MemoryStore::new())
}

fn field(prop: &str, kind: ControlKind) -> BoundField {
    BoundField::new(path!["draft"], prop, kind)
}

fn stored(binder: &Binder<MemoryStore>, path: &Path) -> Option<Value> {
    binder.store().get_value(path)
}

fn fetch_flag(binder: &Binder<MemoryStore>) -> bool {
    binder.trigger().is_set(binder.store())
}

// =============================================================================
// RESOLUTION
// =============================================================================

#[test]
fn value_precedence_item_store_default_category() {
    let mut b = binder();
    let f = field("title", ControlKind::Text);
    assert_eq!(b.resolve(&f).unwrap().value, Some(json!("")));

    let with_default = f.clone().default_value(json!("untitled"));
    assert_eq!(b.resolve(&with_default).unwrap().value, Some(json!("untitled")));

    b.store_mut().set_value(&path!["draft", "title"], Some(json!("stored")), false);
    assert_eq!(b.resolve(&with_default).unwrap().value, Some(json!("stored")));

    let with_item = with_default.clone().item(json!({"title": "from item"}));
    assert_eq!(b.resolve(&with_item).unwrap().value, Some(json!("from item")));

    let null_item = with_default.item(json!({"title": null}));
    assert_eq!(b.resolve(&null_item).unwrap().value, Some(json!("stored")));
}

#[test]
fn checkbox_defaults_false_and_yes_no_stays_unset() {
    let b = binder();
    assert_eq!(b.resolve(&field("agree", ControlKind::Checkbox)).unwrap().value, Some(json!(false)));
    assert_eq!(b.resolve(&field("giftAid", ControlKind::YesNo)).unwrap().value, None);
    assert_eq!(b.resolve(&field("count", ControlKind::Number)).unwrap().value, None);
}

#[test]
fn stored_null_reads_as_unset() {
    let mut b = binder();
    b.store_mut().set_value(&path!["draft", "count"], Some(Value::Null), false);
    let f = field("count", ControlKind::Number).default_value(json!(1));
    assert_eq!(b.resolve(&f).unwrap().value, Some(json!(1)));
}

#[test]
fn unknown_type_and_bad_path_are_errors() {
    let b = binder();
    let err = b.resolve(&BoundField::with_tag(path!["draft"], "x", "slider")).unwrap_err();
    assert_eq!(err.error_code(), "E_UNKNOWN_TYPE");

    let err = b.resolve(&field("", ControlKind::Text)).unwrap_err();
    assert_eq!(err.error_code(), "E_INVALID_PATH");
}

// =============================================================================
// COMMIT
// =============================================================================

#[test]
fn number_with_glyph_and_separators() {
    let mut b = binder();
    let f = field("price", ControlKind::Number);

    let parsed = b.commit(&f, "£1,234.50", EditKind::Change).unwrap();
    assert_eq!(parsed, Parsed::Value(json!(1234.5)));
    assert_eq!(stored(&b, &path!["draft", "price"]), Some(json!(1234.5)));
    // still typing: the literal is shadowed
    assert_eq!(b.raw_value(&f).as_deref(), Some("£1,234.50"));

    b.commit(&f, "£1,234.50", EditKind::Blur).unwrap();
    assert_eq!(b.raw_value(&f), None);
    assert_eq!(stored(&b, &path!["draft", "price_raw"]), None);
}

#[test]
fn literal_matching_canonical_text_needs_no_shadow() {
    let mut b = binder();
    let f = field("qty", ControlKind::Number);
    b.commit(&f, "12", EditKind::Change).unwrap();
    assert_eq!(b.raw_value(&f), None);
}

#[test]
fn bad_date_keeps_raw_and_reports_format() {
    let mut b = binder();
    let f = field("start", ControlKind::Date);

    let parsed = b.commit(&f, "2020-13-45", EditKind::Blur).unwrap();
    assert!(matches!(parsed, Parsed::Invalid(_)));

    let resolution = b.resolve(&f).unwrap();
    assert_eq!(resolution.value, None);
    assert_eq!(resolution.raw.as_deref(), Some("2020-13-45"));
    assert_eq!(resolution.error.as_deref(), Some(DATE_FORMAT_MESSAGE));
    assert_eq!(stored(&b, &path!["draft", "start_raw"]), Some(json!("2020-13-45")));
}

#[test]
fn bad_edit_replaces_previous_value() {
    let mut b = binder();
    let f = field("start", ControlKind::Date);
    b.commit(&f, "2021-01-01", EditKind::Blur).unwrap();
    b.commit(&f, "2021-01-0x", EditKind::Change).unwrap();
    assert_eq!(stored(&b, &f.proppath()), None);

    b.commit(&f, "2021-01-05", EditKind::Blur).unwrap();
    let resolution = b.resolve(&f).unwrap();
    assert_eq!(resolution.value, Some(json!("2021-01-05")));
    assert_eq!(resolution.raw, None);
    assert_eq!(resolution.error, None);
}

#[test]
fn blank_edit_clears_value_and_shadow() {
    let mut b = binder();
    let f = field("count", ControlKind::Number);
    b.commit(&f, "abc", EditKind::Change).unwrap();
    assert!(b.raw_value(&f).is_some());

    assert_eq!(b.commit(&f, "  ", EditKind::Change).unwrap(), Parsed::Unset);
    assert_eq!(stored(&b, &f.proppath()), None);
    assert_eq!(b.raw_value(&f), None);
}

#[test]
fn shadow_props_get_no_shadow_of_their_own() {
    let mut b = binder();
    let f = field("count_raw", ControlKind::Number);
    assert_eq!(f.raw_path(), None);
    b.commit(&f, "abc", EditKind::Change).unwrap();
    assert_eq!(stored(&b, &path!["draft", "count_raw_raw"]), None);
}

#[test]
fn url_gets_scheme_on_blur() {
    let mut b = binder();
    let f = field("site", ControlKind::Url);
    b.commit(&f, "example.com", EditKind::Change).unwrap();
    assert_eq!(stored(&b, &f.proppath()), Some(json!("example.com")));
    b.commit(&f, "example.com", EditKind::Blur).unwrap();
    assert_eq!(stored(&b, &f.proppath()), Some(json!("https://example.com")));
    assert_eq!(b.raw_value(&f), None);
}

#[test]
fn insecure_url_is_flagged_unless_field_opts_out() {
    let mut b = binder();
    let f = field("site", ControlKind::Url);
    b.commit(&f, "http://example.com", EditKind::Blur).unwrap();
    assert_eq!(b.resolve(&f).unwrap().error.as_deref(), Some(SECURE_URL_MESSAGE));
    assert_eq!(b.resolve(&f.clone().https(false)).unwrap().error, None);

    let relaxed = EngineConfig {
        require_https: false,
        ..EngineConfig::default()
    };
    let mut lax = Binder::with_config(MemoryStore::new(), Registry::builtin(), relaxed);
    lax.commit(&f, "http://example.com", EditKind::Blur).unwrap();
    assert_eq!(lax.resolve(&f).unwrap().error, None);
}

#[test]
fn categorical_without_options_is_an_error() {
    let mut b = binder();
    let err = b.commit(&field("colour", ControlKind::Radio), "red", EditKind::Change).unwrap_err();
    assert!(matches!(err, BindError::MissingOptions { ref prop, .. } if prop == "colour"));
    assert_eq!(err.error_code(), "E_MISSING_OPTIONS");
}

#[test]
fn select_coerces_and_empty_clears() {
    let mut b = binder();
    let f = field("size", ControlKind::Select).options(vec![json!(1), json!(2)]);
    b.commit(&f, "2", EditKind::Change).unwrap();
    assert_eq!(stored(&b, &f.proppath()), Some(json!(2)));
    b.commit(&f, "", EditKind::Change).unwrap();
    assert_eq!(stored(&b, &f.proppath()), None);
}

#[test]
fn checkboxes_toggle_membership_in_store() {
    let mut b = binder();
    let f = field("tags", ControlKind::Checkboxes).options(vec![json!("a"), json!("b")]);
    b.commit(&f, RawInput::Toggle("a".into()), EditKind::Change).unwrap();
    b.commit(&f, RawInput::Toggle("b".into()), EditKind::Change).unwrap();
    b.commit(&f, RawInput::Toggle("a".into()), EditKind::Change).unwrap();
    assert_eq!(stored(&b, &f.proppath()), Some(json!(["b"])));
    assert_eq!(b.raw_value(&f), None);
}

// =============================================================================
// FETCH FLAG
// =============================================================================

#[test]
fn typing_then_blur_sets_flag_once() {
    let mut b = binder();
    let f = field("title", ControlKind::Text);
    let mut flags = Vec::new();
    for text in ["h", "he", "hel", "hell", "hello"] {
        b.commit(&f, text, EditKind::Change).unwrap();
        flags.push(fetch_flag(&b));
    }
    b.commit(&f, "hello", EditKind::Blur).unwrap();
    flags.push(fetch_flag(&b));
    assert_eq!(flags, vec![false, false, false, false, false, true]);
}

#[test]
fn each_checkbox_toggle_sets_flag() {
    let mut b = binder();
    let f = field("agree", ControlKind::Checkbox);

    b.commit(&f, false, EditKind::Change).unwrap();
    assert!(fetch_flag(&b));
    assert_eq!(stored(&b, &f.proppath()), Some(json!(false)));

    let flag = b.trigger().flag().clone();
    b.store_mut().set_value(&flag, Some(json!(false)), false);
    b.commit(&f, true, EditKind::Change).unwrap();
    assert!(fetch_flag(&b));
    assert_eq!(stored(&b, &f.proppath()), Some(json!(true)));
}

#[test]
fn fetch_flag_path_follows_config() {
    let config = EngineConfig {
        fetch_flag: path!["sync", "ready"],
        ..EngineConfig::default()
    };
    let mut b = Binder::with_config(MemoryStore::new(), Registry::builtin(), config);
    b.commit(&field("title", ControlKind::Text), "x", EditKind::Commit).unwrap();
    assert_eq!(stored(&b, &path!["sync", "ready"]), Some(json!(true)));
    assert_eq!(stored(&b, &path!["transient", "doFetch"]), None);
}

// =============================================================================
// MONEY
// =============================================================================

#[test]
fn money_edits_store_canonical_object_and_force_notify() {
    let mut b = binder();
    let f = field("price", ControlKind::Money);
    b.commit(&f, "£5", EditKind::Change).unwrap();
    b.store_mut().take_changes();

    b.commit(&f, "£5", EditKind::Change).unwrap();
    let changes = b.store_mut().take_changes();
    assert!(changes.contains(&f.proppath()));

    let value = stored(&b, &f.proppath()).unwrap();
    assert_eq!(value["value100p"], 50_000);
    assert_eq!(value["raw"], "£5");
    // the typed text lives inside the object
    assert_eq!(b.raw_value(&f), None);
}

#[test]
fn money_uses_default_currency_from_config() {
    let config = EngineConfig {
        default_currency: Some("AUD".into()),
        ..EngineConfig::default()
    };
    let mut b = Binder::with_config(MemoryStore::new(), Registry::builtin(), config);
    let f = field("price", ControlKind::Money);
    b.commit(&f, "10", EditKind::Blur).unwrap();
    assert_eq!(stored(&b, &f.proppath()).unwrap()["currency"], "AUD");
}

#[test]
fn unparseable_money_is_a_validation_error() {
    let mut b = binder();
    let f = field("price", ControlKind::Money);
    b.commit(&f, "a fiver", EditKind::Blur).unwrap();
    assert_eq!(b.resolve(&f).unwrap().error.as_deref(), Some("Cannot parse: a fiver"));
}

#[test]
fn migrate_money_rewrites_legacy_payload_once() {
    let mut b = binder();
    let f = field("price", ControlKind::Money);
    b.store_mut()
        .set_value(&f.proppath(), Some(json!({"currency": "GBP", "value100": 500})), false);

    let report = b.migrate_money(&f).unwrap().unwrap();
    assert!(report.changed_canonical());
    let value = stored(&b, &f.proppath()).unwrap();
    assert_eq!(value["value100p"], 50_000);
    assert_eq!(value["value"], 5);
    assert!(value.get("value100").is_none());

    let again = b.migrate_money(&f).unwrap().unwrap();
    assert!(again.is_empty());
    assert_eq!(b.migrate_money(&field("absent", ControlKind::Money)).unwrap(), None);
}

#[test]
fn migrate_money_rejects_non_monetary_values() {
    let mut b = binder();
    let f = field("price", ControlKind::Money);
    b.store_mut().set_value(&f.proppath(), Some(json!([1, 2])), false);
    let err = b.migrate_money(&f).unwrap_err();
    assert_eq!(err.error_code(), "E_NOT_MONETARY");
}

// =============================================================================
// HOOKS, SUBMIT, FETCH
// =============================================================================

#[test]
fn save_hook_sees_every_commit() {
    let mut b = binder();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    b.on_save(move |event| {
        sink.borrow_mut()
            .push((event.prop.to_owned(), event.value.cloned(), event.kind));
    });

    let f = field("count", ControlKind::Number);
    b.commit(&f, "3", EditKind::Change).unwrap();
    b.commit(&f, "x", EditKind::Blur).unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![
            ("count".to_owned(), Some(json!(3)), EditKind::Change),
            ("count".to_owned(), None, EditKind::Blur),
        ]
    );
}

#[test]
fn check_submit_lists_blocking_fields() {
    let mut b = binder();
    let name = field("name", ControlKind::Text).required();
    let start = field("start", ControlKind::Date);
    let site = field("site", ControlKind::Url);
    let notes = field("notes", ControlKind::Textarea);

    b.commit(&start, "2020-13-45", EditKind::Blur).unwrap();
    b.commit(&site, "http://example.com", EditKind::Blur).unwrap();
    b.commit(&notes, "fine", EditKind::Blur).unwrap();

    let errors = b.check_submit(&[name.clone(), start, site, notes]).unwrap();
    let messages: Vec<(String, &str)> = errors
        .iter()
        .map(|e| (e.path.to_string(), e.message.as_str()))
        .collect();
    assert_eq!(
        messages,
        vec![
            ("draft.name".to_owned(), REQUIRED_MESSAGE),
            ("draft.start".to_owned(), DATE_FORMAT_MESSAGE),
            ("draft.site".to_owned(), SECURE_URL_MESSAGE),
        ]
    );

    b.commit(&name, "Ada", EditKind::Blur).unwrap();
    assert_eq!(b.check_submit(&[name]).unwrap(), Vec::new());
}

#[test]
fn caller_validator_wins() {
    let b = binder();
    let f = field("code", ControlKind::Text).validator(|value, _raw| {
        let text = value.and_then(Value::as_str).unwrap_or_default();
        (text.len() != 4).then(|| "Codes have four characters".to_owned())
    });
    assert_eq!(b.resolve(&f).unwrap().error.as_deref(), Some("Codes have four characters"));
}

#[test]
fn pending_fetch_reads_as_no_value_until_settled() {
    let mut b = binder();
    let f = field("count", ControlKind::Number).default_value(json!(0));
    let (tx, rx) = oneshot::channel::<Value>();
    let loader: Loader = Box::new(move || async move { rx.await.map_err(|e| e.to_string()) }.boxed_local());

    let first = b.resolve_or_fetch(&f, loader).unwrap();
    assert_eq!(first.value, Some(json!(0)));

    tx.send(json!(42)).unwrap();
    assert_eq!(b.store_mut().poll_pending(), 1);
    assert_eq!(b.resolve(&f).unwrap().value, Some(json!(42)));
}

#[test]
fn failed_fetch_falls_back_to_default() {
    let mut b = binder();
    let f = field("count", ControlKind::Number).default_value(json!(7));
    let loader: Loader = Box::new(|| async { Err::<Value, _>("offline".to_owned()) }.boxed_local());
    assert_eq!(b.resolve_or_fetch(&f, loader).unwrap().value, Some(json!(7)));
}
