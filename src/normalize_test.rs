use proptest::prelude::*;
use serde_json::json;

use super::*;
use crate::control::EditKind;

fn change() -> ParseContext<'static> {
    ParseContext::new("test", EditKind::Change)
}

fn blur() -> ParseContext<'static> {
    ParseContext::new("test", EditKind::Blur)
}

fn text(s: &str) -> RawInput {
    RawInput::from(s)
}

#[test]
fn numbers_strip_glyph_and_separators() {
    assert_eq!(parse_number(&text("£1,234.50"), &change()), Parsed::Value(json!(1234.5)));
    assert_eq!(parse_number(&text("1,000"), &change()), Parsed::Value(json!(1000)));
    assert_eq!(parse_number(&text("-$3"), &change()), Parsed::Value(json!(-3)));
}

#[test]
fn blank_number_is_unset_and_junk_is_invalid() {
    assert_eq!(parse_number(&text("  "), &change()), Parsed::Unset);
    let Parsed::Invalid(err) = parse_number(&text("12 apples"), &change()) else {
        panic!("expected a parse error");
    };
    assert_eq!(err.raw, "12 apples");
    assert_eq!(err.expected, "a number");
}

#[test]
fn years_read_leading_digits_only() {
    assert_eq!(parse_year(&text("2020"), &change()), Parsed::Value(json!(2020)));
    assert_eq!(parse_year(&text("1990s"), &change()), Parsed::Value(json!(1990)));
    assert_eq!(parse_year(&text("1,999"), &change()), Parsed::Value(json!(1)));
    assert_eq!(parse_year(&text(""), &change()), Parsed::Unset);
    assert!(matches!(parse_year(&text("MMXX"), &change()), Parsed::Invalid(_)));
}

#[test]
fn url_scheme_is_added_on_blur_only() {
    assert_eq!(parse_url(&text("example.com"), &change()), Parsed::Value(json!("example.com")));
    assert_eq!(parse_url(&text("example.com"), &blur()), Parsed::Value(json!("https://example.com")));
}

#[test]
fn url_scheme_is_left_alone_when_present_or_pending() {
    for input in ["http://a.com", "ftp://a.com", "/local/path", "http", "htt", "https", "httpbin.org"] {
        assert_eq!(parse_url(&text(input), &blur()), Parsed::Value(json!(input)), "{input}");
    }
    assert_eq!(parse_url(&text(""), &blur()), Parsed::Value(json!("")));
}

#[test]
fn text_punctuation_is_normalized() {
    let parsed = parse_text(&text("\u{201C}It\u{2019}s\u{201D} \u{2014} a\u{00A0}test"), &change());
    assert_eq!(parsed, Parsed::Value(json!("\"It's\" - a test")));
    assert_eq!(normalize_punctuation("\u{00AB}x\u{00BB} `y\u{2018}"), "\"x\" 'y'");
    assert_eq!(normalize_punctuation("a\u{2010}b\u{2015}c\u{200B}d"), "a-b-c d");
}

#[test]
fn plain_text_is_untouched() {
    let input = "p\u{2019}ss\u{2014}word";
    assert_eq!(parse_plain(&text(input), &change()), Parsed::Value(json!(input)));
}

#[test]
fn dates_are_strict() {
    assert_eq!(parse_date(&text("2020-02-29"), &change()), Parsed::Value(json!("2020-02-29")));
    assert_eq!(
        parse_date(&text("2020-02-29T10:00:00Z"), &change()),
        Parsed::Value(json!("2020-02-29T10:00:00Z"))
    );
    assert_eq!(parse_date(&text(""), &change()), Parsed::Unset);
    for bad in ["2020-13-45", "2019-02-29", "29/02/2020", "2020-2-3", "soon"] {
        assert!(matches!(parse_date(&text(bad), &change()), Parsed::Invalid(_)), "{bad}");
    }
}

#[test]
fn checkbox_states() {
    assert_eq!(parse_checkbox(&RawInput::Checked(true), &change()), Parsed::Value(json!(true)));
    assert_eq!(parse_checkbox(&text("off"), &change()), Parsed::Value(json!(false)));
    assert!(matches!(parse_checkbox(&text("maybe"), &change()), Parsed::Invalid(_)));

    let on = json!(true);
    let cx = ParseContext {
        current: Some(&on),
        ..change()
    };
    assert_eq!(parse_checkbox(&RawInput::Toggle(String::new()), &cx), Parsed::Value(json!(false)));
}

#[test]
fn yes_no_tokens() {
    assert_eq!(parse_yes_no(&text("true"), &change()), Parsed::Value(json!(true)));
    assert_eq!(parse_yes_no(&text("yes please"), &change()), Parsed::Value(json!(true)));
    assert_eq!(parse_yes_no(&text("false"), &change()), Parsed::Value(json!(false)));
    assert_eq!(parse_yes_no(&text(""), &change()), Parsed::Value(json!(false)));
}

#[test]
fn arraytext_keeps_trailing_slot_while_typing() {
    let current = json!(["one"]);
    let cx = ParseContext {
        current: Some(&current),
        ..change()
    };
    assert_eq!(parse_arraytext(&text("one "), &cx), Parsed::Value(json!(["one", ""])));
    assert_eq!(parse_arraytext(&text("one two"), &cx), Parsed::Value(json!(["one", "two"])));
}

#[test]
fn arraytext_drops_empty_tokens_when_deleting() {
    let current = json!(["one", "two"]);
    let cx = ParseContext {
        current: Some(&current),
        ..change()
    };
    assert_eq!(parse_arraytext(&text("one "), &cx), Parsed::Value(json!(["one"])));
    assert_eq!(parse_arraytext(&text(""), &cx), Parsed::Value(json!([])));
    assert_eq!(joined_tokens(&current), "one two");
}

#[test]
fn json_control() {
    assert_eq!(parse_json(&text(r#"{"a": [1, 2]}"#), &change()), Parsed::Value(json!({"a": [1, 2]})));
    assert_eq!(parse_json(&text(" "), &change()), Parsed::Unset);
    assert!(matches!(parse_json(&text("{a:"), &change()), Parsed::Invalid(_)));
}

fn grouped(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

proptest! {
    #[test]
    fn separators_and_glyphs_never_change_the_number(n in 0u64..1_000_000_000_000, glyph in prop::sample::select(vec!["", "£", "$", "€"])) {
        let input = format!("{glyph}{}", grouped(n));
        #[allow(clippy::cast_possible_wrap)]
        let expected = json!(n as i64);
        prop_assert_eq!(parse_number(&text(&input), &change()), Parsed::Value(expected));
    }

    #[test]
    fn letters_are_never_read_as_zero(prefix in "[0-9]{0,4}", junk in "[a-df-zA-DF-Z]{1,4}") {
        let input = format!("{prefix}{junk}");
        prop_assert!(matches!(parse_number(&text(&input), &change()), Parsed::Invalid(_)));
    }
}
