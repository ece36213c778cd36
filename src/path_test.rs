use serde_json::json;

use super::*;
use crate::error::ErrorCode;

#[test]
fn equality_is_structural() {
    let a = Path::new(["draft", "item"]);
    let b = Path::root().child("draft").child("item");
    assert_eq!(a, b);
    assert_ne!(a, Path::new(["draft"]));
}

#[test]
fn child_does_not_touch_the_parent() {
    let base = Path::new(["draft"]);
    let child = base.child(3);
    assert_eq!(base.len(), 1);
    assert_eq!(child.segments(), &[Segment::Key("draft".into()), Segment::Index(3)]);
    assert_eq!(child.parent(), Some(base));
    assert_eq!(child.last(), Some(&Segment::Index(3)));
}

#[test]
fn root_has_no_parent() {
    assert!(Path::root().is_empty());
    assert_eq!(Path::root().parent(), None);
}

#[test]
fn macro_mixes_keys_and_indexes() {
    let p = crate::path!["list", 2, "name"];
    assert_eq!(p.to_string(), "list.2.name");
    assert_eq!(crate::path![], Path::root());
}

#[test]
fn unset_segment_is_rejected() {
    let err = Path::try_from_segments([Some("a".into()), None]).unwrap_err();
    assert_eq!(err.error_code(), "E_INVALID_PATH");
    assert!(err.to_string().contains("position 1"));
}

#[test]
fn from_json_rejects_null_elements() {
    assert!(Path::from_json(&json!(["draft", null, "x"])).is_err());
    assert!(Path::from_json(&json!(["draft", true])).is_err());
    assert!(Path::from_json(&json!(["draft", -1])).is_err());
    assert!(Path::from_json(&json!("draft")).is_err());
    assert_eq!(Path::from_json(&json!(["draft", 0])).unwrap(), crate::path!["draft", 0]);
}

#[test]
fn dotted_paths() {
    assert_eq!(Path::from_dotted("transient.doFetch").unwrap(), Path::new(["transient", "doFetch"]));
    assert_eq!(Path::from_dotted("").unwrap(), Path::root());
    assert!(Path::from_dotted("a..b").is_err());
}
