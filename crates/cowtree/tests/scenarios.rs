//! End-to-end produce scenarios over small hand-written trees.

use cowtree::{produce, DraftError, DraftPath, Key, ProduceConfig, Producer, Slot, Value};
use pretty_assertions::assert_eq;
use serde_json::json;

fn path(s: &str) -> DraftPath {
    s.parse().unwrap()
}

fn steve() -> Value {
    Value::from(json!({
        "name": "Steve",
        "tags": ["a"],
        "friends": [{"name": "x"}, {"name": "y"}]
    }))
}

#[test]
fn rename_append_and_nested_write() {
    let base = steve();

    let next = produce(&base, |draft| {
        draft.set("name", "Bob")?;
        draft.child("tags")?.expect("tags").push("b")?;
        let mut friends = draft.child("friends")?.expect("friends");
        friends.child(0usize)?.expect("first friend").set("name", "z")
    })
    .unwrap();

    assert_eq!(next.pointer(&path("name")), Some(&Value::from("Bob")));
    assert_eq!(next.pointer(&path("tags")), Some(&Value::from(json!(["a", "b"]))));
    assert_eq!(next.pointer(&path("friends.0.name")), Some(&Value::from("z")));
    assert!(next
        .pointer(&path("friends.1"))
        .unwrap()
        .ptr_eq(base.pointer(&path("friends.1")).unwrap()));
    assert_eq!(base, steve());
}

#[test]
fn nested_read_and_same_write_keeps_identity() {
    let base = steve();

    let next = produce(&base, |draft| {
        let mut friend = draft.at(&path("friends.1"))?.expect("second friend");
        let name = friend.get("name")?.and_then(Slot::into_value).unwrap_or_default();
        friend.set("name", name)
    })
    .unwrap();

    assert!(next.ptr_eq(&base));
}

#[test]
fn write_after_sibling_modification_still_shares() {
    let base = Value::from(json!({"a": {"v": 1}, "b": {"v": 2}, "c": {"v": 3}}));

    let next = produce(&base, |draft| {
        draft.set_at(&path("a.v"), 10)?;
        // read "b" after the root was copied; it must be drafted lazily
        // and, being unwritten, resolve back to the base object
        draft.child("b")?;
        Ok(())
    })
    .unwrap();

    assert!(next.pointer(&path("b")).unwrap().ptr_eq(base.pointer(&path("b")).unwrap()));
    assert!(next.pointer(&path("c")).unwrap().ptr_eq(base.pointer(&path("c")).unwrap()));
    assert!(!next.pointer(&path("a")).unwrap().ptr_eq(base.pointer(&path("a")).unwrap()));
}

#[test]
fn draft_handed_out_before_copy_is_kept() {
    let base = Value::from(json!({"a": {"v": 1}, "n": 0}));

    let next = produce(&base, |draft| {
        let a = draft.get("a")?.and_then(|slot| slot.as_draft()).expect("draft");
        draft.set("n", 1)?;
        // the parent was copied after `a` was handed out; writes through
        // the old handle must still land in the result
        draft.open(a)?.set("v", 2)
    })
    .unwrap();

    assert_eq!(next, Value::from(json!({"a": {"v": 2}, "n": 1})));
}

#[test]
fn moving_a_draft_to_a_new_key() {
    let base = Value::from(json!({"src": {"v": 1}}));

    let next = produce(&base, |draft| {
        let src = draft.get("src")?.expect("src");
        draft.set("dst", src)
    })
    .unwrap();

    assert_eq!(next, Value::from(json!({"src": {"v": 1}, "dst": {"v": 1}})));
    assert!(next.pointer(&path("dst")).unwrap().ptr_eq(base.pointer(&path("src")).unwrap()));
}

#[test]
fn replacing_a_container_with_a_scalar() {
    let base = steve();
    let next = produce(&base, |draft| draft.set("friends", Value::Null)).unwrap();
    assert_eq!(next.pointer(&path("friends")), Some(&Value::Null));
    assert!(next.pointer(&path("tags")).unwrap().ptr_eq(base.pointer(&path("tags")).unwrap()));
}

#[test]
fn opaque_leaves_pass_through() {
    let blob = Value::bytes(b"\x00\x01");
    let base = Value::record([("blob", blob.clone()), ("n", Value::from(1))]);

    let next = produce(&base, |draft| {
        let read = draft.get("blob")?.expect("blob");
        assert!(!read.is_draft());
        draft.set("blob", read)?;
        draft.set("n", 2)
    })
    .unwrap();

    assert!(next.pointer(&path("blob")).unwrap().ptr_eq(&blob));
}

#[test]
fn signed_zero_is_a_real_change() {
    let base = Value::from(json!({"z": 0.0}));
    let next = produce(&base, |draft| draft.set("z", -0.0)).unwrap();
    assert!(!next.ptr_eq(&base));
    assert_eq!(
        next.pointer(&path("z")).and_then(Value::as_f64).map(f64::is_sign_negative),
        Some(true)
    );
}

#[test]
fn nan_overwrite_is_suppressed() {
    let base = Value::record([("n", f64::NAN)]);
    let next = produce(&base, |draft| draft.set("n", f64::NAN)).unwrap();
    assert!(next.ptr_eq(&base));
}

#[test]
fn gap_write_fails_by_default() {
    let base = steve();
    let err = produce(&base, |draft| {
        draft.child("tags")?.expect("tags").set(3usize, "d")
    })
    .unwrap_err();
    assert_eq!(err, DraftError::IndexOutOfRange { index: 3, len: 1 });
}

#[test]
fn strict_keys_reject_index_on_record() {
    let base = steve();
    let producer = Producer::new(ProduceConfig::new().with_strict_keys(true));
    let err = producer
        .produce(&base, |draft| draft.set(Key::Index(0), 1))
        .unwrap_err();
    assert!(matches!(err, DraftError::UnsupportedKey { .. }));
}

#[test]
fn lenient_keys_write_numeric_field() {
    let base = steve();
    let next = produce(&base, |draft| draft.set(Key::Index(0), 1)).unwrap();
    assert_eq!(
        next.as_record().and_then(|r| r.get("0")),
        Some(&Value::from(1))
    );
    assert_eq!(next.pointer(&path("0")), Some(&Value::from(1)));
}
