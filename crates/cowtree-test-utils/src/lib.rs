//! Testing utilities for cowtree
//!
//! Fixtures, deep copies and sharing assertions for driving produce calls
//! the way an outside harness does: copy the input, produce, then check
//! that the input is untouched and the result carries every write.

#![allow(missing_docs)]

use cowtree::{produce, Draft, DraftPath, DraftResult, Value};
use std::sync::Arc;

/// Hero fixture as JSON text
pub const TEST_DATA_JSON: &str = include_str!("../fixtures/test_data.json");

pub fn test_data() -> Value {
    serde_json::from_str(TEST_DATA_JSON).unwrap()
}

/// Small record with a scalar, a sequence and a sequence of records
pub fn steve() -> Value {
    Value::from(serde_json::json!({
        "name": "Steve",
        "tags": ["a"],
        "friends": [{"name": "x"}, {"name": "y"}]
    }))
}

pub fn path(s: &str) -> DraftPath {
    s.parse().unwrap()
}

/// Copy every container into a fresh allocation
///
/// The copy is deep-equal to `value` and shares nothing with it.
pub fn deep_clone(value: &Value) -> Value {
    match value {
        Value::Record(record) => Value::Record(Arc::new(
            record
                .iter()
                .map(|(k, v)| (k.clone(), deep_clone(v)))
                .collect(),
        )),
        Value::Sequence(items) => Value::Sequence(Arc::new(items.iter().map(deep_clone).collect())),
        Value::Bytes(data) => Value::bytes(data),
        scalar => scalar.clone(),
    }
}

/// Assert `base` still deep-equals the copy taken before producing
pub fn assert_untouched(snapshot: &Value, base: &Value) {
    pretty_assertions::assert_eq!(snapshot, base, "base value was mutated");
}

/// Assert the container at `at` is the same allocation in both values
pub fn assert_shared(base: &Value, result: &Value, at: &str) {
    let p = path(at);
    let before = base.pointer(&p).unwrap_or_else(|| panic!("{at} missing in base"));
    let after = result.pointer(&p).unwrap_or_else(|| panic!("{at} missing in result"));
    assert!(after.ptr_eq(before), "{at} should be shared with the base");
}

/// Assert the container at `at` was reallocated
pub fn assert_rebuilt(base: &Value, result: &Value, at: &str) {
    let p = path(at);
    let before = base.pointer(&p).unwrap_or_else(|| panic!("{at} missing in base"));
    let after = result.pointer(&p).unwrap_or_else(|| panic!("{at} missing in result"));
    assert!(!after.ptr_eq(before), "{at} should be rebuilt");
}

/// Hero edits: rename, set gender, tag, and rename the first two friends
pub fn hero_producer(draft: &mut Draft<'_>) -> DraftResult<()> {
    draft.set("name", "Captain America")?;
    draft.set("gender", "male")?;
    if let Some(mut tags) = draft.child("tags")? {
        tags.push("super hero")?;
    }
    draft.set_at(&path("friends.0.name"), "Iron Man")?;
    draft.set_at(&path("friends.1.name"), "Thor")
}

/// Whether `result` carries every hero edit
pub fn is_hero_result_right(result: &Value) -> bool {
    let text = |at: &str| result.pointer(&path(at)).and_then(Value::as_str).map(str::to_owned);
    let tagged = result
        .pointer(&path("tags"))
        .and_then(Value::as_sequence)
        .is_some_and(|tags| tags.iter().any(|t| t.as_str() == Some("super hero")));

    text("name").as_deref() == Some("Captain America")
        && text("gender").as_deref() == Some("male")
        && tagged
        && text("friends.0.name").as_deref() == Some("Iron Man")
        && text("friends.1.name").as_deref() == Some("Thor")
}

/// Outcome of the hero scenario
#[derive(Debug, Clone)]
pub struct HeroOutcome {
    pub base: Value,
    pub result: Value,
    pub untouched: bool,
    pub result_right: bool,
}

impl HeroOutcome {
    pub fn passed(&self) -> bool {
        self.untouched && self.result_right
    }
}

/// Copy the fixture, apply the hero edits, and check both sides
pub fn run_hero_scenario(base: &Value) -> DraftResult<HeroOutcome> {
    let snapshot = deep_clone(base);
    let result = produce(base, hero_producer)?;
    Ok(HeroOutcome {
        base: base.clone(),
        untouched: snapshot == *base,
        result_right: is_hero_result_right(&result),
        result,
    })
}
