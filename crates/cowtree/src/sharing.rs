//! Structural sharing inspection
//!
//! Compares a produced value against its base and classifies every
//! container in the result by whether it was reused or reallocated.

use crate::path::DraftPath;
use crate::value::Value;
use std::fmt::{self, Display, Formatter};

/// How a container in the result relates to the base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sharing {
    /// Same allocation as the base container at this path
    Shared,
    /// New allocation replacing a same-kind container at this path
    Rebuilt,
    /// No same-kind container at this path in the base
    Added,
}

impl Sharing {
    /// Lowercase name for reports
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Shared => "shared",
            Self::Rebuilt => "rebuilt",
            Self::Added => "added",
        }
    }
}

impl Display for Sharing {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Per-path sharing classification of a produced value
///
/// Shared containers are not descended into: everything below them is
/// shared as well.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharingReport {
    entries: Vec<(DraftPath, Sharing)>,
}

impl SharingReport {
    /// Classify every container reachable in `result`
    #[must_use]
    pub fn compare(base: &Value, result: &Value) -> Self {
        let mut report = Self::default();
        report.walk(DraftPath::root(), Some(base), result);
        report
    }

    fn walk(&mut self, path: DraftPath, base: Option<&Value>, result: &Value) {
        if !result.is_draftable() {
            return;
        }
        match base {
            Some(base) if base.ptr_eq(result) => self.entries.push((path, Sharing::Shared)),
            Some(base) if base.kind() == result.kind() => {
                for key in result.keys() {
                    if let Some(child) = result.get(&key) {
                        self.walk(path.child(key.clone()), base.get(&key), child);
                    }
                }
                self.entries.push((path, Sharing::Rebuilt));
            }
            _ => self.entries.push((path, Sharing::Added)),
        }
    }

    /// All classified paths, children before parents
    #[must_use]
    pub fn entries(&self) -> &[(DraftPath, Sharing)] {
        &self.entries
    }

    /// Classification of the container at `path`, if one was classified
    #[must_use]
    pub fn sharing_at(&self, path: &DraftPath) -> Option<Sharing> {
        self.entries
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, sharing)| *sharing)
    }

    /// Paths with the given classification
    pub fn paths(&self, sharing: Sharing) -> impl Iterator<Item = &DraftPath> {
        self.entries
            .iter()
            .filter(move |(_, s)| *s == sharing)
            .map(|(p, _)| p)
    }

    /// Number of paths with the given classification
    #[must_use]
    pub fn count(&self, sharing: Sharing) -> usize {
        self.paths(sharing).count()
    }

    /// Whether the result is the base itself
    #[must_use]
    pub fn is_identical(&self) -> bool {
        self.sharing_at(&DraftPath::root()) == Some(Sharing::Shared)
    }
}

impl Display for SharingReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (path, sharing) in &self.entries {
            if path.is_empty() {
                writeln!(f, "{sharing:<8} (root)")?;
            } else {
                writeln!(f, "{sharing:<8} {path}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Key;
    use serde_json::json;
    use std::sync::Arc;

    fn path(s: &str) -> DraftPath {
        s.parse().unwrap()
    }

    #[test]
    fn identical_value_is_one_shared_entry() {
        let base = Value::from(json!({"a": {"b": 1}}));
        let report = SharingReport::compare(&base, &base.clone());
        assert!(report.is_identical());
        assert_eq!(report.entries().len(), 1);
    }

    #[test]
    fn rebuilt_path_and_shared_siblings() {
        let base = Value::from(json!({"a": {"b": 1}, "c": {"d": 2}}));
        let Value::Record(record) = &base else {
            unreachable!()
        };
        let mut next = (**record).clone();
        next.insert("a".into(), Value::from(json!({"b": 2})));
        next.insert("e".into(), Value::from(json!([1])));
        let result = Value::Record(Arc::new(next));

        let report = SharingReport::compare(&base, &result);
        assert_eq!(report.sharing_at(&DraftPath::root()), Some(Sharing::Rebuilt));
        assert_eq!(report.sharing_at(&path("a")), Some(Sharing::Rebuilt));
        assert_eq!(report.sharing_at(&path("c")), Some(Sharing::Shared));
        assert_eq!(report.sharing_at(&path("e")), Some(Sharing::Added));
        assert_eq!(report.count(Sharing::Rebuilt), 2);
        assert!(!report.is_identical());
    }

    #[test]
    fn kind_change_counts_as_added() {
        let base = Value::from(json!({"a": {"b": 1}}));
        let result = Value::record([("a", Value::sequence([1]))]);
        let report = SharingReport::compare(&base, &result);
        assert_eq!(report.sharing_at(&DraftPath::single(Key::from("a"))), Some(Sharing::Added));
    }

    #[test]
    fn display_lists_paths() {
        let base = Value::from(json!({"a": {}}));
        let report = SharingReport::compare(&base, &base);
        assert_eq!(report.to_string(), "shared   (root)\n");
    }
}
