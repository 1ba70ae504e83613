//! Finalization of draft trees into immutable values

use crate::draft::{DraftId, DraftTree, Pending, Slot};
use crate::error::{DraftError, DraftResult};
use crate::value::{Record, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// How much of a tree finalization had to rebuild
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FinalizeStats {
    /// Drafts materialized into new containers
    pub rebuilt: usize,
    /// Drafts resolved to their untouched base
    pub reused: usize,
}

/// Resolve the draft `root` into an immutable value
///
/// Unmodified drafts return their base by reference. Modified drafts become
/// a fresh container of the same kind, with nested drafts resolved
/// recursively. Subtrees that were never drafted are never visited.
///
/// # Errors
/// Returns `CyclicDraft` if a draft was moved somewhere below itself
pub(crate) fn finalize(tree: &DraftTree, root: DraftId) -> DraftResult<(Value, FinalizeStats)> {
    let mut finalizer = Finalizer {
        tree,
        resolved: HashMap::new(),
        visiting: HashSet::new(),
        stats: FinalizeStats::default(),
    };
    let value = finalizer.resolve(root)?;
    Ok((value, finalizer.stats))
}

struct Finalizer<'a> {
    tree: &'a DraftTree,
    // a draft moved to several places resolves to one shared value
    resolved: HashMap<DraftId, Value>,
    visiting: HashSet<DraftId>,
    stats: FinalizeStats,
}

impl Finalizer<'_> {
    fn resolve(&mut self, id: DraftId) -> DraftResult<Value> {
        if let Some(value) = self.resolved.get(&id) {
            return Ok(value.clone());
        }
        if !self.visiting.insert(id) {
            return Err(DraftError::CyclicDraft(id));
        }

        let tree = self.tree;
        let node = tree.node(id)?;
        let value = match node.pending.as_ref() {
            Some(pending) if node.modified => {
                self.stats.rebuilt += 1;
                match pending {
                    Pending::Record(entries) => {
                        let mut record = Record::with_capacity(entries.len());
                        for (key, slot) in entries {
                            record.insert(key.clone(), self.resolve_slot(slot)?);
                        }
                        Value::Record(Arc::new(record))
                    }
                    Pending::Sequence(items) => {
                        let mut sequence = Vec::with_capacity(items.len());
                        for slot in items {
                            sequence.push(self.resolve_slot(slot)?);
                        }
                        Value::Sequence(Arc::new(sequence))
                    }
                }
            }
            _ => {
                self.stats.reused += 1;
                node.base.clone()
            }
        };

        self.visiting.remove(&id);
        self.resolved.insert(id, value.clone());
        Ok(value)
    }

    fn resolve_slot(&mut self, slot: &Slot) -> DraftResult<Value> {
        match slot {
            Slot::Value(value) => Ok(value.clone()),
            Slot::Draft(child) => self.resolve(*child),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProduceConfig;
    use crate::path::Key;
    use serde_json::json;

    #[test]
    fn unmodified_root_returns_base_by_reference() {
        let base = Value::from(json!({"a": {"b": 1}}));
        let mut tree = DraftTree::new(ProduceConfig::default());
        let root = tree.create(None, base.clone()).unwrap();
        tree.read(root, &Key::from("a")).unwrap();

        let (value, stats) = finalize(&tree, root).unwrap();
        assert!(value.ptr_eq(&base));
        assert_eq!(stats, FinalizeStats { rebuilt: 0, reused: 1 });
    }

    #[test]
    fn modified_root_is_rebuilt_and_untouched_children_shared() {
        let base = Value::from(json!({"a": {"b": 1}, "c": {"d": 2}, "n": 0}));
        let mut tree = DraftTree::new(ProduceConfig::default());
        let root = tree.create(None, base.clone()).unwrap();
        tree.read(root, &Key::from("a")).unwrap();
        tree.write(root, &Key::from("n"), Slot::from(1)).unwrap();

        let (value, stats) = finalize(&tree, root).unwrap();
        assert!(!value.ptr_eq(&base));
        assert_eq!(value.get(&Key::from("n")), Some(&Value::from(1)));
        for key in ["a", "c"] {
            let key = Key::from(key);
            assert!(value.get(&key).unwrap().ptr_eq(base.get(&key).unwrap()));
        }
        // root rebuilt, "a" drafted but unmodified; "c" never drafted
        assert_eq!(stats, FinalizeStats { rebuilt: 1, reused: 1 });
    }

    #[test]
    fn sequence_shape_is_preserved() {
        let base = Value::from(json!(["a"]));
        let mut tree = DraftTree::new(ProduceConfig::default());
        let root = tree.create(None, base).unwrap();
        tree.write(root, &Key::Index(1), Slot::from("b")).unwrap();

        let (value, _) = finalize(&tree, root).unwrap();
        assert_eq!(value, Value::from(json!(["a", "b"])));
    }

    #[test]
    fn record_insertion_order_is_preserved() {
        let base = Value::from(json!({"z": 1, "a": 2}));
        let mut tree = DraftTree::new(ProduceConfig::default());
        let root = tree.create(None, base).unwrap();
        tree.write(root, &Key::from("m"), Slot::from(3)).unwrap();
        tree.write(root, &Key::from("z"), Slot::from(0)).unwrap();

        let (value, _) = finalize(&tree, root).unwrap();
        let keys: Vec<String> = value.keys().iter().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn moved_draft_resolves_once() {
        let base = Value::from(json!({"a": {"x": 1}}));
        let mut tree = DraftTree::new(ProduceConfig::default());
        let root = tree.create(None, base).unwrap();
        let a = tree.read(root, &Key::from("a")).unwrap().unwrap();
        let a_id = a.as_draft().unwrap();
        tree.write(a_id, &Key::from("x"), Slot::from(2)).unwrap();
        tree.write(root, &Key::from("b"), a).unwrap();

        let (value, stats) = finalize(&tree, root).unwrap();
        let first = value.get(&Key::from("a")).unwrap();
        let second = value.get(&Key::from("b")).unwrap();
        assert!(first.ptr_eq(second));
        assert_eq!(stats.rebuilt, 2);
    }

    #[test]
    fn draft_moved_below_itself_is_a_cycle() {
        let base = Value::from(json!({"a": {"x": 1}}));
        let mut tree = DraftTree::new(ProduceConfig::default());
        let root = tree.create(None, base).unwrap();
        let a = tree.read(root, &Key::from("a")).unwrap().unwrap();
        let a_id = a.as_draft().unwrap();
        tree.write(a_id, &Key::from("up"), Slot::Draft(root)).unwrap();

        let err = finalize(&tree, root).unwrap_err();
        assert_eq!(err, DraftError::CyclicDraft(root));
    }
}
