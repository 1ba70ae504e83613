//! Draft tree manager
//!
//! A [`DraftTree`] is the arena behind one produce call. Each visited
//! container gets a [`DraftNode`] holding its base value, a parent link, the
//! `modified` flag, a pending copy (once modified) and a cache of child
//! drafts (while unmodified). Producers never see the arena directly; they
//! read and write through a [`Draft`] handle.
//!
//! # Invariants
//! - Base values are never mutated
//! - `modified` is monotone and, once set on a node, is set on every ancestor
//! - Unmodified nodes copy nothing; reads only populate the child cache
//! - Modified nodes serve every read from their pending copy

use crate::config::ProduceConfig;
use crate::error::{DraftError, DraftResult};
use crate::path::{DraftPath, Key};
use crate::value::{Value, ValueKind};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ARENA: AtomicU64 = AtomicU64::new(0);

/// Identity of a draft within one produce call
///
/// Ids carry the arena they were issued by; any other arena, including one
/// of a nested produce call, rejects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DraftId {
    arena: u64,
    index: usize,
}

impl DraftId {
    /// Position in the issuing arena
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }
}

impl Display for DraftId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.arena, self.index)
    }
}

/// Entry read from or written into a draft
///
/// `Slot::Draft` is the out-of-band marker that tells a nested draft apart
/// from data: drafts never appear inside a [`Value`], so no data key or
/// value can be mistaken for one.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// Concrete value (scalar, opaque leaf, or replaced container)
    Value(Value),
    /// Nested draft of the same produce call
    Draft(DraftId),
}

impl Slot {
    /// Concrete value, if this is not a draft
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Draft(_) => None,
        }
    }

    /// Draft id, if this is a draft
    #[must_use]
    pub fn as_draft(&self) -> Option<DraftId> {
        match self {
            Self::Draft(id) => Some(*id),
            Self::Value(_) => None,
        }
    }

    /// Consume into the concrete value, if this is not a draft
    #[must_use]
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Draft(_) => None,
        }
    }

    /// Whether this is a nested draft
    #[must_use]
    pub fn is_draft(&self) -> bool {
        matches!(self, Self::Draft(_))
    }
}

impl From<DraftId> for Slot {
    fn from(id: DraftId) -> Self {
        Self::Draft(id)
    }
}

macro_rules! slot_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Slot {
                fn from(value: $ty) -> Self {
                    Self::Value(Value::from(value))
                }
            }
        )*
    };
}

slot_from_value!(Value, bool, f64, i64, i32, u32, usize, &str, String, Vec<Value>);

impl From<&Value> for Slot {
    fn from(value: &Value) -> Self {
        Self::Value(value.clone())
    }
}

/// Copy of a modified node's entries
#[derive(Debug, Clone)]
pub(crate) enum Pending {
    Record(IndexMap<String, Slot>),
    Sequence(Vec<Slot>),
}

impl Pending {
    /// Shallow copy of every own entry of `base`
    fn shallow_copy(base: &Value) -> Self {
        match base {
            Value::Sequence(items) => {
                Self::Sequence(items.iter().cloned().map(Slot::Value).collect())
            }
            Value::Record(record) => Self::Record(
                record
                    .iter()
                    .map(|(k, v)| (k.clone(), Slot::Value(v.clone())))
                    .collect(),
            ),
            _ => Self::Record(IndexMap::new()),
        }
    }

    fn get(&self, key: &Key) -> Option<&Slot> {
        match (self, key) {
            (Self::Record(entries), Key::Field(name)) => entries.get(name),
            (Self::Sequence(items), Key::Index(index)) => items.get(*index),
            _ => None,
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Record(entries) => entries.len(),
            Self::Sequence(items) => items.len(),
        }
    }

    fn keys(&self) -> Vec<Key> {
        match self {
            Self::Record(entries) => entries.keys().map(Key::from).collect(),
            Self::Sequence(items) => (0..items.len()).map(Key::Index).collect(),
        }
    }

    /// Store `slot` under a normalized key
    ///
    /// Record keys keep their position when replaced. Sequence writes at or
    /// past the end extend the sequence, padding any gap with null.
    fn store(&mut self, key: Key, slot: Slot) {
        match (self, key) {
            (Self::Record(entries), Key::Field(name)) => {
                entries.insert(name, slot);
            }
            (Self::Sequence(items), Key::Index(index)) => {
                if index < items.len() {
                    items[index] = slot;
                } else {
                    items.resize(index, Slot::Value(Value::Null));
                    items.push(slot);
                }
            }
            // keys are normalized against the node kind before storing
            _ => {}
        }
    }
}

/// Bookkeeping for one visited container
#[derive(Debug)]
pub(crate) struct DraftNode {
    pub(crate) base: Value,
    pub(crate) parent: Option<DraftId>,
    pub(crate) modified: bool,
    pub(crate) pending: Option<Pending>,
    children: HashMap<Key, DraftId>,
}

impl DraftNode {
    fn kind(&self) -> ValueKind {
        self.base.kind()
    }

    fn len(&self) -> usize {
        self.pending.as_ref().map_or_else(|| self.base.len(), Pending::len)
    }

    fn keys(&self) -> Vec<Key> {
        self.pending
            .as_ref()
            .map_or_else(|| self.base.keys(), Pending::keys)
    }
}

/// Arena of drafts for one produce call
#[derive(Debug)]
pub(crate) struct DraftTree {
    arena: u64,
    nodes: Vec<DraftNode>,
    config: ProduceConfig,
}

impl DraftTree {
    pub(crate) fn new(config: ProduceConfig) -> Self {
        Self {
            arena: NEXT_ARENA.fetch_add(1, Ordering::Relaxed),
            nodes: Vec::new(),
            config,
        }
    }

    /// Number of drafts created so far
    pub(crate) fn draft_count(&self) -> usize {
        self.nodes.len()
    }

    /// Allocate a draft over `base` without visiting its contents
    ///
    /// # Errors
    /// Returns `NotDraftable` if `base` is not a record or sequence
    pub(crate) fn create(&mut self, parent: Option<DraftId>, base: Value) -> DraftResult<DraftId> {
        let kind = base.kind();
        if !kind.is_draftable() {
            return Err(DraftError::NotDraftable { kind });
        }
        let id = DraftId {
            arena: self.arena,
            index: self.nodes.len(),
        };
        self.nodes.push(DraftNode {
            base,
            parent,
            modified: false,
            pending: None,
            children: HashMap::new(),
        });
        tracing::trace!(draft = %id, parent = ?parent, %kind, "draft created");
        Ok(id)
    }

    pub(crate) fn node(&self, id: DraftId) -> DraftResult<&DraftNode> {
        self.nodes
            .get(id.index)
            .filter(|_| id.arena == self.arena)
            .ok_or(DraftError::UnknownDraft(id))
    }

    fn node_mut(&mut self, id: DraftId) -> DraftResult<&mut DraftNode> {
        if id.arena != self.arena {
            return Err(DraftError::UnknownDraft(id));
        }
        self.nodes.get_mut(id.index).ok_or(DraftError::UnknownDraft(id))
    }

    /// Normalize `key` against a node kind
    ///
    /// Returns `None` when the key cannot address the container.
    fn normalize(&self, kind: ValueKind, key: &Key) -> Option<Key> {
        match (kind, key) {
            (ValueKind::Record, Key::Field(_)) | (ValueKind::Sequence, Key::Index(_)) => {
                Some(key.clone())
            }
            _ if self.config.strict_keys => None,
            (ValueKind::Record, Key::Index(_)) => Some(Key::Field(key.as_field())),
            (ValueKind::Sequence, Key::Field(_)) => key.as_index().map(Key::Index),
            _ => None,
        }
    }

    /// Read `key` through the draft `id`
    ///
    /// Draftable entries come back as child drafts, created on first read
    /// and reused afterwards. Everything else comes back as a value.
    ///
    /// # Errors
    /// Returns `UnsupportedKey` for a mismatched key under strict keys
    pub(crate) fn read(&mut self, id: DraftId, key: &Key) -> DraftResult<Option<Slot>> {
        let kind = self.node(id)?.kind();
        let Some(key) = self.normalize(kind, key) else {
            if self.config.strict_keys {
                return Err(DraftError::unsupported_key(key, kind));
            }
            return Ok(None);
        };

        let node = self.node(id)?;
        if node.modified {
            let value = match node.pending.as_ref().and_then(|p| p.get(&key)) {
                None => return Ok(None),
                Some(Slot::Draft(child)) => return Ok(Some(Slot::Draft(*child))),
                Some(Slot::Value(value)) => value,
            };
            let untouched = value.is_draftable()
                && node.base.get(&key).is_some_and(|base| base.same_value(value));
            if !untouched {
                return Ok(Some(Slot::Value(value.clone())));
            }
            let value = value.clone();
            let child = self.create(Some(id), value)?;
            if let Some(pending) = self.node_mut(id)?.pending.as_mut() {
                pending.store(key, Slot::Draft(child));
            }
            return Ok(Some(Slot::Draft(child)));
        }

        if let Some(child) = node.children.get(&key) {
            return Ok(Some(Slot::Draft(*child)));
        }
        let value = match node.base.get(&key) {
            None => return Ok(None),
            Some(value) if !value.is_draftable() => return Ok(Some(Slot::Value(value.clone()))),
            Some(value) => value.clone(),
        };
        let child = self.create(Some(id), value)?;
        self.node_mut(id)?.children.insert(key, child);
        Ok(Some(Slot::Draft(child)))
    }

    /// Write `slot` under `key` through the draft `id`
    ///
    /// A write that leaves the entry identical to the base (or re-stores the
    /// cached child draft) is dropped without marking anything.
    ///
    /// # Errors
    /// - `UnsupportedKey` if the key cannot address the container
    /// - `IndexOutOfRange` for a gap-leaving sequence write, unless sparse
    ///   writes are on and the gap is within `max_sparse_gap`
    /// - `UnknownDraft` if `slot` names a draft outside this call
    pub(crate) fn write(&mut self, id: DraftId, key: &Key, slot: Slot) -> DraftResult<()> {
        if let Slot::Draft(target) = slot {
            self.node(target)?;
        }
        let node = self.node(id)?;
        let kind = node.kind();
        let key = self
            .normalize(kind, key)
            .ok_or_else(|| DraftError::unsupported_key(key, kind))?;

        if let Key::Index(index) = key {
            let len = node.len();
            if !self.config.permits_index(index, len) {
                return Err(DraftError::IndexOutOfRange { index, len });
            }
        }

        if !node.modified {
            let unchanged = match &slot {
                Slot::Value(value) => node.base.get(&key).is_some_and(|base| base.same_value(value)),
                Slot::Draft(draft) => node.children.get(&key) == Some(draft),
            };
            if unchanged {
                tracing::trace!(draft = %id, %key, "write suppressed");
                return Ok(());
            }
            self.mark_changed(id)?;
        }

        if let Some(pending) = self.node_mut(id)?.pending.as_mut() {
            pending.store(key, slot);
        }
        Ok(())
    }

    /// Mark `id` and every unmodified ancestor as modified
    ///
    /// Each newly marked node gets a shallow copy of its base with cached
    /// child drafts laid over it. Stops at the first ancestor that is
    /// already modified, so a write at depth k costs at most k copies.
    ///
    /// # Errors
    /// Returns `UnknownDraft` if `id` is not in this arena
    pub(crate) fn mark_changed(&mut self, id: DraftId) -> DraftResult<()> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.node_mut(current)?;
            if node.modified {
                break;
            }
            let mut pending = Pending::shallow_copy(&node.base);
            for (key, child) in node.children.drain() {
                pending.store(key, Slot::Draft(child));
            }
            node.pending = Some(pending);
            node.modified = true;
            tracing::trace!(draft = %current, "copied on write");
            cursor = node.parent;
        }
        Ok(())
    }
}

/// Mutable view of one draft, handed to producers
///
/// All producer-visible access goes through [`Draft::get`] and
/// [`Draft::set`]. The handle borrows the produce call's arena, so it
/// cannot outlive the producer.
#[derive(Debug)]
pub struct Draft<'t> {
    tree: &'t mut DraftTree,
    id: DraftId,
}

impl<'t> Draft<'t> {
    pub(crate) fn new(tree: &'t mut DraftTree, id: DraftId) -> Self {
        Self { tree, id }
    }

    fn node(&self) -> &DraftNode {
        // handles are only built for ids issued by this arena
        &self.tree.nodes[self.id.index]
    }

    /// Identity of this draft, usable as a [`Slot`] to move it elsewhere
    #[inline]
    #[must_use]
    pub fn id(&self) -> DraftId {
        self.id
    }

    /// Container kind of the wrapped value
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        self.node().kind()
    }

    /// The untouched value this draft wraps
    #[must_use]
    pub fn base(&self) -> &Value {
        &self.node().base
    }

    /// Whether this draft (or anything below it) has been written
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.node().modified
    }

    /// Current number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.node().len()
    }

    /// Whether the draft currently has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current keys in iteration order
    #[must_use]
    pub fn keys(&self) -> Vec<Key> {
        self.node().keys()
    }

    /// Whether `key` currently holds an entry
    #[must_use]
    pub fn contains_key(&self, key: impl Into<Key>) -> bool {
        let node = self.node();
        self.tree
            .normalize(node.kind(), &key.into())
            .is_some_and(|key| match &node.pending {
                Some(pending) => pending.get(&key).is_some(),
                None => node.base.contains_key(&key),
            })
    }

    /// Read an entry
    ///
    /// Nested records and sequences come back as `Slot::Draft`, drafted on
    /// first access. Returns `None` for absent keys.
    ///
    /// # Errors
    /// Returns `UnsupportedKey` for a mismatched key under strict keys
    pub fn get(&mut self, key: impl Into<Key>) -> DraftResult<Option<Slot>> {
        self.tree.read(self.id, &key.into())
    }

    /// Read an entry and open it as a nested draft
    ///
    /// Returns `None` if the entry is absent or not a record or sequence.
    ///
    /// # Errors
    /// Returns `UnsupportedKey` for a mismatched key under strict keys
    pub fn child(&mut self, key: impl Into<Key>) -> DraftResult<Option<Draft<'_>>> {
        match self.tree.read(self.id, &key.into())? {
            Some(Slot::Draft(id)) => Ok(Some(Draft::new(&mut *self.tree, id))),
            _ => Ok(None),
        }
    }

    /// Open the nested draft at `path`, drafting each step on the way
    ///
    /// # Errors
    /// Returns `UnsupportedKey` for a mismatched key under strict keys
    pub fn at(&mut self, path: &DraftPath) -> DraftResult<Option<Draft<'_>>> {
        let mut id = self.id;
        for key in path.iter() {
            match self.tree.read(id, key)? {
                Some(Slot::Draft(child)) => id = child,
                _ => return Ok(None),
            }
        }
        Ok(Some(Draft::new(&mut *self.tree, id)))
    }

    /// Re-open another draft of the same produce call
    ///
    /// # Errors
    /// Returns `UnknownDraft` if `id` was not issued by this call
    pub fn open(&mut self, id: DraftId) -> DraftResult<Draft<'_>> {
        self.tree.node(id)?;
        Ok(Draft::new(&mut *self.tree, id))
    }

    /// Write an entry
    ///
    /// Writing a value identical to the base entry is a no-op. On sequences,
    /// writing at `len()` appends.
    ///
    /// # Errors
    /// - `UnsupportedKey` if the key cannot address this container
    /// - `IndexOutOfRange` for a gap-leaving sequence write without sparse writes
    /// - `UnknownDraft` if `value` names a draft outside this call
    pub fn set(&mut self, key: impl Into<Key>, value: impl Into<Slot>) -> DraftResult<()> {
        self.tree.write(self.id, &key.into(), value.into())
    }

    /// Write the entry at `path`, drafting the parents on the way
    ///
    /// # Errors
    /// Returns `MissingPath` if `path` is the root or its parent is not a
    /// record or sequence, plus anything [`Draft::set`] returns.
    pub fn set_at(&mut self, path: &DraftPath, value: impl Into<Slot>) -> DraftResult<()> {
        let (Some(last), Some(parent)) = (path.last(), path.parent()) else {
            return Err(DraftError::MissingPath(path.to_string()));
        };
        let mut target = self
            .at(&parent)?
            .ok_or_else(|| DraftError::MissingPath(parent.to_string()))?;
        target.set(last, value)
    }

    /// Append to a sequence: an indexed write at `len()`
    ///
    /// # Errors
    /// Returns `UnsupportedKey` if this draft is not a sequence
    pub fn push(&mut self, value: impl Into<Slot>) -> DraftResult<()> {
        if self.kind() != ValueKind::Sequence {
            return Err(DraftError::unsupported_key(Key::Index(self.len()), self.kind()));
        }
        let index = self.len();
        self.set(index, value)
    }
}
