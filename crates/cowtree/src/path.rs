//! Keys and paths for addressing inside value trees
//!
//! Provides [`Key`], a single step into a record or sequence, and
//! [`DraftPath`], a root-to-leaf list of keys.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// One step into a container
///
/// Records are addressed by field name, sequences by position. Mismatched
/// keys are coerced the way dynamic hosts do (see [`Key::as_field`] and
/// [`Key::as_index`]) unless strict keys are configured.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    /// Named record field
    Field(String),
    /// Sequence position
    Index(usize),
}

impl Key {
    /// Field name this key denotes on a record
    ///
    /// An index key names the field spelled as that integer.
    #[must_use]
    pub fn as_field(&self) -> String {
        match self {
            Self::Field(name) => name.clone(),
            Self::Index(index) => index.to_string(),
        }
    }

    /// Position this key denotes on a sequence
    ///
    /// A field key only denotes a position when it is a canonical
    /// non-negative integer (`"3"`, not `"03"` or `"+3"`).
    #[must_use]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(index) => Some(*index),
            Self::Field(name) => parse_canonical_index(name),
        }
    }
}

fn parse_canonical_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || (segment.len() > 1 && segment.starts_with('0')) {
        return None;
    }
    if !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => write!(f, "{name}"),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Self::Field(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Self::Field(name)
    }
}

impl From<&String> for Key {
    fn from(name: &String) -> Self {
        Self::Field(name.clone())
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

/// Path within a value tree
///
/// # Examples
/// - `["friends", 0, "name"]` → `friends.0.name`
/// - `["tags"]` → `tags`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DraftPath(Vec<Key>);

impl DraftPath {
    /// Create new path from keys
    #[inline]
    #[must_use]
    pub fn new(keys: Vec<Key>) -> Self {
        Self(keys)
    }

    /// Create path from a single key
    #[inline]
    #[must_use]
    pub fn single(key: impl Into<Key>) -> Self {
        Self(vec![key.into()])
    }

    /// Empty path (root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Get path keys
    #[inline]
    #[must_use]
    pub fn keys(&self) -> &[Key] {
        &self.0
    }

    /// Get number of keys
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is empty (root)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get parent path (if not root)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0
            .split_last()
            .map(|(_, init)| Self(init.to_vec()))
    }

    /// Get last key (if not root)
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&Key> {
        self.0.last()
    }

    /// Append a key, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, key: impl Into<Key>) -> Self {
        let mut new = self.clone();
        new.0.push(key.into());
        new
    }

    /// Check if this path is a prefix of another
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        other.0.starts_with(&self.0)
    }

    /// Iterator over keys from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Key> {
        self.0.iter()
    }
}

impl Display for DraftPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

impl FromStr for DraftPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        let keys: Vec<Key> = s
            .split('.')
            .map(|seg| {
                if seg.is_empty() {
                    Err(PathError::EmptySegment)
                } else if let Some(index) = parse_canonical_index(seg) {
                    Ok(Key::Index(index))
                } else {
                    Ok(Key::Field(seg.to_string()))
                }
            })
            .collect::<Result<_, _>>()?;

        Ok(Self(keys))
    }
}

impl From<Vec<Key>> for DraftPath {
    fn from(keys: Vec<Key>) -> Self {
        Self(keys)
    }
}

impl Default for DraftPath {
    fn default() -> Self {
        Self::root()
    }
}

/// Errors related to draft paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path
    #[error("path contains empty segment")]
    EmptySegment,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_coercion_to_field() {
        assert_eq!(Key::Index(3).as_field(), "3");
        assert_eq!(Key::from("name").as_field(), "name");
    }

    #[test]
    fn key_coercion_to_index() {
        assert_eq!(Key::from("7").as_index(), Some(7));
        assert_eq!(Key::from("07").as_index(), None);
        assert_eq!(Key::from("+7").as_index(), None);
        assert_eq!(Key::from("length").as_index(), None);
        assert_eq!(Key::from("0").as_index(), Some(0));
    }

    #[test]
    fn path_root() {
        let path = DraftPath::root();
        assert!(path.is_empty());
        assert!(path.parent().is_none());
    }

    #[test]
    fn path_parent_and_last() {
        let path: DraftPath = "friends.0.name".parse().unwrap();
        assert_eq!(path.last(), Some(&Key::from("name")));
        assert_eq!(path.parent().unwrap().to_string(), "friends.0");
    }

    #[test]
    fn path_from_str_splits_indices() {
        let path: DraftPath = "friends.1.name".parse().unwrap();
        assert_eq!(
            path.keys(),
            &[Key::from("friends"), Key::Index(1), Key::from("name")]
        );
    }

    #[test]
    fn path_from_str_keeps_non_canonical_numbers_as_fields() {
        let path: DraftPath = "a.01".parse().unwrap();
        assert_eq!(path.keys(), &[Key::from("a"), Key::from("01")]);
    }

    #[test]
    fn path_from_str_empty_segment() {
        let result: Result<DraftPath, _> = "a..b".parse();
        assert_eq!(result, Err(PathError::EmptySegment));
    }

    #[test]
    fn path_prefix() {
        let a: DraftPath = "a.b".parse().unwrap();
        let b: DraftPath = "a.b.c".parse().unwrap();
        assert!(a.is_prefix_of(&b));
        assert!(a.is_prefix_of(&a));
        assert!(!b.is_prefix_of(&a));
    }

    #[test]
    fn path_display_round_trips() {
        let path = DraftPath::single("friends").child(0usize).child("name");
        assert_eq!(path.to_string(), "friends.0.name");
        assert_eq!(path.to_string().parse::<DraftPath>().unwrap(), path);
    }
}
