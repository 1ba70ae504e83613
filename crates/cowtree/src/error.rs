//! Error types for draft operations

use crate::draft::DraftId;
use crate::path::PathError;
use crate::value::ValueKind;

/// Errors raised while reading or writing through a draft
///
/// Every documented operation is total over well-formed input; these
/// variants cover input the host type system cannot rule out.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DraftError {
    /// Only records and sequences can be drafted
    #[error("cannot draft a {kind} value")]
    NotDraftable {
        /// Kind of the rejected value
        kind: ValueKind,
    },

    /// Key kind does not address this container
    #[error("key '{key}' does not address a {kind}")]
    UnsupportedKey {
        /// Key as written
        key: String,
        /// Kind of the addressed container
        kind: ValueKind,
    },

    /// Sequence write would leave a gap
    #[error("index {index} out of range for sequence of length {len}")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Current sequence length
        len: usize,
    },

    /// Draft id does not belong to this produce call
    #[error("unknown draft {0}")]
    UnknownDraft(DraftId),

    /// Draft was placed somewhere below itself
    #[error("draft {0} contains itself")]
    CyclicDraft(DraftId),

    /// Path traversal failed
    #[error("path error: {0}")]
    Path(#[from] PathError),

    /// Path does not lead to a draftable value
    #[error("no draftable value at '{0}'")]
    MissingPath(String),
}

impl DraftError {
    /// Create an unsupported key error
    #[inline]
    pub(crate) fn unsupported_key(key: impl ToString, kind: ValueKind) -> Self {
        Self::UnsupportedKey {
            key: key.to_string(),
            kind,
        }
    }
}

/// Result alias for draft operations
pub type DraftResult<T> = Result<T, DraftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_kind() {
        let err = DraftError::NotDraftable {
            kind: ValueKind::String,
        };
        assert_eq!(err.to_string(), "cannot draft a string value");

        let err = DraftError::unsupported_key("length", ValueKind::Sequence);
        assert_eq!(err.to_string(), "key 'length' does not address a sequence");
    }

    #[test]
    fn path_errors_convert() {
        let err: DraftError = PathError::EmptySegment.into();
        assert!(matches!(err, DraftError::Path(PathError::EmptySegment)));
    }
}
