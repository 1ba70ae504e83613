//! cowtree
//!
//! Structural-sharing immutable updates. A producer mutates a draft of an
//! immutable [`Value`] with ordinary reads and writes; the result is a new
//! value that shares every untouched subtree with the base by reference.
//!
//! # Core Concepts
//!
//! - [`Value`]: immutable tree of records, sequences and leaves
//! - [`Draft`]: mutable view handed to producers; nested containers are
//!   drafted lazily on first read and copied on first write
//! - [`produce`] / [`Producer`]: draft, run the producer, finalize
//! - [`SharingReport`]: which containers the result shares with its base
//!
//! # Example
//!
//! ```
//! use cowtree::{produce, DraftPath, Value};
//! use serde_json::json;
//!
//! let base = Value::from(json!({
//!     "name": "Steve",
//!     "friends": [{"name": "x"}, {"name": "y"}]
//! }));
//!
//! let next = produce(&base, |draft| {
//!     draft.set("name", "Bob")?;
//!     draft.set_at(&"friends.0.name".parse()?, "z")
//! })
//! .unwrap();
//!
//! let second: DraftPath = "friends.1".parse().unwrap();
//! assert!(next.pointer(&second).unwrap().ptr_eq(base.pointer(&second).unwrap()));
//! assert_eq!(base.pointer(&"name".parse().unwrap()), Some(&Value::from("Steve")));
//! ```

mod config;
mod draft;
mod error;
mod finalize;
mod path;
mod produce;
mod sharing;
mod value;

// Re-exports
pub use config::ProduceConfig;
pub use draft::{Draft, DraftId, Slot};
pub use error::{DraftError, DraftResult};
pub use finalize::FinalizeStats;
pub use path::{DraftPath, Key, PathError};
pub use produce::{produce, try_produce, Producer};
pub use sharing::{Sharing, SharingReport};
pub use value::{Record, Sequence, Value, ValueKind};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
