//! Produce entry points
//!
//! A produce call wraps the base in a root draft, runs the producer against
//! it, and finalizes the root. The draft arena lives exactly as long as the
//! call.

use crate::config::ProduceConfig;
use crate::draft::{Draft, DraftTree};
use crate::error::{DraftError, DraftResult};
use crate::finalize::{finalize, FinalizeStats};
use crate::value::Value;

/// Configured produce entry point
///
/// # Example
///
/// ```
/// use cowtree::{ProduceConfig, Producer, Value};
/// use serde_json::json;
///
/// let base = Value::from(json!({"tags": ["a"]}));
/// let producer = Producer::new(ProduceConfig::new().with_strict_keys(true));
///
/// let next = producer
///     .produce(&base, |draft| {
///         let mut tags = draft.child("tags")?.expect("tags is a sequence");
///         tags.push("b")
///     })
///     .unwrap();
///
/// assert_eq!(next, Value::from(json!({"tags": ["a", "b"]})));
/// assert_eq!(base, Value::from(json!({"tags": ["a"]})));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Producer {
    config: ProduceConfig,
}

impl Producer {
    /// Create producer with configuration
    #[inline]
    #[must_use]
    pub fn new(config: ProduceConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ProduceConfig {
        &self.config
    }

    /// Apply `producer` to a draft of `base` and return the next value
    ///
    /// The result is `base` itself (by reference) when nothing changed.
    ///
    /// # Errors
    /// Returns `NotDraftable` for a scalar base, `CyclicDraft` if a draft
    /// was moved below itself, or whatever the producer returns
    pub fn produce<F>(&self, base: &Value, producer: F) -> DraftResult<Value>
    where
        F: FnOnce(&mut Draft<'_>) -> DraftResult<()>,
    {
        self.try_produce(base, producer)
    }

    /// [`Producer::produce`] for producers with their own error type
    ///
    /// # Errors
    /// Returns the producer's error, or a converted [`DraftError`]
    pub fn try_produce<F, E>(&self, base: &Value, producer: F) -> Result<Value, E>
    where
        F: FnOnce(&mut Draft<'_>) -> Result<(), E>,
        E: From<DraftError>,
    {
        self.produce_with_stats(base, producer).map(|(value, _)| value)
    }

    /// [`Producer::try_produce`], also reporting how much was rebuilt
    ///
    /// # Errors
    /// Returns the producer's error, or a converted [`DraftError`]
    pub fn produce_with_stats<F, E>(
        &self,
        base: &Value,
        producer: F,
    ) -> Result<(Value, FinalizeStats), E>
    where
        F: FnOnce(&mut Draft<'_>) -> Result<(), E>,
        E: From<DraftError>,
    {
        let mut tree = DraftTree::new(self.config);
        let root = tree.create(None, base.clone())?;

        producer(&mut Draft::new(&mut tree, root))?;

        let (value, stats) = finalize(&tree, root)?;
        tracing::debug!(
            drafts = tree.draft_count(),
            rebuilt = stats.rebuilt,
            reused = stats.reused,
            unchanged = value.ptr_eq(base),
            "produce finished"
        );
        Ok((value, stats))
    }
}

/// Apply `producer` to a draft of `base` with the default configuration
///
/// # Errors
/// Returns `NotDraftable` for a scalar base, or whatever the producer returns
pub fn produce<F>(base: &Value, producer: F) -> DraftResult<Value>
where
    F: FnOnce(&mut Draft<'_>) -> DraftResult<()>,
{
    Producer::default().produce(base, producer)
}

/// [`produce`] for producers with their own error type
///
/// # Errors
/// Returns the producer's error, or a converted [`DraftError`]
pub fn try_produce<F, E>(base: &Value, producer: F) -> Result<Value, E>
where
    F: FnOnce(&mut Draft<'_>) -> Result<(), E>,
    E: From<DraftError>,
{
    Producer::default().try_produce(base, producer)
}
