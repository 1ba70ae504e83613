//! `PATH=JSON` edits applied by `cowtree apply`

use anyhow::{anyhow, Context, Result};
use cowtree::{Draft, DraftPath, DraftResult, Value};
use std::str::FromStr;

/// One write: the value to store at a path
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Edit {
    pub(crate) path: DraftPath,
    pub(crate) value: Value,
}

impl Edit {
    pub(crate) fn apply(&self, draft: &mut Draft<'_>) -> DraftResult<()> {
        draft.set_at(&self.path, self.value.clone())
    }
}

impl FromStr for Edit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (path, json) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("edit `{s}` is not of the form PATH=JSON"))?;
        let path: DraftPath = path
            .parse()
            .with_context(|| format!("invalid path in edit `{s}`"))?;
        if path.is_empty() {
            return Err(anyhow!("edit `{s}` targets the root"));
        }
        // bare words are taken as strings so `name=Bob` works unquoted
        let value = match serde_json::from_str::<serde_json::Value>(json) {
            Ok(parsed) => Value::from(parsed),
            Err(_) => Value::from(json),
        };
        Ok(Self { path, value })
    }
}

/// Apply every edit in order through one draft
pub(crate) fn apply_all(draft: &mut Draft<'_>, edits: &[Edit]) -> DraftResult<()> {
    for edit in edits {
        tracing::trace!(path = %edit.path, "applying edit");
        edit.apply(draft)?;
    }
    Ok(())
}
