//! Counter keys and ratio arithmetic.

use std::fmt;

use crate::error::{Result, TagRaceError};
use crate::tag::{normalize_tag, WatchedTag};

/// Namespace prefix for every counter key in the store.
pub const KEY_PREFIX: &str = "key.";

/// Store key of one counter: `"key." + normalized_tag`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CounterKey(String);

impl CounterKey {
    pub fn for_tag(tag: &WatchedTag) -> Self {
        Self(format!("{KEY_PREFIX}{}", tag.name()))
    }

    /// Derive a key from a client-supplied tag name (request body or path).
    pub fn from_client(raw: &str) -> Result<Self> {
        let name = normalize_tag(raw);
        if name.is_empty() {
            return Err(TagRaceError::BadRequest("counter key must not be empty".into()));
        }
        Ok(Self(format!("{KEY_PREFIX}{name}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CounterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `me * 100 / (me + opponent)` with truncating integer division.
///
/// Returns `None` when the denominator is not positive (both counters zero)
/// or the arithmetic would overflow. Callers skip the reading in that case.
pub fn ratio_percent(me: i64, opponent: i64) -> Option<i64> {
    let total = me.checked_add(opponent)?;
    if total <= 0 {
        return None;
    }
    me.checked_mul(100)?.checked_div(total)
}
