//! Watched tags and the tag matcher.
//!
//! A watched tag is compared case-insensitively with any leading `#`
//! removed. The watch list is fixed at startup.

use std::fmt;

use crate::error::{Result, TagRaceError};

/// Normalize a hashtag: trim whitespace, strip leading `#`, lower-case.
pub fn normalize_tag(raw: &str) -> String {
    raw.trim().trim_start_matches('#').to_lowercase()
}

/// A tag configured at startup to be tracked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchedTag {
    name: String,
    term: String,
}

impl WatchedTag {
    pub fn parse(raw: &str) -> Result<Self> {
        let name = normalize_tag(raw);
        if name.is_empty() {
            return Err(TagRaceError::BadRequest(format!("empty tag: {raw:?}")));
        }
        Ok(Self {
            name,
            term: raw.trim().to_string(),
        })
    }

    /// Normalized form (no `#`, lower-case).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The spelling from configuration, used as a stream filter term.
    pub fn track_term(&self) -> &str {
        &self.term
    }

    pub fn matches(&self, hashtag: &str) -> bool {
        normalize_tag(hashtag) == self.name
    }
}

impl fmt::Display for WatchedTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Return the first watched tag (in watch-list order) present in `hashtags`.
///
/// Only one tag is ever returned, even when an event carries several watched
/// tags. Counting the event once per race is what the ratio expects.
pub fn first_match<'a, S: AsRef<str>>(
    watched: &'a [WatchedTag],
    hashtags: &[S],
) -> Option<&'a WatchedTag> {
    if hashtags.is_empty() {
        return None;
    }
    let normalized: Vec<String> = hashtags.iter().map(|h| normalize_tag(h.as_ref())).collect();
    watched
        .iter()
        .find(|w| normalized.iter().any(|h| h == w.name()))
}

/// Ordered, de-duplicated list of watched tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchList {
    tags: Vec<WatchedTag>,
}

impl WatchList {
    /// Build from raw terms. Rejects empty lists, empty tags and duplicates
    /// after normalization (two tags would share one counter).
    pub fn new<I, S>(raw: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tags: Vec<WatchedTag> = Vec::new();
        for r in raw {
            let tag = WatchedTag::parse(r.as_ref())?;
            if tags.iter().any(|t| t.name() == tag.name()) {
                return Err(TagRaceError::BadRequest(format!(
                    "duplicate watched tag: {}",
                    tag.name()
                )));
            }
            tags.push(tag);
        }
        if tags.is_empty() {
            return Err(TagRaceError::BadRequest("watch list must not be empty".into()));
        }
        Ok(Self { tags })
    }

    /// Parse a comma-separated list (`WATCH_KEYS` format). Blank entries are skipped.
    pub fn from_csv(s: &str) -> Result<Self> {
        Self::new(s.split(',').filter(|t| !t.trim().is_empty()))
    }

    pub fn tags(&self) -> &[WatchedTag] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn first_match<S: AsRef<str>>(&self, hashtags: &[S]) -> Option<&WatchedTag> {
        first_match(&self.tags, hashtags)
    }

    /// Filter terms for the stream subscription.
    pub fn track_terms(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.track_term().to_string()).collect()
    }
}
