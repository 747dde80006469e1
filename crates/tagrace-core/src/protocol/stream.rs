//! Typed stream messages.
//!
//! Each delimited line is a JSON object whose shape identifies its kind:
//! a content event carries `text`/`full_text`, a stall warning is wrapped in
//! `warning`, a disconnect notice in `disconnect`. Everything else (deletes,
//! rate-limit notices, ...) is surfaced as `Other` and ignored upstream.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, TagRaceError};

/// A content event with its hashtag annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tweet {
    pub id: Option<String>,
    /// Hashtag texts as delivered (no `#`), in event order.
    pub hashtags: Vec<String>,
}

/// Health warning: the provider is buffering and will drop data.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StallWarning {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub percent_full: Option<u32>,
}

/// Provider-side disconnect notice.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Disconnect {
    #[serde(default)]
    pub code: Option<u32>,
    #[serde(default)]
    pub stream_name: Option<String>,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamMessage {
    Tweet(Tweet),
    StallWarning(StallWarning),
    Disconnect(Disconnect),
    Other,
}

impl StreamMessage {
    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            StreamMessage::Tweet(_) => "tweet",
            StreamMessage::StallWarning(_) => "stall_warning",
            StreamMessage::Disconnect(_) => "disconnect",
            StreamMessage::Other => "other",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct HashtagEntity {
    text: String,
}

#[derive(Debug, Default, Deserialize)]
struct Entities {
    #[serde(default)]
    hashtags: Vec<HashtagEntity>,
}

#[derive(Debug, Default, Deserialize)]
struct ExtendedTweet {
    #[serde(default)]
    entities: Option<Entities>,
}

#[derive(Debug, Deserialize)]
struct TweetWire {
    #[serde(default)]
    id_str: Option<String>,
    #[serde(default)]
    entities: Option<Entities>,
    #[serde(default)]
    extended_tweet: Option<ExtendedTweet>,
}

impl From<TweetWire> for Tweet {
    fn from(w: TweetWire) -> Self {
        let mut hashtags: Vec<String> = Vec::new();
        let extended = w.extended_tweet.and_then(|e| e.entities);
        for h in w
            .entities
            .into_iter()
            .chain(extended)
            .flat_map(|e| e.hashtags)
        {
            if !hashtags.iter().any(|seen| seen.eq_ignore_ascii_case(&h.text)) {
                hashtags.push(h.text);
            }
        }
        Tweet { id: w.id_str, hashtags }
    }
}

/// Decode one delimited line.
pub fn decode_message(line: &[u8]) -> Result<StreamMessage> {
    let value: Value = serde_json::from_slice(line)
        .map_err(|e| TagRaceError::Stream(format!("invalid stream json: {e}")))?;
    let Some(obj) = value.as_object() else {
        return Err(TagRaceError::Stream("stream message must be an object".into()));
    };

    if let Some(w) = obj.get("warning") {
        let warning: StallWarning = serde_json::from_value(w.clone())
            .map_err(|e| TagRaceError::Stream(format!("invalid warning: {e}")))?;
        return Ok(StreamMessage::StallWarning(warning));
    }
    if let Some(d) = obj.get("disconnect") {
        let disconnect: Disconnect = serde_json::from_value(d.clone())
            .map_err(|e| TagRaceError::Stream(format!("invalid disconnect: {e}")))?;
        return Ok(StreamMessage::Disconnect(disconnect));
    }
    if obj.contains_key("text") || obj.contains_key("full_text") || obj.contains_key("retweet_count") {
        let wire: TweetWire = serde_json::from_value(value)
            .map_err(|e| TagRaceError::Stream(format!("invalid tweet: {e}")))?;
        return Ok(StreamMessage::Tweet(wire.into()));
    }
    Ok(StreamMessage::Other)
}
