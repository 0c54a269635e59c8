//! Post record data structure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Timestamp layout used by the timeline API, e.g. `Sat Oct 17 18:00:00 +0000 2020`.
const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Keys stored in named fields; never present in the payload.
const RESERVED_FIELDS: [&str; 5] = [
    "id",
    "favorite_count",
    "retweet_count",
    "reply_count",
    "quote_count",
];

/// A single timeline post as returned by the remote API.
///
/// Only the identifier and the engagement counters are interpreted. Every
/// other field the API sends is kept in the payload so that a record read back
/// from the cache encodes to the same bytes it was decoded from. The payload
/// never holds a key that is also a named field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    /// Post identifier, larger is newer
    pub id: u64,

    /// Number of likes
    #[serde(default, deserialize_with = "null_as_zero")]
    pub favorite_count: u64,

    /// Number of reposts
    #[serde(default, deserialize_with = "null_as_zero")]
    pub retweet_count: u64,

    /// Number of replies
    #[serde(default, deserialize_with = "null_as_zero")]
    pub reply_count: u64,

    /// Number of quotes
    #[serde(default, deserialize_with = "null_as_zero")]
    pub quote_count: u64,

    /// Remaining API fields, uninterpreted
    #[serde(flatten)]
    payload: Map<String, Value>,
}

impl Post {
    /// Create a post with the given identifier and no engagement.
    pub fn new(id: u64) -> Self {
        Self {
            id,
            favorite_count: 0,
            retweet_count: 0,
            reply_count: 0,
            quote_count: 0,
            payload: Map::new(),
        }
    }

    /// Serialize to the on-disk representation.
    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Deserialize from the on-disk representation.
    pub fn decode(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Uninterpreted API fields.
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// Set an uninterpreted field.
    ///
    /// Returns `false` and leaves the post unchanged when `key` names one of
    /// the interpreted fields.
    pub fn set_field(&mut self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        let key = key.into();
        if RESERVED_FIELDS.contains(&key.as_str()) {
            return false;
        }
        self.payload.insert(key, value.into());
        true
    }

    /// Post text, preferring the extended form.
    pub fn text(&self) -> Option<&str> {
        self.payload
            .get("full_text")
            .or_else(|| self.payload.get("text"))
            .and_then(Value::as_str)
    }

    /// Creation time, if present and well formed.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.payload.get("created_at").and_then(Value::as_str)?;
        DateTime::parse_from_str(raw, CREATED_AT_FORMAT)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

// The API reports some counters as `null` on reposted items.
fn null_as_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}
