//! Core types: updates, payload classification, and the dispatch context.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

/// Payload keys the dispatcher recognizes, in classification order.
pub const MESSAGE_TYPES: [&str; 10] = [
    "text", "audio", "voice", "document", "photo", "sticker", "video", "contact", "location",
    "query",
];

/// One element of a fetched update batch. At most one payload variant is
/// active; extra fields the remote adds are ignored on decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_query: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chosen_inline_result: Option<Value>,
}

impl Update {
    /// The active payload: first present of message, inline_query,
    /// chosen_inline_result; an empty object when none is present.
    pub fn payload(&self) -> Value {
        self.message
            .clone()
            .or_else(|| self.inline_query.clone())
            .or_else(|| self.chosen_inline_result.clone())
            .unwrap_or_else(|| Value::Object(Map::new()))
    }
}

/// Same selection rule applied to a raw JSON update. Used after module hooks
/// have had the chance to rewrite the batch, where the typed struct no longer
/// applies.
pub fn active_payload(update: &Value) -> Value {
    for key in ["message", "inline_query", "chosen_inline_result"] {
        if let Some(payload) = update.get(key) {
            if !payload.is_null() {
                return payload.clone();
            }
        }
    }
    Value::Object(Map::new())
}

/// Accumulator handed to type and command subscribers (`me` in handler
/// terms). Built per batch by merging the outputs of every `update`
/// subscriber; the dispatcher later writes `type` and `cmd` into it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchContext(Map<String, Value>);

impl DispatchContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a context from a module-hook output. Non-objects yield an
    /// empty context.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self(fields),
            _ => Self::default(),
        }
    }

    /// Merges one subscriber output. The first write to a key sets the
    /// value; any later write promotes the existing value to a list and
    /// appends, preserving merge order.
    pub fn merge(&mut self, output: Value) {
        let Value::Object(fields) = output else {
            return;
        };
        for (key, value) in fields {
            match self.0.get_mut(&key) {
                None => {
                    self.0.insert(key, value);
                }
                Some(Value::Array(list)) => list.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
            }
        }
    }

    /// Plain overwrite, used for the dispatcher-owned `type` and `cmd` keys.
    pub fn set(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

/// Boundary the poll loop fetches through. `offset` is the cursor (next
/// update_id to request), `limit` caps the batch size, `timeout` is the
/// long-poll server-side wait in seconds.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    async fn fetch_updates(&self, offset: i64, limit: u32, timeout: u64) -> Result<Vec<Update>>;
}
