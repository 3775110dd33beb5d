//! Inline-query answer builder.

use serde_json::{json, Map, Value};

/// Closed set of inline answer kinds the remote API accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKind {
    Article,
    Photo,
    Gif,
    Mpeg4Gif,
    Video,
    Audio,
    Voice,
    Document,
    Location,
    Venue,
    Sticker,
}

impl AnswerKind {
    /// Wire value for the result `type` field.
    pub fn as_str(self) -> &'static str {
        match self {
            AnswerKind::Article => "article",
            AnswerKind::Photo => "photo",
            AnswerKind::Gif => "gif",
            AnswerKind::Mpeg4Gif => "mpeg4_gif",
            AnswerKind::Video => "video",
            AnswerKind::Audio => "audio",
            AnswerKind::Voice => "voice",
            AnswerKind::Document => "document",
            AnswerKind::Location => "location",
            AnswerKind::Venue => "venue",
            AnswerKind::Sticker => "sticker",
        }
    }
}

/// Accumulates results for one answerInlineQuery call.
#[derive(Debug, Clone)]
pub struct AnswerList {
    /// The inline query being answered.
    pub id: String,
    /// next_offset for pagination; empty means no more results.
    pub next_offset: String,
    /// cache_time in seconds.
    pub cache_time: u32,
    /// is_personal
    pub personal: bool,
    list: Vec<Value>,
}

impl AnswerList {
    pub fn new(query_id: &str) -> Self {
        Self {
            id: query_id.to_string(),
            next_offset: String::new(),
            cache_time: 300,
            personal: false,
            list: Vec::new(),
        }
    }

    /// Adds one result of `kind`. `set` carries the kind-specific fields
    /// (title, url, file ids, ...); its `type` field is filled in here.
    /// Non-object `set` values contribute just the type.
    pub fn add(&mut self, kind: AnswerKind, set: Value) {
        let mut set = match set {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };
        set.insert("type".to_string(), json!(kind.as_str()));
        self.list.push(Value::Object(set));
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Renders the accumulated results as the JSON array string the
    /// answerInlineQuery method expects.
    pub fn results(&self) -> String {
        serde_json::to_string(&self.list).unwrap_or_else(|_| "[]".to_string())
    }
}
