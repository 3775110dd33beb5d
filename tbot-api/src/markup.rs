//! Reply-keyboard and inline-keyboard builders.

use serde_json::{json, Map, Value};

/// The `reply_markup` argument of a send method: hide the custom keyboard,
/// force a reply, or attach markup built by this module (or raw JSON).
#[derive(Debug, Clone)]
pub enum ReplyMarkup {
    Hide,
    ForceReply,
    Custom(Value),
}

impl ReplyMarkup {
    pub fn to_value(&self) -> Value {
        match self {
            ReplyMarkup::Hide => json!({ "hide_keyboard": true }),
            ReplyMarkup::ForceReply => json!({ "force_reply": true }),
            ReplyMarkup::Custom(markup) => markup.clone(),
        }
    }
}

/// Options for reply keyboards.
#[derive(Debug, Clone, Default)]
pub struct KeyboardOptions {
    /// resize_keyboard
    pub resize: bool,
    /// one_time_keyboard
    pub once: bool,
    /// selective
    pub selective: bool,
}

/// Builds a reply keyboard from rows of button labels (or button objects
/// from [`button`]).
pub fn keyboard(rows: Value, opt: &KeyboardOptions) -> Value {
    let mut markup = Map::new();
    markup.insert("keyboard".to_string(), rows);
    if opt.resize {
        markup.insert("resize_keyboard".to_string(), json!(true));
    }
    if opt.once {
        markup.insert("one_time_keyboard".to_string(), json!(true));
    }
    if opt.selective {
        markup.insert("selective".to_string(), json!(true));
    }
    Value::Object(markup)
}

/// What a special keyboard button asks the user to share.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Contact,
    Location,
}

impl RequestKind {
    fn field(self) -> &'static str {
        match self {
            RequestKind::Contact => "request_contact",
            RequestKind::Location => "request_location",
        }
    }
}

/// A contact/location request button for a reply keyboard row.
pub fn button(kind: RequestKind, text: &str) -> Value {
    let mut markup = Map::new();
    markup.insert("text".to_string(), json!(text));
    markup.insert(kind.field().to_string(), json!(true));
    Value::Object(markup)
}

/// Builds an inline keyboard from rows of [`inline_button`]s.
pub fn inline_keyboard(rows: Value) -> Value {
    json!({ "inline_keyboard": rows })
}

/// Options for inline buttons; exactly one is normally set.
#[derive(Debug, Clone, Default)]
pub struct InlineButtonOptions {
    /// url
    pub url: Option<String>,
    /// switch_inline_query
    pub inline: Option<String>,
    /// callback_data
    pub callback: Option<String>,
}

/// One inline keyboard button.
pub fn inline_button(text: &str, opt: &InlineButtonOptions) -> Value {
    let mut markup = Map::new();
    markup.insert("text".to_string(), json!(text));
    if let Some(url) = &opt.url {
        markup.insert("url".to_string(), json!(url));
    }
    if let Some(query) = &opt.inline {
        markup.insert("switch_inline_query".to_string(), json!(query));
    }
    if let Some(data) = &opt.callback {
        markup.insert("callback_data".to_string(), json!(data));
    }
    Value::Object(markup)
}
