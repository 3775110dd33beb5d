//! Typed builders for Bot API methods over a [`Transport`].
//!
//! Every method maps its arguments into the form the remote expects and
//! returns the response's `result` field as JSON. File sends accept a
//! file_id, a URL (forwarded for the remote to fetch), a local path, or
//! in-memory bytes; the latter two go out as multipart uploads.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use tbot_core::{BotConfig, BotError, Result, Update, UpdateSource};

use crate::answers::AnswerList;
use crate::markup::ReplyMarkup;
use crate::transport::{HttpTransport, RequestBody, Transport};

/// Extra options shared by the send methods.
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// reply_to_message_id
    pub reply: Option<i64>,
    /// parse_mode (e.g. "Markdown", "HTML")
    pub parse: Option<String>,
    /// reply_markup
    pub markup: Option<ReplyMarkup>,
    /// set false to disable link previews on sendMessage
    pub preview: Option<bool>,
    /// caption for file sends
    pub caption: Option<String>,
    /// file name override for uploads
    pub file_name: Option<String>,
}

/// File argument for [`Api::send_file`] and its wrappers.
#[derive(Debug, Clone)]
pub enum InputFile {
    /// Re-send a file already known to the remote by its file_id.
    FileId(String),
    /// Public URL the remote fetches itself.
    Url(String),
    /// Local file read and uploaded as multipart.
    Path(PathBuf),
    /// In-memory bytes uploaded as multipart under `name`.
    Bytes { name: String, data: Vec<u8> },
}

/// Which send method a file upload targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Photo,
    Audio,
    Voice,
    Document,
    Sticker,
    Video,
}

impl FileKind {
    /// Form field carrying the file.
    pub fn field(self) -> &'static str {
        match self {
            FileKind::Photo => "photo",
            FileKind::Audio => "audio",
            FileKind::Voice => "voice",
            FileKind::Document => "document",
            FileKind::Sticker => "sticker",
            FileKind::Video => "video",
        }
    }

    /// Remote method name.
    pub fn method(self) -> &'static str {
        match self {
            FileKind::Photo => "sendPhoto",
            FileKind::Audio => "sendAudio",
            FileKind::Voice => "sendVoice",
            FileKind::Document => "sendDocument",
            FileKind::Sticker => "sendSticker",
            FileKind::Video => "sendVideo",
        }
    }
}

/// Where an edit method points: a chat message or an inline message.
#[derive(Debug, Clone)]
pub enum EditTarget {
    Chat { chat_id: i64, message_id: i64 },
    Inline(String),
}

impl EditTarget {
    fn apply(&self, form: &mut Map<String, Value>) {
        match self {
            EditTarget::Chat {
                chat_id,
                message_id,
            } => {
                form.insert("chat_id".to_string(), json!(chat_id));
                form.insert("message_id".to_string(), json!(message_id));
            }
            EditTarget::Inline(inline_message_id) => {
                form.insert("inline_message_id".to_string(), json!(inline_message_id));
            }
        }
    }
}

/// Method builder over a [`Transport`]. Also the engine's [`UpdateSource`].
pub struct Api {
    transport: Arc<dyn Transport>,
    file_base: String,
}

impl Api {
    /// Wraps an existing transport. `file_base` is the prefix file download
    /// links are built from (see [`Api::get_file`]).
    pub fn new(transport: Arc<dyn Transport>, file_base: impl Into<String>) -> Self {
        Self {
            transport,
            file_base: file_base.into(),
        }
    }

    /// Builds the production transport from config.
    pub fn from_config(config: &BotConfig) -> Self {
        let transport = Arc::new(HttpTransport::new(&config.token, &config.api_url));
        let file_base = format!(
            "{}/file/bot{}/",
            config.api_url.trim_end_matches('/'),
            config.token
        );
        Self::new(transport, file_base)
    }

    async fn call(&self, method: &str, form: Map<String, Value>) -> Result<Value> {
        let body = self
            .transport
            .execute(method, RequestBody::Form(Value::Object(form)))
            .await?;
        Ok(body.get("result").cloned().unwrap_or(Value::Null))
    }

    /// getMe
    pub async fn get_me(&self) -> Result<Value> {
        self.call("getMe", Map::new()).await
    }

    /// sendMessage
    pub async fn send_message(&self, chat_id: i64, text: &str, opt: &SendOptions) -> Result<Value> {
        let mut form = Map::new();
        form.insert("chat_id".to_string(), json!(chat_id));
        form.insert("text".to_string(), json!(text));
        let form = apply_options(form, opt);
        self.call("sendMessage", form).await
    }

    /// forwardMessage
    pub async fn forward_message(
        &self,
        chat_id: i64,
        from_chat_id: i64,
        message_id: i64,
    ) -> Result<Value> {
        let mut form = Map::new();
        form.insert("chat_id".to_string(), json!(chat_id));
        form.insert("from_chat_id".to_string(), json!(from_chat_id));
        form.insert("message_id".to_string(), json!(message_id));
        self.call("forwardMessage", form).await
    }

    /// getFile. The result gains a `file_link` field pointing at the
    /// download URL for its file_path.
    pub async fn get_file(&self, file_id: &str) -> Result<Value> {
        let mut form = Map::new();
        form.insert("file_id".to_string(), json!(file_id));
        let mut result = self.call("getFile", form).await?;
        let link = result
            .get("file_path")
            .and_then(Value::as_str)
            .map(|path| format!("{}{}", self.file_base, path));
        if let (Some(link), Some(fields)) = (link, result.as_object_mut()) {
            fields.insert("file_link".to_string(), json!(link));
        }
        Ok(result)
    }

    /// getUserProfilePhotos
    pub async fn get_user_photo(
        &self,
        user_id: i64,
        offset: Option<u32>,
        limit: Option<u32>,
    ) -> Result<Value> {
        let mut form = Map::new();
        form.insert("user_id".to_string(), json!(user_id));
        if let Some(offset) = offset {
            form.insert("offset".to_string(), json!(offset));
        }
        if let Some(limit) = limit {
            form.insert("limit".to_string(), json!(limit));
        }
        self.call("getUserProfilePhotos", form).await
    }

    /// sendChatAction (e.g. "typing", "upload_photo")
    pub async fn send_action(&self, chat_id: i64, action: &str) -> Result<Value> {
        let mut form = Map::new();
        form.insert("chat_id".to_string(), json!(chat_id));
        form.insert("action".to_string(), json!(action));
        self.call("sendChatAction", form).await
    }

    /// sendLocation; `position` is (latitude, longitude).
    pub async fn send_location(
        &self,
        chat_id: i64,
        position: (f64, f64),
        opt: &SendOptions,
    ) -> Result<Value> {
        let mut form = Map::new();
        form.insert("chat_id".to_string(), json!(chat_id));
        form.insert("latitude".to_string(), json!(position.0));
        form.insert("longitude".to_string(), json!(position.1));
        let form = apply_options(form, opt);
        self.call("sendLocation", form).await
    }

    /// sendVenue
    pub async fn send_venue(
        &self,
        chat_id: i64,
        position: (f64, f64),
        title: &str,
        address: &str,
        foursquare: Option<&str>,
        opt: &SendOptions,
    ) -> Result<Value> {
        let mut form = Map::new();
        form.insert("chat_id".to_string(), json!(chat_id));
        form.insert("latitude".to_string(), json!(position.0));
        form.insert("longitude".to_string(), json!(position.1));
        form.insert("title".to_string(), json!(title));
        form.insert("address".to_string(), json!(address));
        if let Some(foursquare_id) = foursquare {
            form.insert("foursquare_id".to_string(), json!(foursquare_id));
        }
        let form = apply_options(form, opt);
        self.call("sendVenue", form).await
    }

    /// sendContact
    pub async fn send_contact(
        &self,
        chat_id: i64,
        phone_number: &str,
        first_name: &str,
        last_name: Option<&str>,
    ) -> Result<Value> {
        let mut form = Map::new();
        form.insert("chat_id".to_string(), json!(chat_id));
        form.insert("phone_number".to_string(), json!(phone_number));
        form.insert("first_name".to_string(), json!(first_name));
        if let Some(last_name) = last_name {
            form.insert("last_name".to_string(), json!(last_name));
        }
        self.call("sendContact", form).await
    }

    /// kickChatMember
    pub async fn kick_chat_member(&self, chat_id: i64, user_id: i64) -> Result<Value> {
        let mut form = Map::new();
        form.insert("chat_id".to_string(), json!(chat_id));
        form.insert("user_id".to_string(), json!(user_id));
        self.call("kickChatMember", form).await
    }

    /// unbanChatMember
    pub async fn unban_chat_member(&self, chat_id: i64, user_id: i64) -> Result<Value> {
        let mut form = Map::new();
        form.insert("chat_id".to_string(), json!(chat_id));
        form.insert("user_id".to_string(), json!(user_id));
        self.call("unbanChatMember", form).await
    }

    /// answerInlineQuery with an accumulated [`AnswerList`].
    pub async fn answer_query(&self, answers: &AnswerList) -> Result<Value> {
        let mut form = Map::new();
        form.insert("inline_query_id".to_string(), json!(answers.id));
        form.insert("results".to_string(), json!(answers.results()));
        form.insert("next_offset".to_string(), json!(answers.next_offset));
        form.insert("is_personal".to_string(), json!(answers.personal));
        form.insert("cache_time".to_string(), json!(answers.cache_time));
        self.call("answerInlineQuery", form).await
    }

    /// answerCallbackQuery
    pub async fn answer_callback(
        &self,
        callback_query_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<Value> {
        let mut form = Map::new();
        form.insert("callback_query_id".to_string(), json!(callback_query_id));
        if let Some(text) = text {
            form.insert("text".to_string(), json!(text));
        }
        form.insert("show_alert".to_string(), json!(show_alert));
        self.call("answerCallbackQuery", form).await
    }

    /// editMessageText
    pub async fn edit_message(&self, target: &EditTarget, text: &str) -> Result<Value> {
        let mut form = Map::new();
        target.apply(&mut form);
        form.insert("text".to_string(), json!(text));
        self.call("editMessageText", form).await
    }

    /// editMessageCaption
    pub async fn edit_caption(&self, target: &EditTarget, caption: &str) -> Result<Value> {
        let mut form = Map::new();
        target.apply(&mut form);
        form.insert("caption".to_string(), json!(caption));
        self.call("editMessageCaption", form).await
    }

    /// editMessageReplyMarkup
    pub async fn edit_markup(&self, target: &EditTarget, markup: Value) -> Result<Value> {
        let mut form = Map::new();
        target.apply(&mut form);
        form.insert("reply_markup".to_string(), markup);
        self.call("editMessageReplyMarkup", form).await
    }

    /// setWebhook; an empty `url` clears the webhook.
    pub async fn set_webhook(&self, url: &str, certificate: Option<&str>) -> Result<Value> {
        let mut form = Map::new();
        form.insert("url".to_string(), json!(url));
        if let Some(certificate) = certificate {
            form.insert("certificate".to_string(), json!(certificate));
        }
        self.call("setWebhook", form).await
    }

    /// Sends a file with the method matching `kind`. file_id and URL
    /// variants go out as plain form fields; path and bytes variants as
    /// multipart uploads.
    pub async fn send_file(
        &self,
        kind: FileKind,
        chat_id: i64,
        file: InputFile,
        opt: &SendOptions,
    ) -> Result<Value> {
        let mut form = Map::new();
        form.insert("chat_id".to_string(), json!(chat_id));
        let mut form = apply_options(form, opt);
        if let Some(caption) = &opt.caption {
            form.insert("caption".to_string(), json!(caption));
        }

        match file {
            InputFile::FileId(id) => {
                form.insert(kind.field().to_string(), json!(id));
                self.call(kind.method(), form).await
            }
            InputFile::Url(url) => {
                form.insert(kind.field().to_string(), json!(url));
                self.call(kind.method(), form).await
            }
            InputFile::Path(path) => {
                let data = tokio::fs::read(&path).await?;
                let name = opt
                    .file_name
                    .clone()
                    .or_else(|| {
                        path.file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                    })
                    .unwrap_or_else(|| kind.field().to_string());
                self.call_multipart(kind, form, name, data).await
            }
            InputFile::Bytes { name, data } => {
                let name = opt.file_name.clone().unwrap_or(name);
                self.call_multipart(kind, form, name, data).await
            }
        }
    }

    pub async fn send_photo(&self, chat_id: i64, file: InputFile, opt: &SendOptions) -> Result<Value> {
        self.send_file(FileKind::Photo, chat_id, file, opt).await
    }

    pub async fn send_audio(&self, chat_id: i64, file: InputFile, opt: &SendOptions) -> Result<Value> {
        self.send_file(FileKind::Audio, chat_id, file, opt).await
    }

    pub async fn send_voice(&self, chat_id: i64, file: InputFile, opt: &SendOptions) -> Result<Value> {
        self.send_file(FileKind::Voice, chat_id, file, opt).await
    }

    pub async fn send_document(&self, chat_id: i64, file: InputFile, opt: &SendOptions) -> Result<Value> {
        self.send_file(FileKind::Document, chat_id, file, opt).await
    }

    pub async fn send_sticker(&self, chat_id: i64, file: InputFile, opt: &SendOptions) -> Result<Value> {
        self.send_file(FileKind::Sticker, chat_id, file, opt).await
    }

    pub async fn send_video(&self, chat_id: i64, file: InputFile, opt: &SendOptions) -> Result<Value> {
        self.send_file(FileKind::Video, chat_id, file, opt).await
    }

    async fn call_multipart(
        &self,
        kind: FileKind,
        form: Map<String, Value>,
        name: String,
        data: Vec<u8>,
    ) -> Result<Value> {
        let mut multipart = reqwest::multipart::Form::new();
        for (key, value) in form {
            let text = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            multipart = multipart.text(key, text);
        }
        let part = reqwest::multipart::Part::bytes(data).file_name(name);
        multipart = multipart.part(kind.field().to_string(), part);

        let body = self
            .transport
            .execute(kind.method(), RequestBody::Multipart(multipart))
            .await?;
        Ok(body.get("result").cloned().unwrap_or(Value::Null))
    }
}

#[async_trait]
impl UpdateSource for Api {
    async fn fetch_updates(&self, offset: i64, limit: u32, timeout: u64) -> Result<Vec<Update>> {
        let mut form = Map::new();
        form.insert("offset".to_string(), json!(offset));
        form.insert("limit".to_string(), json!(limit));
        form.insert("timeout".to_string(), json!(timeout));
        let result = self.call("getUpdates", form).await?;
        serde_json::from_value(result)
            .map_err(|e| BotError::Network(format!("malformed getUpdates result: {}", e)))
    }
}

fn apply_options(mut form: Map<String, Value>, opt: &SendOptions) -> Map<String, Value> {
    if let Some(reply) = opt.reply {
        form.insert("reply_to_message_id".to_string(), json!(reply));
    }
    if let Some(parse) = &opt.parse {
        form.insert("parse_mode".to_string(), json!(parse));
    }
    if let Some(markup) = &opt.markup {
        form.insert("reply_markup".to_string(), markup.to_value());
    }
    if opt.preview == Some(false) {
        form.insert("disable_web_page_preview".to_string(), json!(true));
    }
    form
}
