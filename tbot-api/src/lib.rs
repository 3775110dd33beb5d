//! # tbot-api
//!
//! Bot API access: [`HttpTransport`] executes method calls against the remote
//! endpoint, [`Api`] builds their payloads (messages, files, inline answers),
//! and the markup module builds reply keyboards. [`Api`] also implements
//! [`tbot_core::UpdateSource`], which is all the engine ever sees of it.

pub mod answers;
pub mod markup;
pub mod methods;
pub mod transport;

pub use answers::{AnswerKind, AnswerList};
pub use markup::{
    button, inline_button, inline_keyboard, keyboard, InlineButtonOptions, KeyboardOptions,
    ReplyMarkup, RequestKind,
};
pub use methods::{Api, EditTarget, FileKind, InputFile, SendOptions};
pub use transport::{HttpTransport, RequestBody, Transport};
