//! # tbot-core
//!
//! Shared leaves for the bot runtime: update and dispatch-context types, the error
//! taxonomy, env configuration, tracing initialization, and the [`UpdateSource`]
//! boundary the poll loop fetches through. Transport-agnostic; used by tbot-api
//! and tbot-engine.

pub mod config;
pub mod error;
pub mod logger;
pub mod types;

pub use config::BotConfig;
pub use error::{BotError, Result};
pub use logger::init_tracing;
pub use types::{active_payload, DispatchContext, Update, UpdateSource, MESSAGE_TYPES};
