//! # tbot-engine
//!
//! The polling and dispatch runtime: [`EventRegistry`] (subscription, last-fired
//! replay, isolated concurrent fan-out), [`ModulePipeline`] (staged payload
//! transforms), [`Dispatcher`] (batch classification and cursor advance), and
//! [`BotEngine`] (the tick/fetch/backoff loop).

pub mod dispatch;
pub mod events;
pub mod modules;
pub mod poll;

pub use dispatch::Dispatcher;
pub use events::{EventDetails, EventHandler, EventRegistry, FnHandler};
pub use modules::{ModuleHook, ModulePipeline};
pub use poll::{BotEngine, PollSettings};
