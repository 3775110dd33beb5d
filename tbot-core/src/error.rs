use thiserror::Error;

/// Error taxonomy for the runtime. `Network`, `Api` and `NotFound` are
/// transport failures the poll loop recovers from with backoff-retry;
/// `Handler` is caught per-subscriber inside the event registry and never
/// aborts a batch.
#[derive(Error, Debug)]
pub enum BotError {
    #[error("network error: {0}")]
    Network(String),

    #[error("api error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("handler error: {0}")]
    Handler(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BotError {
    /// True for failures of the remote call itself (retried by the loop).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            BotError::Network(_) | BotError::Api { .. } | BotError::NotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
