/// Shared error type used across all Backchannel crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error("operation {operation} rejected: {message}")]
    RemoteOperationFailed { operation: String, message: String },

    #[error("channel disconnected: {0}")]
    ChannelDisconnected(String),

    #[error("no answer after {0} stale reads")]
    ExchangeTimeout(u32),

    #[error("conversation {0} already has an answer in flight")]
    ExchangeBusy(u64),

    #[error("no active answer for bot {0}")]
    NoActiveAnswer(String),

    #[error("bot create failed: {0}")]
    BotCreateFailed(String),

    #[error("auth: {0}")]
    AuthFailed(String),

    #[error("websocket: {0}")]
    WebSocket(String),

    #[error("config: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
