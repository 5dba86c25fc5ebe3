use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    /// Incoming payload that does not match the room envelope schema.
    #[error("decode error: {0}")]
    Decode(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(&'static str),
    #[error("config error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
