#![forbid(unsafe_code)]

//! Error type for the fallible edges of the core: decoding host input and
//! validating configuration. Store operations themselves never fail.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyscopeError {
    #[error("failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid key event: {0}")]
    InvalidEvent(String),
    #[error("invalid session config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, KeyscopeError>;
