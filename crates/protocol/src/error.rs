//! Protocol error types.

use thiserror::Error;

/// Errors raised while decoding individual protocol tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Unknown player code: {0:?}")]
    UnknownPlayerCode(String),

    #[error("Invalid direction token: {0:?}")]
    InvalidDirection(String),
}
