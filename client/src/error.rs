//! Client Errors

use tessera_common::{ParseError, Snowflake};
use thiserror::Error;

/// Failure reported by a [`Transport`](crate::rest::Transport).
///
/// Passed through unchanged; the store and the resolver never inspect it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Non-success response.
    #[error("Request failed with status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// No response (connection, TLS, timeout).
    #[error("Request failed: {0}")]
    Connection(String),

    /// Success response whose body is not JSON.
    #[error("Invalid response body: {0}")]
    InvalidBody(String),
}

impl TransportError {
    /// HTTP status, if a response was received.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Connection(_) | Self::InvalidBody(_) => None,
        }
    }
}

/// Errors returned by client operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A snowflake or permission string in a payload was malformed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The transport failed the request.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A payload did not match the expected entity shape.
    #[error("Invalid payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// Guild-only operation on a channel outside any guild.
    #[error("Channel {0} is not in a guild")]
    NotInGuild(Snowflake),
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;
