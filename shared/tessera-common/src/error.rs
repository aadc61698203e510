//! Parse Errors

use thiserror::Error;

/// Failure to convert a wire string into a local value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Not a canonical decimal `u64`.
    #[error("Invalid snowflake: {0:?}")]
    InvalidSnowflake(String),

    /// Not a decimal or `0x` hex permission mask that fits in 128 bits.
    #[error("Invalid permission bitmask: {0:?}")]
    InvalidBitmask(String),
}

/// Result alias for conversions in this crate.
pub type Result<T> = std::result::Result<T, ParseError>;
