//! Tessera Common Library
//!
//! Identifier and permission types shared by every part of the SDK. Wire
//! conversion for both lives here so that payload boundaries are the only
//! place strings turn into numbers.

pub mod error;
pub mod permissions;
pub mod snowflake;

pub use error::{ParseError, Result};
pub use permissions::Permissions;
pub use snowflake::{format_snowflake, parse_snowflake, Snowflake};
