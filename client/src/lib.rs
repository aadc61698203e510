//! Tessera Client SDK
//!
//! Local models of a chat platform's channels, messages, guilds and members,
//! kept in per-client caches and resolved against the platform's layered
//! permission overwrites. Requests go through a pluggable [`Transport`].
//!
//! ```no_run
//! use tessera_client::{Client, ClientConfig};
//!
//! # async fn run() -> tessera_client::Result<()> {
//! tessera_client::init_logging();
//! let client = Client::new(ClientConfig::new("bot-token"));
//! let channel = client.fetch_channel("290926798999357250".parse()?).await?;
//! channel.send_message(&client, "hello").await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod permissions;
pub mod rest;
pub mod store;

pub use cache::{CacheEntry, SweepFilter, SweepOutcome, SweeperOptions, SweepingCache};
pub use client::Client;
pub use config::ClientConfig;
pub use error::{Error, Result, TransportError};
pub use observability::init_logging;
pub use rest::{HttpTransport, Method, Transport};
pub use store::EntityStore;
pub use tessera_common::{format_snowflake, parse_snowflake, ParseError, Permissions, Snowflake};
