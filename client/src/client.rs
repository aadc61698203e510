//! Client context.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tessera_common::Snowflake;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::models::{Channel, ChannelPayload, Guild, Member, Message};
use crate::rest::{HttpTransport, Method, Transport};
use crate::store::EntityStore;

/// One API session: a transport, the entity store and the configuration.
///
/// Entity REST methods take a `&Client` rather than holding one.
pub struct Client<T = HttpTransport> {
    transport: T,
    store: EntityStore,
    config: ClientConfig,
}

impl Client<HttpTransport> {
    /// Create a client that talks to the configured API over HTTP.
    pub fn new(config: ClientConfig) -> Self {
        let transport = HttpTransport::new(&config);
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> Client<T> {
    /// Create a client over a custom transport.
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        let store = EntityStore::from_config(&config);
        Self::with_store(config, transport, store)
    }

    /// Create a client with a preconfigured store (e.g. a custom message filter).
    pub fn with_store(config: ClientConfig, transport: T, store: EntityStore) -> Self {
        Self {
            transport,
            store,
            config,
        }
    }

    pub const fn store(&self) -> &EntityStore {
        &self.store
    }

    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Stop all background sweeping. Cached data stays readable, and
    /// channels cached afterwards are not swept.
    pub fn shutdown(&self) {
        self.store.stop();
        tracing::info!("Client shut down");
    }

    pub(crate) async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value> {
        Ok(self.transport.request(method, path, body).await?)
    }

    pub(crate) async fn request_as<R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<R> {
        let value = self.request(method, path, body).await?;
        Ok(serde_json::from_value(value)?)
    }

    // Payload ingestion

    /// Turn a raw channel payload into a cached channel.
    pub fn ingest_channel(&self, payload: Value) -> Result<Arc<Channel>> {
        let payload: ChannelPayload = serde_json::from_value(payload)?;
        Ok(self.store.insert_channel(payload))
    }

    /// Decode a raw message payload and cache it if its channel is cached.
    pub fn ingest_message(&self, payload: Value) -> Result<Message> {
        let message: Message = serde_json::from_value(payload)?;
        self.store.insert_message(message.clone());
        Ok(message)
    }

    pub fn ingest_guild(&self, payload: Value) -> Result<Arc<Guild>> {
        let guild: Guild = serde_json::from_value(payload)?;
        Ok(self.store.insert_guild(guild))
    }

    pub fn ingest_member(&self, guild_id: Snowflake, payload: Value) -> Result<Arc<Member>> {
        let member: Member = serde_json::from_value(payload)?;
        Ok(self.store.insert_member(guild_id, member))
    }
}

impl<T> std::fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
