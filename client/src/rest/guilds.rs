//! Guild REST operations.

use std::sync::Arc;

use serde::Deserialize;
use tessera_common::Snowflake;

use super::{endpoints, Method, Transport};
use crate::client::Client;
use crate::error::Result;
use crate::models::{Channel, ChannelPayload, Guild, GuildPruneCountQuery, Member};

#[derive(Debug, Deserialize)]
struct PruneCount {
    pruned: u64,
}

impl<T: Transport> Client<T> {
    /// Fetch a guild and cache it.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_guild(&self, guild_id: Snowflake) -> Result<Arc<Guild>> {
        let guild: Guild = self
            .request_as(Method::GET, &endpoints::guild(guild_id), None)
            .await?;
        Ok(self.store().insert_guild(guild))
    }

    /// Fetch a guild member and cache it.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_member(&self, guild_id: Snowflake, user_id: Snowflake) -> Result<Arc<Member>> {
        let member: Member = self
            .request_as(Method::GET, &endpoints::guild_member(guild_id, user_id), None)
            .await?;
        Ok(self.store().insert_member(guild_id, member))
    }

    /// Channels of a guild. Each is cached.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_guild_channels(&self, guild_id: Snowflake) -> Result<Vec<Arc<Channel>>> {
        let payloads: Vec<ChannelPayload> = self
            .request_as(Method::GET, &endpoints::guild_channels(guild_id), None)
            .await?;
        Ok(payloads
            .into_iter()
            .map(|p| self.store().insert_channel(p))
            .collect())
    }

    /// Number of members a prune with `query` would remove.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_guild_prune_count(
        &self,
        guild_id: Snowflake,
        query: &GuildPruneCountQuery,
    ) -> Result<u64> {
        let path = format!("{}{}", endpoints::guild_prune(guild_id), query.to_query_string());
        let count: PruneCount = self.request_as(Method::GET, &path, None).await?;
        Ok(count.pruned)
    }
}
