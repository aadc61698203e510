//! Channel REST operations.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tessera_common::Snowflake;
use tracing::info;

use super::{endpoints, with_reason, Method, Transport};
use crate::client::Client;
use crate::error::{Error, Result};
use crate::models::{Channel, ChannelPayload, Message, Overwrite, PrivacyLevel, StageInstance, Webhook};

/// Response of `POST /channels/{id}/followers`.
#[derive(Debug, Deserialize)]
struct FollowedChannel {
    webhook_id: Snowflake,
}

impl<T: Transport> Client<T> {
    /// Fetch a channel and cache it.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_channel(&self, channel_id: Snowflake) -> Result<Arc<Channel>> {
        let payload: ChannelPayload = self
            .request_as(Method::GET, &endpoints::channel(channel_id), None)
            .await?;
        Ok(self.store().insert_channel(payload))
    }

    /// Fetch one message. It is cached if its channel is.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
    ) -> Result<Message> {
        let message: Message = self
            .request_as(
                Method::GET,
                &endpoints::channel_message(channel_id, message_id),
                None,
            )
            .await?;
        self.store().insert_message(message.clone());
        Ok(message)
    }
}

impl Channel {
    /// Create a new guild channel with this channel's settings and overwrites.
    #[tracing::instrument(skip_all, fields(channel_id = %self.id))]
    pub async fn clone_channel<T: Transport>(
        &self,
        client: &Client<T>,
        reason: Option<&str>,
    ) -> Result<Arc<Self>> {
        let guild_id = self.guild_id.ok_or(Error::NotInGuild(self.id))?;
        let body = serde_json::to_value(self.to_create_payload())?;

        let payload: ChannelPayload = client
            .request_as(
                Method::POST,
                &endpoints::guild_channels(guild_id),
                with_reason(Some(body), reason),
            )
            .await?;

        info!(new_channel_id = %payload.id, "Channel cloned");
        Ok(client.store().insert_channel(payload))
    }

    /// Delete the channel and drop it from the store.
    #[tracing::instrument(skip_all, fields(channel_id = %self.id))]
    pub async fn delete<T: Transport>(&self, client: &Client<T>, reason: Option<&str>) -> Result<()> {
        client
            .request(Method::DELETE, &endpoints::channel(self.id), with_reason(None, reason))
            .await?;
        client.store().remove_channel(self.id);
        Ok(())
    }

    /// Create or replace the overwrite for `overwrite.id`.
    ///
    /// The cached channel is updated once the request succeeds.
    #[tracing::instrument(skip_all, fields(channel_id = %self.id, overwrite_id = %overwrite.id))]
    pub async fn edit_overwrite<T: Transport>(
        &self,
        client: &Client<T>,
        overwrite: Overwrite,
    ) -> Result<()> {
        let body = json!({
            "allow": overwrite.allow,
            "deny": overwrite.deny,
            "type": overwrite.kind,
        });
        client
            .request(
                Method::PUT,
                &endpoints::channel_overwrite(self.id, overwrite.id),
                Some(body),
            )
            .await?;
        client
            .store()
            .update_channel(self.id, |c| c.upsert_overwrite(overwrite));
        Ok(())
    }

    /// Remove the overwrite for `overwrite_id`.
    #[tracing::instrument(skip_all, fields(channel_id = %self.id, overwrite_id = %overwrite_id))]
    pub async fn delete_overwrite<T: Transport>(
        &self,
        client: &Client<T>,
        overwrite_id: Snowflake,
    ) -> Result<()> {
        client
            .request(
                Method::DELETE,
                &endpoints::channel_overwrite(self.id, overwrite_id),
                None,
            )
            .await?;
        client.store().update_channel(self.id, |c| {
            c.remove_overwrite(overwrite_id);
        });
        Ok(())
    }

    /// Open a stage on this channel.
    #[tracing::instrument(skip_all, fields(channel_id = %self.id))]
    pub async fn create_stage_instance<T: Transport>(
        &self,
        client: &Client<T>,
        topic: &str,
        privacy_level: Option<PrivacyLevel>,
    ) -> Result<StageInstance> {
        let mut body = json!({
            "channel_id": self.id,
            "topic": topic,
        });
        if let (Some(level), Value::Object(map)) = (privacy_level, &mut body) {
            map.insert("privacy_level".into(), json!(level));
        }
        client
            .request_as(Method::POST, &endpoints::stage_instances(), Some(body))
            .await
    }

    #[tracing::instrument(skip_all, fields(channel_id = %self.id))]
    pub async fn get_stage_instance<T: Transport>(&self, client: &Client<T>) -> Result<StageInstance> {
        client
            .request_as(Method::GET, &endpoints::stage_instance(self.id), None)
            .await
    }

    /// Change the topic and/or privacy of the stage on this channel.
    #[tracing::instrument(skip_all, fields(channel_id = %self.id))]
    pub async fn update_stage_instance<T: Transport>(
        &self,
        client: &Client<T>,
        topic: Option<&str>,
        privacy_level: Option<PrivacyLevel>,
    ) -> Result<StageInstance> {
        let mut body = serde_json::Map::new();
        if let Some(topic) = topic {
            body.insert("topic".into(), json!(topic));
        }
        if let Some(level) = privacy_level {
            body.insert("privacy_level".into(), json!(level));
        }
        client
            .request_as(
                Method::PATCH,
                &endpoints::stage_instance(self.id),
                Some(Value::Object(body)),
            )
            .await
    }

    #[tracing::instrument(skip_all, fields(channel_id = %self.id))]
    pub async fn delete_stage_instance<T: Transport>(&self, client: &Client<T>) -> Result<()> {
        client
            .request(Method::DELETE, &endpoints::stage_instance(self.id), None)
            .await?;
        Ok(())
    }

    /// Webhooks on this channel, by id.
    #[tracing::instrument(skip_all, fields(channel_id = %self.id))]
    pub async fn fetch_webhooks<T: Transport>(
        &self,
        client: &Client<T>,
    ) -> Result<HashMap<Snowflake, Webhook>> {
        let webhooks: Vec<Webhook> = client
            .request_as(Method::GET, &endpoints::channel_webhooks(self.id), None)
            .await?;
        Ok(webhooks.into_iter().map(|w| (w.id, w)).collect())
    }

    /// Show the typing indicator.
    #[tracing::instrument(skip_all, fields(channel_id = %self.id))]
    pub async fn start_typing<T: Transport>(&self, client: &Client<T>) -> Result<()> {
        client
            .request(Method::POST, &endpoints::channel_typing(self.id), None)
            .await?;
        Ok(())
    }

    /// Pinned messages. Not added to the message cache.
    #[tracing::instrument(skip_all, fields(channel_id = %self.id))]
    pub async fn fetch_pins<T: Transport>(&self, client: &Client<T>) -> Result<Vec<Message>> {
        client
            .request_as(Method::GET, &endpoints::channel_pins(self.id), None)
            .await
    }

    /// Follow this announcement channel into `target_channel_id`.
    ///
    /// Returns the id of the webhook created in the target channel.
    #[tracing::instrument(skip_all, fields(channel_id = %self.id, target = %target_channel_id))]
    pub async fn follow<T: Transport>(
        &self,
        client: &Client<T>,
        target_channel_id: Snowflake,
    ) -> Result<Snowflake> {
        let followed: FollowedChannel = client
            .request_as(
                Method::POST,
                &endpoints::channel_follow(self.id),
                Some(json!({ "webhook_channel_id": target_channel_id })),
            )
            .await?;
        Ok(followed.webhook_id)
    }

    /// Post a text message and cache the result.
    #[tracing::instrument(skip_all, fields(channel_id = %self.id))]
    pub async fn send_message<T: Transport>(&self, client: &Client<T>, content: &str) -> Result<Message> {
        let message: Message = client
            .request_as(
                Method::POST,
                &endpoints::channel_messages(self.id),
                Some(json!({ "content": content })),
            )
            .await?;
        client.store().insert_message(message.clone());
        Ok(message)
    }
}
