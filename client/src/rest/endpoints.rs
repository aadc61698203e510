//! Endpoint path builders.

use tessera_common::Snowflake;

pub fn channel(channel_id: Snowflake) -> String {
    format!("/channels/{channel_id}")
}

pub fn channel_overwrite(channel_id: Snowflake, overwrite_id: Snowflake) -> String {
    format!("/channels/{channel_id}/permissions/{overwrite_id}")
}

pub fn channel_messages(channel_id: Snowflake) -> String {
    format!("/channels/{channel_id}/messages")
}

pub fn channel_message(channel_id: Snowflake, message_id: Snowflake) -> String {
    format!("/channels/{channel_id}/messages/{message_id}")
}

pub fn channel_pins(channel_id: Snowflake) -> String {
    format!("/channels/{channel_id}/pins")
}

pub fn channel_typing(channel_id: Snowflake) -> String {
    format!("/channels/{channel_id}/typing")
}

pub fn channel_follow(channel_id: Snowflake) -> String {
    format!("/channels/{channel_id}/followers")
}

pub fn channel_webhooks(channel_id: Snowflake) -> String {
    format!("/channels/{channel_id}/webhooks")
}

pub fn stage_instances() -> String {
    "/stage-instances".to_owned()
}

pub fn stage_instance(channel_id: Snowflake) -> String {
    format!("/stage-instances/{channel_id}")
}

pub fn guild(guild_id: Snowflake) -> String {
    format!("/guilds/{guild_id}")
}

pub fn guild_channels(guild_id: Snowflake) -> String {
    format!("/guilds/{guild_id}/channels")
}

pub fn guild_prune(guild_id: Snowflake) -> String {
    format!("/guilds/{guild_id}/prune")
}

pub fn guild_member(guild_id: Snowflake, user_id: Snowflake) -> String {
    format!("/guilds/{guild_id}/members/{user_id}")
}
