//! Channels.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tessera_common::Snowflake;

use super::message::Message;
use super::overwrite::Overwrite;
use crate::cache::SweepingCache;

/// Channel type as numbered on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ChannelType {
    GuildText,
    Dm,
    GuildVoice,
    GroupDm,
    GuildCategory,
    GuildNews,
    GuildStore,
    GuildNewsThread,
    GuildPublicThread,
    GuildPrivateThread,
    GuildStageVoice,
    /// A type this version does not know yet.
    Unknown(u8),
}

impl From<u8> for ChannelType {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::GuildText,
            1 => Self::Dm,
            2 => Self::GuildVoice,
            3 => Self::GroupDm,
            4 => Self::GuildCategory,
            5 => Self::GuildNews,
            6 => Self::GuildStore,
            10 => Self::GuildNewsThread,
            11 => Self::GuildPublicThread,
            12 => Self::GuildPrivateThread,
            13 => Self::GuildStageVoice,
            other => Self::Unknown(other),
        }
    }
}

impl From<ChannelType> for u8 {
    fn from(kind: ChannelType) -> Self {
        match kind {
            ChannelType::GuildText => 0,
            ChannelType::Dm => 1,
            ChannelType::GuildVoice => 2,
            ChannelType::GroupDm => 3,
            ChannelType::GuildCategory => 4,
            ChannelType::GuildNews => 5,
            ChannelType::GuildStore => 6,
            ChannelType::GuildNewsThread => 10,
            ChannelType::GuildPublicThread => 11,
            ChannelType::GuildPrivateThread => 12,
            ChannelType::GuildStageVoice => 13,
            ChannelType::Unknown(other) => other,
        }
    }
}

/// Channel as received from the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelPayload {
    pub id: Snowflake,
    #[serde(rename = "type")]
    pub kind: ChannelType,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub permission_overwrites: Vec<Overwrite>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub nsfw: Option<bool>,
    #[serde(default)]
    pub last_message_id: Option<Snowflake>,
    #[serde(default)]
    pub bitrate: Option<u32>,
    #[serde(default)]
    pub user_limit: Option<u32>,
    #[serde(default)]
    pub rate_limit_per_user: Option<u32>,
    #[serde(default)]
    pub parent_id: Option<Snowflake>,
    #[serde(default)]
    pub member_count: Option<u32>,
}

/// Body for `POST /guilds/{id}/channels`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateGuildChannel {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ChannelType,
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit_per_user: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Snowflake>,
    pub nsfw: bool,
    pub permission_overwrites: Vec<Overwrite>,
}

/// A channel and its cached messages.
///
/// Held by the store as an immutable `Arc` snapshot. Updates build a new
/// snapshot that shares the same message cache. The guild and parent
/// channel are referenced by id and resolved through the store.
#[derive(Debug, Clone)]
pub struct Channel {
    pub id: Snowflake,
    pub kind: ChannelType,
    /// `None` for direct messages.
    pub guild_id: Option<Snowflake>,
    pub name: String,
    pub topic: String,
    pub position: Option<i32>,
    /// Category this channel sits under.
    pub parent_id: Option<Snowflake>,
    pub nsfw: bool,
    pub last_message_id: Option<Snowflake>,
    /// Thread member count; the platform stops counting at 50.
    pub member_count: u32,
    pub bitrate: Option<u32>,
    pub user_limit: Option<u32>,
    /// Slowmode in seconds (0-21600).
    pub rate_limit_per_user: Option<u32>,
    permission_overwrites: Vec<Overwrite>,
    messages: Arc<SweepingCache<Snowflake, Message>>,
}

impl Channel {
    /// Build from a payload. A repeated overwrite id keeps the last entry.
    pub fn from_payload(
        payload: ChannelPayload,
        messages: Arc<SweepingCache<Snowflake, Message>>,
    ) -> Self {
        let mut channel = Self {
            id: payload.id,
            kind: payload.kind,
            guild_id: payload.guild_id,
            name: payload.name.unwrap_or_default(),
            topic: payload.topic.unwrap_or_default(),
            position: payload.position,
            parent_id: payload.parent_id,
            nsfw: payload.nsfw.unwrap_or(false),
            last_message_id: payload.last_message_id,
            member_count: payload.member_count.unwrap_or(0),
            bitrate: payload.bitrate,
            user_limit: payload.user_limit,
            rate_limit_per_user: payload.rate_limit_per_user,
            permission_overwrites: Vec::with_capacity(payload.permission_overwrites.len()),
            messages,
        };
        for overwrite in payload.permission_overwrites {
            channel.upsert_overwrite(overwrite);
        }
        channel
    }

    /// Overwrites in payload order, one per subject id.
    pub fn overwrites(&self) -> &[Overwrite] {
        &self.permission_overwrites
    }

    pub fn overwrite(&self, id: Snowflake) -> Option<&Overwrite> {
        self.permission_overwrites.iter().find(|o| o.id == id)
    }

    /// Insert an overwrite, replacing any existing one for the same id.
    pub fn upsert_overwrite(&mut self, overwrite: Overwrite) {
        match self
            .permission_overwrites
            .iter_mut()
            .find(|o| o.id == overwrite.id)
        {
            Some(existing) => *existing = overwrite,
            None => self.permission_overwrites.push(overwrite),
        }
    }

    /// Remove the overwrite for `id`. Returns `true` if one existed.
    pub fn remove_overwrite(&mut self, id: Snowflake) -> bool {
        let before = self.permission_overwrites.len();
        self.permission_overwrites.retain(|o| o.id != id);
        self.permission_overwrites.len() != before
    }

    /// Messages received in this channel, subject to the sweep policy.
    pub fn messages(&self) -> &SweepingCache<Snowflake, Message> {
        &self.messages
    }

    pub(crate) fn messages_handle(&self) -> Arc<SweepingCache<Snowflake, Message>> {
        Arc::clone(&self.messages)
    }

    /// Whether every overwrite here has an identical counterpart on `parent`.
    ///
    /// `false` when there is no parent.
    pub fn is_synced(&self, parent: Option<&Self>) -> bool {
        let Some(parent) = parent else {
            return false;
        };
        self.permission_overwrites.iter().all(|ow| {
            parent
                .overwrite(ow.id)
                .is_some_and(|theirs| theirs.matches(ow))
        })
    }

    /// Creation body that reproduces this channel's settings.
    pub fn to_create_payload(&self) -> CreateGuildChannel {
        CreateGuildChannel {
            name: self.name.clone(),
            kind: self.kind,
            topic: self.topic.clone(),
            bitrate: self.bitrate,
            user_limit: self.user_limit,
            rate_limit_per_user: self.rate_limit_per_user,
            position: self.position,
            parent_id: self.parent_id,
            nsfw: self.nsfw,
            permission_overwrites: self.permission_overwrites.clone(),
        }
    }
}
