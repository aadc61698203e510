//! Entity Store
//!
//! Per-client caches for every entity kind. Guilds, channels and members sit
//! in unbounded `DashMap`s; each channel owns a [`SweepingCache`] of its
//! messages, wired with the store's message sweep policy when the channel is
//! first seen.
//!
//! Entries are immutable `Arc` snapshots. An update replaces the snapshot, so
//! a caller holding an older `Arc` keeps a consistent view. Back-references
//! (a channel's guild or parent) are ids resolved through the store.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tessera_common::{Permissions, Snowflake};
use tracing::debug;

use crate::cache::{CacheEntry, SweeperOptions, SweepingCache};
use crate::config::ClientConfig;
use crate::models::{Channel, ChannelPayload, Guild, Member, Message};
use crate::permissions::{compute_base_permissions, resolve_overwrites};

type MessageCache = SweepingCache<Snowflake, Message>;

/// The set of caches owned by one client.
#[derive(Debug)]
pub struct EntityStore {
    guilds: DashMap<Snowflake, Arc<Guild>>,
    channels: DashMap<Snowflake, Arc<Channel>>,
    /// Keyed by (guild id, user id).
    members: DashMap<(Snowflake, Snowflake), Arc<Member>>,
    message_sweeper: SweeperOptions<Snowflake, Message>,
    /// Set by `stop`; message caches created afterwards are unswept.
    stopped: AtomicBool,
}

impl EntityStore {
    /// Create a store whose message caches use `message_sweeper`.
    pub fn new(message_sweeper: SweeperOptions<Snowflake, Message>) -> Self {
        Self {
            guilds: DashMap::new(),
            channels: DashMap::new(),
            members: DashMap::new(),
            message_sweeper,
            stopped: AtomicBool::new(false),
        }
    }

    /// Create a store that drops messages older than the configured retention.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(SweeperOptions::older_than(
            config.message_retention,
            config.message_sweep_interval,
        ))
    }

    /// Replace the message sweep policy for channels cached from now on.
    ///
    /// Channels already cached keep the policy they were created with.
    #[must_use]
    pub fn with_message_filter<F>(mut self, interval: std::time::Duration, filter: F) -> Self
    where
        F: Fn(&Snowflake, &CacheEntry<Message>) -> bool + Send + Sync + 'static,
    {
        self.message_sweeper = SweeperOptions::new(interval, filter);
        self
    }

    fn new_message_cache(&self) -> Arc<MessageCache> {
        if self.stopped.load(Ordering::Acquire) {
            return Arc::new(SweepingCache::new());
        }
        Arc::new(SweepingCache::with_sweeper(self.message_sweeper.clone()))
    }

    // Guilds

    pub fn insert_guild(&self, guild: Guild) -> Arc<Guild> {
        debug!(guild_id = %guild.id, roles = guild.roles.len(), "Caching guild");
        let guild = Arc::new(guild);
        self.guilds.insert(guild.id, Arc::clone(&guild));
        guild
    }

    pub fn get_guild(&self, id: Snowflake) -> Option<Arc<Guild>> {
        self.guilds.get(&id).map(|g| Arc::clone(g.value()))
    }

    /// Remove a guild together with its channels and members.
    pub fn remove_guild(&self, id: Snowflake) -> Option<Arc<Guild>> {
        let removed = self.guilds.remove(&id).map(|(_, g)| g);

        let mut channels = 0usize;
        self.channels.retain(|_, channel| {
            if channel.guild_id == Some(id) {
                channel.messages().stop();
                channels += 1;
                false
            } else {
                true
            }
        });
        self.members.retain(|(guild_id, _), _| *guild_id != id);

        debug!(guild_id = %id, channels, "Removed guild");
        removed
    }

    // Channels

    /// Cache a channel payload, returning the new snapshot.
    ///
    /// A channel already cached keeps its message cache.
    pub fn insert_channel(&self, payload: ChannelPayload) -> Arc<Channel> {
        let id = payload.id;
        let channel = match self.channels.entry(id) {
            Entry::Occupied(mut entry) => {
                let messages = entry.get().messages_handle();
                let channel = Arc::new(Channel::from_payload(payload, messages));
                entry.insert(Arc::clone(&channel));
                channel
            }
            Entry::Vacant(entry) => {
                let channel = Arc::new(Channel::from_payload(payload, self.new_message_cache()));
                entry.insert(Arc::clone(&channel));
                channel
            }
        };
        debug!(
            channel_id = %id,
            overwrites = channel.overwrites().len(),
            "Cached channel"
        );
        channel
    }

    pub fn get_channel(&self, id: Snowflake) -> Option<Arc<Channel>> {
        self.channels.get(&id).map(|c| Arc::clone(c.value()))
    }

    /// Apply `f` to a copy of the cached channel and store the result.
    ///
    /// Returns the new snapshot, or `None` if the channel is not cached.
    pub fn update_channel<F>(&self, id: Snowflake, f: F) -> Option<Arc<Channel>>
    where
        F: FnOnce(&mut Channel),
    {
        let mut entry = self.channels.get_mut(&id)?;
        f(Arc::make_mut(entry.value_mut()));
        Some(Arc::clone(entry.value()))
    }

    /// Remove a channel and stop its message sweeper.
    pub fn remove_channel(&self, id: Snowflake) -> Option<Arc<Channel>> {
        let (_, channel) = self.channels.remove(&id)?;
        channel.messages().stop();
        debug!(channel_id = %id, "Removed channel");
        Some(channel)
    }

    /// Channels cached for a guild.
    pub fn channels_in(&self, guild_id: Snowflake) -> Vec<Arc<Channel>> {
        self.channels
            .iter()
            .filter(|c| c.guild_id == Some(guild_id))
            .map(|c| Arc::clone(c.value()))
            .collect()
    }

    /// The cached guild `channel` belongs to.
    pub fn guild_of(&self, channel: &Channel) -> Option<Arc<Guild>> {
        channel.guild_id.and_then(|id| self.get_guild(id))
    }

    /// The cached category `channel` sits under.
    pub fn parent_of(&self, channel: &Channel) -> Option<Arc<Channel>> {
        channel.parent_id.and_then(|id| self.get_channel(id))
    }

    // Messages

    /// Cache a message in its channel's message cache.
    ///
    /// Returns `false` and drops the message if the channel is not cached.
    pub fn insert_message(&self, message: Message) -> bool {
        let Some(channel) = self.get_channel(message.channel_id) else {
            debug!(
                channel_id = %message.channel_id,
                message_id = %message.id,
                "Dropping message for uncached channel"
            );
            return false;
        };
        debug!(channel_id = %channel.id, message_id = %message.id, "Cached message");
        channel.messages().insert(message.id, message);
        true
    }

    pub fn get_message(&self, channel_id: Snowflake, message_id: Snowflake) -> Option<Message> {
        self.get_channel(channel_id)?.messages().get(&message_id)
    }

    /// Returns `true` iff the message was cached.
    pub fn remove_message(&self, channel_id: Snowflake, message_id: Snowflake) -> bool {
        let removed = self
            .get_channel(channel_id)
            .is_some_and(|c| c.messages().delete(&message_id));
        if removed {
            debug!(channel_id = %channel_id, message_id = %message_id, "Removed message");
        }
        removed
    }

    // Members

    pub fn insert_member(&self, guild_id: Snowflake, member: Member) -> Arc<Member> {
        let user_id = member.user_id();
        debug!(guild_id = %guild_id, user_id = %user_id, "Caching member");
        let member = Arc::new(member);
        self.members.insert((guild_id, user_id), Arc::clone(&member));
        member
    }

    pub fn get_member(&self, guild_id: Snowflake, user_id: Snowflake) -> Option<Arc<Member>> {
        self.members
            .get(&(guild_id, user_id))
            .map(|m| Arc::clone(m.value()))
    }

    pub fn remove_member(&self, guild_id: Snowflake, user_id: Snowflake) -> Option<Arc<Member>> {
        self.members.remove(&(guild_id, user_id)).map(|(_, m)| m)
    }

    // Permissions

    /// Effective permissions of a member in a guild channel.
    ///
    /// Administrators and the guild owner skip overwrites. `None` unless the
    /// channel, its guild and the member are all cached.
    pub fn member_channel_permissions(
        &self,
        user_id: Snowflake,
        channel_id: Snowflake,
    ) -> Option<Permissions> {
        let channel = self.get_channel(channel_id)?;
        let guild = self.guild_of(&channel)?;
        let member = self.get_member(guild.id, user_id)?;

        let base = compute_base_permissions(&guild, &member);
        if base.has_all(Permissions::ADMINISTRATOR) {
            return Some(base);
        }

        let roles: HashSet<Snowflake> = member.roles.iter().copied().collect();
        Some(resolve_overwrites(base, user_id, &roles, &channel))
    }

    /// Stop every message sweeper. Cached data stays readable.
    ///
    /// Channels cached afterwards get an unswept message cache.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        for channel in &self.channels {
            channel.messages().stop();
        }
    }
}

impl Drop for EntityStore {
    fn drop(&mut self) {
        self.stop();
    }
}
