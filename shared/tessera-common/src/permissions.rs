//! Permission flags using bitflags.
//!
//! The platform numbers its permissions by bit position and keeps adding new
//! ones, so the mask is 128 bits wide and every algebra operation keeps bits
//! this crate has no name for yet.
//!
//! Wire form is the decimal string of the mask.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ParseError, Result};

bitflags! {
    /// Permission mask represented as a 128-bit bitfield.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Permissions: u128 {
        /// Create invite links
        const CREATE_INSTANT_INVITE    = 1 << 0;
        /// Kick members from the guild
        const KICK_MEMBERS             = 1 << 1;
        /// Ban members from the guild
        const BAN_MEMBERS              = 1 << 2;
        /// Every permission, and bypasses channel overwrites
        const ADMINISTRATOR            = 1 << 3;
        /// Create, edit, and delete channels
        const MANAGE_CHANNELS          = 1 << 4;
        /// Modify guild settings
        const MANAGE_GUILD             = 1 << 5;
        /// Add reactions to messages
        const ADD_REACTIONS            = 1 << 6;
        /// View the guild audit log
        const VIEW_AUDIT_LOG           = 1 << 7;
        /// Priority speaker in voice channels
        const PRIORITY_SPEAKER         = 1 << 8;
        /// Go live in voice channels
        const STREAM                   = 1 << 9;
        /// View a channel and read its messages
        const VIEW_CHANNEL             = 1 << 10;
        /// Send messages in text channels
        const SEND_MESSAGES            = 1 << 11;
        /// Send text-to-speech messages
        const SEND_TTS_MESSAGES        = 1 << 12;
        /// Delete and pin messages from other members
        const MANAGE_MESSAGES          = 1 << 13;
        /// Links are auto-embedded
        const EMBED_LINKS              = 1 << 14;
        /// Upload files
        const ATTACH_FILES             = 1 << 15;
        /// Read message history
        const READ_MESSAGE_HISTORY     = 1 << 16;
        /// Mention @everyone and @here
        const MENTION_EVERYONE         = 1 << 17;
        /// Use emoji from other guilds
        const USE_EXTERNAL_EMOJIS      = 1 << 18;
        /// View guild insights
        const VIEW_GUILD_INSIGHTS      = 1 << 19;
        /// Join voice channels
        const CONNECT                  = 1 << 20;
        /// Speak in voice channels
        const SPEAK                    = 1 << 21;
        /// Mute members in voice channels
        const MUTE_MEMBERS             = 1 << 22;
        /// Deafen members in voice channels
        const DEAFEN_MEMBERS           = 1 << 23;
        /// Move members between voice channels
        const MOVE_MEMBERS             = 1 << 24;
        /// Use voice activity detection
        const USE_VAD                  = 1 << 25;
        /// Change own nickname
        const CHANGE_NICKNAME          = 1 << 26;
        /// Change other members' nicknames
        const MANAGE_NICKNAMES         = 1 << 27;
        /// Create, edit, and delete roles
        const MANAGE_ROLES             = 1 << 28;
        /// Create, edit, and delete webhooks
        const MANAGE_WEBHOOKS          = 1 << 29;
        /// Create, edit, and delete emojis and stickers
        const MANAGE_EMOJIS            = 1 << 30;
        /// Use application commands
        const USE_SLASH_COMMANDS       = 1 << 31;
        /// Request to speak in stage channels
        const REQUEST_TO_SPEAK         = 1 << 32;
        /// Create, edit, and delete scheduled events
        const MANAGE_EVENTS            = 1 << 33;
        /// Archive, delete, and view all threads
        const MANAGE_THREADS           = 1 << 34;
        /// Create public and announcement threads
        const CREATE_PUBLIC_THREADS    = 1 << 35;
        /// Create private threads
        const CREATE_PRIVATE_THREADS   = 1 << 36;
        /// Use stickers from other guilds
        const USE_EXTERNAL_STICKERS    = 1 << 37;
        /// Send messages in threads
        const SEND_MESSAGES_IN_THREADS = 1 << 38;
        /// Launch embedded activities in voice channels
        const START_EMBEDDED_ACTIVITIES = 1 << 39;
        /// Time out members
        const MODERATE_MEMBERS         = 1 << 40;
    }
}

impl Permissions {
    /// Parse a mask from its decimal or `0x`-prefixed hex form.
    ///
    /// Bits without a named flag are kept.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || ParseError::InvalidBitmask(s.to_owned());
        let (digits, radix) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => (hex, 16),
            None => (s, 10),
        };
        if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
            return Err(invalid());
        }
        u128::from_str_radix(digits, radix)
            .map(Self::from_bits_retain)
            .map_err(|_| invalid())
    }

    /// Check that every bit of `flags` is set in `self`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tessera_common::Permissions;
    ///
    /// let perms = Permissions::SEND_MESSAGES | Permissions::VIEW_CHANNEL;
    /// assert!(perms.has_all(Permissions::SEND_MESSAGES));
    /// assert!(!perms.has_all(Permissions::SEND_MESSAGES | Permissions::BAN_MEMBERS));
    /// ```
    #[must_use]
    pub const fn has_all(self, flags: Self) -> bool {
        self.bits() & flags.bits() == flags.bits()
    }

    /// Apply one overwrite tier: grant `allow`, then clear `deny`.
    ///
    /// A bit present in both ends up cleared. Bits present in neither keep
    /// their value. Unknown bits survive, unlike `!deny` which would
    /// truncate them.
    #[must_use]
    pub const fn apply_overwrite(self, allow: Self, deny: Self) -> Self {
        Self::from_bits_retain((self.bits() | allow.bits()) & !deny.bits())
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

impl FromStr for Permissions {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Permissions {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Permissions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(PermissionsVisitor)
    }
}

struct PermissionsVisitor;

impl Visitor<'_> for PermissionsVisitor {
    type Value = Permissions;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a permission mask as a decimal string or unsigned integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Permissions, E> {
        Permissions::parse(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Permissions, E> {
        Ok(Permissions::from_bits_retain(u128::from(v)))
    }
}
