//! Stage instances.

use serde::{Deserialize, Serialize};
use tessera_common::Snowflake;

/// Who can see a stage instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PrivacyLevel {
    Public,
    GuildOnly,
}

impl TryFrom<u8> for PrivacyLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Public),
            2 => Ok(Self::GuildOnly),
            other => Err(format!("unknown privacy level {other}")),
        }
    }
}

impl From<PrivacyLevel> for u8 {
    fn from(level: PrivacyLevel) -> Self {
        match level {
            PrivacyLevel::Public => 1,
            PrivacyLevel::GuildOnly => 2,
        }
    }
}

/// A live stage attached to a stage channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageInstance {
    pub id: Snowflake,
    pub guild_id: Snowflake,
    pub channel_id: Snowflake,
    pub topic: String,
    pub privacy_level: PrivacyLevel,
}
