//! Channel permission overwrites.

use serde::{Deserialize, Serialize};
use tessera_common::{Permissions, Snowflake};

/// Whether an overwrite targets a role or a single member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum OverwriteKind {
    Role,
    Member,
}

impl TryFrom<u8> for OverwriteKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Role),
            1 => Ok(Self::Member),
            other => Err(format!("unknown overwrite type {other}")),
        }
    }
}

impl From<OverwriteKind> for u8 {
    fn from(kind: OverwriteKind) -> Self {
        match kind {
            OverwriteKind::Role => 0,
            OverwriteKind::Member => 1,
        }
    }
}

/// Per-channel allow/deny masks for one role or member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overwrite {
    /// Role or user id.
    pub id: Snowflake,
    #[serde(rename = "type")]
    pub kind: OverwriteKind,
    pub allow: Permissions,
    pub deny: Permissions,
}

impl Overwrite {
    pub const fn role(id: Snowflake, allow: Permissions, deny: Permissions) -> Self {
        Self {
            id,
            kind: OverwriteKind::Role,
            allow,
            deny,
        }
    }

    pub const fn member(id: Snowflake, allow: Permissions, deny: Permissions) -> Self {
        Self {
            id,
            kind: OverwriteKind::Member,
            allow,
            deny,
        }
    }

    /// Same subject and identical masks.
    pub fn matches(&self, other: &Self) -> bool {
        self.id == other.id && self.allow == other.allow && self.deny == other.deny
    }
}
