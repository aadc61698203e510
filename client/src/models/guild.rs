//! Guilds, roles and members.

use serde::{Deserialize, Serialize};
use tessera_common::{Permissions, Snowflake};

use super::user::User;

/// A role in a guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: Snowflake,
    pub name: String,
    pub permissions: Permissions,
    /// Higher number = higher rank.
    #[serde(default)]
    pub position: i32,
}

/// A guild and its roles.
///
/// The default role (shown as @everyone) shares the guild's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    pub id: Snowflake,
    pub name: String,
    pub owner_id: Snowflake,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl Guild {
    /// Id of the default role.
    pub const fn default_role_id(&self) -> Snowflake {
        self.id
    }

    pub fn role(&self, id: Snowflake) -> Option<&Role> {
        self.roles.iter().find(|r| r.id == id)
    }

    /// Permissions of the default role, empty if it is not present.
    pub fn default_permissions(&self) -> Permissions {
        self.role(self.default_role_id())
            .map(|r| r.permissions)
            .unwrap_or_default()
    }
}

/// A user's membership in a guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user: User,
    /// Assigned roles, not including the default role.
    #[serde(default)]
    pub roles: Vec<Snowflake>,
    #[serde(default)]
    pub nick: Option<String>,
}

impl Member {
    pub const fn user_id(&self) -> Snowflake {
        self.user.id
    }
}

/// Query for `GET /guilds/{id}/prune`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuildPruneCountQuery {
    /// Inactivity window in days (1 or more). Platform default is 7.
    pub days: Option<u32>,
    /// Also count members holding these roles.
    pub include_roles: Vec<Snowflake>,
}

impl GuildPruneCountQuery {
    /// Render as a query string, including the leading `?` when non-empty.
    pub fn to_query_string(&self) -> String {
        let mut params = Vec::new();
        if let Some(days) = self.days {
            params.push(format!("days={days}"));
        }
        if !self.include_roles.is_empty() {
            let roles: Vec<String> = self.include_roles.iter().map(|r| r.to_string()).collect();
            params.push(format!("include_roles={}", roles.join(",")));
        }
        if params.is_empty() {
            String::new()
        } else {
            format!("?{}", params.join("&"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_guild_default_permissions() {
        let guild: Guild = serde_json::from_value(json!({
            "id": "100",
            "name": "Test Guild",
            "owner_id": "1",
            "roles": [
                { "id": "100", "name": "@everyone", "permissions": "3072", "position": 0 },
                { "id": "200", "name": "Moderator", "permissions": "8192", "position": 1 }
            ]
        }))
        .unwrap();

        assert_eq!(
            guild.default_permissions(),
            Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES
        );
        assert_eq!(guild.role(Snowflake::new(200)).unwrap().name, "Moderator");
        assert!(guild.role(Snowflake::new(300)).is_none());
    }

    #[test]
    fn test_prune_query_string() {
        assert_eq!(GuildPruneCountQuery::default().to_query_string(), "");

        let query = GuildPruneCountQuery {
            days: Some(30),
            include_roles: vec![Snowflake::new(1), Snowflake::new(2)],
        };
        assert_eq!(query.to_query_string(), "?days=30&include_roles=1,2");
    }
}
