//! Permission resolution logic.

use std::collections::HashSet;

use tessera_common::{Permissions, Snowflake};

use crate::models::{Channel, Guild, Member, OverwriteKind};

/// Compute a member's guild-level permissions.
///
/// Resolution order:
/// 1. Guild owner has all permissions
/// 2. Start with the default role's permissions
/// 3. Add permissions from each assigned role
/// 4. `ADMINISTRATOR` expands to all permissions
pub fn compute_base_permissions(guild: &Guild, member: &Member) -> Permissions {
    if guild.owner_id == member.user_id() {
        return Permissions::all();
    }

    let mut perms = guild.default_permissions();
    for role in member.roles.iter().filter_map(|id| guild.role(*id)) {
        perms |= role.permissions;
    }

    if perms.has_all(Permissions::ADMINISTRATOR) {
        return Permissions::all();
    }
    perms
}

/// Apply a channel's overwrites to `base` for one subject.
///
/// `subject_id` is the member's user id and `role_ids` the roles it holds.
/// Tiers, lowest first: the default-role overwrite (keyed by the channel's
/// guild id), the union of overwrites for held roles, then the member's own
/// overwrite. A flag no applicable overwrite mentions keeps its value from
/// the tier below.
pub fn resolve_overwrites(
    base: Permissions,
    subject_id: Snowflake,
    role_ids: &HashSet<Snowflake>,
    channel: &Channel,
) -> Permissions {
    let mut perms = base;

    // Default role
    if let Some(ow) = channel.guild_id.and_then(|id| channel.overwrite(id)) {
        perms = perms.apply_overwrite(ow.allow, ow.deny);
    }

    // Roles, unioned so the result does not depend on iteration order
    let mut role_allow = Permissions::empty();
    let mut role_deny = Permissions::empty();
    for ow in channel.overwrites() {
        let is_default_role = Some(ow.id) == channel.guild_id;
        if ow.kind == OverwriteKind::Role && !is_default_role && role_ids.contains(&ow.id) {
            role_allow |= ow.allow;
            role_deny |= ow.deny;
        }
    }
    perms = perms.apply_overwrite(role_allow, role_deny);

    // Member
    if let Some(ow) = channel
        .overwrites()
        .iter()
        .find(|o| o.kind == OverwriteKind::Member && o.id == subject_id)
    {
        perms = perms.apply_overwrite(ow.allow, ow.deny);
    }

    perms
}

/// Check `flags` against a single overwrite.
///
/// Uses the overwrite for `id`, or the default-role overwrite if `id` has
/// none. Held roles and the tier order are not considered; use
/// [`resolve_overwrites`] for effective permissions.
///
/// Returns `false` when neither overwrite exists. Otherwise `true` iff no
/// requested flag is denied and every requested flag is allowed.
pub fn channel_overwrite_has_permission(
    channel: &Channel,
    id: Snowflake,
    flags: Permissions,
) -> bool {
    let overwrite = channel
        .overwrite(id)
        .or_else(|| channel.guild_id.and_then(|guild_id| channel.overwrite(guild_id)));

    let Some(overwrite) = overwrite else {
        return false;
    };

    !overwrite.deny.intersects(flags) && overwrite.allow.has_all(flags)
}
