//! Channel permission resolution.
//!
//! Three overwrite tiers are layered over a member's base permissions:
//! - Default role: the overwrite keyed by the guild id
//! - Roles: every held role's overwrite, allow and deny each unioned
//! - Member: the overwrite keyed by the member's user id
//!
//! A higher tier always beats a lower one. Within a tier, deny beats allow.

pub mod resolver;

pub use resolver::{channel_overwrite_has_permission, compute_base_permissions, resolve_overwrites};
