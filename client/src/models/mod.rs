//! Entity models.
//!
//! Wire shapes are snake_case JSON with snowflakes and permission masks as
//! decimal strings; the `tessera_common` types handle that conversion, so
//! most models deserialize directly. `Channel` is the exception: it owns a
//! message cache and is built from a [`ChannelPayload`].

pub mod channel;
pub mod guild;
pub mod message;
pub mod overwrite;
pub mod stage;
pub mod user;
pub mod webhook;

pub use channel::{Channel, ChannelPayload, ChannelType, CreateGuildChannel};
pub use guild::{Guild, GuildPruneCountQuery, Member, Role};
pub use message::Message;
pub use overwrite::{Overwrite, OverwriteKind};
pub use stage::{PrivacyLevel, StageInstance};
pub use user::User;
pub use webhook::Webhook;
