//! Domain and persisted record types.
//!
//! Domain types (`User`, `InvitationRecord`, ...) are what the services hand
//! to callers; the `Stored*` shapes are the serde forms written to the store,
//! kept field-compatible with the records the legacy client persisted
//! (camelCase keys, RFC 3339 timestamps).

pub mod invitation;
pub mod user;

pub use invitation::{
    InvitationRecord, InvitationStats, Inviter, PaginatedInvitations, ProcessInvitation,
};
pub use user::{NewUser, User};

pub(crate) use user::StoredUser;
