//! Repositories over the durable key-value store.
//!
//! The subsystem persists three logical collections, each as one JSON
//! document under a fixed key:
//!
//! - [`keys::USERS`] - user records
//! - [`keys::CREDENTIALS`] - email → password-secret map
//! - [`keys::INVITATIONS`] / [`keys::INVITATION_CODES`] - the invitation log
//!   and the user → code assignments
//!
//! plus the restored-session key [`keys::SESSION`]. Key names match what the
//! legacy client wrote so existing data keeps loading.
//!
//! Repositories are cheap per-call views over a borrowed store; they do no
//! locking of their own. Callers that read-modify-write hold the owning
//! service's lock across the whole sequence.

pub mod invitations;
pub mod users;

use thiserror::Error;

use crate::store::StoreError;

/// Fixed storage keys for the persisted collections.
pub mod keys {
    /// User records.
    pub const USERS: &str = "quickimage_users";
    /// Email → password-secret map.
    pub const CREDENTIALS: &str = "quickimage_credentials";
    /// Append-only invitation log.
    pub const INVITATIONS: &str = "quickimage_invitations";
    /// User id → invitation code assignments.
    pub const INVITATION_CODES: &str = "quickimage_invitation_codes";
    /// Restored-session record.
    pub const SESSION: &str = "quickimage_auth_user";
}

/// Errors that can occur in repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The backing store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Data in the store could not be serialized.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}
