use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur while processing invitations.
#[derive(Debug, Error)]
pub enum InvitationError {
    /// The code is neither an assigned user code nor a promotional code.
    #[error("invalid invitation code")]
    InvalidCode,

    /// This account already redeemed this code.
    #[error("invitation code already used by this account")]
    AlreadyUsedByThisAccount,

    /// Both the 4-digit and 6-digit spaces failed to yield a free code.
    #[error("invitation code space exhausted")]
    CodeSpaceExhausted,

    /// Underlying storage failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
