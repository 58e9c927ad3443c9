use thiserror::Error;

use quickimage_core::EmailError;

use crate::db::RepositoryError;
use crate::services::verification::VerificationError;

/// Errors that can occur during authentication flows.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required field was empty.
    #[error("please fill in all required fields")]
    MissingFields,

    /// The email address is malformed.
    #[error(transparent)]
    InvalidEmail(#[from] EmailError),

    /// Email/password combination did not match.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// No account exists for the given channel.
    #[error("no account found")]
    UnknownAccount,

    /// The email is already registered to another account.
    #[error("email already registered")]
    EmailTaken,

    /// The phone is already registered to another account.
    #[error("phone number already registered")]
    PhoneTaken,

    /// The password does not meet the minimum requirements.
    #[error("weak password: {0}")]
    WeakPassword(String),

    /// The operation requires an email-capable account.
    #[error("account has no email address")]
    PhoneOnlyAccount,

    /// The operation requires an authenticated session for this user.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The email is already verified.
    #[error("email already verified")]
    AlreadyVerified,

    /// The submitted verification code is wrong.
    #[error("wrong verification code")]
    WrongCode,

    /// The current password did not match.
    #[error("current password is incorrect")]
    WrongCurrentPassword,

    /// Phone verification failed.
    #[error(transparent)]
    Verification(#[from] VerificationError),

    /// Underlying storage failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
