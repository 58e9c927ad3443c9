//! Identity services.
//!
//! - [`VerificationCodeService`] - phone one-time codes
//! - [`AccountService`] - user records, credentials, and credit grants
//! - [`AuthService`] - session state and authentication flows
//! - [`InvitationService`] - invitation codes, ledger, and rewards
//! - [`delivery`] - SMS/email side-channels (mocked behind traits)

pub mod accounts;
pub mod auth;
pub mod delivery;
pub mod invitation;
pub mod verification;

pub use accounts::AccountService;
pub use auth::{AuthError, AuthService};
pub use delivery::{EmailDelivery, LoggingEmailDelivery, LoggingSmsDelivery, SmsDelivery};
pub use invitation::{InvitationError, InvitationService};
pub use verification::{VerificationCodeService, VerificationError};
