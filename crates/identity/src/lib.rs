//! QuickImage identity subsystem.
//!
//! Everything the QuickImage UI needs to sign users up, prove who they are,
//! and reward invitations:
//!
//! - [`services::VerificationCodeService`] - short-lived, single-use phone
//!   verification codes
//! - [`services::AccountService`] - user records, credentials, and the single
//!   credit write path
//! - [`services::AuthService`] - session state and every login, registration,
//!   binding, and profile flow
//! - [`services::InvitationService`] - per-user invitation codes, the
//!   append-only invitation ledger, and reward grants
//!
//! Persistence goes through the [`store::KeyValueStore`] boundary; the
//! services own no storage mechanism of their own and can be constructed
//! per-test over [`store::MemoryStore`].
//!
//! # Wiring
//!
//! [`IdentityServices::open`] builds the whole service graph over one store,
//! runs the legacy-record migration, and restores any persisted session:
//!
//! ```
//! use std::sync::Arc;
//!
//! use quickimage_identity::{IdentityConfig, IdentityServices, store::MemoryStore};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), quickimage_identity::db::RepositoryError> {
//! let store = Arc::new(MemoryStore::new());
//! let services = IdentityServices::open(store, IdentityConfig::default()).await?;
//! assert!(!services.auth.is_authenticated());
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod store;

mod wiring;

pub use config::{ConfigError, IdentityConfig, PromotionalCode};
pub use wiring::IdentityServices;
