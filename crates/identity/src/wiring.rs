//! Service graph construction.

use std::sync::Arc;

use crate::config::IdentityConfig;
use crate::db::RepositoryError;
use crate::services::accounts::AccountService;
use crate::services::auth::AuthService;
use crate::services::delivery::{LoggingEmailDelivery, LoggingSmsDelivery};
use crate::services::invitation::InvitationService;
use crate::services::verification::VerificationCodeService;
use crate::store::KeyValueStore;

/// The wired identity subsystem.
///
/// [`IdentityServices::open`] builds the whole graph over one store, runs the
/// legacy user migration, and restores any persisted session.
pub struct IdentityServices {
    /// User records, credentials, and credit grants.
    pub accounts: Arc<AccountService>,
    /// Phone one-time codes.
    pub verification: Arc<VerificationCodeService>,
    /// Invitation codes, ledger, and rewards.
    pub invitations: Arc<InvitationService>,
    /// Registration, login, and session state.
    pub auth: Arc<AuthService>,
}

impl IdentityServices {
    /// Open the identity subsystem over `store`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the legacy migration or session restore
    /// cannot read or write the store.
    pub async fn open(
        store: Arc<dyn KeyValueStore>,
        config: IdentityConfig,
    ) -> Result<Self, RepositoryError> {
        let accounts = Arc::new(AccountService::new(store.clone()));
        let verification = Arc::new(VerificationCodeService::new(
            &config,
            Arc::new(LoggingSmsDelivery),
        ));
        let invitations = Arc::new(InvitationService::new(
            store.clone(),
            accounts.clone(),
            config.clone(),
        ));
        let auth = Arc::new(AuthService::new(
            accounts.clone(),
            verification.clone(),
            invitations.clone(),
            Arc::new(LoggingEmailDelivery),
            store,
            config,
        ));

        accounts.migrate_legacy_users().await?;
        auth.restore_session().await?;

        Ok(Self {
            accounts,
            verification,
            invitations,
            auth,
        })
    }
}
