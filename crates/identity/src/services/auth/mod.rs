//! Authentication flows and session state.
//!
//! Supports two parallel front doors: email + password, and phone + one-time
//! code. Phone signups get a name derived from the number's last four digits
//! and start out phone-verified; email accounts can later bind a phone and
//! verify their email for bonus credits.
//!
//! The active session is a single user id, mirrored to the store so a
//! restarted process resumes where the previous one left off.

mod error;

pub use error::AuthError;

use std::sync::{Arc, PoisonError, RwLock};

use quickimage_core::{Credits, Email, Phone, UserId};

use crate::config::IdentityConfig;
use crate::db::{RepositoryError, keys};
use crate::models::{NewUser, ProcessInvitation, StoredUser, User};
use crate::services::accounts::AccountService;
use crate::services::delivery::EmailDelivery;
use crate::services::invitation::InvitationService;
use crate::services::verification::VerificationCodeService;
use crate::store::KeyValueStore;

const MIN_PASSWORD_LENGTH: usize = 6;

/// Registration, login, profile management, and the active session.
pub struct AuthService {
    accounts: Arc<AccountService>,
    verification: Arc<VerificationCodeService>,
    invitations: Arc<InvitationService>,
    email_delivery: Arc<dyn EmailDelivery>,
    store: Arc<dyn KeyValueStore>,
    session: RwLock<Option<UserId>>,
    config: IdentityConfig,
}

impl AuthService {
    /// Create a new auth service with no active session.
    #[must_use]
    pub fn new(
        accounts: Arc<AccountService>,
        verification: Arc<VerificationCodeService>,
        invitations: Arc<InvitationService>,
        email_delivery: Arc<dyn EmailDelivery>,
        store: Arc<dyn KeyValueStore>,
        config: IdentityConfig,
    ) -> Self {
        Self {
            accounts,
            verification,
            invitations,
            email_delivery,
            store,
            session: RwLock::new(None),
            config,
        }
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `MissingFields`, `InvalidEmail`, `UnknownAccount`, or
    /// `InvalidCredentials`.
    pub async fn login_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }
        let email = Email::parse(email)?;

        let user = self
            .accounts
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UnknownAccount)?;

        let stored = self.accounts.password_for(&email).await?;
        if stored.as_deref() != Some(password) {
            return Err(AuthError::InvalidCredentials);
        }

        self.start_session(&user).await;
        Ok(user)
    }

    /// Log in with phone and a verification code.
    ///
    /// # Errors
    ///
    /// Returns `Verification` if the code check fails, or `UnknownAccount` if
    /// no account owns the phone.
    pub async fn login_with_phone_code(&self, phone: &str, code: &str) -> Result<User, AuthError> {
        let phone = self.verification.verify(phone, code).await?;

        let user = self
            .accounts
            .find_by_phone(&phone)
            .await?
            .ok_or(AuthError::UnknownAccount)?;

        self.start_session(&user).await;
        Ok(user)
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a new account with email and password.
    ///
    /// Grants the signup credits and, when `invitation_code` is given,
    /// attributes the signup to it (best-effort).
    ///
    /// # Errors
    ///
    /// Returns `MissingFields`, `InvalidEmail`, `WeakPassword`, or
    /// `EmailTaken`.
    pub async fn register_with_password(
        &self,
        email: &str,
        password: &str,
        name: &str,
        invitation_code: Option<&str>,
    ) -> Result<User, AuthError> {
        if email.trim().is_empty() || password.is_empty() || name.trim().is_empty() {
            return Err(AuthError::MissingFields);
        }
        check_password(password)?;
        let email = Email::parse(email)?;

        let user = self
            .accounts
            .create_user(NewUser {
                email: Some(email.clone()),
                phone: None,
                name: name.trim().to_owned(),
                password: Some(password.to_owned()),
                phone_verified: false,
                credits: Credits::new(self.config.signup_credits),
            })
            .await
            .map_err(conflict_to(AuthError::EmailTaken))?;

        let user = self
            .attribute_invitation(user, invitation_code, Some(email), None)
            .await?;
        self.start_session(&user).await;
        Ok(user)
    }

    /// Register a new account with phone and a verification code.
    ///
    /// The account starts phone-verified with a name derived from the
    /// number's last four digits.
    ///
    /// # Errors
    ///
    /// Returns `Verification` if the code check fails, or `PhoneTaken`.
    pub async fn register_with_phone_code(
        &self,
        phone: &str,
        code: &str,
        invitation_code: Option<&str>,
    ) -> Result<User, AuthError> {
        let phone = self.verification.verify(phone, code).await?;

        let user = self
            .accounts
            .create_user(NewUser {
                email: None,
                phone: Some(phone.clone()),
                name: format!("用户{}", phone.last_four()),
                password: None,
                phone_verified: true,
                credits: Credits::new(self.config.signup_credits),
            })
            .await
            .map_err(conflict_to(AuthError::PhoneTaken))?;

        let user = self
            .attribute_invitation(user, invitation_code, None, Some(phone))
            .await?;
        self.start_session(&user).await;
        Ok(user)
    }

    // =========================================================================
    // Account management
    // =========================================================================

    /// Bind a verified phone to the authenticated user and grant the bonus.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated`, `Verification`, or `PhoneTaken`.
    pub async fn bind_phone(
        &self,
        user_id: &UserId,
        phone: &str,
        code: &str,
    ) -> Result<User, AuthError> {
        self.require_session(user_id)?;
        let phone = self.verification.verify(phone, code).await?;

        self.accounts
            .bind_phone(user_id, phone)
            .await
            .map_err(conflict_to(AuthError::PhoneTaken))?;

        let user = self
            .accounts
            .add_credits(user_id, self.config.phone_bind_credits)
            .await?;
        self.persist_session(&user).await;
        Ok(user)
    }

    /// Update the authenticated user's display name and email.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated`, `MissingFields`, `InvalidEmail`, or
    /// `EmailTaken`.
    pub async fn update_profile(
        &self,
        user_id: &UserId,
        name: &str,
        email: &str,
    ) -> Result<User, AuthError> {
        self.require_session(user_id)?;
        if name.trim().is_empty() || email.trim().is_empty() {
            return Err(AuthError::MissingFields);
        }
        let email = Email::parse(email)?;

        let user = self
            .accounts
            .update_profile(user_id, name.trim().to_owned(), email)
            .await
            .map_err(conflict_to(AuthError::EmailTaken))?;
        self.persist_session(&user).await;
        Ok(user)
    }

    /// Change the authenticated user's password.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated`, `MissingFields`, `PhoneOnlyAccount`,
    /// `WrongCurrentPassword`, or `WeakPassword`.
    pub async fn update_password(
        &self,
        user_id: &UserId,
        current: &str,
        replacement: &str,
    ) -> Result<User, AuthError> {
        self.require_session(user_id)?;
        if current.is_empty() || replacement.is_empty() {
            return Err(AuthError::MissingFields);
        }
        check_password(replacement)?;

        let user = self
            .accounts
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UnknownAccount)?;
        let email = user.email.clone().ok_or(AuthError::PhoneOnlyAccount)?;

        let stored = self.accounts.password_for(&email).await?;
        if stored.as_deref() != Some(current) {
            return Err(AuthError::WrongCurrentPassword);
        }

        self.accounts
            .set_password(&email, replacement.to_owned())
            .await?;
        Ok(user)
    }

    /// Send an email verification code to the authenticated user.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated`, `PhoneOnlyAccount`, or `AlreadyVerified`.
    pub async fn send_email_verification(&self, user_id: &UserId) -> Result<(), AuthError> {
        self.require_session(user_id)?;

        let user = self
            .accounts
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UnknownAccount)?;
        let email = user.email.ok_or(AuthError::PhoneOnlyAccount)?;
        if user.email_verified {
            return Err(AuthError::AlreadyVerified);
        }

        if let Err(error) = self
            .email_delivery
            .send_code(&email, &self.config.mock_email_code)
            .await
        {
            tracing::warn!(%error, %email, "email delivery failed");
        }
        Ok(())
    }

    /// Verify the authenticated user's email and grant the bonus.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated`, `AlreadyVerified`, or `WrongCode`.
    pub async fn verify_email(&self, user_id: &UserId, code: &str) -> Result<User, AuthError> {
        self.require_session(user_id)?;

        let user = self
            .accounts
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UnknownAccount)?;
        if user.email.is_none() {
            return Err(AuthError::PhoneOnlyAccount);
        }
        if user.email_verified {
            return Err(AuthError::AlreadyVerified);
        }
        if code != self.config.mock_email_code {
            return Err(AuthError::WrongCode);
        }

        self.accounts.set_email_verified(user_id).await?;
        let user = self
            .accounts
            .add_credits(user_id, self.config.email_verification_credits)
            .await?;
        self.persist_session(&user).await;
        Ok(user)
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// The currently authenticated user, freshly loaded.
    ///
    /// # Errors
    ///
    /// Returns `Repository` on storage failure.
    pub async fn current_user(&self) -> Result<Option<User>, AuthError> {
        let Some(user_id) = self.session_id() else {
            return Ok(None);
        };
        Ok(self.accounts.find_by_id(&user_id).await?)
    }

    /// Whether a session is active.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session_id().is_some()
    }

    /// End the session and clear its persisted copy.
    pub async fn logout(&self) {
        *self
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;

        if let Err(error) = self.store.delete(keys::SESSION).await {
            tracing::warn!(%error, "failed to clear persisted session");
        }
    }

    /// Restore the session persisted by a previous process, if any.
    ///
    /// An undecodable snapshot, or one pointing at a user that no longer
    /// exists, is discarded.
    ///
    /// # Errors
    ///
    /// Returns `Repository` on storage failure.
    pub(crate) async fn restore_session(&self) -> Result<(), RepositoryError> {
        let Some(raw) = self.store.get(keys::SESSION).await? else {
            return Ok(());
        };

        let snapshot: StoredUser = match serde_json::from_str(&raw) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                tracing::warn!(%error, "undecodable session snapshot, discarding");
                self.store.delete(keys::SESSION).await?;
                return Ok(());
            }
        };

        if self.accounts.find_by_id(&snapshot.id).await?.is_none() {
            tracing::warn!(user_id = %snapshot.id, "persisted session for unknown user, discarding");
            self.store.delete(keys::SESSION).await?;
            return Ok(());
        }

        *self
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(snapshot.id);
        Ok(())
    }

    fn session_id(&self) -> Option<UserId> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn require_session(&self, user_id: &UserId) -> Result<(), AuthError> {
        if self.session_id().as_ref() == Some(user_id) {
            Ok(())
        } else {
            Err(AuthError::NotAuthenticated)
        }
    }

    async fn start_session(&self, user: &User) {
        *self
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(user.id.clone());
        self.persist_session(user).await;
    }

    /// Mirror the user snapshot to the store; failure is logged, the
    /// in-memory session stays valid.
    async fn persist_session(&self, user: &User) {
        let snapshot = StoredUser::from(user);
        match serde_json::to_string(&snapshot) {
            Ok(raw) => {
                if let Err(error) = self.store.set(keys::SESSION, &raw).await {
                    tracing::warn!(%error, "failed to persist session");
                }
            }
            Err(error) => tracing::warn!(%error, "failed to serialize session snapshot"),
        }
    }

    async fn attribute_invitation(
        &self,
        user: User,
        invitation_code: Option<&str>,
        email: Option<Email>,
        phone: Option<Phone>,
    ) -> Result<User, AuthError> {
        let Some(code) = invitation_code.map(str::trim).filter(|c| !c.is_empty()) else {
            return Ok(user);
        };

        let request = ProcessInvitation {
            code: code.to_owned(),
            invitee_id: user.id.clone(),
            invitee_name: user.name.clone(),
            invitee_email: email,
            invitee_phone: phone,
        };
        // A bad code never fails registration.
        if let Err(error) = self.invitations.process_invitation(request).await {
            tracing::warn!(%error, user_id = %user.id, "invitation attribution failed");
            return Ok(user);
        }

        // Promotional codes may have credited the invitee; return the fresh
        // balance.
        Ok(self.accounts.find_by_id(&user.id).await?.unwrap_or(user))
    }
}

fn check_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Map a repository conflict to the channel-specific taken error; everything
/// else passes through.
fn conflict_to(taken: AuthError) -> impl FnOnce(RepositoryError) -> AuthError {
    move |error| match error {
        RepositoryError::Conflict(_) => taken,
        other => AuthError::Repository(other),
    }
}
