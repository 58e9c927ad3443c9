//! User account records, credentials, and credit grants.
//!
//! `AccountService` is the only component that writes the user and credential
//! collections. Every mutation runs under one write lock, so uniqueness
//! checks and read-modify-write sequences against the store never interleave;
//! in particular `add_credits` is the single credit write path and two
//! concurrent grants can never lose an update.

use std::sync::Arc;

use chrono::Utc;

use quickimage_core::{AuthMethod, Email, Phone, UserId};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::{NewUser, User};
use crate::store::KeyValueStore;

/// Owner of user and credential state.
pub struct AccountService {
    store: Arc<dyn KeyValueStore>,
    write_lock: tokio::sync::Mutex<()>,
}

impl AccountService {
    /// Create a new account service over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    fn users(&self) -> UserRepository<'_> {
        UserRepository::new(&*self.store)
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Find a user by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the read fails.
    pub async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        self.users().find_by_id(id).await
    }

    /// Find a user by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the read fails.
    pub async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        self.users().find_by_email(email).await
    }

    /// Find a user by canonical phone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the read fails.
    pub async fn find_by_phone(&self, phone: &Phone) -> Result<Option<User>, RepositoryError> {
        self.users().find_by_phone(phone).await
    }

    /// Get the password secret stored for `email`, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the read fails.
    pub async fn password_for(&self, email: &Email) -> Result<Option<String>, RepositoryError> {
        let credentials = self.users().credentials().await?;
        Ok(credentials.get(email.as_str()).cloned())
    }

    // =========================================================================
    // Mutations (all under the write lock)
    // =========================================================================

    /// Create a user, enforcing email/phone uniqueness.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email or phone is already
    /// registered.
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let repo = self.users();
        let mut users = repo.list().await?;

        if let Some(email) = &new_user.email
            && users.iter().any(|u| u.email.as_ref() == Some(email))
        {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        if let Some(phone) = &new_user.phone
            && users.iter().any(|u| u.phone.as_ref() == Some(phone))
        {
            return Err(RepositoryError::Conflict("phone already exists".to_owned()));
        }

        let user = User {
            id: UserId::generate(),
            auth_method: AuthMethod::from_channels(
                new_user.email.is_some(),
                new_user.phone.is_some(),
            ),
            email: new_user.email,
            phone: new_user.phone,
            name: new_user.name,
            email_verified: false,
            phone_verified: new_user.phone_verified,
            credits: new_user.credits,
            created_at: Utc::now(),
        };

        users.push(user.clone());
        repo.save(&users).await?;

        if let (Some(email), Some(password)) = (&user.email, new_user.password) {
            let mut credentials = repo.credentials().await?;
            credentials.insert(email.as_str().to_owned(), password);
            repo.save_credentials(&credentials).await?;
        }

        tracing::info!(user_id = %user.id, method = ?user.auth_method, "user created");
        Ok(user)
    }

    /// Update a user's name and email, re-keying any password credential when
    /// the email changes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user is gone, or
    /// `RepositoryError::Conflict` if another user owns the email.
    pub async fn update_profile(
        &self,
        user_id: &UserId,
        name: String,
        email: Email,
    ) -> Result<User, RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let repo = self.users();
        let mut users = repo.list().await?;

        if users
            .iter()
            .any(|u| u.email.as_ref() == Some(&email) && &u.id != user_id)
        {
            return Err(RepositoryError::Conflict(
                "email already in use by another account".to_owned(),
            ));
        }

        let user = users
            .iter_mut()
            .find(|u| &u.id == user_id)
            .ok_or(RepositoryError::NotFound)?;

        let previous_email = user.email.clone();
        user.name = name;
        user.email = Some(email.clone());
        user.auth_method = AuthMethod::from_channels(true, user.phone.is_some());
        let updated = user.clone();
        repo.save(&users).await?;

        // A password stays attached to the account when its email moves.
        if let Some(old_email) = previous_email
            && old_email != email
        {
            let mut credentials = repo.credentials().await?;
            if let Some(secret) = credentials.remove(old_email.as_str()) {
                credentials.insert(email.as_str().to_owned(), secret);
                repo.save_credentials(&credentials).await?;
            }
        }

        Ok(updated)
    }

    /// Replace the password secret for `email`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the write fails.
    pub async fn set_password(&self, email: &Email, secret: String) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let repo = self.users();
        let mut credentials = repo.credentials().await?;
        credentials.insert(email.as_str().to_owned(), secret);
        repo.save_credentials(&credentials).await
    }

    /// Bind `phone` to an existing account and mark it verified.
    ///
    /// Promotes `auth_method` to `Both` when the account has an email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user is gone, or
    /// `RepositoryError::Conflict` if another user owns the phone.
    pub async fn bind_phone(&self, user_id: &UserId, phone: Phone) -> Result<User, RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let repo = self.users();
        let mut users = repo.list().await?;

        if users
            .iter()
            .any(|u| u.phone.as_ref() == Some(&phone) && &u.id != user_id)
        {
            return Err(RepositoryError::Conflict("phone already exists".to_owned()));
        }

        let user = users
            .iter_mut()
            .find(|u| &u.id == user_id)
            .ok_or(RepositoryError::NotFound)?;

        user.phone = Some(phone);
        user.phone_verified = true;
        user.auth_method = AuthMethod::from_channels(user.email.is_some(), true);
        let updated = user.clone();
        repo.save(&users).await?;
        Ok(updated)
    }

    /// Mark a user's email as verified. The flag only ever goes false→true.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user is gone.
    pub async fn set_email_verified(&self, user_id: &UserId) -> Result<User, RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let repo = self.users();
        let mut users = repo.list().await?;

        let user = users
            .iter_mut()
            .find(|u| &u.id == user_id)
            .ok_or(RepositoryError::NotFound)?;
        user.email_verified = true;
        let updated = user.clone();
        repo.save(&users).await?;
        Ok(updated)
    }

    /// Grant `amount` credits to a user. Each call is one grant event; the
    /// balance never decreases.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user is gone.
    pub async fn add_credits(&self, user_id: &UserId, amount: u64) -> Result<User, RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let repo = self.users();
        let mut users = repo.list().await?;

        let user = users
            .iter_mut()
            .find(|u| &u.id == user_id)
            .ok_or(RepositoryError::NotFound)?;
        user.credits = user.credits.plus(amount);
        let updated = user.clone();
        repo.save(&users).await?;

        tracing::debug!(%user_id, amount, balance = %updated.credits, "credits granted");
        Ok(updated)
    }

    /// Back-fill `auth_method` and the verification flags on records written
    /// by earlier client versions. Idempotent; run once at startup.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the collection cannot be read or
    /// rewritten.
    pub async fn migrate_legacy_users(&self) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let repo = self.users();
        let stored = repo.load_stored().await?;

        let legacy = stored.iter().filter(|u| u.is_legacy()).count();
        if legacy == 0 {
            return Ok(());
        }

        let migrated: Vec<User> = stored.into_iter().map(User::from).collect();
        repo.save(&migrated).await?;
        tracing::info!(count = legacy, "migrated legacy user records");
        Ok(())
    }
}
