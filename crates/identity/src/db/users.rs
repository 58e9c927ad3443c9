//! User repository over the key-value store.
//!
//! Loads and saves the `users` collection and the email → secret credential
//! map. Undecodable payloads are logged and treated as empty collections,
//! matching the cache-like semantics of the original client storage; store
//! I/O failures always propagate.

use std::collections::HashMap;

use quickimage_core::{Email, Phone, UserId};

use super::{RepositoryError, keys};
use crate::models::{StoredUser, User};
use crate::store::KeyValueStore;

/// Repository for user and credential records.
pub struct UserRepository<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    /// Load every user record in stored form.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the read fails.
    pub(crate) async fn load_stored(&self) -> Result<Vec<StoredUser>, RepositoryError> {
        let Some(raw) = self.store.get(keys::USERS).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(users) => Ok(users),
            Err(error) => {
                tracing::warn!(%error, "undecodable user collection, starting empty");
                Ok(Vec::new())
            }
        }
    }

    /// Load every user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the read fails.
    pub async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let stored = self.load_stored().await?;
        Ok(stored.into_iter().map(User::from).collect())
    }

    /// Replace the whole user collection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the write fails, or
    /// `RepositoryError::DataCorruption` if the records cannot be serialized.
    pub async fn save(&self, users: &[User]) -> Result<(), RepositoryError> {
        let stored: Vec<StoredUser> = users.iter().map(StoredUser::from).collect();
        self.save_stored(&stored).await
    }

    pub(crate) async fn save_stored(&self, users: &[StoredUser]) -> Result<(), RepositoryError> {
        let raw = serde_json::to_string(users).map_err(|e| {
            RepositoryError::DataCorruption(format!("failed to serialize users: {e}"))
        })?;
        self.store.set(keys::USERS, &raw).await?;
        Ok(())
    }

    /// Find a user by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the read fails.
    pub async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let users = self.list().await?;
        Ok(users.into_iter().find(|u| &u.id == id))
    }

    /// Find a user by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the read fails.
    pub async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let users = self.list().await?;
        Ok(users.into_iter().find(|u| u.email.as_ref() == Some(email)))
    }

    /// Find a user by canonical phone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the read fails.
    pub async fn find_by_phone(&self, phone: &Phone) -> Result<Option<User>, RepositoryError> {
        let users = self.list().await?;
        Ok(users.into_iter().find(|u| u.phone.as_ref() == Some(phone)))
    }

    /// Load the email → password-secret map.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the read fails.
    pub async fn credentials(&self) -> Result<HashMap<String, String>, RepositoryError> {
        let Some(raw) = self.store.get(keys::CREDENTIALS).await? else {
            return Ok(HashMap::new());
        };

        match serde_json::from_str(&raw) {
            Ok(credentials) => Ok(credentials),
            Err(error) => {
                tracing::warn!(%error, "undecodable credential map, starting empty");
                Ok(HashMap::new())
            }
        }
    }

    /// Replace the credential map.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the write fails, or
    /// `RepositoryError::DataCorruption` if the map cannot be serialized.
    pub async fn save_credentials(
        &self,
        credentials: &HashMap<String, String>,
    ) -> Result<(), RepositoryError> {
        let raw = serde_json::to_string(credentials).map_err(|e| {
            RepositoryError::DataCorruption(format!("failed to serialize credentials: {e}"))
        })?;
        self.store.set(keys::CREDENTIALS, &raw).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use quickimage_core::{AuthMethod, Credits};

    use super::*;
    use crate::store::MemoryStore;

    fn sample_user(id: &str, email: &str) -> User {
        User {
            id: UserId::new(id),
            email: Some(Email::parse(email).unwrap()),
            phone: None,
            name: "demo".to_owned(),
            auth_method: AuthMethod::Email,
            email_verified: false,
            phone_verified: false,
            credits: Credits::new(50),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_empty_store_lists_nothing() {
        let store = MemoryStore::new();
        let repo = UserRepository::new(&store);
        assert!(repo.list().await.unwrap().is_empty());
        assert!(repo.credentials().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_and_find() {
        let store = MemoryStore::new();
        let repo = UserRepository::new(&store);

        let users = vec![sample_user("1", "a@b.com"), sample_user("2", "c@d.com")];
        repo.save(&users).await.unwrap();

        let found = repo
            .find_by_email(&Email::parse("c@d.com").unwrap())
            .await
            .unwrap();
        assert_eq!(found.map(|u| u.id), Some(UserId::new("2")));
        assert!(
            repo.find_by_id(&UserId::new("missing"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_corrupt_collection_starts_empty() {
        let store = MemoryStore::with_entries([(keys::USERS.to_owned(), "{not json".to_owned())]);
        let repo = UserRepository::new(&store);
        assert!(repo.list().await.unwrap().is_empty());
    }
}
