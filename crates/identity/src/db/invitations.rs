//! Invitation repository over the key-value store.
//!
//! Owns two documents: the append-only invitation log and the user → code
//! assignment map. The log is audit data - records are appended, never
//! rewritten.

use std::collections::HashMap;

use quickimage_core::{InvitationCode, UserId};

use super::{RepositoryError, keys};
use crate::models::InvitationRecord;
use crate::store::KeyValueStore;

/// Repository for invitation records and code assignments.
pub struct InvitationRepository<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> InvitationRepository<'a> {
    /// Create a new invitation repository.
    #[must_use]
    pub const fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    /// Load the full invitation log.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the read fails.
    pub async fn records(&self) -> Result<Vec<InvitationRecord>, RepositoryError> {
        let Some(raw) = self.store.get(keys::INVITATIONS).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(records) => Ok(records),
            Err(error) => {
                tracing::warn!(%error, "undecodable invitation log, starting empty");
                Ok(Vec::new())
            }
        }
    }

    /// Append one record to the log.
    ///
    /// Callers hold the ledger lock, so load-push-save cannot interleave.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the write fails, or
    /// `RepositoryError::DataCorruption` if the log cannot be serialized.
    pub async fn append(&self, record: InvitationRecord) -> Result<(), RepositoryError> {
        let mut records = self.records().await?;
        records.push(record);
        let raw = serde_json::to_string(&records).map_err(|e| {
            RepositoryError::DataCorruption(format!("failed to serialize invitations: {e}"))
        })?;
        self.store.set(keys::INVITATIONS, &raw).await?;
        Ok(())
    }

    /// Load the user → code assignment map.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the read fails.
    pub async fn codes(&self) -> Result<HashMap<UserId, InvitationCode>, RepositoryError> {
        let Some(raw) = self.store.get(keys::INVITATION_CODES).await? else {
            return Ok(HashMap::new());
        };

        match serde_json::from_str(&raw) {
            Ok(codes) => Ok(codes),
            Err(error) => {
                tracing::warn!(%error, "undecodable code assignments, starting empty");
                Ok(HashMap::new())
            }
        }
    }

    /// Replace the code assignment map.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Store` if the write fails, or
    /// `RepositoryError::DataCorruption` if the map cannot be serialized.
    pub async fn save_codes(
        &self,
        codes: &HashMap<UserId, InvitationCode>,
    ) -> Result<(), RepositoryError> {
        let raw = serde_json::to_string(codes).map_err(|e| {
            RepositoryError::DataCorruption(format!("failed to serialize code assignments: {e}"))
        })?;
        self.store.set(keys::INVITATION_CODES, &raw).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use quickimage_core::{InvitationStatus, RecordId};

    use super::*;
    use crate::models::Inviter;
    use crate::store::MemoryStore;

    fn sample_record(id: &str) -> InvitationRecord {
        InvitationRecord {
            id: RecordId::new(id),
            inviter_id: Inviter::User(UserId::new("u-1")),
            invitee_id: UserId::new("u-2"),
            invitee_name: "invitee".to_owned(),
            invitee_email: None,
            invitee_phone: None,
            invitation_code: InvitationCode::parse("1234").unwrap(),
            status: InvitationStatus::Completed,
            created_at: Utc::now(),
            completed_at: Some(Utc::now()),
            reward_credits: 1000,
        }
    }

    #[tokio::test]
    async fn test_append_preserves_order() {
        let store = MemoryStore::new();
        let repo = InvitationRepository::new(&store);

        repo.append(sample_record("1")).await.unwrap();
        repo.append(sample_record("2")).await.unwrap();

        let records = repo.records().await.unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_codes_roundtrip() {
        let store = MemoryStore::new();
        let repo = InvitationRepository::new(&store);

        let mut codes = HashMap::new();
        codes.insert(UserId::new("u-1"), InvitationCode::parse("1234").unwrap());
        repo.save_codes(&codes).await.unwrap();

        let loaded = repo.codes().await.unwrap();
        assert_eq!(loaded, codes);
    }
}
