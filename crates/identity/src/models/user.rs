//! User domain and persisted types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quickimage_core::{AuthMethod, Credits, Email, Phone, UserId};

/// A QuickImage user (domain type).
///
/// At least one of `email`/`phone` is always present; both uniqueness and the
/// `auth_method` derivation are enforced by the account service, never here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID, assigned at creation and never reused.
    pub id: UserId,
    /// Email address, unique across users when present.
    pub email: Option<Email>,
    /// Canonical phone number, unique across users when present.
    pub phone: Option<Phone>,
    /// Display name.
    pub name: String,
    /// How this user authenticates.
    pub auth_method: AuthMethod,
    /// Whether the email channel has been verified.
    pub email_verified: bool,
    /// Whether the phone channel has been verified.
    pub phone_verified: bool,
    /// Credit balance. Only ever increases within this subsystem.
    pub credits: Credits,
    /// When the user was created. Immutable.
    pub created_at: DateTime<Utc>,
}

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Email address, if registering by email.
    pub email: Option<Email>,
    /// Phone number, if registering by phone.
    pub phone: Option<Phone>,
    /// Display name.
    pub name: String,
    /// Password secret, stored in the credential map (email accounts only).
    pub password: Option<String>,
    /// Whether the phone was already proven at registration time.
    pub phone_verified: bool,
    /// Starting credit grant.
    pub credits: Credits,
}

/// The persisted form of a [`User`].
///
/// Records written by earlier client versions may be missing `authMethod`
/// and the verification flags; those fields stay optional here and are
/// back-filled once by the legacy migration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StoredUser {
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<Phone>,
    pub name: String,
    #[serde(default)]
    pub auth_method: Option<AuthMethod>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub phone_verified: Option<bool>,
    #[serde(default)]
    pub credits: Credits,
    pub created_at: DateTime<Utc>,
}

impl StoredUser {
    /// Whether this record predates the `auth_method`/verification-flag
    /// schema and needs the one-time back-fill.
    pub(crate) const fn is_legacy(&self) -> bool {
        self.auth_method.is_none() || self.email_verified.is_none() || self.phone_verified.is_none()
    }
}

impl From<StoredUser> for User {
    fn from(stored: StoredUser) -> Self {
        let auth_method = stored.auth_method.unwrap_or_else(|| {
            AuthMethod::from_channels(stored.email.is_some(), stored.phone.is_some())
        });
        Self {
            id: stored.id,
            email: stored.email,
            phone: stored.phone,
            name: stored.name,
            auth_method,
            email_verified: stored.email_verified.unwrap_or(false),
            phone_verified: stored.phone_verified.unwrap_or(false),
            credits: stored.credits,
            created_at: stored.created_at,
        }
    }
}

impl From<&User> for StoredUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            name: user.name.clone(),
            auth_method: Some(user.auth_method),
            email_verified: Some(user.email_verified),
            phone_verified: Some(user.phone_verified),
            credits: user.credits,
            created_at: user.created_at,
        }
    }
}
