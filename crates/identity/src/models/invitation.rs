//! Invitation ledger types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quickimage_core::{Email, InvitationCode, InvitationStatus, Phone, RecordId, UserId};

/// Sentinel inviter id used for promotional codes.
const SYSTEM_INVITER: &str = "system";

/// Who issued an invitation.
///
/// Serializes as a plain string (`"system"` or the inviter's user id) so the
/// ledger stays readable by the legacy client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Inviter {
    /// A regular user's invitation code was used.
    User(UserId),
    /// A promotional code with no associated inviter.
    System,
}

impl From<String> for Inviter {
    fn from(s: String) -> Self {
        if s == SYSTEM_INVITER {
            Self::System
        } else {
            Self::User(UserId::new(s))
        }
    }
}

impl From<Inviter> for String {
    fn from(inviter: Inviter) -> Self {
        match inviter {
            Inviter::User(id) => id.into_inner(),
            Inviter::System => SYSTEM_INVITER.to_owned(),
        }
    }
}

/// One entry in the append-only invitation log.
///
/// Created exactly once per successful `process_invitation` call and never
/// mutated or deleted afterwards; the log is the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationRecord {
    /// Unique record id.
    pub id: RecordId,
    /// Who invited, or [`Inviter::System`] for promotional codes.
    pub inviter_id: Inviter,
    /// The user created by this signup.
    pub invitee_id: UserId,
    /// Invitee display name at signup time.
    pub invitee_name: String,
    /// Invitee email, for email signups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invitee_email: Option<Email>,
    /// Invitee phone, for phone signups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invitee_phone: Option<Phone>,
    /// The code that was redeemed.
    pub invitation_code: InvitationCode,
    /// Always `Completed` for records written by this subsystem.
    pub status: InvitationStatus,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the invitation completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Credits granted for this invitation.
    pub reward_credits: u64,
}

/// Aggregated invitation statistics for one inviter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationStats {
    /// Number of completed invitations.
    pub successful_invitations: usize,
    /// Total credits earned across those invitations.
    pub total_credits_earned: u64,
    /// The inviter's own code.
    pub invitation_code: InvitationCode,
}

/// One page of an inviter's invitation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedInvitations {
    /// Records on this page, newest first.
    pub invitations: Vec<InvitationRecord>,
    /// Total records across all pages.
    pub total: usize,
    /// 1-based page number that was requested.
    pub page: usize,
    /// Page size that was requested.
    pub limit: usize,
    /// Ceiling-division page count.
    pub total_pages: usize,
}

/// Request to attribute a fresh signup to an invitation code.
#[derive(Debug, Clone)]
pub struct ProcessInvitation {
    /// The raw code the invitee supplied.
    pub code: String,
    /// The just-created user.
    pub invitee_id: UserId,
    /// Their display name.
    pub invitee_name: String,
    /// Their email, if they signed up by email.
    pub invitee_email: Option<Email>,
    /// Their phone, if they signed up by phone.
    pub invitee_phone: Option<Phone>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_inviter_serializes_as_string() {
        let system = serde_json::to_string(&Inviter::System).unwrap();
        assert_eq!(system, "\"system\"");

        let user = serde_json::to_string(&Inviter::User(UserId::new("u-9"))).unwrap();
        assert_eq!(user, "\"u-9\"");

        let parsed: Inviter = serde_json::from_str("\"system\"").unwrap();
        assert_eq!(parsed, Inviter::System);
        let parsed: Inviter = serde_json::from_str("\"u-9\"").unwrap();
        assert_eq!(parsed, Inviter::User(UserId::new("u-9")));
    }

    #[test]
    fn test_record_uses_legacy_field_names() {
        let record = InvitationRecord {
            id: RecordId::new("1"),
            inviter_id: Inviter::User(UserId::new("u-1")),
            invitee_id: UserId::new("u-2"),
            invitee_name: "测试用户".to_owned(),
            invitee_email: Some(Email::parse("test@example.com").unwrap()),
            invitee_phone: None,
            invitation_code: InvitationCode::parse("1234").unwrap(),
            status: InvitationStatus::Completed,
            created_at: "2024-01-15T00:00:00Z".parse().unwrap(),
            completed_at: Some("2024-01-15T00:00:00Z".parse().unwrap()),
            reward_credits: 1000,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"inviterId\":\"u-1\""));
        assert!(json.contains("\"rewardCredits\":1000"));
        assert!(json.contains("\"status\":\"completed\""));
        assert!(!json.contains("inviteePhone"));

        let parsed: InvitationRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }
}
