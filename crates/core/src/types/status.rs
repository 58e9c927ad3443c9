//! Status enums for identity entities.

use serde::{Deserialize, Serialize};

/// How a user can authenticate.
///
/// Derived from which contact channels are present on the account. `Both` is
/// reachable only by binding a phone onto an existing email account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Email + password account.
    Email,
    /// Phone + one-time-code account.
    Phone,
    /// Email account with a bound, verified phone.
    Both,
}

impl AuthMethod {
    /// Derive the method from channel presence.
    #[must_use]
    pub const fn from_channels(has_email: bool, has_phone: bool) -> Self {
        match (has_email, has_phone) {
            (true, true) => Self::Both,
            (false, true) => Self::Phone,
            // A user always has at least one channel; default the degenerate
            // case to email rather than invent a variant for it.
            (true, false) | (false, false) => Self::Email,
        }
    }
}

/// Lifecycle status of an invitation record.
///
/// The ledger only ever appends completed records; `Pending` exists for
/// stored-data compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    /// Invitation issued but not yet completed.
    Pending,
    /// Invitee signed up and rewards were applied.
    Completed,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_channels() {
        assert_eq!(AuthMethod::from_channels(true, false), AuthMethod::Email);
        assert_eq!(AuthMethod::from_channels(false, true), AuthMethod::Phone);
        assert_eq!(AuthMethod::from_channels(true, true), AuthMethod::Both);
    }

    #[test]
    fn test_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&AuthMethod::Both).unwrap(),
            "\"both\""
        );
        assert_eq!(
            serde_json::to_string(&InvitationStatus::Completed).unwrap(),
            "\"completed\""
        );
    }
}
