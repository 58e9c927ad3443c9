//! Invitation code type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`InvitationCode`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum InvitationCodeError {
    /// The input string is empty.
    #[error("invitation code cannot be empty")]
    Empty,
    /// The input is not all ASCII digits or has the wrong length.
    #[error("invitation code must be {min}-{max} digits")]
    InvalidFormat {
        /// Minimum accepted length.
        min: usize,
        /// Maximum accepted length.
        max: usize,
    },
}

/// A numeric invitation code.
///
/// Codes are assigned from a 4-digit space; the ledger falls back to a
/// 6-digit space when the short space is exhausted, so both lengths parse.
/// Promotional codes share this shape.
///
/// ## Examples
///
/// ```
/// use quickimage_core::InvitationCode;
///
/// assert!(InvitationCode::parse("1234").is_ok());
/// assert!(InvitationCode::parse("191900").is_ok());
/// assert!(InvitationCode::parse("12").is_err());
/// assert!(InvitationCode::parse("12a4").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct InvitationCode(String);

impl InvitationCode {
    /// Length of codes in the primary assignment space.
    pub const SHORT_LENGTH: usize = 4;
    /// Length of codes in the fallback assignment space.
    pub const LONG_LENGTH: usize = 6;

    /// Parse an `InvitationCode` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, contains non-digits, or is
    /// neither 4 nor 6 characters long.
    pub fn parse(s: &str) -> Result<Self, InvitationCodeError> {
        if s.is_empty() {
            return Err(InvitationCodeError::Empty);
        }

        let digits = s.bytes().all(|b| b.is_ascii_digit());
        if !digits || (s.len() != Self::SHORT_LENGTH && s.len() != Self::LONG_LENGTH) {
            return Err(InvitationCodeError::InvalidFormat {
                min: Self::SHORT_LENGTH,
                max: Self::LONG_LENGTH,
            });
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `InvitationCode` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for InvitationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for InvitationCode {
    type Err = InvitationCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for InvitationCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
