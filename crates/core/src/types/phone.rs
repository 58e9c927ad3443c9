//! Mobile phone number type.
//!
//! Phone numbers are always held in canonical form (`+86` followed by 11
//! digits) so that lookups and uniqueness checks never depend on how the
//! caller happened to type the number.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input is not a valid Chinese mobile number.
    #[error("phone number is not a valid mobile number")]
    InvalidFormat,
}

/// A Chinese mainland mobile phone number in canonical `+86XXXXXXXXXXX` form.
///
/// Accepted input shapes (whitespace is ignored):
/// - `+86` followed by 11 digits
/// - `86` followed by 11 digits
/// - 11 digits starting with `1` and a second digit in `3..=9`
///
/// ## Examples
///
/// ```
/// use quickimage_core::Phone;
///
/// let phone = Phone::parse("138 0000 0000").unwrap();
/// assert_eq!(phone.as_str(), "+8613800000000");
/// assert_eq!(Phone::parse("+8613800000000").unwrap(), phone);
/// assert_eq!(Phone::parse("8613800000000").unwrap(), phone);
///
/// assert!(Phone::parse("12345").is_err());
/// assert!(Phone::parse("12900000000").is_err()); // second digit out of range
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Number of national digits in a mobile number.
    pub const NATIONAL_DIGITS: usize = 11;

    /// Parse a `Phone` from any accepted input shape, normalizing to the
    /// canonical `+86` form.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or does not match the mobile
    /// number pattern after stripping whitespace and the country prefix.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let cleaned: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        if cleaned.is_empty() {
            return Err(PhoneError::Empty);
        }

        let national = cleaned
            .strip_prefix("+86")
            .or_else(|| cleaned.strip_prefix("86"))
            .unwrap_or(&cleaned);

        if !is_valid_national(national) {
            return Err(PhoneError::InvalidFormat);
        }

        Ok(Self(format!("+86{national}")))
    }

    /// Returns the canonical phone number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Phone` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Returns the last four digits of the national number.
    ///
    /// Used to derive default display names for phone-only signups.
    #[must_use]
    pub fn last_four(&self) -> &str {
        let split = self.0.len().saturating_sub(4);
        self.0.get(split..).unwrap_or("")
    }

    /// Returns the number masked for display: `+86138****8000`.
    #[must_use]
    pub fn masked(&self) -> String {
        // Canonical form is always "+86" + 11 digits; keep the first three
        // national digits and the last four.
        let prefix = self.0.get(..6).unwrap_or(&self.0);
        format!("{prefix}****{}", self.last_four())
    }
}

/// Check an 11-digit national mobile number: `1` then `3..=9` then 9 digits.
fn is_valid_national(s: &str) -> bool {
    if s.len() != Phone::NATIONAL_DIGITS || !s.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let mut bytes = s.bytes();
    bytes.next() == Some(b'1') && bytes.next().is_some_and(|b| (b'3'..=b'9').contains(&b))
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Phone {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Phone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
