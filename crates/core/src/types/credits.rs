//! Credit balance type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A non-negative credit balance.
///
/// Credits are an integer unit of account granted to a user. Within the
/// identity subsystem no operation spends credits, so the balance is
/// additive-only and the type exposes no subtraction.
///
/// ## Examples
///
/// ```
/// use quickimage_core::Credits;
///
/// let balance = Credits::new(50);
/// let rewarded = balance.plus(1000);
/// assert_eq!(rewarded.amount(), 1050);
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Credits(u64);

impl Credits {
    /// An empty balance.
    pub const ZERO: Self = Self(0);

    /// Create a balance from a raw amount.
    #[must_use]
    pub const fn new(amount: u64) -> Self {
        Self(amount)
    }

    /// Get the raw amount.
    #[must_use]
    pub const fn amount(&self) -> u64 {
        self.0
    }

    /// Return the balance with `amount` more credits.
    ///
    /// Saturates at `u64::MAX`; the balance can never decrease.
    #[must_use]
    pub const fn plus(self, amount: u64) -> Self {
        Self(self.0.saturating_add(amount))
    }
}

impl fmt::Display for Credits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Credits {
    fn from(amount: u64) -> Self {
        Self(amount)
    }
}

impl From<Credits> for u64 {
    fn from(credits: Credits) -> Self {
        credits.0
    }
}
