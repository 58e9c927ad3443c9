//! Identity subsystem configuration.
//!
//! # Environment Variables
//!
//! All optional; [`IdentityConfig::default`] supplies the deployment values
//! the legacy client shipped with.
//!
//! - `QUICKIMAGE_BASE_URL` - Public base URL used in invitation links
//!   (default: `https://quickimage.ai`)
//! - `QUICKIMAGE_SIGNUP_CREDITS` - Credits granted on registration (default: 50)
//! - `QUICKIMAGE_INVITATION_REWARD` - Credits granted to an inviter per
//!   completed invitation (default: 1000)
//! - `QUICKIMAGE_PHONE_BIND_CREDITS` - Bonus for binding a phone (default: 50)
//! - `QUICKIMAGE_EMAIL_VERIFY_CREDITS` - Bonus for verifying an email
//!   (default: 30)
//! - `QUICKIMAGE_CODE_TTL_SECONDS` - Verification code lifetime
//!   (default: 300)

use std::collections::HashMap;

use thiserror::Error;

/// Maximum attempts in the 4-digit space before falling back to 6 digits.
pub(crate) const SHORT_CODE_ATTEMPTS: usize = 64;
/// Maximum attempts in the 6-digit fallback space.
pub(crate) const LONG_CODE_ATTEMPTS: usize = 1024;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable was set but could not be parsed.
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// A statically configured invitation code with a fixed reward and no
/// associated inviter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionalCode {
    /// Credits granted directly to the invitee.
    pub credits_reward: u64,
    /// Human-readable campaign description.
    pub description: String,
}

/// Identity subsystem configuration.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Public base URL for invitation links.
    pub base_url: String,
    /// Credits granted on registration.
    pub signup_credits: u64,
    /// Credits granted to an inviter per completed invitation.
    pub invitation_reward_credits: u64,
    /// Bonus for binding a phone to an existing account.
    pub phone_bind_credits: u64,
    /// Bonus for verifying an email address.
    pub email_verification_credits: u64,
    /// Verification code lifetime.
    pub verification_code_ttl: chrono::Duration,
    /// Fixed code the mock SMS channel "delivers".
    pub mock_sms_code: String,
    /// Fixed code the mock email channel "delivers".
    pub mock_email_code: String,
    /// Promotional code table, configured at deployment and never mutated at
    /// runtime.
    pub promotional_codes: HashMap<String, PromotionalCode>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        let mut promotional_codes = HashMap::new();
        promotional_codes.insert(
            "1919".to_owned(),
            PromotionalCode {
                credits_reward: 1000,
                description: "注册即送1000积分".to_owned(),
            },
        );

        Self {
            base_url: "https://quickimage.ai".to_owned(),
            signup_credits: 50,
            invitation_reward_credits: 1000,
            phone_bind_credits: 50,
            email_verification_credits: 30,
            verification_code_ttl: chrono::Duration::minutes(5),
            mock_sms_code: "123456".to_owned(),
            mock_email_code: "123456".to_owned(),
            promotional_codes,
        }
    }
}

impl IdentityConfig {
    /// Load configuration from the environment on top of the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a set variable cannot be
    /// parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(base_url) = std::env::var("QUICKIMAGE_BASE_URL") {
            config.base_url = base_url;
        }
        config.signup_credits = env_u64("QUICKIMAGE_SIGNUP_CREDITS", config.signup_credits)?;
        config.invitation_reward_credits = env_u64(
            "QUICKIMAGE_INVITATION_REWARD",
            config.invitation_reward_credits,
        )?;
        config.phone_bind_credits =
            env_u64("QUICKIMAGE_PHONE_BIND_CREDITS", config.phone_bind_credits)?;
        config.email_verification_credits = env_u64(
            "QUICKIMAGE_EMAIL_VERIFY_CREDITS",
            config.email_verification_credits,
        )?;

        if let Ok(raw) = std::env::var("QUICKIMAGE_CODE_TTL_SECONDS") {
            let seconds: i64 = raw.parse().map_err(|_| {
                ConfigError::InvalidEnvVar("QUICKIMAGE_CODE_TTL_SECONDS".to_owned(), raw)
            })?;
            config.verification_code_ttl = chrono::Duration::seconds(seconds);
        }

        Ok(config)
    }
}

fn env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidEnvVar(name.to_owned(), raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_deployment() {
        let config = IdentityConfig::default();
        assert_eq!(config.signup_credits, 50);
        assert_eq!(config.invitation_reward_credits, 1000);
        assert_eq!(config.verification_code_ttl, chrono::Duration::minutes(5));
        assert_eq!(
            config.promotional_codes.get("1919").map(|p| p.credits_reward),
            Some(1000)
        );
    }
}
