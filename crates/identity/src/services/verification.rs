//! Phone verification codes.
//!
//! Codes are ephemeral and single-use: at most one live code per phone, an
//! absolute expiry instant rather than a countdown, deleted on first
//! successful verification or on expiry check. Verification-code state is
//! deliberately not one of the persisted collections - it lives behind one
//! lock here, which also serializes send/verify per phone.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::Mutex;

use quickimage_core::{Phone, PhoneError};

use crate::config::IdentityConfig;
use crate::services::delivery::SmsDelivery;

/// Errors that can occur when sending or verifying a code.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// The phone number is not a valid mobile number.
    #[error("invalid phone number: {0}")]
    InvalidPhone(#[from] PhoneError),

    /// No code was ever requested (or it was already consumed).
    #[error("no verification code was requested for this phone")]
    NoCodeRequested,

    /// The code's 5-minute window has passed.
    #[error("verification code has expired")]
    Expired,

    /// The submitted code does not match the issued one.
    #[error("verification code does not match")]
    Mismatch,
}

/// A code issued to one phone.
#[derive(Debug, Clone)]
struct IssuedCode {
    code: String,
    expires_at: DateTime<Utc>,
}

/// Issues and validates short-lived, single-use phone verification codes.
pub struct VerificationCodeService {
    codes: Mutex<HashMap<Phone, IssuedCode>>,
    ttl: chrono::Duration,
    mock_code: String,
    sms: Arc<dyn SmsDelivery>,
}

impl VerificationCodeService {
    /// Create a new verification code service.
    #[must_use]
    pub fn new(config: &IdentityConfig, sms: Arc<dyn SmsDelivery>) -> Self {
        Self {
            codes: Mutex::new(HashMap::new()),
            ttl: config.verification_code_ttl,
            mock_code: config.mock_sms_code.clone(),
            sms,
        }
    }

    /// Issue a code for `phone`, overwriting any existing one.
    ///
    /// Delivery failure is logged, not surfaced - the code is live either
    /// way.
    ///
    /// # Errors
    ///
    /// Returns `VerificationError::InvalidPhone` if the number is malformed.
    pub async fn send(&self, phone: &str) -> Result<(), VerificationError> {
        let phone = Phone::parse(phone)?;
        let issued = IssuedCode {
            code: self.mock_code.clone(),
            expires_at: Utc::now() + self.ttl,
        };

        {
            let mut codes = self.codes.lock().await;
            codes.insert(phone.clone(), issued.clone());
        }

        if let Err(error) = self.sms.send_code(&phone, &issued.code).await {
            tracing::warn!(%error, phone = %phone.masked(), "sms delivery failed");
        }

        Ok(())
    }

    /// Verify `code` against the live code for `phone`, returning the
    /// canonical phone on success.
    ///
    /// A successful verification consumes the code; an expired code is
    /// removed, so a retry reports `NoCodeRequested`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPhone`, `NoCodeRequested`, `Expired`, or `Mismatch`.
    pub async fn verify(&self, phone: &str, code: &str) -> Result<Phone, VerificationError> {
        let phone = Phone::parse(phone)?;
        let mut codes = self.codes.lock().await;

        let Some(issued) = codes.get(&phone) else {
            return Err(VerificationError::NoCodeRequested);
        };

        if Utc::now() > issued.expires_at {
            codes.remove(&phone);
            return Err(VerificationError::Expired);
        }

        if code != issued.code {
            return Err(VerificationError::Mismatch);
        }

        codes.remove(&phone);
        Ok(phone)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::delivery::LoggingSmsDelivery;

    fn service_with_ttl(ttl: chrono::Duration) -> VerificationCodeService {
        let config = IdentityConfig {
            verification_code_ttl: ttl,
            ..IdentityConfig::default()
        };
        VerificationCodeService::new(&config, Arc::new(LoggingSmsDelivery))
    }

    #[tokio::test]
    async fn test_send_rejects_invalid_phone() {
        let service = service_with_ttl(chrono::Duration::minutes(5));
        assert!(matches!(
            service.send("12345").await,
            Err(VerificationError::InvalidPhone(_))
        ));
    }

    #[tokio::test]
    async fn test_verify_without_send() {
        let service = service_with_ttl(chrono::Duration::minutes(5));
        assert!(matches!(
            service.verify("13800000000", "123456").await,
            Err(VerificationError::NoCodeRequested)
        ));
    }

    #[tokio::test]
    async fn test_code_is_single_use() {
        let service = service_with_ttl(chrono::Duration::minutes(5));
        service.send("13800000000").await.unwrap();

        service.verify("13800000000", "123456").await.unwrap();
        assert!(matches!(
            service.verify("13800000000", "123456").await,
            Err(VerificationError::NoCodeRequested)
        ));
    }

    #[tokio::test]
    async fn test_mismatch_keeps_code_live() {
        let service = service_with_ttl(chrono::Duration::minutes(5));
        service.send("13800000000").await.unwrap();

        assert!(matches!(
            service.verify("13800000000", "000000").await,
            Err(VerificationError::Mismatch)
        ));
        // Correct code still works after a wrong guess
        service.verify("13800000000", "123456").await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_code_is_removed() {
        let service = service_with_ttl(chrono::Duration::seconds(-1));
        service.send("13800000000").await.unwrap();

        assert!(matches!(
            service.verify("13800000000", "123456").await,
            Err(VerificationError::Expired)
        ));
        assert!(matches!(
            service.verify("13800000000", "123456").await,
            Err(VerificationError::NoCodeRequested)
        ));
    }

    #[tokio::test]
    async fn test_reissue_overwrites_and_normalizes() {
        let service = service_with_ttl(chrono::Duration::minutes(5));
        service.send("138 0000 0000").await.unwrap();
        service.send("+8613800000000").await.unwrap();

        // Any accepted input shape verifies against the same canonical entry
        let phone = service.verify("8613800000000", "123456").await.unwrap();
        assert_eq!(phone.as_str(), "+8613800000000");
    }
}
