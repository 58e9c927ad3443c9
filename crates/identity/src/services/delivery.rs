//! Code delivery side-channels.
//!
//! Real deployments would put an SMS provider and a mail sender behind these
//! traits; the shipped implementations only log, which is exactly what the
//! mock subsystem promises. Delivery failure never fails the operation that
//! triggered it - callers log and move on.

use async_trait::async_trait;
use thiserror::Error;

use quickimage_core::{Email, Phone};

/// Errors that can occur while handing a code to a provider.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The upstream provider rejected the message.
    #[error("delivery provider error: {0}")]
    Provider(String),
}

/// Sends verification codes over SMS.
#[async_trait]
pub trait SmsDelivery: Send + Sync {
    /// Deliver `code` to `phone`.
    async fn send_code(&self, phone: &Phone, code: &str) -> Result<(), DeliveryError>;
}

/// Sends verification codes over email.
#[async_trait]
pub trait EmailDelivery: Send + Sync {
    /// Deliver `code` to `email`.
    async fn send_code(&self, email: &Email, code: &str) -> Result<(), DeliveryError>;
}

/// Mock SMS channel that logs instead of sending.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSmsDelivery;

#[async_trait]
impl SmsDelivery for LoggingSmsDelivery {
    async fn send_code(&self, phone: &Phone, code: &str) -> Result<(), DeliveryError> {
        tracing::info!(phone = %phone.masked(), code, "mock sms verification code");
        Ok(())
    }
}

/// Mock email channel that logs instead of sending.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingEmailDelivery;

#[async_trait]
impl EmailDelivery for LoggingEmailDelivery {
    async fn send_code(&self, email: &Email, code: &str) -> Result<(), DeliveryError> {
        tracing::info!(%email, code, "mock email verification code");
        Ok(())
    }
}
