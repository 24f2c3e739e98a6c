mod smtp;

pub use smtp::SmtpMailer;

use async_trait::async_trait;
use thiserror::Error;

/// A contact-form submission to be forwarded by email.
#[derive(Debug, Clone)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub program: Option<String>,
    pub message: String,
}

/// Transport-agnostic mail failure. The provider detail ends up in the
/// logs, never in a client response.
#[derive(Debug, Error)]
#[error("mail dispatch failed: {0}")]
pub struct MailError(pub String);

/// Outbound mail collaborator. Delivery reliability is the provider's
/// problem; callers only see success or failure of the handoff.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_contact(&self, msg: &ContactMessage) -> Result<(), MailError>;
}
