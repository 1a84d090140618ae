//! Outgoing account emails.

pub mod smtp;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Invalid address: {0}")]
    Address(String),

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("Failed to send email to {recipient}: {reason}")]
    Send { recipient: String, reason: String },
}

/// Sends the account lifecycle emails. `link` is the URL the message points at.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_activation_email(
        &self,
        recipient: &str,
        link: &str,
    ) -> Result<(), NotificationError>;

    async fn send_activation_complete_email(
        &self,
        recipient: &str,
        link: &str,
    ) -> Result<(), NotificationError>;

    async fn send_password_reset_email(
        &self,
        recipient: &str,
        link: &str,
    ) -> Result<(), NotificationError>;

    async fn send_password_reset_complete_email(
        &self,
        recipient: &str,
        link: &str,
    ) -> Result<(), NotificationError>;
}
