//! SMTP email delivery via lettre.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{error, info};

use super::{EmailSender, NotificationError};

/// SMTP connection settings.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub host: String,
    pub port: u16,
    /// Account used to authenticate and as the `From` address.
    pub user: String,
    pub password: String,
    /// Upgrade the connection with STARTTLS.
    pub use_tls: bool,
}

/// [`EmailSender`] that delivers HTML messages over SMTP.
#[derive(Clone)]
pub struct SmtpEmailSender {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpEmailSender {
    pub fn new(config: &EmailConfig) -> Result<Self, NotificationError> {
        let from: Mailbox = config
            .user
            .parse()
            .map_err(|e| NotificationError::Address(format!("{}: {e}", config.user)))?;

        let builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| NotificationError::Build(format!("SMTP setup failed: {e}")))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };
        let mut builder = builder.port(config.port);
        if !config.password.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.user.clone(),
                config.password.clone(),
            ));
        }

        Ok(Self {
            from,
            transport: builder.build(),
        })
    }

    async fn send(&self, recipient: &str, subject: &str, html: String) -> Result<(), NotificationError> {
        let to: Mailbox = recipient
            .parse()
            .map_err(|e| NotificationError::Address(format!("{recipient}: {e}")))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)
            .map_err(|e| NotificationError::Build(e.to_string()))?;

        self.transport.send(message).await.map_err(|e| {
            error!(error = %e, "Failed to send email");
            NotificationError::Send {
                recipient: recipient.to_string(),
                reason: e.to_string(),
            }
        })?;

        info!(subject, "Sent email");
        Ok(())
    }
}

fn render(email: &str, lead: &str, link_label: &str, link: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<body>\n\
         <p>Hello, {email}!</p>\n\
         <p>{lead}</p>\n\
         <p><a href=\"{link}\">{link_label}</a></p>\n\
         </body>\n</html>\n"
    )
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send_activation_email(
        &self,
        recipient: &str,
        link: &str,
    ) -> Result<(), NotificationError> {
        let html = render(
            recipient,
            "Thank you for registering. Please activate your account within 24 hours.",
            "Activate account",
            link,
        );
        self.send(recipient, "Account Activation", html).await
    }

    async fn send_activation_complete_email(
        &self,
        recipient: &str,
        link: &str,
    ) -> Result<(), NotificationError> {
        let html = render(
            recipient,
            "Your account has been activated. You can now log in.",
            "Log in",
            link,
        );
        self.send(recipient, "Account Activated Successfully", html)
            .await
    }

    async fn send_password_reset_email(
        &self,
        recipient: &str,
        link: &str,
    ) -> Result<(), NotificationError> {
        let html = render(
            recipient,
            "We received a request to reset your password. If it wasn't you, ignore this email.",
            "Reset password",
            link,
        );
        self.send(recipient, "Password Reset Request", html).await
    }

    async fn send_password_reset_complete_email(
        &self,
        recipient: &str,
        link: &str,
    ) -> Result<(), NotificationError> {
        let html = render(
            recipient,
            "Your password has been changed.",
            "Log in",
            link,
        );
        self.send(recipient, "Your Password Has Been Successfully Reset", html)
            .await
    }
}
