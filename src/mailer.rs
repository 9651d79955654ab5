use std::sync::Arc;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use crate::config::SmtpConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl OutgoingMail {
    pub fn email_verification(to: &str, frontend_url: &str, token: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Verify your email".to_string(),
            body: format!(
                "Welcome to LensMart!\n\nConfirm your email address by opening:\n{frontend_url}/verify-email/{token}\n"
            ),
        }
    }

    pub fn password_reset_code(to: &str, code: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: "Password reset code".to_string(),
            body: format!("Your password reset code is {code}. It expires in 2 minutes.\n"),
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()>;
}

/// Sends mail in the background. Delivery failures are logged and never
/// reach the caller.
pub fn send_detached(mailer: Arc<dyn Mailer>, mail: OutgoingMail) {
    tokio::spawn(async move {
        let to = mail.to.clone();
        if let Err(err) = mailer.send(mail).await {
            tracing::warn!(error = %err, to = %to, "email delivery failed");
        }
    });
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host).port(config.port);
        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        Ok(Self {
            transport: builder.build(),
            from: config.from.parse()?,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(mail.to.parse()?)
            .subject(mail.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body)?;
        self.transport.send(message).await?;
        Ok(())
    }
}

/// Used when no SMTP host is configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()> {
        tracing::info!(to = %mail.to, subject = %mail.subject, body = %mail.body, "email (not sent)");
        Ok(())
    }
}
