//! Email notification collaborator (SMTP relay with a PDF attachment).

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use tracing::info;

use crate::config::MailConfig;

/// Opaque mail relay: deliver a message with one attachment.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        attachment: &[u8],
        attachment_name: &str,
    ) -> Result<()>;
}

pub struct SmtpNotifier {
    config: MailConfig,
    send_timeout: Duration,
}

impl SmtpNotifier {
    pub fn new(config: &MailConfig) -> Self {
        Self {
            config: config.clone(),
            send_timeout: Duration::from_secs(config.timeout_seconds),
        }
    }

    fn build_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let builder = if self.config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
                .context("Failed to configure STARTTLS relay")?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.host)
        };

        Ok(builder
            .port(self.config.port)
            .credentials(Credentials::new(
                self.config.user.clone(),
                self.config.password.clone(),
            ))
            .build())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        attachment: &[u8],
        attachment_name: &str,
    ) -> Result<()> {
        if self.config.user.trim().is_empty() || self.config.password.trim().is_empty() {
            bail!("SMTP user and password must be configured to send email");
        }

        let from: Mailbox = format!("{} <{}>", self.config.sender_name, self.config.user)
            .parse()
            .context("Invalid sender address")?;
        let to: Mailbox = to.parse().context("Invalid recipient address")?;

        let pdf = Attachment::new(attachment_name.to_string()).body(
            attachment.to_vec(),
            ContentType::parse("application/pdf").context("Invalid attachment content type")?,
        );

        let message = Message::builder()
            .from(from)
            .to(to.clone())
            .subject(subject)
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(body.to_string()))
                    .singlepart(pdf),
            )
            .context("Failed to build email message")?;

        let transport = self.build_transport()?;

        tokio::time::timeout(self.send_timeout, transport.send(message))
            .await
            .map_err(|_| anyhow!("Timed out sending email to {to}"))?
            .with_context(|| format!("Failed to deliver email to {to}"))?;

        info!("Email with {} sent to {}", attachment_name, to);

        Ok(())
    }
}
