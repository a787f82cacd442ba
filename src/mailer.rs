use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use tracing::debug;

use crate::config::SmtpConfig;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(String),
    #[error("build message: {0}")]
    Build(String),
    #[error("smtp send: {0}")]
    Transport(String),
}

/// Outbound email.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

#[derive(Clone)]
pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpMailer {
    /// Port 465 uses implicit TLS, anything else upgrades with STARTTLS.
    pub fn new(cfg: &SmtpConfig) -> anyhow::Result<Self> {
        let builder = if cfg.port == 465 {
            SmtpTransport::relay(&cfg.host)
        } else {
            SmtpTransport::starttls_relay(&cfg.host)
        }
        .with_context(|| format!("smtp relay {}", cfg.host))?;

        let transport = builder
            .port(cfg.port)
            .credentials(Credentials::new(cfg.user.clone(), cfg.pass.clone()))
            .build();
        let from = cfg
            .from
            .parse::<Mailbox>()
            .with_context(|| format!("SMTP_FROM {:?}", cfg.from))?;

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let to: Mailbox = to
            .parse()
            .map_err(|e: lettre::address::AddressError| MailError::Address(e.to_string()))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| MailError::Build(e.to_string()))?;

        // lettre's SmtpTransport blocks; keep it off the async workers.
        let transport = self.transport.clone();
        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?
            .map_err(|e| MailError::Transport(e.to_string()))?;

        debug!(subject, "email sent");
        Ok(())
    }
}
