use anyhow::Context;
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::config::SmtpConfig;

/// Outbound mail collaborator. The gate only ever needs to deliver
/// verification codes; everything else rides on domain events.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification_code(&self, to: &str, code: &str) -> anyhow::Result<()>;
}

/// SMTP delivery via lettre.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .context("Failed to configure SMTP relay")?
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();
        let from = config
            .from
            .parse()
            .context("Failed to parse SMTP from address")?;
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_verification_code(&self, to: &str, code: &str) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse().context("Invalid recipient address")?)
            .subject("O seu código de verificação")
            .body(format!(
                "O seu código de verificação é {code}. O código expira em 10 minutos."
            ))
            .context("Failed to build verification email")?;
        self.transport
            .send(message)
            .await
            .context("Failed to send verification email")?;
        Ok(())
    }
}

/// Logs the code instead of sending mail. Default when SMTP is not
/// configured, which keeps local development self-contained.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification_code(&self, to: &str, code: &str) -> anyhow::Result<()> {
        info!(to, code, "SMTP not configured; verification code logged only");
        Ok(())
    }
}

/// Captures outbound codes so tests can read them back.
#[derive(Default)]
pub struct RecordingMailer {
    sent: std::sync::Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, code)| code.clone())
    }

    pub fn sent_count(&self) -> usize {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_verification_code(&self, to: &str, code: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((to.to_owned(), code.to_owned()));
        Ok(())
    }
}
