use std::time::Duration;

use lettre::address::AddressError;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Deserialize;
use tracker_core::Notification;
use tracker_logging::{tracker_error, tracker_info, tracker_warn};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifyError {
    #[error("mail sender credentials are not configured")]
    MissingCredentials,
    #[error("invalid mail address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("could not build mail message: {0}")]
    InvalidMessage(String),
    #[error("mail server rejected the message: {0}")]
    Rejected(String),
    #[error("mail server unreachable: {0}")]
    Transport(String),
}

impl NotifyError {
    /// Configuration problems will not fix themselves between attempts.
    pub fn is_retryable(&self) -> bool {
        matches!(self, NotifyError::Transport(_))
    }
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &Notification) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifyPolicy {
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for NotifyPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { attempts: u32 },
    DeliveryFailed { attempts: u32, reason: String },
}

/// Sends `message`, retrying retryable failures up to the policy's limit.
pub async fn deliver_with_retry(
    notifier: &dyn Notifier,
    message: &Notification,
    policy: &NotifyPolicy,
) -> DeliveryOutcome {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        tracker_info!("Sending notification to {} (attempt {})", message.recipient, attempt);
        match notifier.send(message).await {
            Ok(()) => {
                tracker_info!("Notification delivered to {}", message.recipient);
                return DeliveryOutcome::Delivered { attempts: attempt };
            }
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                tracker_warn!(
                    "Notification attempt {} failed: {}; retrying in {:?}",
                    attempt,
                    err,
                    policy.retry_delay
                );
                tokio::time::sleep(policy.retry_delay).await;
            }
            Err(err) => {
                tracker_error!("Notification to {} failed: {}", message.recipient, err);
                return DeliveryOutcome::DeliveryFailed {
                    attempts: attempt,
                    reason: err.to_string(),
                };
            }
        }
    }
}

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpSecurity {
    /// Implicit TLS from the first byte, usually port 465.
    #[default]
    Tls,
    /// Plain connection upgraded with STARTTLS, usually port 587.
    StartTls,
    /// No encryption. Only for local relays.
    Plain,
}

/// SMTP server, sender identity and credential.
#[derive(Debug, Clone)]
pub struct MailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub security: SmtpSecurity,
    pub sender: Option<String>,
    pub password: Option<String>,
    pub timeout: Option<Duration>,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 465,
            security: SmtpSecurity::Tls,
            sender: None,
            password: None,
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// Sends HTML mail over SMTP, logging in with the sender credentials.
pub struct SmtpNotifier {
    settings: MailSettings,
}

impl SmtpNotifier {
    pub fn new(settings: MailSettings) -> Self {
        Self { settings }
    }

    fn credentials(&self) -> Option<(&str, &str)> {
        let sender = self.settings.sender.as_deref().filter(|s| !s.is_empty())?;
        let password = self.settings.password.as_deref().filter(|p| !p.is_empty())?;
        Some((sender, password))
    }

    fn transport(
        &self,
        sender: &str,
        password: &str,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotifyError> {
        let host = self.settings.smtp_host.as_str();
        let builder = match self.settings.security {
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(host),
            SmtpSecurity::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host),
            SmtpSecurity::Plain => Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)),
        }
        .map_err(|err| NotifyError::Transport(err.to_string()))?;

        Ok(builder
            .port(self.settings.smtp_port)
            .credentials(Credentials::new(sender.to_string(), password.to_string()))
            .timeout(self.settings.timeout)
            .build())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address
        .trim()
        .parse()
        .map_err(|err: AddressError| NotifyError::InvalidAddress {
            address: address.to_string(),
            reason: err.to_string(),
        })
}

fn build_message(sender: &str, message: &Notification) -> Result<Message, NotifyError> {
    Message::builder()
        .from(parse_mailbox(sender)?)
        .to(parse_mailbox(&message.recipient)?)
        .subject(message.subject.as_str())
        .header(ContentType::TEXT_HTML)
        .body(message.html_body.clone())
        .map_err(|err| NotifyError::InvalidMessage(err.to_string()))
}

#[async_trait::async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, message: &Notification) -> Result<(), NotifyError> {
        let Some((sender, password)) = self.credentials() else {
            return Err(NotifyError::MissingCredentials);
        };
        let email = build_message(sender, message)?;
        let transport = self.transport(sender, password)?;

        match transport.send(email).await {
            Ok(_) => Ok(()),
            Err(err) if err.is_permanent() => Err(NotifyError::Rejected(err.to_string())),
            Err(err) => Err(NotifyError::Transport(err.to_string())),
        }
    }
}
