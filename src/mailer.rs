// Outbound mail transport
// The relay only sees the MailTransport trait; SmtpMailer is the lettre-backed relay

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::{error::Error as StdError, io, time::Duration};
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body_html: String,
}

// Why the connectivity check failed, derived from the low-level connection error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityFailure {
    #[error("connection timed out")]
    Timeout,

    #[error("connection refused")]
    Refused,

    #[error("connection failed: {0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum MailerError {
    #[error("SMTP setup error: {0}")]
    Setup(String),

    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Message build error: {0}")]
    Build(String),

    #[error("Send failed: {0}")]
    Send(String),
}

#[async_trait]
pub trait MailTransport: Send + Sync + 'static {
    async fn verify_connectivity(&self) -> Result<(), ConnectivityFailure>;

    async fn send(&self, message: &OutboundMessage) -> Result<(), MailerError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub operator_address: String,
    pub timeout_secs: u64,
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    // STARTTLS on the configured port (587 unless overridden)
    pub fn new(config: &SmtpConfig) -> Result<Self, MailerError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| MailerError::Setup(e.to_string()))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .timeout(Some(Duration::from_secs(config.timeout_secs)))
            .build();

        Ok(Self { transport })
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailerError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| MailerError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

pub fn build_message(message: &OutboundMessage) -> Result<Message, MailerError> {
    Message::builder()
        .from(parse_mailbox(&message.from)?)
        .to(parse_mailbox(&message.to)?)
        .subject(message.subject.as_str())
        .header(ContentType::TEXT_HTML)
        .body(message.body_html.clone())
        .map_err(|e| MailerError::Build(e.to_string()))
}

/// Walks the error chain looking for the io error underneath and classifies it.
pub fn classify_connect_error(err: &(dyn StdError + 'static)) -> ConnectivityFailure {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            match io_err.kind() {
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
                    return ConnectivityFailure::Timeout
                }
                io::ErrorKind::ConnectionRefused => return ConnectivityFailure::Refused,
                _ => {}
            }
        }
        current = e.source();
    }

    let message = err.to_string();
    if message.to_lowercase().contains("timed out") {
        ConnectivityFailure::Timeout
    } else {
        ConnectivityFailure::Other(message)
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn verify_connectivity(&self) -> Result<(), ConnectivityFailure> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(ConnectivityFailure::Other(
                "server did not accept the connection".to_string(),
            )),
            Err(e) => {
                error!(error = %e, "SMTP connection failed");
                Err(classify_connect_error(&e))
            }
        }
    }

    async fn send(&self, message: &OutboundMessage) -> Result<(), MailerError> {
        let email = build_message(message)?;
        let response = self
            .transport
            .send(email)
            .await
            .map_err(|e| MailerError::Send(e.to_string()))?;
        debug!(to = %message.to, code = %response.code(), "message accepted by relay");
        Ok(())
    }
}
