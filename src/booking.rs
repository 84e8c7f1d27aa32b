// Booking relay
// Validate, check the relay is reachable, then send the operator notification
// followed by the submitter confirmation

use chrono::Local;
use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::mailer::{ConnectivityFailure, MailTransport, OutboundMessage};
use crate::templates::{
    confirmation_subject, operator_subject, render_operator_notification,
    render_submitter_confirmation, RenderContext,
};

pub const MISSING_FIELDS_MESSAGE: &str =
    "Missing required fields. Please fill in all required fields.";
pub const INVALID_EMAIL_MESSAGE: &str = "Please enter a valid email address.";
pub const SUCCESS_MESSAGE: &str = "Booking request sent successfully";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("{0}")]
    Validation(String),

    #[error("mail transport unavailable: {0}")]
    TransportUnavailable(ConnectivityFailure),

    #[error("dispatch failed: {0}")]
    Dispatch(String),
}

impl BookingError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, BookingError::Validation(_))
    }

    // Text safe to show the submitter
    pub fn user_message(&self) -> String {
        match self {
            BookingError::Validation(msg) => msg.clone(),
            BookingError::TransportUnavailable(ConnectivityFailure::Timeout) => {
                "SMTP connection timed out. Please check your SMTP host, port, and network/firewall settings.".to_string()
            }
            BookingError::TransportUnavailable(ConnectivityFailure::Refused) => {
                "SMTP connection refused. Please check your SMTP server and port.".to_string()
            }
            BookingError::TransportUnavailable(ConnectivityFailure::Other(_)) => {
                "Email service is currently unavailable. Please try again later.".to_string()
            }
            BookingError::Dispatch(_) => "Failed to send booking request".to_string(),
        }
    }
}

/// Raw form body as posted by the site.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSubmission {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub event_type: Option<String>,
    pub event_date: Option<String>,
    pub message: Option<String>,
}

// A submission that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub name: String,
    pub email: String,
    pub event_type: String,
    pub message: String,
    pub phone: Option<String>,
    pub event_date: Option<String>,
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email pattern"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl BookingSubmission {
    pub fn validate(self) -> Result<BookingRequest, BookingError> {
        let missing = || BookingError::Validation(MISSING_FIELDS_MESSAGE.to_string());

        let name = non_blank(self.name).ok_or_else(missing)?;
        let email = non_blank(self.email).ok_or_else(missing)?;
        let event_type = non_blank(self.event_type).ok_or_else(missing)?;
        let message = non_blank(self.message).ok_or_else(missing)?;

        if !email_pattern().is_match(&email) {
            return Err(BookingError::Validation(INVALID_EMAIL_MESSAGE.to_string()));
        }

        Ok(BookingRequest {
            name,
            email,
            event_type,
            message,
            phone: non_blank(self.phone),
            event_date: non_blank(self.event_date),
        })
    }
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    // Sender for both messages, normally the SMTP login
    pub from: String,
    pub operator_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingReceipt {
    pub request_id: String,
}

pub struct BookingRelay {
    transport: Arc<dyn MailTransport>,
    config: RelayConfig,
}

impl BookingRelay {
    pub fn new(transport: Arc<dyn MailTransport>, config: RelayConfig) -> Self {
        Self { transport, config }
    }

    /// Runs one submission through the relay.
    ///
    /// Validation errors return before any network I/O. Sends are sequential
    /// and a failed confirmation does not undo the operator notification.
    pub async fn submit(&self, submission: BookingSubmission) -> Result<BookingReceipt, BookingError> {
        let request = submission.validate().map_err(|e| {
            warn!(error = %e, "rejected booking submission");
            e
        })?;

        if let Err(failure) = self.transport.verify_connectivity().await {
            error!(error = %failure, "mail transport connectivity check failed");
            return Err(BookingError::TransportUnavailable(failure));
        }

        let ctx = RenderContext::new(Local::now());
        let operator = OutboundMessage {
            from: self.config.from.clone(),
            to: self.config.operator_address.clone(),
            subject: operator_subject(&request),
            body_html: render_operator_notification(&request, &ctx),
        };
        let confirmation = OutboundMessage {
            from: self.config.from.clone(),
            to: request.email.clone(),
            subject: confirmation_subject(),
            body_html: render_submitter_confirmation(&request, &ctx),
        };

        for message in [&operator, &confirmation] {
            self.transport.send(message).await.map_err(|e| {
                error!(to = %message.to, error = %e, "failed to send booking email");
                BookingError::Dispatch(e.to_string())
            })?;
        }

        info!(request_id = %ctx.request_id, event_type = %request.event_type, "booking request relayed");
        Ok(BookingReceipt {
            request_id: ctx.request_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::mock_transport::MockTransport;
    use tokio_test::{assert_err, assert_ok};

    fn submission() -> BookingSubmission {
        BookingSubmission {
            name: Some("Jane Doe".into()),
            email: Some("jane@example.com".into()),
            phone: Some("".into()),
            event_type: Some("Corporate".into()),
            event_date: None,
            message: Some("Annual gala, 300 guests".into()),
        }
    }

    fn relay(transport: Arc<MockTransport>) -> BookingRelay {
        BookingRelay::new(
            transport,
            RelayConfig {
                from: "relay@example.com".into(),
                operator_address: "ops@example.com".into(),
            },
        )
    }

    #[test]
    fn test_validate_trims_and_drops_blank_optionals() {
        let mut sub = submission();
        sub.name = Some("  Jane Doe ".into());
        let req = assert_ok!(sub.validate());
        assert_eq!(req.name, "Jane Doe");
        assert_eq!(req.phone, None);
    }

    #[test]
    fn test_validate_email_shape() {
        for bad in ["jane", "jane@example", "jane doe@example.com", "@example.com"] {
            let mut sub = submission();
            sub.email = Some(bad.into());
            assert_eq!(
                sub.validate(),
                Err(BookingError::Validation(INVALID_EMAIL_MESSAGE.into())),
                "{bad} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_missing_message_fails_before_io() {
        let transport = Arc::new(MockTransport::healthy());
        let mut sub = submission();
        sub.message = Some("   ".into());

        let err = assert_err!(relay(transport.clone()).submit(sub).await);
        assert_eq!(err, BookingError::Validation(MISSING_FIELDS_MESSAGE.into()));
        assert!(err.is_client_error());
        assert_eq!(transport.verify_calls(), 0);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_transport_distinguishes_timeout_and_refused() {
        let timeout = Arc::new(MockTransport::unreachable(ConnectivityFailure::Timeout));
        let err = assert_err!(relay(timeout.clone()).submit(submission()).await);
        assert!(err.user_message().contains("timed out"));
        assert!(timeout.sent().is_empty());

        let refused = Arc::new(MockTransport::unreachable(ConnectivityFailure::Refused));
        let err = assert_err!(relay(refused).submit(submission()).await);
        assert!(err.user_message().contains("refused"));
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn test_healthy_transport_sends_operator_then_submitter() {
        let transport = Arc::new(MockTransport::healthy());
        let receipt = assert_ok!(relay(transport.clone()).submit(submission()).await);

        let sent = transport.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, "ops@example.com");
        assert_eq!(sent[0].subject, "🎯 New Booking Request from Jane Doe");
        assert_eq!(sent[1].to, "jane@example.com");
        assert!(sent.iter().all(|m| m.from == "relay@example.com"));
        assert!(sent[1].body_html.contains(&receipt.request_id));
    }

    #[tokio::test]
    async fn test_second_send_failure_keeps_first_delivery() {
        let transport = Arc::new(MockTransport::failing_send(1));
        let err = assert_err!(relay(transport.clone()).submit(submission()).await);

        assert!(matches!(err, BookingError::Dispatch(_)));
        assert_eq!(err.user_message(), "Failed to send booking request");
        assert_eq!(transport.sent().len(), 1);
        assert_eq!(transport.sent()[0].to, "ops@example.com");
    }
}
