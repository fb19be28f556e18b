//! Email gateway.
//!
//! Sends plain-text notifications over SMTP using the lettre crate.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{ChannelGateway, GatewayError};
use crate::config::SmtpConfig;
use crate::models::DeliveryResult;

/// SMTP email gateway
pub struct EmailGateway {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    subject: String,
}

impl EmailGateway {
    /// Builds the SMTP transport once; invalid host or sender is a configuration fault
    pub fn new(config: &SmtpConfig, timeout: Duration) -> Result<Self, GatewayError> {
        let from: Mailbox = config.from_address.parse().map_err(|_| {
            GatewayError::ProviderConfiguration(format!(
                "Invalid SMTP sender address: {}",
                config.from_address
            ))
        })?;

        // Port 465 = implicit TLS (SMTPS), anything else = STARTTLS
        let builder = if config.port == 465 {
            let tls_params = TlsParameters::new(config.host.clone()).map_err(|e| {
                GatewayError::ProviderConfiguration(format!(
                    "Invalid TLS parameters for SMTP host: {}",
                    e
                ))
            })?;

            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map(|b| b.port(config.port).tls(Tls::Wrapper(tls_params)))
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map(|b| b.port(config.port))
        }
        .map_err(|e| GatewayError::ProviderConfiguration(format!("Invalid SMTP host: {}", e)))?;

        let builder = builder.timeout(Some(timeout));

        let mailer = match (&config.username, &config.password) {
            (Some(username), Some(password)) => builder
                .credentials(Credentials::new(username.clone(), password.clone()))
                .build(),
            _ => builder.build(),
        };

        Ok(Self {
            mailer,
            from,
            subject: config.subject.clone(),
        })
    }

    fn build_message(&self, to: Mailbox, message: &str) -> Result<Message, String> {
        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&self.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(message.to_string())
            .map_err(|e| format!("Failed to build email: {}", e))
    }
}

#[async_trait]
impl ChannelGateway for EmailGateway {
    fn provider(&self) -> &'static str {
        "smtp"
    }

    async fn send(&self, recipient: &str, message: &str) -> Result<DeliveryResult, GatewayError> {
        let to: Mailbox = match recipient.parse() {
            Ok(addr) => addr,
            Err(_) => {
                return Ok(DeliveryResult::failure(
                    recipient,
                    format!("Invalid email recipient: {}", recipient),
                ))
            }
        };

        let email = match self.build_message(to, message) {
            Ok(email) => email,
            Err(reason) => return Ok(DeliveryResult::failure(recipient, reason)),
        };

        match self.mailer.send(email).await {
            Ok(_) => {
                log::debug!("Email sent successfully to {}", recipient);
                Ok(DeliveryResult::success(recipient))
            }
            Err(e) if is_credential_rejection(e.status().map(u16::from)) => {
                Err(GatewayError::ProviderConfiguration(format!(
                    "SMTP server rejected the configured credentials: {}",
                    e
                )))
            }
            Err(e) => Ok(DeliveryResult::failure(
                recipient,
                format!("Failed to send email: {}", e),
            )),
        }
    }
}

/// 530 auth required, 534 mechanism too weak, 535 credentials invalid
fn is_credential_rejection(code: Option<u16>) -> bool {
    matches!(code, Some(530 | 534 | 535))
}
