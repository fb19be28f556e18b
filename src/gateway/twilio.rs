//! Twilio gateway for SMS and WhatsApp.
//!
//! Uses the Programmable Messaging REST API: a form-encoded POST to
//! `/2010-04-01/Accounts/{sid}/Messages.json` with HTTP basic auth.
//! WhatsApp goes through the same endpoint with `whatsapp:`-prefixed numbers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use super::{describe_transport_error, http_client, truncate_body, ChannelGateway, GatewayError};
use crate::config::TwilioConfig;
use crate::models::{Channel, DeliveryResult};

/// Twilio error code for failed account authentication
const TWILIO_AUTH_ERROR_CODE: i64 = 20003;

/// Error body returned by the Twilio REST API
#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    code: Option<i64>,
    message: Option<String>,
}

/// Twilio messaging gateway bound to one channel
pub struct TwilioGateway {
    client: reqwest::Client,
    messages_url: String,
    account_sid: String,
    auth_token: String,
    from: String,
    channel: Channel,
}

impl TwilioGateway {
    /// Creates a gateway sending from `from` on `channel` (SMS or WhatsApp)
    pub fn new(
        config: &TwilioConfig,
        channel: Channel,
        from: &str,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        if !channel.is_phone_based() {
            return Err(GatewayError::ProviderConfiguration(format!(
                "Twilio cannot deliver over the {} channel",
                channel
            )));
        }

        url::Url::parse(&config.api_base_url).map_err(|_| {
            GatewayError::ProviderConfiguration(format!(
                "Invalid Twilio API base URL: {}",
                config.api_base_url
            ))
        })?;

        Ok(Self {
            client: http_client(timeout)?,
            messages_url: format!(
                "{}/2010-04-01/Accounts/{}/Messages.json",
                config.api_base_url.trim_end_matches('/'),
                config.account_sid
            ),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from: from.to_string(),
            channel,
        })
    }

    /// Formats a number the way Twilio expects it for this channel
    fn address(&self, number: &str) -> String {
        match self.channel {
            Channel::Whatsapp => format!("whatsapp:{}", number.trim_start_matches("whatsapp:")),
            _ => number.to_string(),
        }
    }

    /// Turns a Twilio error response into a readable reason
    fn summarize_error(status: StatusCode, body: &str) -> String {
        match serde_json::from_str::<TwilioErrorBody>(body) {
            Ok(TwilioErrorBody {
                code: Some(code),
                message: Some(message),
            }) => format!("Twilio error {}: {}", code, message),
            Ok(TwilioErrorBody {
                message: Some(message),
                ..
            }) => format!("Twilio error: {}", message),
            _ if body.trim().is_empty() => format!("Twilio API error: HTTP {}", status.as_u16()),
            _ => format!(
                "Twilio API error: HTTP {}: {}",
                status.as_u16(),
                truncate_body(body)
            ),
        }
    }

    /// Credential rejections invalidate every send on this account
    fn is_credential_failure(status: StatusCode, body: &str) -> bool {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return true;
        }
        serde_json::from_str::<TwilioErrorBody>(body)
            .map(|e| e.code == Some(TWILIO_AUTH_ERROR_CODE))
            .unwrap_or(false)
    }
}

#[async_trait]
impl ChannelGateway for TwilioGateway {
    fn provider(&self) -> &'static str {
        match self.channel {
            Channel::Whatsapp => "twilio-whatsapp",
            _ => "twilio-sms",
        }
    }

    async fn send(&self, recipient: &str, message: &str) -> Result<DeliveryResult, GatewayError> {
        let to = self.address(recipient);
        let from = self.address(&self.from);
        let form = [("To", to.as_str()), ("From", from.as_str()), ("Body", message)];

        let response = match self
            .client
            .post(&self.messages_url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return Ok(DeliveryResult::failure(
                    recipient,
                    describe_transport_error("Twilio", &e),
                ))
            }
        };

        let status = response.status();
        if status.is_success() {
            log::debug!("Twilio accepted message to {}", recipient);
            return Ok(DeliveryResult::success(recipient));
        }

        let body = response.text().await.unwrap_or_default();
        let reason = Self::summarize_error(status, &body);

        if Self::is_credential_failure(status, &body) {
            return Err(GatewayError::ProviderConfiguration(format!(
                "Twilio rejected the account credentials ({})",
                reason
            )));
        }

        Ok(DeliveryResult::failure(recipient, reason))
    }
}
