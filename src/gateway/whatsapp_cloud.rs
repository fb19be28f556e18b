//! WhatsApp Business Cloud API gateway.
//!
//! Sends text messages with a JSON POST to `/{phone_number_id}/messages`
//! authenticated by a bearer access token.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use super::{describe_transport_error, http_client, truncate_body, ChannelGateway, GatewayError};
use crate::config::WhatsAppCloudConfig;
use crate::models::DeliveryResult;

/// Graph API error code for an invalid or expired access token
const GRAPH_INVALID_TOKEN_CODE: i64 = 190;

#[derive(Debug, Deserialize)]
struct GraphErrorEnvelope {
    error: GraphError,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    message: Option<String>,
    code: Option<i64>,
}

/// WhatsApp Cloud API gateway
pub struct WhatsAppCloudGateway {
    client: reqwest::Client,
    messages_url: String,
    access_token: String,
}

impl WhatsAppCloudGateway {
    pub fn new(config: &WhatsAppCloudConfig, timeout: Duration) -> Result<Self, GatewayError> {
        let parsed = url::Url::parse(&config.api_base_url).map_err(|_| {
            GatewayError::ProviderConfiguration(format!(
                "Invalid WhatsApp Cloud API base URL: {}",
                config.api_base_url
            ))
        })?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(GatewayError::ProviderConfiguration(
                "WhatsApp Cloud API base URL must use HTTP or HTTPS".to_string(),
            ));
        }

        Ok(Self {
            client: http_client(timeout)?,
            messages_url: format!(
                "{}/{}/messages",
                config.api_base_url.trim_end_matches('/'),
                config.phone_number_id
            ),
            access_token: config.access_token.clone(),
        })
    }

    /// Builds the text message payload; the API expects digits without `+`
    fn payload(recipient: &str, message: &str) -> serde_json::Value {
        json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": recipient.trim_start_matches('+'),
            "type": "text",
            "text": {
                "preview_url": false,
                "body": message
            }
        })
    }

    fn parse_error(body: &str) -> Option<GraphError> {
        serde_json::from_str::<GraphErrorEnvelope>(body)
            .ok()
            .map(|e| e.error)
    }
}

#[async_trait]
impl ChannelGateway for WhatsAppCloudGateway {
    fn provider(&self) -> &'static str {
        "whatsapp-cloud"
    }

    async fn send(&self, recipient: &str, message: &str) -> Result<DeliveryResult, GatewayError> {
        let response = match self
            .client
            .post(&self.messages_url)
            .bearer_auth(&self.access_token)
            .json(&Self::payload(recipient, message))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return Ok(DeliveryResult::failure(
                    recipient,
                    describe_transport_error("WhatsApp Cloud API", &e),
                ))
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(DeliveryResult::success(recipient));
        }

        let body = response.text().await.unwrap_or_default();
        let error = Self::parse_error(&body);

        let reason = match &error {
            Some(GraphError {
                message: Some(message),
                code: Some(code),
            }) => format!("WhatsApp Cloud API error {}: {}", code, message),
            Some(GraphError {
                message: Some(message),
                ..
            }) => format!("WhatsApp Cloud API error: {}", message),
            _ if body.trim().is_empty() => {
                format!("WhatsApp Cloud API error: HTTP {}", status.as_u16())
            }
            _ => format!(
                "WhatsApp Cloud API error: HTTP {}: {}",
                status.as_u16(),
                truncate_body(&body)
            ),
        };

        let bad_token = error
            .as_ref()
            .and_then(|e| e.code)
            .is_some_and(|code| code == GRAPH_INVALID_TOKEN_CODE);

        if status == StatusCode::UNAUTHORIZED || bad_token {
            return Err(GatewayError::ProviderConfiguration(format!(
                "WhatsApp Cloud API rejected the access token ({})",
                reason
            )));
        }

        Ok(DeliveryResult::failure(recipient, reason))
    }
}
