//! Gateway adapter over the messaging providers.
//!
//! Each provider (Twilio SMS/WhatsApp, WhatsApp Cloud API, SMTP) implements
//! `ChannelGateway`; `GatewayAdapter` routes a channel to the gateway
//! registered for it. Provider rejections and transport errors come back as
//! failed `DeliveryResult`s. Only configuration faults are returned as errors.

pub mod email;
pub mod twilio;
pub mod whatsapp_cloud;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{GatewayConfig, WhatsAppProvider};
use crate::error::AppError;
use crate::models::{Channel, DeliveryResult};

pub use email::EmailGateway;
pub use twilio::TwilioGateway;
pub use whatsapp_cloud::WhatsAppCloudGateway;

// =============================================================================
// Gateway Errors
// =============================================================================

/// Faults that invalidate a whole channel rather than one recipient
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("no gateway configured for channel '{0}'")]
    UnsupportedChannel(Channel),

    #[error("{0}")]
    ProviderConfiguration(String),
}

impl From<GatewayError> for AppError {
    fn from(e: GatewayError) -> Self {
        AppError::ProviderConfiguration(e.to_string())
    }
}

// =============================================================================
// Channel Gateway Trait
// =============================================================================

/// One messaging provider bound to one channel
#[async_trait]
pub trait ChannelGateway: Send + Sync {
    /// Provider name for logs
    fn provider(&self) -> &'static str;

    /// Sends `message` to an already-normalized `recipient`
    ///
    /// Returns `Err` only when the provider rejects our own configuration
    /// (for example invalid credentials). Everything else is a failed result.
    async fn send(&self, recipient: &str, message: &str) -> Result<DeliveryResult, GatewayError>;
}

// =============================================================================
// Gateway Adapter
// =============================================================================

/// Routes sends to the gateway registered for each channel
#[derive(Clone, Default)]
pub struct GatewayAdapter {
    gateways: HashMap<Channel, Arc<dyn ChannelGateway>>,
}

impl GatewayAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the gateway for a channel
    pub fn with_gateway(mut self, channel: Channel, gateway: Arc<dyn ChannelGateway>) -> Self {
        self.gateways.insert(channel, gateway);
        self
    }

    /// Builds gateways for every channel whose provider credentials are present
    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let mut adapter = Self::new();

        if let Some(twilio) = &config.twilio {
            if let Some(from) = &twilio.phone_number {
                let gateway = TwilioGateway::new(twilio, Channel::Sms, from, config.timeout)?;
                adapter = adapter.with_gateway(Channel::Sms, Arc::new(gateway));
            }
        }

        match config.whatsapp_provider {
            WhatsAppProvider::Twilio => {
                if let Some(twilio) = &config.twilio {
                    if let Some(from) = &twilio.whatsapp_number {
                        let gateway =
                            TwilioGateway::new(twilio, Channel::Whatsapp, from, config.timeout)?;
                        adapter = adapter.with_gateway(Channel::Whatsapp, Arc::new(gateway));
                    }
                }
            }
            WhatsAppProvider::Cloud => {
                if let Some(cloud) = &config.whatsapp_cloud {
                    let gateway = WhatsAppCloudGateway::new(cloud, config.timeout)?;
                    adapter = adapter.with_gateway(Channel::Whatsapp, Arc::new(gateway));
                }
            }
        }

        if let Some(smtp) = &config.smtp {
            let gateway = EmailGateway::new(smtp, config.timeout)?;
            adapter = adapter.with_gateway(Channel::Email, Arc::new(gateway));
        }

        Ok(adapter)
    }

    /// Whether a gateway is registered for the channel
    pub fn supports(&self, channel: Channel) -> bool {
        self.gateways.contains_key(&channel)
    }

    /// Channels with a registered gateway, in declaration order
    pub fn configured_channels(&self) -> Vec<Channel> {
        Channel::ALL
            .into_iter()
            .filter(|c| self.supports(*c))
            .collect()
    }

    /// Provider name serving a channel, if any
    pub fn provider_for(&self, channel: Channel) -> Option<&'static str> {
        self.gateways.get(&channel).map(|g| g.provider())
    }

    /// Sends one message through the channel's gateway
    pub async fn send_one(
        &self,
        channel: Channel,
        recipient: &str,
        message: &str,
    ) -> Result<DeliveryResult, GatewayError> {
        let gateway = self
            .gateways
            .get(&channel)
            .ok_or(GatewayError::UnsupportedChannel(channel))?;

        gateway.send(recipient, message).await
    }
}

// =============================================================================
// Shared helpers
// =============================================================================

/// Builds the HTTP client shared by the HTTP-based providers
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, GatewayError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| {
            GatewayError::ProviderConfiguration(format!("Failed to create HTTP client: {}", e))
        })
}

/// Summarizes a transport-level error for a failed delivery result
pub(crate) fn describe_transport_error(provider: &str, e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("Request to {} timed out", provider)
    } else if e.is_connect() {
        format!("Connection to {} failed", provider)
    } else {
        format!("{} request failed: {}", provider, e)
    }
}

/// Trims provider error bodies before they are stored on a result
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 300;
    let body = body.trim();
    if body.chars().count() <= MAX {
        body.to_string()
    } else {
        let cut: String = body.chars().take(MAX).collect();
        format!("{}...", cut)
    }
}
