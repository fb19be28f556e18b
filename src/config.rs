use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::models::Channel;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
    pub dispatch: DispatchConfig,
    pub gateways: GatewayConfig,
}

/// Database connection pool configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

/// Batch limits and delivery pacing
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Gateway calls in flight per batch
    pub concurrency: usize,
    /// Minimum spacing between consecutive SMS provider calls
    pub sms_min_interval: Duration,
    /// Minimum spacing between consecutive WhatsApp provider calls
    pub whatsapp_min_interval: Duration,
    /// Minimum spacing between consecutive SMTP sends
    pub email_min_interval: Duration,
    pub max_recipients_per_batch: usize,
    /// Maximum message length in characters
    pub max_message_length: usize,
}

/// Outbound provider settings. A provider left as `None` leaves its channel unconfigured.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub timeout: Duration,
    pub twilio: Option<TwilioConfig>,
    pub whatsapp_provider: WhatsAppProvider,
    pub whatsapp_cloud: Option<WhatsAppCloudConfig>,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender number for SMS
    pub phone_number: Option<String>,
    /// Sender number for WhatsApp (without the `whatsapp:` prefix)
    pub whatsapp_number: Option<String>,
    pub api_base_url: String,
}

#[derive(Debug, Clone)]
pub struct WhatsAppCloudConfig {
    pub access_token: String,
    pub phone_number_id: String,
    pub api_base_url: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: String,
    pub subject: String,
}

/// Which backend carries WhatsApp messages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WhatsAppProvider {
    #[default]
    Twilio,
    Cloud,
}

impl FromStr for WhatsAppProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "twilio" => Ok(WhatsAppProvider::Twilio),
            "cloud" => Ok(WhatsAppProvider::Cloud),
            other => Err(ConfigError::InvalidWhatsAppProvider(other.to_string())),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            database: DatabaseConfig::from_env()?,
            dispatch: DispatchConfig::from_env(),
            gateways: GatewayConfig::from_env()?,
        })
    }
}

/// Reads a numeric variable, falling back to `default` when unset or unparsable
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Reads a variable, treating empty values as unset
fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl DatabaseConfig {
    /// Load database configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)?;

        Ok(Self {
            url,
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10),
            min_connections: env_or("DATABASE_MIN_CONNECTIONS", 1),
            acquire_timeout: Duration::from_secs(env_or("DATABASE_ACQUIRE_TIMEOUT_SECS", 5)),
            idle_timeout: Duration::from_secs(env_or("DATABASE_IDLE_TIMEOUT_SECS", 600)),
            max_lifetime: Duration::from_secs(env_or("DATABASE_MAX_LIFETIME_SECS", 1800)),
        })
    }
}

impl DispatchConfig {
    /// Load dispatch configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            concurrency: env_or("DISPATCH_CONCURRENCY", 4usize).max(1),
            sms_min_interval: Duration::from_millis(env_or("SMS_MIN_INTERVAL_MS", 1000)),
            whatsapp_min_interval: Duration::from_millis(env_or("WHATSAPP_MIN_INTERVAL_MS", 500)),
            email_min_interval: Duration::from_millis(env_or("EMAIL_MIN_INTERVAL_MS", 0)),
            max_recipients_per_batch: env_or("MAX_RECIPIENTS_PER_BATCH", 1000),
            max_message_length: env_or("MAX_MESSAGE_LENGTH", 1600),
        }
    }

    /// Minimum spacing between provider calls on a channel
    pub fn min_interval(&self, channel: Channel) -> Duration {
        match channel {
            Channel::Sms => self.sms_min_interval,
            Channel::Whatsapp => self.whatsapp_min_interval,
            Channel::Email => self.email_min_interval,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            sms_min_interval: Duration::from_millis(1000),
            whatsapp_min_interval: Duration::from_millis(500),
            email_min_interval: Duration::ZERO,
            max_recipients_per_batch: 1000,
            max_message_length: 1600,
        }
    }
}

impl GatewayConfig {
    /// Load provider credentials from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let whatsapp_provider = match env_opt("WHATSAPP_PROVIDER") {
            Some(value) => value.parse()?,
            None => WhatsAppProvider::default(),
        };

        let twilio = match (env_opt("TWILIO_ACCOUNT_SID"), env_opt("TWILIO_AUTH_TOKEN")) {
            (Some(account_sid), Some(auth_token)) => Some(TwilioConfig {
                account_sid,
                auth_token,
                phone_number: env_opt("TWILIO_PHONE_NUMBER"),
                whatsapp_number: env_opt("TWILIO_WHATSAPP_NUMBER"),
                api_base_url: env_opt("TWILIO_API_BASE_URL")
                    .unwrap_or_else(|| "https://api.twilio.com".to_string()),
            }),
            _ => None,
        };

        let whatsapp_cloud = match (
            env_opt("WHATSAPP_CLOUD_TOKEN"),
            env_opt("WHATSAPP_CLOUD_PHONE_NUMBER_ID"),
        ) {
            (Some(access_token), Some(phone_number_id)) => Some(WhatsAppCloudConfig {
                access_token,
                phone_number_id,
                api_base_url: env_opt("WHATSAPP_CLOUD_API_BASE_URL")
                    .unwrap_or_else(|| "https://graph.facebook.com/v19.0".to_string()),
            }),
            _ => None,
        };

        let smtp = env_opt("SMTP_HOST").map(|host| SmtpConfig {
            host,
            port: env_or("SMTP_PORT", 587),
            username: env_opt("SMTP_USERNAME"),
            password: env_opt("SMTP_PASSWORD"),
            from_address: env_opt("SMTP_FROM")
                .unwrap_or_else(|| "notifications@schoolcast.local".to_string()),
            subject: env_opt("SMTP_SUBJECT").unwrap_or_else(|| "School notification".to_string()),
        });

        Ok(Self {
            timeout: Duration::from_secs(env_or("GATEWAY_TIMEOUT_SECS", 30)),
            twilio,
            whatsapp_provider,
            whatsapp_cloud,
            smtp,
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    MissingDatabaseUrl,
    InvalidWhatsAppProvider(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "PORT must be a valid number"),
            ConfigError::MissingDatabaseUrl => {
                write!(f, "DATABASE_URL environment variable is required")
            }
            ConfigError::InvalidWhatsAppProvider(value) => {
                write!(
                    f,
                    "WHATSAPP_PROVIDER must be 'twilio' or 'cloud', got '{}'",
                    value
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}
