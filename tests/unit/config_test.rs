//! Unit tests for configuration parsing
//!
//! Tests environment variable parsing and default values.
//!
//! Note: These tests modify global environment variables and must run serially.

use std::time::Duration;

use schoolcast::config::{DispatchConfig, GatewayConfig, WhatsAppProvider};
use schoolcast::models::Channel;
use serial_test::serial;

const DISPATCH_VARS: [&str; 6] = [
    "DISPATCH_CONCURRENCY",
    "SMS_MIN_INTERVAL_MS",
    "WHATSAPP_MIN_INTERVAL_MS",
    "EMAIL_MIN_INTERVAL_MS",
    "MAX_RECIPIENTS_PER_BATCH",
    "MAX_MESSAGE_LENGTH",
];

const GATEWAY_VARS: [&str; 14] = [
    "GATEWAY_TIMEOUT_SECS",
    "TWILIO_ACCOUNT_SID",
    "TWILIO_AUTH_TOKEN",
    "TWILIO_PHONE_NUMBER",
    "TWILIO_WHATSAPP_NUMBER",
    "TWILIO_API_BASE_URL",
    "WHATSAPP_PROVIDER",
    "WHATSAPP_CLOUD_TOKEN",
    "WHATSAPP_CLOUD_PHONE_NUMBER_ID",
    "WHATSAPP_CLOUD_API_BASE_URL",
    "SMTP_HOST",
    "SMTP_PORT",
    "SMTP_FROM",
    "SMTP_SUBJECT",
];

fn clear(vars: &[&str]) {
    for var in vars {
        std::env::remove_var(var);
    }
}

// =============================================================================
// Dispatch Config Tests
// =============================================================================

#[test]
#[serial]
fn test_dispatch_config_defaults() {
    clear(&DISPATCH_VARS);

    let config = DispatchConfig::from_env();

    assert_eq!(config.concurrency, 4);
    assert_eq!(config.sms_min_interval, Duration::from_millis(1000));
    assert_eq!(config.whatsapp_min_interval, Duration::from_millis(500));
    assert_eq!(config.email_min_interval, Duration::ZERO);
    assert_eq!(config.max_recipients_per_batch, 1000);
    assert_eq!(config.max_message_length, 1600);
}

#[test]
#[serial]
fn test_dispatch_config_custom_values() {
    std::env::set_var("DISPATCH_CONCURRENCY", "8");
    std::env::set_var("SMS_MIN_INTERVAL_MS", "250");
    std::env::set_var("EMAIL_MIN_INTERVAL_MS", "100");
    std::env::set_var("MAX_RECIPIENTS_PER_BATCH", "50");

    let config = DispatchConfig::from_env();

    assert_eq!(config.concurrency, 8);
    assert_eq!(config.min_interval(Channel::Sms), Duration::from_millis(250));
    assert_eq!(config.min_interval(Channel::Email), Duration::from_millis(100));
    assert_eq!(
        config.min_interval(Channel::Whatsapp),
        Duration::from_millis(500)
    );
    assert_eq!(config.max_recipients_per_batch, 50);

    clear(&DISPATCH_VARS);
}

#[test]
#[serial]
fn test_dispatch_config_invalid_values_use_defaults() {
    std::env::set_var("DISPATCH_CONCURRENCY", "lots");
    std::env::set_var("SMS_MIN_INTERVAL_MS", "-5");

    let config = DispatchConfig::from_env();

    assert_eq!(config.concurrency, 4);
    assert_eq!(config.sms_min_interval, Duration::from_millis(1000));

    clear(&DISPATCH_VARS);
}

#[test]
#[serial]
fn test_dispatch_config_zero_concurrency_is_sequential() {
    std::env::set_var("DISPATCH_CONCURRENCY", "0");

    let config = DispatchConfig::from_env();

    assert_eq!(config.concurrency, 1);

    clear(&DISPATCH_VARS);
}

// =============================================================================
// Gateway Config Tests
// =============================================================================

#[test]
#[serial]
fn test_gateway_config_without_credentials() {
    clear(&GATEWAY_VARS);

    let config = GatewayConfig::from_env().unwrap();

    assert!(config.twilio.is_none());
    assert!(config.whatsapp_cloud.is_none());
    assert!(config.smtp.is_none());
    assert_eq!(config.whatsapp_provider, WhatsAppProvider::Twilio);
    assert_eq!(config.timeout, Duration::from_secs(30));
}

#[test]
#[serial]
fn test_gateway_config_twilio_requires_sid_and_token() {
    clear(&GATEWAY_VARS);
    std::env::set_var("TWILIO_ACCOUNT_SID", "AC123");

    let config = GatewayConfig::from_env().unwrap();
    assert!(config.twilio.is_none());

    std::env::set_var("TWILIO_AUTH_TOKEN", "secret");
    std::env::set_var("TWILIO_PHONE_NUMBER", "+15005550006");

    let config = GatewayConfig::from_env().unwrap();
    let twilio = config.twilio.expect("twilio should be configured");
    assert_eq!(twilio.account_sid, "AC123");
    assert_eq!(twilio.phone_number.as_deref(), Some("+15005550006"));
    assert!(twilio.whatsapp_number.is_none());
    assert_eq!(twilio.api_base_url, "https://api.twilio.com");

    clear(&GATEWAY_VARS);
}

#[test]
#[serial]
fn test_gateway_config_blank_values_are_unset() {
    clear(&GATEWAY_VARS);
    std::env::set_var("TWILIO_ACCOUNT_SID", "  ");
    std::env::set_var("TWILIO_AUTH_TOKEN", "secret");
    std::env::set_var("SMTP_HOST", "");

    let config = GatewayConfig::from_env().unwrap();

    assert!(config.twilio.is_none());
    assert!(config.smtp.is_none());

    clear(&GATEWAY_VARS);
}

#[test]
#[serial]
fn test_gateway_config_whatsapp_cloud() {
    clear(&GATEWAY_VARS);
    std::env::set_var("WHATSAPP_PROVIDER", "Cloud");
    std::env::set_var("WHATSAPP_CLOUD_TOKEN", "EAAG");
    std::env::set_var("WHATSAPP_CLOUD_PHONE_NUMBER_ID", "1098765");

    let config = GatewayConfig::from_env().unwrap();

    assert_eq!(config.whatsapp_provider, WhatsAppProvider::Cloud);
    let cloud = config.whatsapp_cloud.expect("cloud should be configured");
    assert_eq!(cloud.phone_number_id, "1098765");
    assert_eq!(cloud.api_base_url, "https://graph.facebook.com/v19.0");

    clear(&GATEWAY_VARS);
}

#[test]
#[serial]
fn test_gateway_config_invalid_whatsapp_provider() {
    clear(&GATEWAY_VARS);
    std::env::set_var("WHATSAPP_PROVIDER", "telegram");

    let err = GatewayConfig::from_env().unwrap_err();
    assert!(err.to_string().contains("telegram"));

    clear(&GATEWAY_VARS);
}

#[test]
#[serial]
fn test_gateway_config_smtp_defaults() {
    clear(&GATEWAY_VARS);
    std::env::set_var("SMTP_HOST", "smtp.example.com");

    let config = GatewayConfig::from_env().unwrap();

    let smtp = config.smtp.expect("smtp should be configured");
    assert_eq!(smtp.host, "smtp.example.com");
    assert_eq!(smtp.port, 587);
    assert!(smtp.username.is_none());
    assert_eq!(smtp.from_address, "notifications@schoolcast.local");
    assert_eq!(smtp.subject, "School notification");

    clear(&GATEWAY_VARS);
}
