//! Integration tests for the Twilio gateway
//!
//! Runs the gateway against a mock Twilio REST API.

use std::time::Duration;

use schoolcast::config::TwilioConfig;
use schoolcast::gateway::{ChannelGateway, GatewayError, TwilioGateway};
use schoolcast::models::{Channel, DeliveryStatus};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MESSAGES_PATH: &str = "/2010-04-01/Accounts/AC0123456789/Messages.json";

fn config(base_url: &str) -> TwilioConfig {
    TwilioConfig {
        account_sid: "AC0123456789".to_string(),
        auth_token: "secret".to_string(),
        phone_number: Some("+15005550006".to_string()),
        whatsapp_number: Some("+14155238886".to_string()),
        api_base_url: base_url.to_string(),
    }
}

fn sms_gateway(base_url: &str) -> TwilioGateway {
    TwilioGateway::new(
        &config(base_url),
        Channel::Sms,
        "+15005550006",
        Duration::from_secs(2),
    )
    .unwrap()
}

#[tokio::test]
async fn test_sms_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MESSAGES_PATH))
        .and(header_exists("authorization"))
        .and(body_string_contains("To=%2B971501234567"))
        .and(body_string_contains("Body=Fee+due"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "sid": "SM123",
            "status": "queued"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = sms_gateway(&server.uri())
        .send("+971501234567", "Fee due")
        .await
        .unwrap();

    assert_eq!(result.status, DeliveryStatus::Success);
    assert_eq!(result.recipient, "+971501234567");
    assert!(result.error.is_none());
}

#[tokio::test]
async fn test_whatsapp_uses_prefixed_numbers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MESSAGES_PATH))
        .and(body_string_contains("To=whatsapp%3A%2B971501234567"))
        .and(body_string_contains("From=whatsapp%3A%2B14155238886"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = TwilioGateway::new(
        &config(&server.uri()),
        Channel::Whatsapp,
        "+14155238886",
        Duration::from_secs(2),
    )
    .unwrap();

    let result = gateway.send("+971501234567", "Fee due").await.unwrap();

    assert!(result.is_success());
    assert_eq!(gateway.provider(), "twilio-whatsapp");
}

#[tokio::test]
async fn test_rejected_recipient_is_failed_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MESSAGES_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 21211,
            "message": "The 'To' number +971500000000 is not a valid phone number.",
            "status": 400
        })))
        .mount(&server)
        .await;

    let result = sms_gateway(&server.uri())
        .send("+971500000000", "Fee due")
        .await
        .unwrap();

    assert_eq!(result.status, DeliveryStatus::Failed);
    assert_eq!(
        result.error.as_deref(),
        Some("Twilio error 21211: The 'To' number +971500000000 is not a valid phone number.")
    );
}

#[tokio::test]
async fn test_server_error_without_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = sms_gateway(&server.uri())
        .send("+971501234567", "Fee due")
        .await
        .unwrap();

    assert_eq!(result.error.as_deref(), Some("Twilio API error: HTTP 503"));
}

#[tokio::test]
async fn test_bad_credentials_is_configuration_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": 20003,
            "message": "Authenticate",
            "status": 401
        })))
        .mount(&server)
        .await;

    let err = sms_gateway(&server.uri())
        .send("+971501234567", "Fee due")
        .await
        .unwrap_err();

    match err {
        GatewayError::ProviderConfiguration(reason) => {
            assert!(reason.contains("Twilio error 20003: Authenticate"));
        }
        other => panic!("expected a configuration error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_timeout_is_failed_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let gateway = TwilioGateway::new(
        &config(&server.uri()),
        Channel::Sms,
        "+15005550006",
        Duration::from_millis(100),
    )
    .unwrap();

    let result = gateway.send("+971501234567", "Fee due").await.unwrap();

    assert_eq!(result.error.as_deref(), Some("Request to Twilio timed out"));
}

#[tokio::test]
async fn test_unreachable_provider_is_failed_result() {
    let result = sms_gateway("http://127.0.0.1:1")
        .send("+971501234567", "Fee due")
        .await
        .unwrap();

    assert_eq!(result.status, DeliveryStatus::Failed);
    assert!(result.error.unwrap().contains("Twilio"));
}
