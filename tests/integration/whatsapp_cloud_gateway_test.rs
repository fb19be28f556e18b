//! Integration tests for the WhatsApp Cloud API gateway

use std::time::Duration;

use schoolcast::config::WhatsAppCloudConfig;
use schoolcast::gateway::{ChannelGateway, GatewayError, WhatsAppCloudGateway};
use schoolcast::models::DeliveryStatus;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway(base_url: &str) -> WhatsAppCloudGateway {
    let config = WhatsAppCloudConfig {
        access_token: "EAAGtest".to_string(),
        phone_number_id: "1098765".to_string(),
        api_base_url: base_url.to_string(),
    };
    WhatsAppCloudGateway::new(&config, Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn test_text_message_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/1098765/messages"))
        .and(header("authorization", "Bearer EAAGtest"))
        .and(body_partial_json(json!({
            "messaging_product": "whatsapp",
            "to": "971501234567",
            "type": "text",
            "text": { "body": "School closed tomorrow" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messaging_product": "whatsapp",
            "messages": [{ "id": "wamid.HBgL" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway(&server.uri());
    let result = gateway
        .send("+971501234567", "School closed tomorrow")
        .await
        .unwrap();

    assert_eq!(result.status, DeliveryStatus::Success);
    assert_eq!(result.recipient, "+971501234567");
    assert_eq!(gateway.provider(), "whatsapp-cloud");
}

#[tokio::test]
async fn test_graph_error_is_failed_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "message": "Recipient phone number not in allowed list",
                "type": "OAuthException",
                "code": 131030
            }
        })))
        .mount(&server)
        .await;

    let result = gateway(&server.uri())
        .send("+971501234567", "Fee due")
        .await
        .unwrap();

    assert_eq!(result.status, DeliveryStatus::Failed);
    assert_eq!(
        result.error.as_deref(),
        Some("WhatsApp Cloud API error 131030: Recipient phone number not in allowed list")
    );
}

#[tokio::test]
async fn test_unparseable_error_body_is_truncated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let result = gateway(&server.uri())
        .send("+971501234567", "Fee due")
        .await
        .unwrap();

    assert_eq!(
        result.error.as_deref(),
        Some("WhatsApp Cloud API error: HTTP 502: <html>bad gateway</html>")
    );
}

#[tokio::test]
async fn test_expired_token_is_configuration_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "message": "Error validating access token: Session has expired",
                "type": "OAuthException",
                "code": 190
            }
        })))
        .mount(&server)
        .await;

    let err = gateway(&server.uri())
        .send("+971501234567", "Fee due")
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::ProviderConfiguration(_)));
    assert!(err.to_string().contains("Session has expired"));
}

#[tokio::test]
async fn test_unauthorized_is_configuration_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = gateway(&server.uri())
        .send("+971501234567", "Fee due")
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::ProviderConfiguration(_)));
}
