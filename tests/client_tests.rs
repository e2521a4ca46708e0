mod common;

use common::*;
use serde_json::json;
use std::time::Duration;
use whatsapp_cloud_bridge::{
    error::{BuildError, ConfigError, ServiceErrorKind},
    Client, Config, Error, SendRequest,
};
use wiremock::{
    matchers::{bearer_token, body_json, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn client(mock_server: &MockServer) -> Client {
    let config = Config::new(WABA_ID, PHONE_ID, ACCESS_TOKEN, VERIFY_TOKEN)
        .base_url(mock_server.uri())
        .api_version("23.0")
        .timeout(Duration::from_secs(5));
    Client::new(config).unwrap()
}

#[tokio::test]
async fn test_send_text_message() {
    let mock_server = MockServer::start().await;
    // Arrange
    let client = client(&mock_server);
    let message_id = "wamid.your_message_id";

    let request_body = json!({
        "messaging_product": "whatsapp",
        "recipient_type": "individual",
        "to": RECIPIENT_ID,
        "type": "text",
        "text": {"preview_url": false, "body": "Hello, world!"}
    });

    let response_body = json!({
        "messaging_product": "whatsapp",
        "contacts": [{"input": RECIPIENT_ID, "wa_id": RECIPIENT_ID}],
        "messages": [{"id": message_id}]
    });

    Mock::given(method("POST"))
        .and(path(format!("/v23.0/{}/messages", PHONE_ID)))
        .and(bearer_token(ACCESS_TOKEN))
        .and(body_json(&request_body))
        .respond_with(ResponseTemplate::new(200).set_body_json(response_body))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Act
    let result = client
        .send_message(&SendRequest::new(
            RECIPIENT_ID,
            "text",
            json!({"body": "Hello, world!"}),
        ))
        .await
        .unwrap();

    // Assert
    assert_eq!(result.external_id, message_id);
    assert_eq!(result.recipient_phone_number, RECIPIENT_ID);
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({"recipientPhoneNumber": RECIPIENT_ID, "externalId": message_id})
    );
}

#[tokio::test]
async fn test_send_reports_provider_error() {
    let mock_server = MockServer::start().await;
    let client = client(&mock_server);

    let error_body = json!({
        "error": {
            "message": "(#131030) Recipient phone number not in allowed list",
            "type": "OAuthException",
            "code": 131030,
            "error_data": {
                "messaging_product": "whatsapp",
                "details": "Recipient phone number not in allowed list"
            },
            "fbtrace_id": "AbC123"
        }
    });

    Mock::given(method("POST"))
        .and(path(format!("/v23.0/{}/messages", PHONE_ID)))
        .respond_with(ResponseTemplate::new(400).set_body_json(error_body))
        .mount(&mock_server)
        .await;

    let err = client
        .send_message(&SendRequest::new(
            RECIPIENT_ID,
            "image",
            json!({"link": "https://example.com/a.png"}),
        ))
        .await
        .unwrap_err();

    let service = match err {
        Error::Service(service) => service,
        other => panic!("expected a service error, got {other:?}"),
    };
    assert_eq!(service.status().as_u16(), 400);
    assert!(service.endpoint().ends_with(&format!("/v23.0/{PHONE_ID}/messages")));

    let meta = service.meta_error().unwrap();
    assert_eq!(meta.code, 131030);
    assert_eq!(meta.fbtrace_id.as_deref(), Some("AbC123"));
    assert_eq!(
        meta.error_metadata.details.as_deref(),
        Some("Recipient phone number not in allowed list")
    );
}

#[tokio::test]
async fn test_send_with_unexpected_success_body() {
    let mock_server = MockServer::start().await;
    let client = client(&mock_server);

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"messages": []})))
        .mount(&mock_server)
        .await;

    let err = client
        .send_message(&SendRequest::new(RECIPIENT_ID, "text", json!({"body": "hi"})))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Service(ref service) if matches!(service.kind(), ServiceErrorKind::InvalidPayload(_))
    ));
}

#[tokio::test]
async fn test_invalid_request_never_hits_the_network() {
    let mock_server = MockServer::start().await;
    let client = client(&mock_server);

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let err = client
        .send_message(&SendRequest::new(RECIPIENT_ID, "sticker", json!({})))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Build(BuildError::UnsupportedType(ref kind)) if kind == "sticker"
    ));
}

#[tokio::test]
async fn test_set_read_and_typing_indicator() {
    let mock_server = MockServer::start().await;
    let client = client(&mock_server);

    Mock::given(method("POST"))
        .and(path(format!("/v23.0/{}/messages", PHONE_ID)))
        .and(bearer_token(ACCESS_TOKEN))
        .and(body_json(json!({
            "messaging_product": "whatsapp",
            "status": "read",
            "message_id": "wamid.IN"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/v23.0/{}/messages", PHONE_ID)))
        .and(body_json(json!({
            "messaging_product": "whatsapp",
            "status": "read",
            "message_id": "wamid.IN",
            "typing_indicator": {"type": "text"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    client.set_read(RECIPIENT_ID, "wamid.IN").await.unwrap();
    client
        .set_typing_indicator(RECIPIENT_ID, "wamid.IN")
        .await
        .unwrap();
}

#[test]
fn test_config_from_env() {
    temp_env::with_vars(
        [
            ("ACCOUNT_ID", Some(WABA_ID)),
            ("PHONE_NUMBER_ID", Some(PHONE_ID)),
            ("WHATSAPP_ACCESS_TOKEN", Some(ACCESS_TOKEN)),
            ("VERIFY_TOKEN", Some(VERIFY_TOKEN)),
            ("WHATSAPP_API_VERSION", Some("v22.0")),
            ("WHATSAPP_API_BASE_URL", Some("http://127.0.0.1:9")),
            ("WHATSAPP_TIMEOUT_SECS", Some("7")),
        ],
        || {
            let config = Config::from_env().unwrap();
            assert_eq!(config.account_id, WABA_ID);
            assert_eq!(config.api_version, "22.0");
            assert_eq!(config.timeout, Some(Duration::from_secs(7)));
            assert_eq!(
                config.messages_endpoint(),
                format!("http://127.0.0.1:9/v22.0/{PHONE_ID}/messages")
            );
        },
    );
}

#[test]
fn test_config_from_env_defaults_and_errors() {
    temp_env::with_vars(
        [
            ("ACCOUNT_ID", Some(WABA_ID)),
            ("PHONE_NUMBER_ID", Some(PHONE_ID)),
            ("WHATSAPP_ACCESS_TOKEN", Some(ACCESS_TOKEN)),
            ("VERIFY_TOKEN", None),
            ("WHATSAPP_API_VERSION", None),
            ("WHATSAPP_API_BASE_URL", None),
            ("WHATSAPP_TIMEOUT_SECS", None),
        ],
        || {
            assert!(matches!(
                Config::from_env(),
                Err(ConfigError::MissingVar("VERIFY_TOKEN"))
            ));
        },
    );

    temp_env::with_vars(
        [
            ("ACCOUNT_ID", Some(WABA_ID)),
            ("PHONE_NUMBER_ID", Some(PHONE_ID)),
            ("WHATSAPP_ACCESS_TOKEN", Some(ACCESS_TOKEN)),
            ("VERIFY_TOKEN", Some(VERIFY_TOKEN)),
            ("WHATSAPP_API_VERSION", None),
            ("WHATSAPP_API_BASE_URL", None),
            ("WHATSAPP_TIMEOUT_SECS", Some("soon")),
        ],
        || {
            assert!(matches!(
                Config::from_env(),
                Err(ConfigError::InvalidVar {
                    name: "WHATSAPP_TIMEOUT_SECS",
                    ..
                })
            ));
        },
    );

    temp_env::with_vars(
        [
            ("ACCOUNT_ID", Some(WABA_ID)),
            ("PHONE_NUMBER_ID", Some(PHONE_ID)),
            ("WHATSAPP_ACCESS_TOKEN", Some(ACCESS_TOKEN)),
            ("VERIFY_TOKEN", Some(VERIFY_TOKEN)),
            ("WHATSAPP_API_VERSION", None),
            ("WHATSAPP_API_BASE_URL", None),
            ("WHATSAPP_TIMEOUT_SECS", None),
        ],
        || {
            let config = Config::from_env().unwrap();
            assert_eq!(
                config.messages_endpoint(),
                format!("https://graph.facebook.com/v23.0/{PHONE_ID}/messages")
            );
            assert_eq!(config.timeout, None);
        },
    );
}
