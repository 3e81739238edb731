//! Device code request against a mock GitHub login host


use std::sync::Arc;
use std::time::{Duration, Instant};

use copilot_auth::{
    AuthConfig, AuthError, CancellationToken, DeviceFlow, RecordingSleeper, Stage,
};
use test_utils::*;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_device_code_request_sends_client_id_and_scope() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DEVICE_CODE_PATH))
        .and(header("accept", "application/json"))
        .and(header("user-agent", "GitHubCopilotChat/0.26.7"))
        .and(body_json(serde_json::json!({
            "client_id": "Iv1.b507a08c87ecfe98",
            "scope": "read:user"
        })))
        .respond_with(MockResponseBuilder::device_code(5, 900))
        .expect(1)
        .mount(&mock_server)
        .await;

    let authenticator = test_authenticator(&mock_server, Arc::new(RecordingSleeper::new()));
    let info = authenticator
        .request_device_code()
        .await
        .expect("device code");

    assert_eq!(info.user_code, "WDJB-MJHT");
    assert_eq!(info.verification_uri, "https://github.com/login/device");
    assert_eq!(info.interval, 5);
    assert_eq!(info.expires_in, 900);
}

#[tokio::test]
async fn test_device_code_request_uses_configured_identity() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DEVICE_CODE_PATH))
        .and(header("user-agent", "MyEditor/2.0"))
        .and(body_json(serde_json::json!({
            "client_id": "Iv1.custom",
            "scope": "read:user repo"
        })))
        .respond_with(MockResponseBuilder::device_code(5, 900))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = AuthConfig {
        client_id: "Iv1.custom".to_string(),
        scope: "read:user repo".to_string(),
        user_agent: "MyEditor/2.0".to_string(),
        ..test_config(&mock_server)
    };
    let authenticator = authenticator_for(config);

    assert!(authenticator.request_device_code().await.is_ok());
}

#[tokio::test]
async fn test_device_code_defaults_when_provider_omits_timing() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DEVICE_CODE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "device_code": "dc",
            "user_code": "ABCD-EFGH",
            "verification_uri": "https://github.com/login/device"
        })))
        .mount(&mock_server)
        .await;

    let authenticator = test_authenticator(&mock_server, Arc::new(RecordingSleeper::new()));
    let info = authenticator
        .request_device_code()
        .await
        .expect("device code");

    assert_eq!(info.interval, 5);
    assert_eq!(info.expires_in, 900);
}

#[tokio::test]
async fn test_device_code_server_error_stops_before_polling() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DEVICE_CODE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path(ACCESS_TOKEN_PATH))
        .respond_with(MockResponseBuilder::pending())
        .expect(0)
        .mount(&mock_server)
        .await;

    let sleeper = Arc::new(RecordingSleeper::new());
    let flow = DeviceFlow::new(test_authenticator(&mock_server, sleeper.clone()));
    let mut output = Vec::new();
    let err = flow.run(&mut output).await.unwrap_err();

    match err {
        AuthError::Http {
            stage,
            status,
            body,
        } => {
            assert_eq!(stage, Stage::DeviceCode);
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body, "upstream exploded");
        }
        other => panic!("expected HTTP error, got {other:?}"),
    }
    assert_eq!(sleeper.count(), 0);
    let output = String::from_utf8(output).expect("utf8");
    assert!(!output.contains("Waiting for user to authorize"));
}

#[tokio::test]
async fn test_device_code_malformed_body_is_parse_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DEVICE_CODE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let authenticator = test_authenticator(&mock_server, Arc::new(RecordingSleeper::new()));
    let err = authenticator.request_device_code().await.unwrap_err();

    assert!(matches!(
        err,
        AuthError::Parse {
            stage: Stage::DeviceCode,
            ..
        }
    ));
}

#[tokio::test]
async fn test_device_code_cancelled_before_request_sends_nothing() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DEVICE_CODE_PATH))
        .respond_with(MockResponseBuilder::device_code(5, 900))
        .expect(0)
        .mount(&mock_server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let authenticator = test_authenticator(&mock_server, Arc::new(RecordingSleeper::new()))
        .with_cancellation(cancel);
    let err = authenticator.request_device_code().await.unwrap_err();

    assert!(matches!(err, AuthError::Cancelled));
}

#[tokio::test]
async fn test_device_code_cancel_interrupts_slow_request() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DEVICE_CODE_PATH))
        .respond_with(
            MockResponseBuilder::device_code(5, 900).set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let authenticator = test_authenticator(&mock_server, Arc::new(RecordingSleeper::new()));
    let cancel = authenticator.cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
    });

    let started = Instant::now();
    let err = authenticator.request_device_code().await.unwrap_err();

    assert!(matches!(err, AuthError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(4));
}
