use std::time::Duration;

use serde_json::json;
use tgf_core::{
    api::{
        port::ForwarderApi,
        types::{ApiOutcome, FailureKind, STATUS_UNAVAILABLE_MESSAGE},
    },
    domain::SessionBlob,
    model::{
        credentials::{CredentialField, Credentials},
        forwarding::{ForwardingConfig, PairField},
    },
};
use tgf_http::{
    HttpForwarderApi, DEFAULT_SEND_CODE_MESSAGE, DEFAULT_UPLOAD_MESSAGE,
};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> HttpForwarderApi {
    HttpForwarderApi::new(server.uri(), Duration::from_secs(5)).unwrap()
}

fn login_credentials() -> Credentials {
    let mut c = Credentials::new(30);
    c.set(CredentialField::AppId, "123456").unwrap();
    c.set(CredentialField::AppSecret, "0123456789abcdef").unwrap();
    c.set(CredentialField::PhoneNumber, "+55 (11) 98765-4321")
        .unwrap();
    c
}

#[tokio::test]
async fn upload_sends_multipart_session_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload-session"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "message": "Session is valid"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server);
    let blob = SessionBlob::new("telegram.session", b"SQLite format 3".to_vec());
    let outcome = api.upload_session(&blob).await;

    assert_eq!(
        outcome,
        ApiOutcome::Success {
            message: "Session is valid".into()
        }
    );

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"session_file\""), "{body}");
    assert!(body.contains("filename=\"telegram.session\""), "{body}");
    assert!(body.contains("SQLite format 3"));
}

#[tokio::test]
async fn expired_session_reply_is_classified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload-session"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "message": "Session file invalid or expired"
        })))
        .mount(&server)
        .await;

    let outcome = client(&server)
        .upload_session(&SessionBlob::new("old.session", vec![1, 2, 3]))
        .await;

    match outcome {
        ApiOutcome::Failure(f) => {
            assert_eq!(f.kind, FailureKind::SessionExpired);
            assert_eq!(f.message, "Session file invalid or expired");
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn send_code_canonicalizes_phone_and_keeps_failure_hints() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send-code"))
        .and(body_partial_json(json!({
            "apiId": "123456",
            "apiHash": "0123456789abcdef",
            "phoneNumber": "+5511987654321"
        })))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "success": false,
            "message": "Too many attempts. Wait 30 seconds.",
            "waitTime": 30
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client(&server).request_code(&login_credentials()).await;

    match outcome {
        ApiOutcome::Failure(f) => {
            assert_eq!(f.kind, FailureKind::Remote);
            assert_eq!(f.wait_time_seconds, Some(30));
            assert_eq!(f.message, "Too many attempts. Wait 30 seconds.");
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn verify_code_surfaces_two_factor_requirement() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/verify-code"))
        .and(body_partial_json(json!({"confirmationCode": "12345"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "2FA authentication required",
            "requires2FA": true
        })))
        .mount(&server)
        .await;

    let mut creds = login_credentials();
    creds
        .set(CredentialField::ConfirmationCode, " 12345 ")
        .unwrap();
    let outcome = client(&server).verify_code(&creds).await;

    match outcome {
        ApiOutcome::Failure(f) => {
            assert!(f.requires_two_factor);
            assert!(!f.requires_code);
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn start_posts_credentials_and_pairs() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/start"))
        .and(body_partial_json(json!({
            "telegram": {"phoneNumber": "+5511987654321", "sendInterval": 30},
            "pairs": [{"donorId": "-1001", "recipientIds": ["-2001", "-2002"]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let mut cfg = ForwardingConfig::default();
    let id = cfg.add_pair();
    cfg.update_pair(&id, PairField::DonorId("-1001".into()));
    cfg.update_pair(
        &id,
        PairField::RecipientIds(vec!["-2001".into(), "-2002".into()]),
    );

    let outcome = client(&server)
        .start_forwarding(&login_credentials(), &cfg)
        .await;
    assert!(matches!(outcome, ApiOutcome::Success { .. }), "{outcome:?}");
}

#[tokio::test]
async fn non_json_body_becomes_default_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send-code"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let outcome = client(&server).request_code(&login_credentials()).await;
    match outcome {
        ApiOutcome::Failure(f) => {
            assert_eq!(f.kind, FailureKind::Transport);
            assert_eq!(f.message, DEFAULT_SEND_CODE_MESSAGE);
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn stop_sends_empty_object() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/stop"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "message": "Forwarding stopped"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client(&server).stop_forwarding().await;
    assert_eq!(
        outcome,
        ApiOutcome::Success {
            message: "Forwarding stopped".into()
        }
    );

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body, json!({}));
}

#[tokio::test]
async fn status_is_parsed_with_error_counts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "isRunning": true,
            "lastMessage": "Forwarded 3 messages",
            "lastUpdate": "2024-05-01T12:00:00.000Z",
            "isConnected": true,
            "errorCounts": {"FloodWait": 2}
        })))
        .mount(&server)
        .await;

    let status = client(&server).query_status().await;
    assert!(status.is_running);
    assert!(status.is_connected);
    assert_eq!(status.last_message, "Forwarded 3 messages");
    assert_eq!(status.error_counts.get("FloodWait"), Some(&2));
    assert!(status.last_update_at().is_some());
}

#[tokio::test]
async fn status_with_null_fields_keeps_run_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "isRunning": true,
            "lastMessage": null,
            "lastUpdate": null,
            "isConnected": true
        })))
        .mount(&server)
        .await;

    let status = client(&server).query_status().await;
    assert!(status.is_running);
    assert!(status.is_connected);
    assert_ne!(status.last_message, STATUS_UNAVAILABLE_MESSAGE);
}

#[tokio::test]
async fn slow_status_degrades_to_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"isRunning": true, "isConnected": true}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let api = HttpForwarderApi::new(server.uri(), Duration::from_millis(100)).unwrap();
    let status = api.query_status().await;
    assert!(!status.is_running);
    assert!(!status.is_connected);
    assert_eq!(status.last_message, STATUS_UNAVAILABLE_MESSAGE);
}

#[tokio::test]
async fn unreachable_service_folds_into_failures() {
    // Grab a free port, then close it so nothing is listening.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let api = HttpForwarderApi::new(format!("http://{addr}"), Duration::from_secs(2)).unwrap();

    let outcome = api
        .upload_session(&SessionBlob::new("a.session", vec![0]))
        .await;
    match outcome {
        ApiOutcome::Failure(f) => {
            assert_eq!(f.kind, FailureKind::Transport);
            assert_eq!(f.message, DEFAULT_UPLOAD_MESSAGE);
        }
        other => panic!("expected failure, got {other:?}"),
    }

    let status = api.query_status().await;
    assert_eq!(status.last_message, STATUS_UNAVAILABLE_MESSAGE);
}
