//! HTTP client behavior against a mock Semaphore server.

use semops::api::ApiClient;
use semops::config::ServerSettings;
use semops::error::Error;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(&ServerSettings {
        url: server.uri(),
        token: "test-token".to_string(),
    })
    .unwrap()
}

#[tokio::test]
async fn ping_returns_trimmed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong\n"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    assert_eq!(client.ping().await.unwrap(), "pong");
}

#[tokio::test]
async fn requests_carry_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/ping"))
        .and(wiremock::matchers::header(
            "authorization",
            "Bearer test-token",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    client.ping().await.unwrap();
}

#[tokio::test]
async fn empty_success_body_parses_as_null() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/project/1/tasks/9/stop"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let value = client.post("/api/project/1/tasks/9/stop", None).await.unwrap();
    assert!(value.is_null());
}

#[tokio::test]
async fn non_json_success_body_is_wrapped_as_string() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/info"))
        .respond_with(ResponseTemplate::new(200).set_body_string("plain text"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let value = client.get("/api/info").await.unwrap();
    assert_eq!(value, json!("plain text"));
}

#[tokio::test]
async fn unauthorized_maps_to_authentication_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/project/1/templates"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.get("/api/project/1/templates").await.unwrap_err();
    assert!(matches!(err, Error::AuthenticationFailed { .. }));
    assert_eq!(err.detail().as_deref(), Some("Check API token."));
}

#[tokio::test]
async fn forbidden_maps_to_permission_denied() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/project/1/templates"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.get("/api/project/1/templates").await.unwrap_err();
    assert!(matches!(err, Error::PermissionDenied));
}

#[tokio::test]
async fn not_found_names_method_and_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/project/1/templates/99"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.get("/api/project/1/templates/99").await.unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("GET"));
    assert!(msg.contains("/api/project/1/templates/99"));
}

#[tokio::test]
async fn conflict_and_validation_carry_the_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/project/1/templates"))
        .respond_with(ResponseTemplate::new(409).set_body_string("name already in use"))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/project/1/templates/3"))
        .respond_with(ResponseTemplate::new(422).set_body_string("cron expression invalid"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;

    let err = client
        .post("/api/project/1/templates", Some(&json!({})))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict { .. }));
    assert_eq!(err.detail().as_deref(), Some("name already in use"));

    let err = client
        .put("/api/project/1/templates/3", &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
    assert_eq!(err.detail().as_deref(), Some("cron expression invalid"));
}

#[tokio::test]
async fn server_errors_keep_their_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/project/1/backup"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.get("/api/project/1/backup").await.unwrap_err();
    match err {
        Error::ServerError { status, detail } => {
            assert_eq!(status, 503);
            assert_eq!(detail.as_deref(), Some("maintenance"));
        }
        other => panic!("expected ServerError, got {other:?}"),
    }
}

#[tokio::test]
async fn other_statuses_map_to_generic_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/project/1/views"))
        .respond_with(ResponseTemplate::new(418))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.get("/api/project/1/views").await.unwrap_err();
    assert!(matches!(err, Error::Http { status: 418, .. }));
}

#[tokio::test]
async fn connection_refused_maps_to_connection_failed() {
    // Nothing listens on this port.
    let client = ApiClient::new(&ServerSettings {
        url: "http://127.0.0.1:9".to_string(),
        token: "t".to_string(),
    })
    .unwrap();
    let err = client.ping().await.unwrap_err();
    assert!(matches!(err, Error::ConnectionFailed { .. }));
    assert_eq!(err.detail().as_deref(), Some("Check URL and network."));
}
