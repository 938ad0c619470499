//! Integration tests for client-credentials authentication using wiremock.
//!
//! The mock server stands in for `login.microsoftonline.com`:
//! - POST /{tenant}/oauth2/token?api-version=1.0 — Azure AD Graph tokens
//! - POST /{tenant}/oauth2/v2.0/token           — Microsoft Graph tokens

use b2c_graph::auth::Credentials;
use b2c_graph::client::{Endpoints, Tenant};
use b2c_graph::error::DirectoryError;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TENANT: &str = "contoso.onmicrosoft.com";

fn tenant_for(server: &MockServer) -> Tenant {
    Tenant::with_endpoints(
        Credentials::new("cid", "s3cret", TENANT),
        Endpoints::single(&server.uri()),
    )
}

#[tokio::test]
async fn legacy_authentication_stores_token() {
    let server = MockServer::start().await;
    let mut tenant = tenant_for(&server);

    Mock::given(method("POST"))
        .and(path(format!("/{TENANT}/oauth2/token")))
        .and(query_param("api-version", "1.0"))
        .and(body_string_contains("client_id=cid"))
        .and(body_string_contains("client_secret=s3cret"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token_type": "Bearer",
            "expires_in": "3599",
            "resource": "https://graph.windows.net",
            "access_token": "legacy-token"
        })))
        .expect(1)
        .mount(&server)
        .await;

    tenant.authenticate_legacy().await.unwrap();

    let token = tenant.token().expect("token should be stored");
    assert_eq!(token.access_token, "legacy-token");
    assert_eq!(token.token_type, "Bearer");
}

#[tokio::test]
async fn graph_authentication_requests_graph_scope() {
    let server = MockServer::start().await;
    let mut tenant = tenant_for(&server);

    Mock::given(method("POST"))
        .and(path(format!("/{TENANT}/oauth2/v2.0/token")))
        .and(body_string_contains(
            "scope=https%3A%2F%2Fgraph.microsoft.com%2F.default",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token_type": "Bearer",
            "expires_in": 3599,
            "access_token": "graph-token"
        })))
        .expect(1)
        .mount(&server)
        .await;

    tenant.authenticate_graph().await.unwrap();
    assert_eq!(tenant.token().unwrap().access_token, "graph-token");
}

#[tokio::test]
async fn reauthentication_replaces_token() {
    let server = MockServer::start().await;
    let mut tenant = tenant_for(&server);

    Mock::given(method("POST"))
        .and(path(format!("/{TENANT}/oauth2/token")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token_type": "Bearer",
            "access_token": "first"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/{TENANT}/oauth2/v2.0/token")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token_type": "Bearer",
            "access_token": "second"
        })))
        .mount(&server)
        .await;

    tenant.authenticate_legacy().await.unwrap();
    tenant.authenticate_graph().await.unwrap();
    assert_eq!(tenant.token().unwrap().access_token, "second");
}

#[tokio::test]
async fn rejected_credentials_surface_aadsts_body() {
    let server = MockServer::start().await;
    let mut tenant = tenant_for(&server);

    Mock::given(method("POST"))
        .and(path(format!("/{TENANT}/oauth2/v2.0/token")))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": "invalid_client",
            "error_description": "AADSTS7000215: Invalid client secret provided."
        })))
        .mount(&server)
        .await;

    let err = tenant.authenticate_graph().await.unwrap_err();
    match &err {
        DirectoryError::Auth { message, .. } => {
            assert!(message.contains("401"), "message should carry status: {message}");
            assert!(message.contains("AADSTS7000215"), "message should carry body: {message}");
        }
        other => panic!("expected Auth error, got {other:?}"),
    }
    assert!(tenant.token().is_none(), "failed authentication must not store a token");
}

#[tokio::test]
async fn failed_reauthentication_keeps_previous_token() {
    let server = MockServer::start().await;
    let mut tenant = tenant_for(&server);

    Mock::given(method("POST"))
        .and(path(format!("/{TENANT}/oauth2/token")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token_type": "Bearer",
            "access_token": "still-valid"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/{TENANT}/oauth2/v2.0/token")))
        .respond_with(ResponseTemplate::new(500).set_body_string("outage"))
        .mount(&server)
        .await;

    tenant.authenticate_legacy().await.unwrap();
    assert!(tenant.authenticate_graph().await.is_err());
    assert_eq!(tenant.token().unwrap().access_token, "still-valid");
}

#[tokio::test]
async fn malformed_token_json_is_auth_error() {
    let server = MockServer::start().await;
    let mut tenant = tenant_for(&server);

    Mock::given(method("POST"))
        .and(path(format!("/{TENANT}/oauth2/token")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let err = tenant.authenticate_legacy().await.unwrap_err();
    match err {
        DirectoryError::Auth { source, .. } => {
            assert!(source.is_some(), "parse failure should be chained")
        }
        other => panic!("expected Auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_token_endpoint_is_auth_error_with_transport_source() {
    // Nothing listens on port 1.
    let mut tenant = Tenant::with_endpoints(
        Credentials::new("cid", "s3cret", TENANT),
        Endpoints::single("http://127.0.0.1:1"),
    );

    let err = tenant.authenticate_legacy().await.unwrap_err();
    match err {
        DirectoryError::Auth { source, .. } => {
            let source = source.expect("transport error should be chained");
            assert!(source.downcast_ref::<reqwest::Error>().is_some());
        }
        other => panic!("expected Auth error, got {other:?}"),
    }
}
