//! Integration tests for the B2C authentication-count report using wiremock.

use b2c_graph::client::{Endpoints, Tenant};
use b2c_graph::error::DirectoryError;
use b2c_graph::reports::get_b2c_authentication_count;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TENANT: &str = "contoso.onmicrosoft.com";

fn mock_tenant(server: &MockServer) -> Tenant {
    Tenant::with_token(TENANT, Endpoints::single(&server.uri()), "mock-token")
}

#[tokio::test]
async fn returns_first_row_count() {
    let server = MockServer::start().await;
    let tenant = mock_tenant(&server);

    Mock::given(method("GET"))
        .and(path(format!("/{TENANT}/reports/b2cAuthenticationCount/")))
        .and(query_param("api-version", "beta"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": [
                {"AuthenticationCount": 4711},
                {"AuthenticationCount": 1}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let count = get_b2c_authentication_count(&tenant).await.unwrap();
    assert_eq!(count, 4711.0);
}

#[tokio::test]
async fn empty_report_is_an_error_not_a_panic() {
    let server = MockServer::start().await;
    let tenant = mock_tenant(&server);

    Mock::given(method("GET"))
        .and(path(format!("/{TENANT}/reports/b2cAuthenticationCount/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "value": [] })))
        .mount(&server)
        .await;

    let err = get_b2c_authentication_count(&tenant).await.unwrap_err();
    assert!(matches!(err, DirectoryError::EmptyReport(_)), "got {err:?}");
}

#[tokio::test]
async fn upstream_failure_is_api_error() {
    let server = MockServer::start().await;
    let tenant = mock_tenant(&server);

    Mock::given(method("GET"))
        .and(path(format!("/{TENANT}/reports/b2cAuthenticationCount/")))
        .respond_with(ResponseTemplate::new(403).set_body_string("Insufficient privileges"))
        .mount(&server)
        .await;

    let err = get_b2c_authentication_count(&tenant).await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(403));
}
