//! OAuth2 client-credentials authentication for the Microsoft identity platform.
//!
//! Two token endpoints are supported:
//!
//! - [`TokenEndpoint::Legacy`] — `/oauth2/token?api-version=1.0`, which issues
//!   tokens for the Azure AD Graph API (`graph.windows.net`).
//! - [`TokenEndpoint::Graph`] — `/oauth2/v2.0/token` with the
//!   `https://graph.microsoft.com/.default` scope, which issues tokens for
//!   Microsoft Graph.
//!
//! Tokens are not tracked for expiry. The session stores whatever the last
//! successful call returned and callers re-authenticate when the directory
//! API starts answering 401.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DirectoryError, Result};

/// Scope requested from the v2.0 endpoint for Microsoft Graph tokens.
pub const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

/// App registration credentials for a tenant.
#[derive(Clone)]
pub struct Credentials {
    /// Application (client) ID of the app registration.
    pub client_id: String,
    /// Client secret of the app registration.
    pub client_secret: String,
    /// Tenant domain, e.g. `contoso.onmicrosoft.com`.
    pub tenant_domain: String,
}

impl Credentials {
    /// Bundles the three identifiers of an app registration.
    pub fn new(client_id: &str, client_secret: &str, tenant_domain: &str) -> Self {
        Credentials {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            tenant_domain: tenant_domain.to_string(),
        }
    }
}

// The secret never ends up in logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("tenant_domain", &self.tenant_domain)
            .finish()
    }
}

/// Which token endpoint to authenticate against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenEndpoint {
    /// Azure AD v1 endpoint, tokens for `graph.windows.net`.
    Legacy,
    /// Azure AD v2.0 endpoint, tokens for `graph.microsoft.com`.
    Graph,
}

impl TokenEndpoint {
    /// Resolves the endpoint URL for `tenant_domain` under `login_base`
    /// (normally `https://login.microsoftonline.com`).
    pub fn url(self, login_base: &str, tenant_domain: &str) -> String {
        let base = login_base.trim_end_matches('/');
        match self {
            TokenEndpoint::Legacy => {
                format!("{base}/{tenant_domain}/oauth2/token?api-version=1.0")
            }
            TokenEndpoint::Graph => format!("{base}/{tenant_domain}/oauth2/v2.0/token"),
        }
    }

    fn scope(self) -> Option<&'static str> {
        match self {
            TokenEndpoint::Legacy => None,
            TokenEndpoint::Graph => Some(GRAPH_SCOPE),
        }
    }
}

/// Form body sent to the token endpoint.
/// Serialized as `application/x-www-form-urlencoded` by reqwest's `.form()`.
#[derive(Serialize)]
pub struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<&'a str>,
}

impl<'a> TokenRequest<'a> {
    /// Builds the client-credentials form for `endpoint`.
    pub fn client_credentials(credentials: &'a Credentials, endpoint: TokenEndpoint) -> Self {
        TokenRequest {
            client_id: &credentials.client_id,
            client_secret: &credentials.client_secret,
            grant_type: "client_credentials",
            scope: endpoint.scope(),
        }
    }
}

/// Bearer token as returned by the token endpoint.
///
/// The endpoint returns more fields (`expires_in`, `resource`, ...) which
/// serde ignores.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct AccessToken {
    /// The opaque token string.
    pub access_token: String,
    /// Token type, `Bearer` in practice.
    pub token_type: String,
}

impl AccessToken {
    /// Builds a token from parts, e.g. one obtained outside this crate.
    pub fn new(access_token: &str, token_type: &str) -> Self {
        AccessToken {
            access_token: access_token.to_string(),
            token_type: token_type.to_string(),
        }
    }

    /// Value for the `Authorization` header: `{token_type} {access_token}`.
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Runs the client-credentials flow and returns the issued token.
///
/// The body is read as text before the status check so that Azure AD's
/// AADSTS diagnostics end up in the error.
pub async fn request_token(
    http: &reqwest::Client,
    login_base: &str,
    credentials: &Credentials,
    endpoint: TokenEndpoint,
) -> Result<AccessToken> {
    let url = endpoint.url(login_base, &credentials.tenant_domain);
    let form = TokenRequest::client_credentials(credentials, endpoint);

    debug!(endpoint = ?endpoint, %url, "requesting access token");

    let response = http
        .post(&url)
        .form(&form)
        .send()
        .await
        .map_err(|e| DirectoryError::Auth {
            message: format!("token request to {url} failed"),
            source: Some(Box::new(e)),
        })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| DirectoryError::Auth {
        message: format!("failed to read token response from {url}"),
        source: Some(Box::new(e)),
    })?;

    if status != reqwest::StatusCode::OK {
        return Err(DirectoryError::Auth {
            message: format!("token request failed ({status}): {body}"),
            source: None,
        });
    }

    serde_json::from_str(&body).map_err(|e| DirectoryError::Auth {
        message: "failed to parse token response".to_string(),
        source: Some(Box::new(e)),
    })
}
