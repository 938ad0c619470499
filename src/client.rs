//! Tenant session and the authenticated request executor.
//!
//! [`Tenant`] is the explicit context every directory operation borrows. It
//! holds the app registration credentials, the current access token, the
//! service base URLs and a shared `reqwest::Client`.
//!
//! Requests are addressed through [`Address`]:
//! - [`Address::Legacy`] targets the Azure AD Graph API,
//!   `{legacy}/{tenant_domain}{endpoint}?api-version={version}`.
//! - [`Address::Modern`] targets Microsoft Graph, `{modern}{endpoint}`.
//! - [`Address::NextLink`] sends a GET to an absolute continuation link.
//!
//! Token lifecycle: the token is set only by [`Tenant::authenticate_legacy`],
//! [`Tenant::authenticate_graph`] or [`Tenant::set_token`]. Nothing here
//! refreshes or expires it. A request sent without a token goes out without
//! an `Authorization` header and the directory's 401 comes back as
//! [`DirectoryError::Api`].

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::auth::{self, AccessToken, Credentials, TokenEndpoint};
use crate::error::{DirectoryError, Result};

/// Default Azure AD login host.
pub const LOGIN_URL: &str = "https://login.microsoftonline.com";

/// Default Azure AD Graph (legacy) host.
pub const LEGACY_GRAPH_URL: &str = "https://graph.windows.net";

/// Default Microsoft Graph base, pinned to the `beta` surface.
pub const GRAPH_URL: &str = "https://graph.microsoft.com/beta";

/// Covers TCP + TLS handshake only.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

fn build_http_client() -> Client {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .expect("failed to build HTTP client for the directory API")
}

/// Base URLs of the services a tenant talks to.
///
/// Stored as `String`s so tests can point every service at a wiremock
/// server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Token host, e.g. `https://login.microsoftonline.com`.
    pub login: String,
    /// Azure AD Graph host, e.g. `https://graph.windows.net`.
    pub legacy: String,
    /// Microsoft Graph base including the version segment.
    pub modern: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            login: LOGIN_URL.to_string(),
            legacy: LEGACY_GRAPH_URL.to_string(),
            modern: GRAPH_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Routes all three services to one base URL (a mock server).
    pub fn single(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Endpoints {
            login: base.to_string(),
            legacy: base.to_string(),
            modern: base.to_string(),
        }
    }
}

/// `api-version` values accepted by the legacy Azure AD Graph API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    /// `api-version=1.6`, the stable surface used for users and groups.
    V1_6,
    /// `api-version=beta`, needed for the B2C reports.
    Beta,
}

impl ApiVersion {
    /// Query-string value for this version.
    pub fn as_str(self) -> &'static str {
        match self {
            ApiVersion::V1_6 => "1.6",
            ApiVersion::Beta => "beta",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an endpoint path is turned into a full request URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Address {
    /// Azure AD Graph, tenant-scoped and versioned.
    Legacy(ApiVersion),
    /// Microsoft Graph `beta`.
    Modern,
    /// The endpoint is an absolute URL (an `@odata.nextLink`).
    NextLink,
}

/// An authenticated session against one B2C tenant.
pub struct Tenant {
    http: Client,
    credentials: Credentials,
    endpoints: Endpoints,
    token: Option<AccessToken>,
}

impl Tenant {
    /// Creates an unauthenticated session against the public Azure endpoints.
    pub fn new(credentials: Credentials) -> Self {
        Self::with_endpoints(credentials, Endpoints::default())
    }

    /// Creates an unauthenticated session against custom base URLs.
    pub fn with_endpoints(credentials: Credentials, endpoints: Endpoints) -> Self {
        Tenant {
            http: build_http_client(),
            credentials,
            endpoints,
            token: None,
        }
    }

    /// Creates a session with a pre-set token, bypassing Azure AD.
    /// Used by tests to skip token acquisition.
    pub fn with_token(tenant_domain: &str, endpoints: Endpoints, token: &str) -> Self {
        let mut tenant = Self::with_endpoints(Credentials::new("", "", tenant_domain), endpoints);
        tenant.set_token(AccessToken::new(token, "Bearer"));
        tenant
    }

    /// Tenant domain the session is scoped to.
    pub fn tenant_domain(&self) -> &str {
        &self.credentials.tenant_domain
    }

    /// Base URLs in use.
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Current token, if any call has authenticated yet.
    pub fn token(&self) -> Option<&AccessToken> {
        self.token.as_ref()
    }

    /// Replaces the current token wholesale.
    pub fn set_token(&mut self, token: AccessToken) {
        self.token = Some(token);
    }

    /// Acquires a token for the Azure AD Graph API (v1 endpoint) and stores it.
    ///
    /// On failure the previous token, if any, is left in place.
    pub async fn authenticate_legacy(&mut self) -> Result<()> {
        self.authenticate(TokenEndpoint::Legacy).await
    }

    /// Acquires a token for Microsoft Graph (v2.0 endpoint) and stores it.
    ///
    /// On failure the previous token, if any, is left in place.
    pub async fn authenticate_graph(&mut self) -> Result<()> {
        self.authenticate(TokenEndpoint::Graph).await
    }

    async fn authenticate(&mut self, endpoint: TokenEndpoint) -> Result<()> {
        let token =
            auth::request_token(&self.http, &self.endpoints.login, &self.credentials, endpoint)
                .await?;
        debug!(tenant = %self.credentials.tenant_domain, ?endpoint, "access token acquired");
        self.token = Some(token);
        Ok(())
    }

    /// Resolves `endpoint` to a full URL under `address`. GET parameters are
    /// joined onto the query string.
    pub fn resolve_url(
        &self,
        address: Address,
        endpoint: &str,
        method: &Method,
        params: &str,
    ) -> String {
        let url = match address {
            Address::Legacy(version) => format!(
                "{}/{}{}?api-version={}",
                self.endpoints.legacy.trim_end_matches('/'),
                self.credentials.tenant_domain,
                endpoint,
                version
            ),
            Address::Modern => {
                format!("{}{}", self.endpoints.modern.trim_end_matches('/'), endpoint)
            }
            Address::NextLink => endpoint.to_string(),
        };

        if *method == Method::GET && !params.is_empty() {
            let sep = if url.contains('?') { '&' } else { '?' };
            format!("{url}{sep}{params}")
        } else {
            url
        }
    }

    /// Sends one authenticated request and returns the raw response body.
    ///
    /// - GET: non-empty `params` become extra query parameters.
    /// - POST: non-empty `params` are the JSON request body.
    /// - [`Address::NextLink`] always issues a GET.
    ///
    /// The body is read whatever the status. Statuses 200–204 are success;
    /// anything else is [`DirectoryError::Api`] carrying the body bytes.
    pub async fn call(
        &self,
        address: Address,
        endpoint: &str,
        method: Method,
        params: &str,
    ) -> Result<Bytes> {
        let method = if address == Address::NextLink { Method::GET } else { method };
        let url = self.resolve_url(address, endpoint, &method, params);

        debug!(%method, %url, "calling directory API");

        let mut request = self.http.request(method.clone(), &url);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, token.authorization());
        }
        if method == Method::POST && !params.is_empty() {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(params.to_string());
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !is_success(status) {
            warn!(%method, %url, %status, "directory API call failed");
            return Err(DirectoryError::Api { status, body });
        }

        Ok(body)
    }

    /// GET `endpoint` and decode the JSON response.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        address: Address,
        endpoint: &str,
        params: &str,
    ) -> Result<T> {
        let body = self.call(address, endpoint, Method::GET, params).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// POST `payload` as JSON to `endpoint` and return the raw response body.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        address: Address,
        endpoint: &str,
        payload: &B,
    ) -> Result<Bytes> {
        let params = serde_json::to_string(payload)?;
        self.call(address, endpoint, Method::POST, &params).await
    }

    /// DELETE `endpoint`, discarding the (normally empty) response body.
    pub async fn delete(&self, address: Address, endpoint: &str) -> Result<()> {
        self.call(address, endpoint, Method::DELETE, "").await?;
        Ok(())
    }
}

impl fmt::Debug for Tenant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tenant")
            .field("credentials", &self.credentials)
            .field("endpoints", &self.endpoints)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

/// 200–204 in every addressing mode.
fn is_success(status: StatusCode) -> bool {
    (200..=204).contains(&status.as_u16())
}
