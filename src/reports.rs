//! Azure AD B2C usage reports.
//!
//! The authentication-count report only exists on the legacy API's `beta`
//! surface and covers a rolling 30-day window fixed by the service.

use serde::Deserialize;

use crate::client::{Address, ApiVersion, Tenant};
use crate::error::{DirectoryError, Result};

const AUTH_COUNT_ENDPOINT: &str = "/reports/b2cAuthenticationCount/";

/// One row of the `b2cAuthenticationCount` report.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthenticationCount {
    /// Authentications in the last 30 days.
    #[serde(rename = "AuthenticationCount")]
    pub count: f64,
}

#[derive(Debug, Deserialize)]
struct AuthenticationCountReport {
    #[serde(default)]
    value: Vec<AuthenticationCount>,
}

/// Returns the number of B2C authentications in the last 30 days.
///
/// # Errors
///
/// - `DirectoryError::EmptyReport` — the report came back without rows.
/// - `DirectoryError::Api` / `Decode` / `Transport` from the request.
pub async fn get_b2c_authentication_count(tenant: &Tenant) -> Result<f64> {
    let report: AuthenticationCountReport = tenant
        .get_json(Address::Legacy(ApiVersion::Beta), AUTH_COUNT_ENDPOINT, "")
        .await?;
    report
        .value
        .first()
        .map(|row| row.count)
        .ok_or_else(|| DirectoryError::EmptyReport("b2cAuthenticationCount".to_string()))
}
