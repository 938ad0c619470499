//! Typed error hierarchy for the b2c-graph crate.
//!
//! `DirectoryError` covers every failure boundary the library crosses:
//! - `Auth` for the Azure AD token endpoints.
//! - `Api` for the directory APIs (legacy and modern). The raw response
//!   body is kept so callers can read the `odata.error` payload.
//! - `Transport` for failures that never produced an HTTP status.
//! - `Decode` for response bodies that don't match the expected shape.
//! - `NotFound` and `Validation` for conditions detected locally, before
//!   a mutating call is issued.

use bytes::Bytes;
use reqwest::StatusCode;

/// Unified error type for all b2c-graph library operations.
///
/// Inner errors are marked `#[source]` (or `#[from]`) so that
/// `Error::source()` walks the full cause chain.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// Token acquisition failed.
    ///
    /// Covers non-200 responses from the `/oauth2/token` endpoints (the
    /// message then carries the status and Azure AD's AADSTS body),
    /// transport failures reaching the endpoint, and token JSON that could
    /// not be parsed.
    #[error("authentication failed: {message}")]
    Auth {
        /// What went wrong, including status and body when available.
        message: String,
        /// The underlying transport or parse error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A directory API returned a status outside 200–204.
    #[error("API error {status}: {}", String::from_utf8_lossy(.body))]
    Api {
        /// Status code returned by the directory API.
        status: StatusCode,
        /// Raw response body, exactly as received.
        body: Bytes,
    },

    /// A response body could not be decoded into the expected type.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A lookup used as a precondition for a mutation matched nothing.
    #[error("not found: {0}")]
    NotFound(String),

    /// A required argument was missing. No request was sent.
    #[error("invalid argument: {0}")]
    Validation(String),

    /// A report endpoint answered with an empty `value` list.
    #[error("report {0} returned no rows")]
    EmptyReport(String),

    /// Pagination stopped because the configured page cap was reached
    /// while a continuation link was still present.
    #[error("pagination aborted after {pages} pages: continuation link still present")]
    PageLimitExceeded {
        /// Number of pages fetched before giving up.
        pages: usize,
    },

    /// DNS, TCP, TLS or body-read failure. No status is available.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl DirectoryError {
    /// Returns the upstream status for `Api` errors.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            DirectoryError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// `true` for local `NotFound` errors and for upstream 404 responses.
    pub fn is_not_found(&self) -> bool {
        match self {
            DirectoryError::NotFound(_) => true,
            DirectoryError::Api { status, .. } => *status == StatusCode::NOT_FOUND,
            _ => false,
        }
    }
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, DirectoryError>;
