//! Async Rust client library for Azure AD B2C directories.
//!
//! Talks to both directory APIs a B2C tenant exposes: the legacy Azure AD
//! Graph API (`graph.windows.net`) and Microsoft Graph
//! (`graph.microsoft.com/beta`). Provides OAuth2 client-credentials
//! authentication, one authenticated request executor for both APIs,
//! `@odata.nextLink` pagination, and user/group/report operations.
//!
//! # Modules
//!
//! - [`auth`] — Client-credentials token acquisition (v1 and v2.0 endpoints).
//! - [`client`] — `Tenant` session and the authenticated request executor.
//! - [`error`] — Typed error hierarchy (`DirectoryError`).
//! - [`pagination`] — Continuation-link aggregation for list endpoints.
//! - [`users`] — User lookup, search, creation and membership queries.
//! - [`groups`] — Group lookup and membership edits.
//! - [`reports`] — B2C authentication-count report.
//!
//! # Quick Start
//!
//! ```ignore
//! use b2c_graph::auth::Credentials;
//! use b2c_graph::client::Tenant;
//! use b2c_graph::users::search_user;
//!
//! let creds = Credentials::new("client_id", "secret", "contoso.onmicrosoft.com");
//! let mut tenant = Tenant::new(creds);
//! tenant.authenticate_graph().await?;
//! let users = search_user(&tenant, "@contoso.com").await?;
//! ```

#![warn(missing_docs)]

pub mod auth;
pub mod client;
pub mod error;
pub mod groups;
pub mod pagination;
pub mod reports;
pub mod users;
