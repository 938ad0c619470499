//! User lookup, search, creation and group membership queries.
//!
//! | Function | API | Path |
//! |----------|-----|------|
//! | [`get_user`] | modern | GET `/users/{id}` |
//! | [`get_users`] | legacy 1.6 | GET `/users/` |
//! | [`search_user`] | modern, paginated | GET `/users` |
//! | [`get_member_group_ids`] | legacy 1.6 | POST `/users/{id}/getMemberGroups` |
//! | [`get_member_groups_detailed`] | legacy 1.6 | as above + GET `/groups/{id}` per group |
//! | [`add_user`] | legacy 1.6 | POST `/users` |
//! | [`delete_user`] | legacy 1.6 | DELETE `/users/{id}` |
//!
//! [`get_users`] reads the first page only. The legacy API's continuation
//! link (`odata.nextLink`) is relative and keyed differently from Microsoft
//! Graph's, so it isn't followed.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::{Address, ApiVersion, Tenant};
use crate::error::{DirectoryError, Result};
use crate::groups;
use crate::pagination::{self, ODataPage};

const LEGACY: Address = Address::Legacy(ApiVersion::V1_6);

/// A directory user.
///
/// The legacy API identifies users by `objectId`, Microsoft Graph by `id`;
/// whichever one the source API omits stays empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Azure AD Graph object ID.
    #[serde(default)]
    pub object_id: String,

    /// Microsoft Graph ID.
    #[serde(default)]
    pub id: String,

    /// Display name.
    #[serde(default)]
    pub display_name: String,

    /// Additional email addresses (`otherMails`). For B2C local accounts
    /// the first entry is the sign-in address.
    #[serde(rename = "otherMails", default)]
    pub email_addresses: Vec<String>,
}

impl User {
    /// First email address, if the user has any.
    pub fn primary_email(&self) -> Option<&str> {
        self.email_addresses.first().map(String::as_str)
    }
}

/// Response of the `getMemberGroups` action.
#[derive(Debug, Deserialize)]
struct MemberGroupIds {
    #[serde(default)]
    value: Vec<String>,
}

/// Body of the `getMemberGroups` action. Transitive membership, all group types.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MemberGroupsRequest {
    security_enabled_only: bool,
}

/// Creation payload for a B2C local account.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser<'a> {
    account_enabled: bool,
    creation_type: &'a str,
    display_name: &'a str,
    password_profile: PasswordProfile<'a>,
    password_policies: &'a str,
    sign_in_names: [SignInName<'a>; 1],
    other_mails: [&'a str; 1],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordProfile<'a> {
    password: &'a str,
    force_change_password_next_login: bool,
}

#[derive(Debug, Serialize)]
struct SignInName<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    value: &'a str,
}

impl<'a> NewUser<'a> {
    /// An enabled local account that signs in with `email`. The password
    /// never expires and need not be changed at first sign-in.
    pub fn local_account(email: &'a str, display_name: &'a str, password: &'a str) -> Self {
        NewUser {
            account_enabled: true,
            creation_type: "LocalAccount",
            display_name,
            password_profile: PasswordProfile {
                password,
                force_change_password_next_login: false,
            },
            password_policies: "DisablePasswordExpiration",
            sign_in_names: [SignInName {
                kind: "emailAddress",
                value: email,
            }],
            other_mails: [email],
        }
    }
}

pub(crate) fn require(value: &str, what: &str) -> Result<()> {
    if value.is_empty() {
        return Err(DirectoryError::Validation(format!("no {what} specified")));
    }
    Ok(())
}

/// Fetches a single user through Microsoft Graph.
///
/// # Errors
///
/// - `DirectoryError::Api` — non-success status; 404 for an unknown id.
/// - `DirectoryError::Decode` — the body is not a user object.
pub async fn get_user(tenant: &Tenant, id: &str) -> Result<User> {
    require(id, "user id")?;
    tenant.get_json(Address::Modern, &format!("/users/{id}"), "").await
}

/// Lists the users on the first page of the legacy `/users/` collection.
pub async fn get_users(tenant: &Tenant) -> Result<Vec<User>> {
    let page: ODataPage<User> = tenant.get_json(LEGACY, "/users/", "").await?;
    Ok(page.value)
}

/// Returns every user whose first email address contains `needle`.
///
/// Walks all pages of Microsoft Graph's `/users`. The match is a
/// case-sensitive substring test; users without email addresses are
/// skipped. Source order is kept.
pub async fn search_user(tenant: &Tenant, needle: &str) -> Result<Vec<User>> {
    pagination::collect_all(tenant, Address::Modern, "/users", |user: &User| {
        user.primary_email().is_some_and(|email| email.contains(needle))
    })
    .await
}

/// Returns the object IDs of every group `user_id` is a member of.
pub async fn get_member_group_ids(tenant: &Tenant, user_id: &str) -> Result<Vec<String>> {
    require(user_id, "user id")?;
    let body = tenant
        .post_json(
            LEGACY,
            &format!("/users/{user_id}/getMemberGroups"),
            &MemberGroupsRequest {
                security_enabled_only: false,
            },
        )
        .await?;
    let ids: MemberGroupIds = serde_json::from_slice(&body)?;
    Ok(ids.value)
}

/// Returns the display names of every group `user_id` is a member of.
///
/// Each group is resolved with its own `get_group` call, one after the
/// other, so cost grows linearly with the membership count. The first
/// failed lookup aborts the whole call.
pub async fn get_member_groups_detailed(tenant: &Tenant, user_id: &str) -> Result<Vec<String>> {
    let ids = get_member_group_ids(tenant, user_id).await?;
    let mut names = Vec::with_capacity(ids.len());
    for id in &ids {
        names.push(groups::get_group(tenant, id).await?.display_name);
    }
    Ok(names)
}

/// Creates a B2C local account and returns it with its assigned identifiers.
pub async fn add_user(
    tenant: &Tenant,
    email: &str,
    display_name: &str,
    password: &str,
) -> Result<User> {
    require(email, "user email")?;
    require(display_name, "display name")?;
    require(password, "password")?;

    let body = tenant
        .post_json(LEGACY, "/users", &NewUser::local_account(email, display_name, password))
        .await?;
    let user: User = serde_json::from_slice(&body)?;
    info!(object_id = %user.object_id, %email, "created user");
    Ok(user)
}

/// Deletes a user by object ID. Deleting a user that no longer exists
/// succeeds.
pub async fn delete_user(tenant: &Tenant, object_id: &str) -> Result<()> {
    require(object_id, "user object id")?;
    match tenant.delete(LEGACY, &format!("/users/{object_id}")).await {
        Ok(()) => {
            info!(%object_id, "deleted user");
            Ok(())
        }
        Err(err) if err.is_not_found() => {
            info!(%object_id, "user already absent");
            Ok(())
        }
        Err(err) => Err(err),
    }
}
