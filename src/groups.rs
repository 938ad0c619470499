//! Group lookup and membership management.
//!
//! Membership edits resolve an email address to directory users first
//! (server-side `otherMails` filter on the legacy API) and then add or
//! remove every matching user, one request per user. The first failed
//! request ends the call with that error. Edits made before it stay in
//! place; nothing is rolled back.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::client::{Address, ApiVersion, Tenant};
use crate::error::{DirectoryError, Result};
use crate::pagination::{self, ODataPage};
use crate::users::{require, User};

const LEGACY: Address = Address::Legacy(ApiVersion::V1_6);

/// A directory group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Azure AD Graph object ID.
    #[serde(default)]
    pub object_id: String,

    /// Display name.
    #[serde(default)]
    pub display_name: String,
}

/// Body of a `$links/members` POST: the canonical URL of the member object.
#[derive(Debug, Serialize)]
struct MemberLink {
    url: String,
}

/// Direction of a membership edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipOp {
    /// Link the user into the group.
    Add,
    /// Unlink the user from the group.
    Remove,
}

/// Users changed by a successful add/remove-member call.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipReport {
    /// Group that was edited.
    pub group: String,
    /// Whether users were added or removed.
    pub op: MembershipOp,
    /// Object IDs of every user matching the email address, in directory
    /// order.
    pub changed: Vec<String>,
}

/// Fetches a single group by object ID.
pub async fn get_group(tenant: &Tenant, id: &str) -> Result<Group> {
    require(id, "group id")?;
    tenant.get_json(LEGACY, &format!("/groups/{id}"), "").await
}

/// Lists the groups on the first page of the legacy `/groups/` collection.
pub async fn get_groups(tenant: &Tenant) -> Result<Vec<Group>> {
    let page: ODataPage<Group> = tenant.get_json(LEGACY, "/groups/", "").await?;
    Ok(page.value)
}

/// Returns all direct members of a group, following continuation links.
pub async fn get_group_members(tenant: &Tenant, group_id: &str) -> Result<Vec<User>> {
    require(group_id, "group id")?;
    let endpoint = format!("/groups/{group_id}/members");
    pagination::collect_all(tenant, Address::Modern, &endpoint, |_: &User| true).await
}

/// Adds every user whose `otherMails` contains `email` to `group`.
///
/// # Errors
///
/// - `DirectoryError::Validation` — empty `group` or `email`; nothing is sent.
/// - `DirectoryError::NotFound` — no user has that email address.
/// - Lookup failures (`Api`, `Transport`, `Decode`) from resolving the email.
/// - The first failed link request. Users linked before it stay linked.
pub async fn add_group_member(
    tenant: &Tenant,
    group: &str,
    email: &str,
) -> Result<MembershipReport> {
    edit_membership(tenant, group, email, MembershipOp::Add).await
}

/// Removes every user whose `otherMails` contains `email` from `group`.
///
/// Same error contract as [`add_group_member`].
pub async fn delete_group_member(
    tenant: &Tenant,
    group: &str,
    email: &str,
) -> Result<MembershipReport> {
    edit_membership(tenant, group, email, MembershipOp::Remove).await
}

async fn edit_membership(
    tenant: &Tenant,
    group: &str,
    email: &str,
    op: MembershipOp,
) -> Result<MembershipReport> {
    require(group, "AAD group")?;
    require(email, "user email")?;

    let users = find_users_by_email(tenant, email).await?;
    if users.is_empty() {
        return Err(DirectoryError::NotFound(format!("no user with email {email} exists")));
    }

    let mut changed = Vec::with_capacity(users.len());
    for user in users {
        let result = match op {
            MembershipOp::Add => link_member(tenant, group, &user.object_id).await,
            MembershipOp::Remove => unlink_member(tenant, group, &user.object_id).await,
        };
        if let Err(err) = result {
            warn!(
                user = %user.object_id,
                %group,
                ?op,
                already_changed = changed.len(),
                error = %err,
                "group membership update failed"
            );
            return Err(err);
        }
        info!(user = %user.object_id, %group, ?op, "group membership updated");
        changed.push(user.object_id);
    }

    Ok(MembershipReport {
        group: group.to_string(),
        op,
        changed,
    })
}

async fn link_member(tenant: &Tenant, group: &str, object_id: &str) -> Result<()> {
    let link = MemberLink {
        url: format!(
            "{}/{}/directoryObjects/{object_id}",
            tenant.endpoints().legacy.trim_end_matches('/'),
            tenant.tenant_domain()
        ),
    };
    tenant
        .post_json(LEGACY, &format!("/groups/{group}/$links/members"), &link)
        .await?;
    Ok(())
}

async fn unlink_member(tenant: &Tenant, group: &str, object_id: &str) -> Result<()> {
    tenant
        .delete(LEGACY, &format!("/groups/{group}/$links/members/{object_id}"))
        .await
}

/// `$filter` expression matching users that list `email` in `otherMails`,
/// form-encoded for the query string.
///
/// Single quotes are doubled, as OData requires inside a string literal,
/// so the address can never close the literal early.
pub fn email_filter(email: &str) -> String {
    let literal = email.replace('\'', "''");
    let expr = format!("otherMails/any(x:x eq '{literal}')");
    let encoded: String = url::form_urlencoded::byte_serialize(expr.as_bytes()).collect();
    format!("$filter={encoded}")
}

async fn find_users_by_email(tenant: &Tenant, email: &str) -> Result<Vec<User>> {
    let page: ODataPage<User> = tenant
        .get_json(LEGACY, "/users", &email_filter(email))
        .await?;
    Ok(page.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_deserializes_from_legacy_shape() {
        let json = r#"{
            "odata.type": "Microsoft.DirectoryServices.Group",
            "objectType": "Group",
            "objectId": "g-123",
            "displayName": "Admins",
            "securityEnabled": true
        }"#;
        let group: Group = serde_json::from_str(json).unwrap();
        assert_eq!(group.object_id, "g-123");
        assert_eq!(group.display_name, "Admins");
    }

    #[test]
    fn group_wire_shape_round_trips() {
        let group = Group {
            object_id: "g-1".to_string(),
            display_name: "Readers".to_string(),
        };
        let json = serde_json::to_string(&group).unwrap();
        assert_eq!(json, r#"{"objectId":"g-1","displayName":"Readers"}"#);
        assert_eq!(serde_json::from_str::<Group>(&json).unwrap(), group);
    }

    #[test]
    fn email_filter_is_form_encoded() {
        assert_eq!(
            email_filter("alice@x.com"),
            "$filter=otherMails%2Fany%28x%3Ax+eq+%27alice%40x.com%27%29"
        );
    }

    #[test]
    fn email_filter_doubles_single_quotes() {
        assert_eq!(
            email_filter("o'brien@x.com"),
            "$filter=otherMails%2Fany%28x%3Ax+eq+%27o%27%27brien%40x.com%27%29"
        );
    }

    #[test]
    fn crafted_email_stays_inside_the_literal() {
        let filter = email_filter("a') or accountEnabled eq true or otherMails/any(y:y eq 'b");
        let decoded: Vec<(String, String)> = url::form_urlencoded::parse(filter.as_bytes())
            .into_owned()
            .collect();
        assert_eq!(
            decoded,
            vec![(
                "$filter".to_string(),
                "otherMails/any(x:x eq 'a'') or accountEnabled eq true or otherMails/any(y:y eq ''b')"
                    .to_string()
            )]
        );
    }
}
