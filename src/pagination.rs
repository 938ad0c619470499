//! Aggregation of paged OData list responses.
//!
//! List endpoints answer with `{ "value": [...], "@odata.nextLink": "..." }`.
//! [`collect_all`] requests the first page, then follows continuation links
//! with [`Address::NextLink`] until a page arrives without one, merging the
//! items in page order.
//!
//! Every page is decoded into a fresh [`ODataPage`], so a page lacking a
//! link can never inherit the link of the page before it.

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::client::{Address, Tenant};
use crate::error::{DirectoryError, Result};

/// One page of an OData collection.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ODataPage<T> {
    /// Items on this page.
    #[serde(default)]
    pub value: Vec<T>,

    /// Absolute URL of the next page, absent on the last page.
    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,
}

impl<T> ODataPage<T> {
    /// The continuation link, treating an empty string as absent.
    pub fn continuation(&self) -> Option<&str> {
        self.next_link.as_deref().filter(|link| !link.is_empty())
    }
}

/// Fetches every page of `endpoint` and returns the items `keep` accepts.
///
/// No cap on the number of pages: an upstream that keeps returning a
/// continuation link keeps this loop going. Use
/// [`collect_all_with_limit`] to bound it.
pub async fn collect_all<T, F>(
    tenant: &Tenant,
    address: Address,
    endpoint: &str,
    keep: F,
) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    F: FnMut(&T) -> bool,
{
    collect_all_with_limit(tenant, address, endpoint, None, keep).await
}

/// Like [`collect_all`], but fails with
/// [`DirectoryError::PageLimitExceeded`] instead of fetching more than
/// `max_pages` pages.
///
/// The cap counts pages already fetched and is checked before every
/// request, so `Some(0)` fails without sending anything.
pub async fn collect_all_with_limit<T, F>(
    tenant: &Tenant,
    address: Address,
    endpoint: &str,
    max_pages: Option<usize>,
    mut keep: F,
) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    F: FnMut(&T) -> bool,
{
    let mut items = Vec::new();
    let mut pages = 0usize;
    let mut next = Some((address, endpoint.to_string()));

    while let Some((address, url)) = next {
        if max_pages.is_some_and(|max| pages >= max) {
            return Err(DirectoryError::PageLimitExceeded { pages });
        }
        if pages > 0 {
            debug!(page = pages + 1, link = %url, "following continuation link");
        }

        let body = tenant.call(address, &url, Method::GET, "").await?;
        let page: ODataPage<T> = serde_json::from_slice(&body)?;
        pages += 1;

        next = page
            .continuation()
            .map(|link| (Address::NextLink, link.to_owned()));
        items.extend(page.value.into_iter().filter(|item| keep(item)));
    }

    debug!(pages, items = items.len(), "pagination complete");
    Ok(items)
}
