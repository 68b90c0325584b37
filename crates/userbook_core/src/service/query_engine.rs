//! Listing/query use-case service.
//!
//! # Responsibility
//! - Normalize raw paging and search inputs.
//! - Build the record filter and run fetch + count as one read.
//! - Compute page metadata.
//!
//! # Invariants
//! - Effective `limit` is always within `[1, 50]`; effective `page >= 1`.
//! - `total` counts every filter match, independent of the page window.
//! - `total_pages == ceil(total / limit)`; `data.len() <= limit`.
//! - A page past the end returns empty `data`, never an error.

use crate::model::user::User;
use crate::repo::user_repo::{UserFilter, UserRepository};
use crate::service::error::{ServiceResult, UserServiceError};
use crate::service::input::{parse_leading_int, ListUsersQuery};
use log::{error, info};
use serde::Serialize;
use std::time::Instant;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u32 = 5;
pub const LIMIT_MAX: u32 = 50;

/// One page of list results with paging metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPage {
    pub page: u64,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
    pub data: Vec<User>,
}

/// Read-only service over a user store.
pub struct QueryEngine<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> QueryEngine<R> {
    /// Creates a query engine over the provided store handle.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists one page of users matching the optional search term.
    ///
    /// # Errors
    /// - `UserServiceError::Internal` for any store fault; no partial page is
    ///   returned.
    pub fn list(&self, query: &ListUsersQuery) -> ServiceResult<UserPage> {
        let started_at = Instant::now();
        let page = normalize_page(query.page.as_deref());
        let limit = normalize_limit(query.limit.as_deref());
        let filter = UserFilter::contains(query.search.as_deref().unwrap_or_default());
        let skip = (page - 1).saturating_mul(u64::from(limit));

        match self.repo.find_page(&filter, skip, limit) {
            Ok((data, total)) => {
                info!(
                    "event=users_list module=query status=ok page={page} limit={limit} searched={} total={total} returned={} duration_ms={}",
                    filter != UserFilter::All,
                    data.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(UserPage {
                    page,
                    limit,
                    total,
                    total_pages: total.div_ceil(u64::from(limit)),
                    data,
                })
            }
            Err(err) => {
                error!(
                    "event=users_list module=query status=error page={page} limit={limit} duration_ms={} error_code=store_fault error={err}",
                    started_at.elapsed().as_millis()
                );
                Err(UserServiceError::Internal(err))
            }
        }
    }
}

/// Normalizes a raw page number; unparsable or zero means the first page.
pub fn normalize_page(raw: Option<&str>) -> u64 {
    match raw.and_then(parse_leading_int) {
        Some(value) if value >= 1 => value.unsigned_abs(),
        _ => DEFAULT_PAGE,
    }
}

/// Normalizes a raw page size; unparsable or zero means the default,
/// everything else is clamped into `[1, LIMIT_MAX]`.
pub fn normalize_limit(raw: Option<&str>) -> u32 {
    match raw.and_then(parse_leading_int) {
        None | Some(0) => DEFAULT_LIMIT,
        Some(value) if value < 1 => 1,
        Some(value) if value > i64::from(LIMIT_MAX) => LIMIT_MAX,
        Some(value) => u32::try_from(value).unwrap_or(LIMIT_MAX),
    }
}
