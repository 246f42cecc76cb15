//! Page-number pagination shared by every list endpoint.
//!
//! Query parameters:
//! - `pageSize`: items per page (1-100, default: 10)
//! - `pageNumber`: page number (1-indexed, default: 1)
//!
//! Responses carry the page plus how many matching rows come after it:
//!
//! ```json
//! { "data": [...], "remaining": 42 }
//! ```
//!
//! # Example
//!
//! ```ignore
//! let take = params.take();
//! let skip = params.skip();
//! let (rows, total) = fetch(take, skip).await?;
//! Ok(Json(Paginated::new(rows, total, &params)))
//! ```

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::serde::deserialize_optional_i64;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct PaginationParams {
    /// Items per page (default: 10, max: 100)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: Option<i64>,
    /// 1-indexed page number (default: 1)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    #[param(minimum = 1)]
    pub page_number: Option<i64>,
}

impl PaginationParams {
    pub fn take(&self) -> i64 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn page_number(&self) -> i64 {
        self.page_number.unwrap_or(1).max(1)
    }

    /// Saturates instead of overflowing on huge page numbers.
    pub fn skip(&self) -> i64 {
        (self.page_number() - 1).saturating_mul(self.take())
    }

    /// Rows matching the filter that lie past the current page.
    pub fn remaining(&self, total: i64) -> i64 {
        total
            .saturating_sub(self.take().saturating_add(self.skip()))
            .max(0)
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub remaining: i64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, params: &PaginationParams) -> Self {
        Self {
            data,
            remaining: params.remaining(total),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            remaining: self.remaining,
        }
    }
}
