//! `pageNo` / `pageSize` / `searchBy` query handling.

use crate::database::ListParams;
use serde::Deserialize;
use utoipa::IntoParams;

pub const DEFAULT_PAGE_NO: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Raw list query.
///
/// Fields are kept as strings so that a malformed number falls back to its
/// default instead of rejecting the whole request.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct PageQuery {
    /// 1-based page number (default 1).
    #[param(value_type = Option<u32>)]
    pub page_no: Option<String>,
    /// Items per page (default 10, max 100).
    #[param(value_type = Option<u32>)]
    pub page_size: Option<String>,
    /// Case-sensitive substring filter.
    pub search_by: Option<String>,
}

/// A validated page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub page_no: u32,
    pub page_size: u32,
    pub search: String,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page_no: DEFAULT_PAGE_NO,
            page_size: DEFAULT_PAGE_SIZE,
            search: String::new(),
        }
    }
}

fn positive_or(value: Option<&str>, default: u32) -> u32 {
    value
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|v| *v >= 1)
        .unwrap_or(default)
}

impl From<PageQuery> for Page {
    fn from(query: PageQuery) -> Self {
        Self {
            page_no: positive_or(query.page_no.as_deref(), DEFAULT_PAGE_NO),
            page_size: positive_or(query.page_size.as_deref(), DEFAULT_PAGE_SIZE)
                .min(MAX_PAGE_SIZE),
            search: query.search_by.unwrap_or_default(),
        }
    }
}

impl Page {
    pub fn new(page_no: u32, page_size: u32) -> Self {
        Self {
            page_no: page_no.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            search: String::new(),
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page_no - 1) * i64::from(self.page_size)
    }

    pub fn to_list_params(&self) -> ListParams {
        ListParams::new(i64::from(self.page_size), self.offset()).with_search(self.search.clone())
    }
}
