mod catalog;
mod conversion;
mod rate;
pub use catalog::*;
pub use conversion::*;
pub use rate::*;

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::rate_service::RateService;
use crate::storage::{CatalogStorage, ConversionStorage, RateStorage};

/// Shared state for request handlers.
#[derive(Clone)]
pub struct AppState {
    pub rates: RateStorage,
    pub conversion: ConversionStorage,
    pub catalog: CatalogStorage,
    pub rate_service: Arc<RateService>,
    pub auth: AuthConfig,
    pub upload_dir: PathBuf,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    /// Clamped 1-based page and page size.
    pub fn resolve(&self) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(10).clamp(1, 100);
        (page, limit)
    }
}

/// Pagination envelope returned by all list endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, page: i64, limit: i64) -> Self {
        Self {
            items,
            total,
            page,
            limit,
            total_pages: total_pages(total, limit),
        }
    }
}

/// `ceil(total / limit)`; zero rows means zero pages.
pub fn total_pages(total: i64, limit: i64) -> i64 {
    if limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(21, 5), 5);
    }

    #[test]
    fn page_query_clamps() {
        let q = PageQuery {
            page: Some(0),
            limit: Some(1000),
        };
        assert_eq!(q.resolve(), (1, 100));
        let q = PageQuery {
            page: None,
            limit: None,
        };
        assert_eq!(q.resolve(), (1, 10));
    }
}
