//! Pagination helpers
//!
//! Query convention: `?page=1&limit=20`. Responses carry a
//! `pagination: {page, limit, total, pages}` block.

use serde::{Deserialize, Serialize};

const MAX_LIMIT: i64 = 100;

/// Query params for paginated listings
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PageQuery {
    /// Clamp to sane bounds (page >= 1, 1 <= limit <= 100)
    pub fn clamped(self) -> Self {
        Self {
            page: self.page.max(1),
            limit: self.limit.clamp(1, MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// Pagination block included in list responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl PageInfo {
    pub fn new(query: &PageQuery, total: i64) -> Self {
        Self {
            page: query.page,
            limit: query.limit,
            total,
            pages: (total + query.limit - 1) / query.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_info_rounds_up() {
        let query = PageQuery { page: 1, limit: 20 };
        assert_eq!(PageInfo::new(&query, 41).pages, 3);
        assert_eq!(PageInfo::new(&query, 40).pages, 2);
        assert_eq!(PageInfo::new(&query, 0).pages, 0);
    }

    #[test]
    fn test_clamped_bounds() {
        let query = PageQuery { page: 0, limit: 5000 }.clamped();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 100);
        assert_eq!(query.offset(), 0);
    }
}
