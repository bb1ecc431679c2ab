//! 分页查询类型
//!
//! List endpoints accept [`PageQuery`] and answer with [`PaginatedResponse`].

use serde::{Deserialize, Serialize};

/// Upper bound for `limit` on any list endpoint
pub const MAX_PAGE_LIMIT: u32 = 200;

/// 列表查询参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageQuery {
    /// 页码 (从 1 开始)
    #[serde(default = "default_page")]
    pub page: u32,
    /// 每页数量
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Case-insensitive substring filter on the display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    20
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
            search: None,
        }
    }
}

impl PageQuery {
    /// Page clamped to `>= 1`
    pub fn page(&self) -> u32 {
        self.page.max(1)
    }

    /// Limit clamped to `1..=MAX_PAGE_LIMIT`
    pub fn limit(&self) -> u32 {
        self.limit.clamp(1, MAX_PAGE_LIMIT)
    }

    /// Row offset for SQL `OFFSET`
    pub fn offset(&self) -> i64 {
        i64::from(self.page() - 1) * i64::from(self.limit())
    }

    /// Search term, trimmed, `None` when blank
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// 分页响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    /// 数据列表
    pub data: Vec<T>,
    /// 总记录数
    pub total: u64,
    /// 当前页码
    pub page: u32,
    /// 每页数量
    pub limit: u32,
    /// 总页数
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: u64, page: u32, limit: u32) -> Self {
        let total_pages = if limit > 0 {
            total.div_ceil(u64::from(limit)) as u32
        } else {
            1
        };

        Self {
            data,
            total,
            page,
            limit,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_query_clamps() {
        let q = PageQuery {
            page: 0,
            limit: 10_000,
            search: Some("   ".into()),
        };
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(), MAX_PAGE_LIMIT);
        assert_eq!(q.offset(), 0);
        assert_eq!(q.search_term(), None);
    }

    #[test]
    fn test_page_query_offset() {
        let q = PageQuery {
            page: 3,
            limit: 25,
            search: Some(" ann ".into()),
        };
        assert_eq!(q.offset(), 50);
        assert_eq!(q.search_term(), Some("ann"));
    }

    #[test]
    fn test_paginated_response() {
        let items = vec!["a", "b", "c"];
        let resp = PaginatedResponse::new(items, 101, 2, 10);

        assert_eq!(resp.total, 101);
        assert_eq!(resp.page, 2);
        assert_eq!(resp.total_pages, 11);
    }
}
