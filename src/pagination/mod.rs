use serde::Serialize;

/// Default page size for pagination
pub const PAGE_SIZE: i64 = 20;

/// Largest page a caller may request
pub const MAX_PAGE_SIZE: i64 = 100;

/// Highest page number whose offset still fits in an i64
pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_SIZE;

/// Offset-based paginated response wrapper
#[derive(Debug, Serialize)]
pub struct OffsetPaginatedResponse<T> {
    pub items: Vec<T>,
    pub total_count: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl<T> OffsetPaginatedResponse<T> {
    pub fn new(items: Vec<T>, total_count: i64, page: i64, per_page: i64) -> Self {
        let total_pages = (total_count + per_page - 1) / per_page; // Ceiling division
        Self {
            items,
            total_count,
            page,
            per_page,
            total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> OffsetPaginatedResponse<U> {
        OffsetPaginatedResponse {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
        }
    }
}

/// Page selection shared by list endpoints (1-indexed)
#[derive(Debug, Clone, Copy)]
pub struct PageParams {
    pub page: i64,
    pub per_page: i64,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: PAGE_SIZE,
        }
    }
}

impl PageParams {
    /// Clamps out-of-range values instead of rejecting them
    pub fn clamped(self) -> Self {
        Self {
            page: self.page.clamp(1, MAX_PAGE),
            per_page: self.per_page.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }
}
