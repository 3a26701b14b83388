use axum::{response::IntoResponse, Json};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        Json(self).into_response()
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message),
        }
    }
}

/// Totals reported alongside one page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct PageMeta {
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
    pub total_count: u64,
}

impl PageMeta {
    pub fn new(total_count: u64, page: u64, per_page: u64) -> Self {
        let total_pages = if per_page == 0 {
            0
        } else {
            total_count.div_ceil(per_page)
        };
        Self {
            page,
            per_page,
            total_pages,
            total_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_basic() {
        let meta = PageMeta::new(100, 1, 20);
        assert_eq!(meta.total_pages, 5);
    }

    #[test]
    fn total_pages_with_remainder() {
        let meta = PageMeta::new(120, 1, 50);
        assert_eq!(meta.total_pages, 3);
    }

    #[test]
    fn total_pages_exact_division() {
        let meta = PageMeta::new(150, 1, 50);
        assert_eq!(meta.total_pages, 3);
    }

    #[test]
    fn total_pages_zero_per_page() {
        let meta = PageMeta::new(10, 1, 0);
        assert_eq!(meta.total_pages, 0);
    }

    #[test]
    fn total_pages_zero_total() {
        let meta = PageMeta::new(0, 1, 50);
        assert_eq!(meta.total_pages, 0);
    }

    #[test]
    fn out_of_range_page_keeps_totals() {
        let meta = PageMeta::new(120, 4, 50);
        assert_eq!(meta.page, 4);
        assert_eq!(meta.total_pages, 3);
        assert_eq!(meta.total_count, 120);
    }
}
