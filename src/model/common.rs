use serde::Serialize;
use utoipa::ToSchema;

pub const DEFAULT_PAGE_SIZE: u64 = 15;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Normalizes `(page, size)` query values: pages start at 1, size is clamped
/// to `1..=MAX_PAGE_SIZE`.
pub fn page_params(page: Option<u64>, size: Option<u64>) -> (u64, u64) {
    let page = page.unwrap_or(1).max(1);
    let size = size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (page, size)
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResponse<T> {
    pub content: Vec<T>,
    pub page: u64,
    pub size: u64,
    pub total_elements: u64,
    pub total_pages: u64,
    pub is_first: bool,
    pub is_last: bool,
}

impl<T> PaginationResponse<T> {
    pub fn new(content: Vec<T>, page: u64, size: u64, total_elements: u64) -> Self {
        let total_pages = total_elements.div_ceil(size.max(1));
        let is_first = page == 1;
        let is_last = page >= total_pages;

        Self {
            content,
            page,
            size,
            total_elements,
            total_pages,
            is_first,
            is_last,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginationResponse<U> {
        PaginationResponse {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            is_first: self.is_first,
            is_last: self.is_last,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_params_are_clamped() {
        assert_eq!(page_params(None, None), (1, DEFAULT_PAGE_SIZE));
        assert_eq!(page_params(Some(0), Some(0)), (1, 1));
        assert_eq!(page_params(Some(3), Some(500)), (3, MAX_PAGE_SIZE));
    }

    #[test]
    fn totals_round_up() {
        let page = PaginationResponse::new(vec![1, 2], 2, 15, 31);
        assert_eq!(page.total_pages, 3);
        assert!(!page.is_first);
        assert!(!page.is_last);

        let empty = PaginationResponse::<i32>::new(Vec::new(), 1, 15, 0);
        assert!(empty.is_first && empty.is_last);
    }
}
