use serde::{Deserialize, Serialize};

/// One page of a paginated listing. Pages are 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: usize, page: usize, per_page: usize) -> Self {
        let total_pages = if per_page == 0 { 0 } else { total.div_ceil(per_page) };
        Self {
            items,
            total,
            page,
            per_page,
            total_pages,
        }
    }

    pub fn empty(per_page: usize) -> Self {
        Self::new(Vec::new(), 0, 1, per_page)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// SQL `OFFSET` for a 1-based page number. Page 0 is treated as page 1.
pub fn page_offset(page: usize, per_page: usize) -> usize {
    page.saturating_sub(1) * per_page
}
