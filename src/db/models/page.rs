// src/db/models/page.rs

//! Pagination for read queries

/// Default number of rows per page
pub const DEFAULT_PAGE_SIZE: u32 = 25;

/// A 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub per_page: u32,
}

impl Page {
    pub fn new(number: u32, per_page: u32) -> Self {
        Self {
            number: number.max(1),
            per_page: per_page.max(1),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.number - 1) * i64::from(self.per_page)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// One page of results plus the total row count
#[derive(Debug, Clone)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: Page,
}

impl<T> Paginated<T> {
    /// Number of pages needed for `total` rows (at least 1)
    pub fn pages(&self) -> i64 {
        let per_page = self.page.limit();
        ((self.total + per_page - 1) / per_page).max(1)
    }

    pub fn has_next(&self) -> bool {
        i64::from(self.page.number) < self.pages()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets() {
        assert_eq!(Page::new(1, 25).offset(), 0);
        assert_eq!(Page::new(3, 25).offset(), 50);
        // Page 0 is treated as page 1
        assert_eq!(Page::new(0, 25).offset(), 0);
    }

    #[test]
    fn test_page_count() {
        let page: Paginated<()> = Paginated {
            items: Vec::new(),
            total: 51,
            page: Page::new(2, 25),
        };
        assert_eq!(page.pages(), 3);
        assert!(page.has_next());

        let empty: Paginated<()> = Paginated {
            items: Vec::new(),
            total: 0,
            page: Page::default(),
        };
        assert_eq!(empty.pages(), 1);
        assert!(!empty.has_next());
    }
}
