use serde::{Deserialize, Serialize};

/// Items per page for every paginated listing.
pub const PAGINATOR_ITEMS_PER_PAGE: i64 = 10;

/// A 1-based page window over an ordered query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    pub fn first(per_page: i64) -> Self {
        Self::new(1, per_page)
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first(PAGINATOR_ITEMS_PER_PAGE)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_items: i64) -> Self {
        let total_pages = if total_items <= 0 {
            0
        } else {
            (total_items + request.per_page - 1) / request.per_page
        };
        Self {
            items,
            page: request.page,
            per_page: request.per_page,
            total_items,
            total_pages,
        }
    }

    /// Cuts one page out of an already ordered, complete result set.
    pub fn slice(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as i64;
        let items = all
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.limit() as usize)
            .collect();
        Self::new(items, request, total)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<i64>,
}

impl PageQuery {
    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.page.unwrap_or(1), PAGINATOR_ITEMS_PER_PAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_page_number_to_one() {
        let req = PageRequest::new(0, 10);
        assert_eq!(req.page, 1);
        assert_eq!(req.offset(), 0);
        assert_eq!(PageRequest::new(-4, 10).page, 1);
    }

    #[test]
    fn offset_follows_page_number() {
        assert_eq!(PageRequest::new(3, 10).offset(), 20);
    }

    #[test]
    fn slice_returns_bounded_page_with_totals() {
        let all: Vec<i32> = (1..=23).collect();
        let page = Page::slice(all, PageRequest::new(3, 10));
        assert_eq!(page.items, vec![21, 22, 23]);
        assert_eq!(page.total_items, 23);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let page = Page::slice(vec![1, 2], PageRequest::new(5, 10));
        assert!(page.items.is_empty());
        assert_eq!(page.total_items, 2);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn empty_listing_has_no_pages() {
        let page: Page<i32> = Page::slice(Vec::new(), PageRequest::default());
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn query_defaults_to_first_page() {
        let q = PageQuery::default();
        assert_eq!(q.request(), PageRequest::new(1, PAGINATOR_ITEMS_PER_PAGE));
    }
}
