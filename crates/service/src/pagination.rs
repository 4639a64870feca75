//! Pagination utilities for service layer
//!
//! Provides a simple `Pagination` struct and helpers to normalize inputs.

pub const MAX_PER_PAGE: usize = 100;

/// Pagination parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page index
    pub page: usize,
    /// items per page
    pub per_page: usize,
}

impl Pagination {
    /// Clamp to sane defaults; returns `(page_idx, per_page)` with a 0-based page index
    pub fn normalize(self) -> (usize, usize) {
        let page = if self.page == 0 { 1 } else { self.page };
        let per_page = self.per_page.clamp(1, MAX_PER_PAGE);
        (page - 1, per_page)
    }

    /// Slice one page out of `records`; pages past the end are empty.
    pub fn apply<T>(self, records: Vec<T>) -> Vec<T> {
        let (page_idx, per_page) = self.normalize();
        let offset = page_idx.saturating_mul(per_page);
        records.into_iter().skip(offset).take(per_page).collect()
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: 1, per_page: 20 } }
}

#[cfg(test)]
mod tests {
    use super::Pagination;

    #[test]
    fn normalize_clamps_zero_to_defaults() {
        let (idx, per) = Pagination { page: 0, per_page: 0 }.normalize();
        assert_eq!(idx, 0);
        assert_eq!(per, 1);
    }

    #[test]
    fn normalize_clamps_upper_bound() {
        let (idx, per) = Pagination { page: 5, per_page: 1000 }.normalize();
        assert_eq!(idx, 4);
        assert_eq!(per, 100);
    }

    #[test]
    fn default_values_are_sane() {
        let d = Pagination::default();
        assert_eq!(d.page, 1);
        assert_eq!(d.per_page, 20);
    }

    #[test]
    fn apply_slices_pages() {
        let data: Vec<u32> = (1..=7).collect();
        assert_eq!(Pagination { page: 2, per_page: 3 }.apply(data.clone()), vec![4, 5, 6]);
        assert_eq!(Pagination { page: 3, per_page: 3 }.apply(data.clone()), vec![7]);
        assert!(Pagination { page: 9, per_page: 3 }.apply(data).is_empty());
    }
}
