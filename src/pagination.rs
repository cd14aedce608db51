//! Page number ↔ (offset, limit) and the page selector row.

use serde::Serialize;

/// Zero-based offset of the first post on 1-indexed `page`. `None` for page 0
/// or when the offset does not fit in a `u64`.
pub fn compute_offset(page: u64, page_size: u64) -> Option<u64> {
    page.checked_sub(1)?.checked_mul(page_size)
}

pub fn page_count(total: u64, page_size: u64) -> u64 {
    if page_size == 0 { 0 } else { total.div_ceil(page_size) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageButton {
    pub number: u64,
    pub active: bool,
}

/// Buttons `1..=ceil(total / page_size)`, the one for `current` marked active.
pub fn page_controls(total: u64, page_size: u64, current: u64) -> Vec<PageButton> {
    (1..=page_count(total, page_size))
        .map(|number| PageButton { number, active: number == current })
        .collect()
}

/// The slice of posts on screen plus the server-reported total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
}

impl PageWindow {
    pub fn new(page: u64, page_size: u64) -> Self { Self { page, page_size, total: 0 } }
    pub fn limit(&self) -> u64 { self.page_size }
    pub fn offset(&self) -> Option<u64> { compute_offset(self.page, self.page_size) }
    pub fn page_count(&self) -> u64 { page_count(self.total, self.page_size) }
    pub fn controls(&self) -> Vec<PageButton> { page_controls(self.total, self.page_size, self.page) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_formula() {
        for size in [1, 5, 10] {
            for page in 1..20 {
                assert_eq!(compute_offset(page, size), Some((page - 1) * size));
            }
        }
    }

    #[test]
    fn huge_page_has_no_offset() {
        assert_eq!(compute_offset(u64::MAX / 2, 5), None);
        assert_eq!(compute_offset(i64::MAX as u64, 5), None);
        assert_eq!(compute_offset(0, 5), None);
        // the last representable page still works
        assert_eq!(compute_offset(u64::MAX, 1), Some(u64::MAX - 1));
    }

    #[test]
    fn twenty_three_posts_five_per_page() {
        let c = page_controls(23, 5, 3);
        assert_eq!(c.len(), 5);
        assert!(c[2].active);
        assert_eq!(c.iter().filter(|b| b.active).count(), 1);
    }

    #[test]
    fn twelve_posts_page_two() {
        let nums: Vec<_> = page_controls(12, 5, 1).iter().map(|b| b.number).collect();
        assert_eq!(nums, vec![1, 2, 3]);
        let w = PageWindow { page: 2, page_size: 5, total: 12 };
        assert_eq!((w.offset(), w.limit()), (Some(5), 5));
        assert_eq!(w.page_count(), 3);
    }

    #[test]
    fn zero_total_no_buttons() {
        assert!(page_controls(0, 5, 1).is_empty());
    }

    #[test]
    fn exact_multiple_has_no_trailing_page() {
        assert_eq!(page_count(10, 5), 2);
        assert_eq!(page_count(11, 5), 3);
    }
}
