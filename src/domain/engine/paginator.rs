use crate::domain::entities::view::Pagination;

/// Number of pages needed for `total` rows; an empty result still has one
/// (empty) page.
pub fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1)).max(1)
}

/// The slice of `rows` shown on the requested page. Pages past the end are
/// empty rather than clamped.
pub fn paginate<T>(rows: &[T], pagination: Pagination) -> &[T] {
    let size = pagination.page_size();
    let start = pagination.page.saturating_mul(size).min(rows.len());
    let end = start.saturating_add(size).min(rows.len());
    &rows[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_pages_and_handles_the_tail() {
        let rows: Vec<u32> = (0..250).collect();
        let first = paginate(&rows, Pagination::new(100));
        assert_eq!(first.len(), 100);
        assert_eq!(first[0], 0);

        let last = paginate(&rows, Pagination::new(100).at_page(2));
        assert_eq!(last, &rows[200..]);

        assert!(paginate(&rows, Pagination::new(100).at_page(7)).is_empty());
        assert_eq!(page_count(rows.len(), 100), 3);
    }

    #[test]
    fn empty_results_have_one_page() {
        let rows: Vec<u32> = Vec::new();
        assert!(paginate(&rows, Pagination::default()).is_empty());
        assert_eq!(page_count(0, 100), 1);
        assert_eq!(page_count(100, 100), 1);
        assert_eq!(page_count(101, 100), 2);
    }

    #[test]
    fn zero_page_size_is_treated_as_one() {
        let rows = [1, 2, 3];
        assert_eq!(paginate(&rows, Pagination::new(0).at_page(1)), &[2]);
    }
}
