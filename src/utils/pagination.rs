use serde::Serialize;

pub const DEFAULT_PER_PAGE: usize = 10;
pub const MAX_PER_PAGE: usize = 100;

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
        }
    }
}

/// Slices an already filtered list. Pages are 1-based; pages past the end are empty.
pub fn paginate<T>(items: Vec<T>, page: Option<i64>, per_page: Option<i64>) -> Page<T> {
    let per_page = per_page
        .map(|p| p.clamp(1, MAX_PER_PAGE as i64) as usize)
        .unwrap_or(DEFAULT_PER_PAGE);
    let page = page.map(|p| p.max(1) as usize).unwrap_or(1);

    let total = items.len();
    let total_pages = total.div_ceil(per_page);
    let start = (page - 1).saturating_mul(per_page);

    let items = items.into_iter().skip(start).take(per_page).collect();

    Page {
        items,
        total,
        page,
        per_page,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_is_ceiling_of_rows_over_page_size() {
        for n in 0..=45usize {
            let page = paginate((0..n).collect(), Some(1), Some(10));
            assert_eq!(page.total_pages, n.div_ceil(10), "n = {}", n);
            assert_eq!(page.total, n);
        }
    }

    #[test]
    fn last_page_holds_the_remainder() {
        let rows: Vec<usize> = (0..23).collect();
        let last = paginate(rows, Some(3), None);
        assert_eq!(last.total_pages, 3);
        assert_eq!(last.items, vec![20, 21, 22]);
    }

    #[test]
    fn full_last_page_is_not_short() {
        let last = paginate((0..30).collect::<Vec<_>>(), Some(3), Some(10));
        assert_eq!(last.items.len(), 10);
    }

    #[test]
    fn out_of_range_page_is_empty() {
        let page = paginate((0..5).collect::<Vec<_>>(), Some(4), Some(10));
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn clamps_page_and_page_size() {
        let page = paginate((0..500).collect::<Vec<_>>(), Some(0), Some(1_000));
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, MAX_PER_PAGE);
        assert_eq!(page.items.len(), MAX_PER_PAGE);

        let tiny = paginate((0..3).collect::<Vec<_>>(), Some(2), Some(-4));
        assert_eq!(tiny.per_page, 1);
        assert_eq!(tiny.items, vec![1]);
    }
}
