use serde::{Deserialize, Serialize};

/// One page of a list query. `total` comes from an independent count query
/// over the same predicate as `items`, so the two can momentarily disagree
/// under concurrent writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, page_size: i64) -> Self {
        let total_pages = total_pages(total, page_size);
        Self {
            items,
            total,
            total_pages,
        }
    }
}

/// ceil(total / page_size); a non-positive page size collapses to one page.
pub fn total_pages(total: i64, page_size: i64) -> i64 {
    if page_size <= 0 {
        return 1;
    }
    (total + page_size - 1) / page_size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(100, 7), 15);
    }

    #[test]
    fn total_pages_degenerate_page_size() {
        assert_eq!(total_pages(42, 0), 1);
    }
}
