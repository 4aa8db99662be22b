//! Page-count derivation from server metadata.

use crate::model::{RemotePaginationMeta, DEFAULT_PAGE_SIZE};

/// Page count implied by server metadata: `max(1, ceil(total / limit))`.
///
/// A zero `limit` falls back to [`DEFAULT_PAGE_SIZE`].
pub fn page_count_from_pagination(meta: &RemotePaginationMeta) -> u32 {
    let limit = if meta.limit > 0 {
        meta.limit
    } else {
        DEFAULT_PAGE_SIZE
    };
    let pages = meta.total.div_ceil(u64::from(limit)).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Resolves the page count shown by the footer.
///
/// Server metadata wins; otherwise a positive explicit count; otherwise 1.
pub fn resolve_page_count(meta: Option<&RemotePaginationMeta>, explicit: Option<i64>) -> u32 {
    if let Some(meta) = meta {
        return page_count_from_pagination(meta);
    }
    explicit
        .filter(|count| *count > 0)
        .map(|count| u32::try_from(count).unwrap_or(u32::MAX))
        .unwrap_or(1)
}

/// Whether a page after `page` exists.
pub fn can_next_page(page: u32, page_count: u32) -> bool {
    page < page_count
}

/// Whether a page before `page` exists.
pub fn can_previous_page(page: u32) -> bool {
    page > 1
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn meta(limit: u32, total: u64) -> RemotePaginationMeta {
        RemotePaginationMeta {
            page: 1,
            limit,
            total,
        }
    }

    #[test]
    fn page_count_rounds_up_with_floor_of_one() {
        assert_eq!(page_count_from_pagination(&meta(10, 95)), 10);
        assert_eq!(page_count_from_pagination(&meta(10, 100)), 10);
        assert_eq!(page_count_from_pagination(&meta(10, 0)), 1);
        assert_eq!(page_count_from_pagination(&meta(0, 25)), 3);
    }

    #[test]
    fn metadata_wins_over_explicit_count() {
        assert_eq!(resolve_page_count(Some(&meta(10, 95)), Some(3)), 10);
        assert_eq!(resolve_page_count(None, Some(4)), 4);
        assert_eq!(resolve_page_count(None, Some(-1)), 1);
        assert_eq!(resolve_page_count(None, None), 1);
    }

    #[test]
    fn navigation_bounds() {
        assert!(can_next_page(1, 2));
        assert!(!can_next_page(2, 2));
        assert!(!can_previous_page(1));
        assert!(can_previous_page(2));
    }
}
