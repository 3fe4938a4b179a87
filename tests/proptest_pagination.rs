//! Property-based tests using proptest
//!
//! These tests check pagination, cache bounds, share link parsing and the
//! status table over randomized inputs.

use abstract_sdk::{Cursor, CursorState, ErrorKind, Page, ResponseCache, ShareReference};
use proptest::prelude::*;

const SHARE_PREFIX: &str = "https://share.goabstract.com/";

/// Cursor over `0..total`, `limit` items per fetch
fn range_cursor(total: u64, limit: u64) -> Cursor<Vec<u64>> {
    Cursor::new(move |state: Option<CursorState>| async move {
        let offset = state.and_then(|s| s.next_offset).unwrap_or(0);
        let end = (offset + limit).min(total);
        Ok(Page {
            data: (offset..end).collect(),
            state: CursorState {
                limit,
                offset,
                next_offset: (end < total).then_some(end),
                total,
            },
        })
    })
}

proptest! {
    /// Walking a cursor visits every item exactly once, in order
    #[test]
    fn cursor_visits_every_item_once(total in 0u64..200, limit in 1u64..20) {
        let pages = tokio_test::block_on(range_cursor(total, limit).collect_pages()).unwrap();

        let expected_pages = total.div_ceil(limit).max(1) as usize;
        prop_assert_eq!(pages.len(), expected_pages);

        let items: Vec<u64> = pages.into_iter().flatten().collect();
        prop_assert_eq!(items, (0..total).collect::<Vec<_>>());
    }

    /// No page is larger than the requested limit
    #[test]
    fn pages_respect_limit(total in 0u64..200, limit in 1u64..20) {
        let pages = tokio_test::block_on(range_cursor(total, limit).collect_pages()).unwrap();
        prop_assert!(pages.iter().all(|page| page.len() as u64 <= limit));
    }

    /// The cache never grows past its bound and keeps the newest entry
    #[test]
    fn cache_stays_bounded(
        max_size in 0usize..16,
        keys in prop::collection::vec("[a-e][0-9]", 0..64)
    ) {
        let cache = ResponseCache::new(max_size);
        for (i, key) in keys.iter().enumerate() {
            cache.insert(key.clone(), i);
        }

        prop_assert!(cache.len() <= max_size);
        if let (Some(last), true) = (keys.last(), max_size > 0) {
            prop_assert_eq!(cache.get::<usize>(last), Some(keys.len() - 1));
        }
    }

    /// Share links resolve to their id regardless of trailing parts
    #[test]
    fn share_url_yields_id(
        id in "[A-Za-z0-9-]{1,36}",
        suffix in prop_oneof![Just(""), Just("/"), Just("?ref=slack"), Just("#layer"), Just("/extra/path")]
    ) {
        let url = format!("{}{}{}", SHARE_PREFIX, id, suffix);
        let resolved = ShareReference::from_url(url).resolve(SHARE_PREFIX).unwrap();
        prop_assert_eq!(resolved, id);
    }

    /// Links on another host never resolve
    #[test]
    fn foreign_share_url_is_rejected(id in "[A-Za-z0-9-]{1,36}") {
        let url = format!("https://example.com/{}", id);
        prop_assert!(ShareReference::from_url(url).resolve(SHARE_PREFIX).is_err());
    }

    /// Statuses outside the table map to Other
    #[test]
    fn unknown_status_is_other(status in 100u16..600) {
        prop_assume!(![401, 403, 404, 422, 429, 500, 503].contains(&status));
        prop_assert_eq!(ErrorKind::from_status(status), ErrorKind::Other);
    }
}
