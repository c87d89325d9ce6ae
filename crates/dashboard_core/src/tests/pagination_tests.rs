use super::*;

use PageLink::{Ellipsis, Page};

#[test]
fn total_pages_rounds_up() {
    assert_eq!(total_pages(0, 20), 0);
    assert_eq!(total_pages(1, 20), 1);
    assert_eq!(total_pages(20, 20), 1);
    assert_eq!(total_pages(21, 20), 2);
    assert_eq!(total_pages(45, 20), 3);
    assert_eq!(total_pages(45, 0), 0);
}

#[test]
fn offset_follows_page_index() {
    assert_eq!(offset_for(1, 20), 0);
    assert_eq!(offset_for(3, 20), 40);
    assert_eq!(offset_for(0, 20), 0);
}

#[test]
fn empty_result_has_no_links() {
    assert!(visible_page_window(1, 0).is_empty());
}

#[test]
fn single_page_shows_only_first_page() {
    assert_eq!(visible_page_window(1, 1), vec![Page(1)]);
}

#[test]
fn small_result_shows_every_page() {
    assert_eq!(
        visible_page_window(3, 5),
        vec![Page(1), Page(2), Page(3), Page(4), Page(5)]
    );
}

#[test]
fn middle_of_large_result_collapses_both_sides() {
    assert_eq!(
        visible_page_window(10, 20),
        vec![
            Page(1),
            Ellipsis,
            Page(8),
            Page(9),
            Page(10),
            Page(11),
            Page(12),
            Ellipsis,
            Page(20),
        ]
    );
}

#[test]
fn window_touching_an_edge_skips_that_ellipsis() {
    assert_eq!(
        visible_page_window(2, 10),
        vec![Page(1), Page(2), Page(3), Page(4), Ellipsis, Page(10)]
    );
    assert_eq!(
        visible_page_window(4, 10),
        vec![Page(1), Page(2), Page(3), Page(4), Page(5), Page(6), Ellipsis, Page(10)]
    );
    assert_eq!(
        visible_page_window(10, 10),
        vec![Page(1), Ellipsis, Page(8), Page(9), Page(10)]
    );
}

#[test]
fn single_skipped_page_collapses_into_ellipsis() {
    assert_eq!(
        visible_page_window(5, 10),
        vec![
            Page(1),
            Ellipsis,
            Page(3),
            Page(4),
            Page(5),
            Page(6),
            Page(7),
            Ellipsis,
            Page(10),
        ]
    );
}

#[test]
fn page_beyond_total_is_clamped() {
    assert_eq!(visible_page_window(9, 3), vec![Page(1), Page(2), Page(3)]);
}

#[test]
fn window_is_strictly_increasing_without_duplicates() {
    for total in 0..=40 {
        for page in 1..=total.max(1) {
            let pages: Vec<u32> = visible_page_window(page, total)
                .into_iter()
                .filter_map(|link| match link {
                    Page(n) => Some(n),
                    Ellipsis => None,
                })
                .collect();
            assert!(
                pages.windows(2).all(|pair| pair[0] < pair[1]),
                "page={page} total={total} window={pages:?}"
            );
            if total > 0 {
                assert_eq!(pages.first(), Some(&1));
                assert_eq!(pages.last(), Some(&total));
                assert!(pages.contains(&page));
            }
        }
    }
}

#[test]
fn saturated_page_count_does_not_overflow() {
    let last = total_pages(u64::MAX, 1);
    assert_eq!(last, u32::MAX);
    assert_eq!(
        visible_page_window(last, last),
        vec![Page(1), Ellipsis, Page(last - 2), Page(last - 1), Page(last)]
    );
    assert_eq!(
        visible_page_window(last - 3, last),
        vec![
            Page(1),
            Ellipsis,
            Page(last - 5),
            Page(last - 4),
            Page(last - 3),
            Page(last - 2),
            Page(last - 1),
            Page(last),
        ]
    );
}
