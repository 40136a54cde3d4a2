// =====
// TESTS: 9
// =====
//
// Bidirectional paging against the in-memory store.
// Covers guards, anchor preservation and virtual index stability.

use chat_viewport::viewport::{LoadState, PageDirection, ViewportEvent, VirtualIndex};
use pretty_assertions::assert_eq;
use std::time::Duration;

use crate::helpers::{Harness, TEXT_HEIGHT, VIEWPORT_HEIGHT, general, key, text_message};

const PAST_SETTLE: Duration = Duration::from_millis(300);

#[tokio::test(start_paused = true)]
async fn initial_page_is_pinned_to_bottom() {
    let mut h = Harness::new(60);
    h.open().await;

    assert_eq!(h.viewport.sequence().len(), 50);
    assert_eq!(h.viewport.sequence().first().map(|m| m.key()), Some(key("m11")));
    assert_eq!(h.viewport.first_index(), 100_000);
    assert_eq!(h.viewport.scroll_offset(), 50 * TEXT_HEIGHT - u64::from(VIEWPORT_HEIGHT));
    assert!(h.viewport.edges().at_bottom);
}

#[tokio::test(start_paused = true)]
async fn older_page_keeps_anchor_row_still() {
    let mut h = Harness::new(60);
    h.open().await;
    tokio::time::advance(PAST_SETTLE).await;

    h.viewport.user_scroll_to(0);
    assert_eq!(h.offset_of("m11"), Some(0));
    h.settle().await;

    assert_eq!(h.viewport.sequence().len(), 60);
    assert_eq!(h.viewport.first_index(), 99_990);
    assert_eq!(h.viewport.virtual_index_of(&key("m11")), Some(VirtualIndex(100_000)));
    assert_eq!(h.viewport.virtual_index_of(&key("m1")), Some(VirtualIndex(99_990)));
    assert_eq!(h.offset_of("m11"), Some(0));
    assert!(!h.viewport.pagination().has_more(PageDirection::Older));
    assert_eq!(h.store.calls().older, 2);
}

#[tokio::test(start_paused = true)]
async fn no_older_paging_before_settle() {
    let mut h = Harness::new(200);
    h.open().await;

    h.viewport.user_scroll_to(0);
    h.settle().await;
    assert_eq!(h.store.calls().older, 1);

    tokio::time::advance(PAST_SETTLE).await;
    h.viewport.user_scroll_by(-1);
    h.settle().await;
    assert_eq!(h.store.calls().older, 2);
    assert_eq!(h.viewport.sequence().len(), 100);
}

#[tokio::test(start_paused = true)]
async fn cooldown_spaces_consecutive_pages() {
    let mut h = Harness::new(300);
    h.open().await;
    tokio::time::advance(PAST_SETTLE).await;

    h.viewport.user_scroll_to(0);
    h.settle().await;
    assert_eq!(h.viewport.sequence().len(), 100);

    // Back at the top straight away: still cooling down.
    h.viewport.user_scroll_to(0);
    h.settle().await;
    assert_eq!(h.store.calls().older, 2);

    tokio::time::advance(PAST_SETTLE).await;
    h.viewport.user_scroll_by(-1);
    h.settle().await;
    assert_eq!(h.store.calls().older, 3);
    assert_eq!(h.viewport.sequence().len(), 150);
    assert_eq!(h.viewport.first_index(), 99_900);
}

#[tokio::test(start_paused = true)]
async fn failed_page_is_retried_after_cooldown() {
    let mut h = Harness::new(300);
    h.open().await;
    tokio::time::advance(PAST_SETTLE).await;

    h.store.fail_next(1);
    h.viewport.user_scroll_to(0);
    h.settle().await;
    assert_eq!(h.viewport.sequence().len(), 50);
    assert_eq!(h.viewport.pagination().state(PageDirection::Older), LoadState::Idle);
    assert!(h.viewport.pagination().has_more(PageDirection::Older));

    tokio::time::advance(PAST_SETTLE).await;
    h.viewport.user_scroll_by(-1);
    h.settle().await;
    assert_eq!(h.viewport.sequence().len(), 100);
}

#[tokio::test(start_paused = true)]
async fn short_history_is_exhausted_after_first_page() {
    let mut h = Harness::new(30);
    h.open().await;
    assert!(!h.viewport.pagination().has_more(PageDirection::Older));

    tokio::time::advance(PAST_SETTLE).await;
    h.viewport.user_scroll_to(0);
    h.settle().await;
    assert_eq!(h.store.calls().older, 1);
}

#[tokio::test(start_paused = true)]
async fn late_measurements_above_anchor_are_compensated() {
    let mut h = Harness::new(60);
    h.open().await;
    tokio::time::advance(PAST_SETTLE).await;
    h.viewport.user_scroll_to(0);
    h.settle().await;

    // The prepended rows render taller than estimated before layout commits.
    for index in 99_990..100_000 {
        h.viewport.record_measurement(VirtualIndex(index), 100);
    }
    assert_eq!(h.offset_of("m11"), Some(0));
    assert_eq!(h.viewport.scroll_offset(), 1_000);

    h.commit_layout().await;
    assert!(h.viewport.pending_anchor().is_none());
    assert_eq!(h.offset_of("m11"), Some(0));
}

#[tokio::test(start_paused = true)]
async fn replayed_messages_are_not_duplicated() {
    let mut h = Harness::new(60);
    h.open().await;

    h.viewport.handle_event(ViewportEvent::Live(text_message(&general(), 60)));
    h.viewport.handle_event(ViewportEvent::Live(text_message(&general(), 59)));
    assert_eq!(h.viewport.sequence().len(), 50);
    assert_eq!(h.viewport.first_index(), 100_000);
}

#[tokio::test(start_paused = true)]
async fn failed_first_page_is_retried_on_scroll() {
    let mut h = Harness::new(60);
    h.store.fail_next(1);
    h.open().await;
    assert!(h.viewport.sequence().is_empty());

    tokio::time::advance(PAST_SETTLE).await;
    h.viewport.user_scroll_by(-10);
    h.settle().await;

    assert_eq!(h.viewport.sequence().len(), 50);
    assert_eq!(h.viewport.sequence().last().map(|m| m.key()), Some(key("m60")));
    assert!(h.viewport.edges().at_bottom);
}
