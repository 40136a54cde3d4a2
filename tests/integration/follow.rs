// =====
// TESTS: 6
// =====
//
// Follow/hold behaviour with live traffic, optimistic sends and
// remeasurement while the user reads history.

use chat_viewport::model::{ContentKind, LocalId, Message, MessageId, MessageKey};
use chat_viewport::store::MessageStore;
use chat_viewport::viewport::{FollowMode, ScrollCommand, ViewportEvent, VirtualIndex};
use pretty_assertions::assert_eq;

use crate::helpers::{Harness, TEXT_HEIGHT, VIEWPORT_HEIGHT, general, text_message};

#[tokio::test(start_paused = true)]
async fn live_message_at_bottom_is_followed() {
    let mut h = Harness::new(60);
    h.open().await;
    h.scrolls.clear();

    h.viewport.handle_event(ViewportEvent::Live(text_message(&general(), 61)));
    h.settle().await;

    assert_eq!(h.scrolls, vec![ScrollCommand::ToBottom { smooth: true }]);
    assert_eq!(h.viewport.scroll_offset(), 51 * TEXT_HEIGHT - u64::from(VIEWPORT_HEIGHT));
    assert!(h.viewport.edges().at_bottom);
}

#[tokio::test(start_paused = true)]
async fn reading_history_is_not_interrupted() {
    let mut h = Harness::new(60);
    h.open().await;
    h.viewport.user_scroll_by(-700);
    let before = h.viewport.scroll_offset();
    assert_eq!(h.viewport.follow_mode(), FollowMode::Holding);

    h.viewport.handle_event(ViewportEvent::Live(text_message(&general(), 61)));
    h.viewport.handle_event(ViewportEvent::Live(text_message(&general(), 62)));
    h.settle().await;

    assert_eq!(h.viewport.scroll_offset(), before);
    assert_eq!(h.viewport.sequence().len(), 52);
}

#[tokio::test(start_paused = true)]
async fn returning_to_bottom_resumes_following() {
    let mut h = Harness::new(60);
    h.open().await;
    h.viewport.user_scroll_by(-700);
    h.viewport.user_scroll_to_bottom();
    assert_eq!(h.viewport.follow_mode(), FollowMode::Following);

    h.viewport.handle_event(ViewportEvent::Live(text_message(&general(), 61)));
    assert!(h.viewport.edges().at_bottom);
}

#[tokio::test(start_paused = true)]
async fn optimistic_send_keeps_one_row_through_confirmation() {
    let mut h = Harness::new(60);
    h.open().await;
    let local = LocalId::generate();
    let pending =
        Message::new(MessageId::local(local), general(), 61, ContentKind::Text, "on my way");

    h.viewport.handle_event(ViewportEvent::Live(pending.clone()));
    let index = h.viewport.virtual_index_of(&MessageKey::Local(local)).unwrap();
    h.viewport.record_measurement(index, 90);

    let confirmed = h.store.send(pending).await.unwrap();
    h.viewport.handle_event(ViewportEvent::Live(confirmed.clone()));

    assert_eq!(h.viewport.sequence().len(), 51);
    let server = MessageKey::Server(confirmed.id.server_id().cloned().unwrap());
    assert_eq!(h.viewport.virtual_index_of(&server), Some(index));
    assert_eq!(h.viewport.item_height(index), Some(90));
}

#[tokio::test(start_paused = true)]
async fn media_growing_above_reader_keeps_position() {
    let mut h = Harness::new(60);
    h.open().await;
    h.viewport.user_scroll_to(1_280);
    let reading = h.viewport.sequence().get(20).map(Message::key).unwrap();
    assert_eq!(h.viewport.viewport_offset_of(&reading), Some(0));

    h.viewport.record_measurement(VirtualIndex(100_005), 300);
    h.viewport.record_measurement(VirtualIndex(100_006), 300);

    assert_eq!(h.viewport.viewport_offset_of(&reading), Some(0));
    assert_eq!(h.viewport.scroll_offset(), 1_280 + 2 * (300 - 64));
}

#[tokio::test(start_paused = true)]
async fn growth_while_following_stays_pinned() {
    let mut h = Harness::new(60);
    h.open().await;

    h.viewport.record_measurement(VirtualIndex(100_049), 200);
    assert!(h.viewport.edges().at_bottom);
    assert_eq!(h.viewport.follow_mode(), FollowMode::Following);
}
