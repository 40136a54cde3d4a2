// =====
// TESTS: 8
// =====
//
// Jump-to-message flows: local scrolls, context window replacement,
// the corrective pass, highlight expiry and stale-result rejection.

use chat_viewport::model::{ConversationId, ServerId};
use chat_viewport::viewport::{
    FollowMode, JumpPhase, PageDirection, ScheduledTask, ViewportEvent,
};
use pretty_assertions::assert_eq;
use std::time::Duration;

use crate::helpers::{Harness, general, key, text_message};

async fn land(h: &mut Harness) {
    h.commit_layout().await;
    h.fire(ScheduledTask::CorrectiveScroll).await;
}

#[tokio::test(start_paused = true)]
async fn loaded_target_scrolls_without_fetching() {
    let mut h = Harness::new(60);
    h.open().await;

    h.viewport.jump_to(key("m40"));
    h.settle().await;

    assert_eq!(h.store.calls().context, 0);
    assert_eq!(h.highlights, vec![(key("m40"), true)]);
    assert_eq!(h.offset_of("m40"), Some(320 - 32));
    assert_eq!(h.viewport.follow_mode(), FollowMode::Holding);

    h.fire(ScheduledTask::ClearHighlight).await;
    assert_eq!(h.highlights.last(), Some(&(key("m40"), false)));
    assert_eq!(h.viewport.highlighted(), None);
}

#[tokio::test(start_paused = true)]
async fn unloaded_target_replaces_window() {
    let mut h = Harness::new(2_000);
    h.open().await;

    h.viewport.jump_to(key("m500"));
    h.settle().await;
    assert_eq!(h.store.calls().context, 1);
    assert_eq!(h.viewport.sequence().len(), 101);
    assert_eq!(h.viewport.sequence().first().map(|m| m.key()), Some(key("m450")));
    assert_eq!(h.viewport.sequence().last().map(|m| m.key()), Some(key("m550")));
    assert!(h.viewport.pagination().has_more(PageDirection::Older));
    assert!(h.viewport.pagination().has_more(PageDirection::Newer));
    assert_eq!(h.viewport.jump_phase(), &JumpPhase::AwaitingLayout { target: key("m500") });

    land(&mut h).await;
    assert_eq!(h.viewport.jump_phase(), &JumpPhase::Idle);
    assert_eq!(h.viewport.highlighted(), Some(&key("m500")));
    assert_eq!(h.offset_of("m500"), Some(320 - 32));
    assert_eq!(h.viewport.follow_mode(), FollowMode::Holding);
}

#[tokio::test(start_paused = true)]
async fn target_near_history_start_aligns_to_top() {
    let mut h = Harness::new(2_000);
    h.open().await;

    h.viewport.jump_to(key("m3"));
    h.settle().await;
    assert_eq!(h.viewport.sequence().len(), 53);
    assert!(!h.viewport.pagination().has_more(PageDirection::Older));

    land(&mut h).await;
    assert_eq!(h.offset_of("m3"), Some(0));
}

#[tokio::test(start_paused = true)]
async fn latest_jump_wins_over_earlier_one() {
    let mut h = Harness::new(2_000);
    h.open().await;

    h.viewport.jump_to(key("m500"));
    h.viewport.jump_to(key("m900"));
    h.settle().await;

    assert_eq!(h.store.calls().context, 2);
    assert!(h.viewport.sequence().contains(&key("m900")));
    assert!(!h.viewport.sequence().contains(&key("m500")));

    land(&mut h).await;
    assert_eq!(h.viewport.highlighted(), Some(&key("m900")));
}

#[tokio::test(start_paused = true)]
async fn switching_conversation_drops_in_flight_jump() {
    let mut h = Harness::new(2_000);
    h.open().await;

    h.viewport.jump_to(key("m500"));
    h.hold();
    h.viewport.open_conversation(ConversationId::new("random"));
    h.release().await;

    assert!(h.viewport.sequence().is_empty());
    assert_eq!(h.viewport.jump_phase(), &JumpPhase::Idle);
    assert_eq!(h.viewport.highlighted(), None);
    assert_ne!(h.viewport.follow_mode(), FollowMode::Jumping);
}

#[tokio::test(start_paused = true)]
async fn unknown_target_leaves_window_in_place() {
    let mut h = Harness::new(100);
    h.open().await;

    h.viewport.jump_to(key("m9999"));
    h.settle().await;

    assert_eq!(h.viewport.sequence().len(), 50);
    assert_eq!(h.viewport.jump_phase(), &JumpPhase::Idle);
    assert!(h.highlights.is_empty());
}

#[tokio::test(start_paused = true)]
async fn jumped_window_extends_in_both_directions() {
    let mut h = Harness::new(2_000);
    h.open().await;
    h.viewport.jump_to(key("m500"));
    h.settle().await;
    land(&mut h).await;
    tokio::time::advance(Duration::from_millis(300)).await;

    h.viewport.user_scroll_to(0);
    h.settle().await;
    assert_eq!(h.viewport.sequence().len(), 151);
    assert_eq!(h.viewport.first_index(), 99_950);
    assert_eq!(h.offset_of("m450"), Some(0));

    tokio::time::advance(Duration::from_millis(300)).await;
    h.viewport.user_scroll_to_bottom();
    h.settle().await;
    assert_eq!(h.viewport.sequence().len(), 201);
    assert_eq!(h.viewport.sequence().last().map(|m| m.key()), Some(key("m600")));
    assert_eq!(h.viewport.first_index(), 99_950);
}

#[tokio::test(start_paused = true)]
async fn live_messages_wait_while_newer_history_is_unloaded() {
    let mut h = Harness::new(2_000);
    h.open().await;
    h.viewport.jump_to(key("m500"));
    h.settle().await;
    land(&mut h).await;

    h.viewport.handle_event(ViewportEvent::Live(text_message(&general(), 2_001)));
    assert_eq!(h.viewport.sequence().len(), 101);
    assert!(!h.viewport.sequence().contains(&chat_viewport::model::MessageKey::Server(
        ServerId::new("m2001")
    )));
}
