// =====
// TESTS: 4
// =====
//
// The app wired to the demo store: effects run through the driver on a
// LocalSet and their results come back over the app event channel.

use chat_viewport::Cli;
use chat_viewport::app::{App, create_app, handle_app_event};
use chat_viewport::config::{AppConfig, DemoConfig};
use chat_viewport::model::{ConversationId, MessageKey, ServerId};
use chat_viewport::store::MemoryStore;
use chat_viewport::viewport::{FollowMode, JumpPhase};
use pretty_assertions::assert_eq;
use std::rc::Rc;
use tokio::task::LocalSet;

fn demo_store() -> Rc<MemoryStore> {
    Rc::new(MemoryStore::synthetic(&DemoConfig {
        conversations: 3,
        messages_per_conversation: 200,
        latency_ms: 0,
        live_interval_ms: 0,
    }))
}

fn app_with(cli: &Cli, store: Rc<MemoryStore>) -> App {
    let mut app = create_app(cli, &AppConfig::default(), store).unwrap();
    app.viewport.set_viewport_height(20);
    app
}

/// Run pending effects, then apply the next event the driver posts.
async fn pump(app: &mut App) {
    app.flush_effects();
    let event = app.event_rx.recv().await.unwrap();
    handle_app_event(app, event);
}

#[tokio::test(start_paused = true)]
async fn first_page_arrives_through_the_event_channel() {
    LocalSet::new()
        .run_until(async {
            let mut app = app_with(&Cli::default(), demo_store());
            pump(&mut app).await;

            assert_eq!(app.active_conversation(), Some(&ConversationId::new("design")));
            assert_eq!(app.viewport.sequence().len(), 50);
            assert_eq!(app.viewport.follow_mode(), FollowMode::Following);
            assert!(app.viewport.edges().at_bottom);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn command_line_jump_lands_and_highlights() {
    LocalSet::new()
        .run_until(async {
            let cli = Cli { jump: Some("m20".into()), ..Cli::default() };
            let mut app = app_with(&cli, demo_store());
            let target = MessageKey::Server(ServerId::new("m20"));

            // First page, then the context window around the target.
            pump(&mut app).await;
            assert!(app.pending_jump.is_none());
            pump(&mut app).await;
            assert!(app.viewport.virtual_index_of(&target).is_some());
            assert_eq!(app.viewport.jump_phase(), &JumpPhase::AwaitingLayout { target: target.clone() });

            app.viewport.layout_committed();
            pump(&mut app).await;

            assert_eq!(app.viewport.highlighted(), Some(&target));
            assert_eq!(app.viewport.jump_phase(), &JumpPhase::Idle);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn live_messages_reach_the_viewport() {
    LocalSet::new()
        .run_until(async {
            let store = demo_store();
            let mut app = app_with(&Cli::default(), Rc::clone(&store));
            pump(&mut app).await;

            let design = ConversationId::new("design");
            store.push_live(store.next_synthetic(&design).unwrap());
            pump(&mut app).await;

            assert_eq!(app.viewport.sequence().len(), 51);
            assert!(app.viewport.edges().at_bottom);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn switching_before_the_page_lands_discards_it() {
    LocalSet::new()
        .run_until(async {
            let mut app = app_with(&Cli::default(), demo_store());
            app.flush_effects();
            app.cycle_conversation(true);
            pump(&mut app).await;

            let general = ConversationId::new("general");
            assert_eq!(app.active_conversation(), Some(&general));
            assert_eq!(app.viewport.sequence().len(), 50);
            assert!(app.viewport.sequence().items().iter().all(|m| m.conversation == general));
        })
        .await;
}
