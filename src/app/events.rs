// chat_viewport - A scroll-stable message viewport for chat clients
// Copyright (C) 2025  Simon Peter Rothgang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use super::{App, AppEvent};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};

const MOUSE_SCROLL_LINES: i64 = 3;
const DEMO_REPLY: &str = "on it, will report back shortly";

pub fn handle_terminal_event(app: &mut App, event: Event) {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, key),
        Event::Mouse(mouse) => handle_mouse_event(app, mouse),
        Event::Resize(..) => app.force_redraw = true,
        _ => {}
    }
}

fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.viewport.user_scroll_by(-MOUSE_SCROLL_LINES),
        MouseEventKind::ScrollDown => app.viewport.user_scroll_by(MOUSE_SCROLL_LINES),
        _ => return,
    }
    app.snap_scroll();
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let page = i64::from(app.viewport.viewport_height().saturating_sub(1).max(1));
    match (key.code, key.modifiers) {
        (KeyCode::Char('c'), m) if m.contains(KeyModifiers::CONTROL) => app.should_quit = true,
        (KeyCode::Char('q') | KeyCode::Esc, _) => app.should_quit = true,
        (KeyCode::Up | KeyCode::Char('k'), _) => scroll(app, -1),
        (KeyCode::Down | KeyCode::Char('j'), _) => scroll(app, 1),
        (KeyCode::PageUp, _) => scroll(app, -page),
        (KeyCode::PageDown | KeyCode::Char(' '), _) => scroll(app, page),
        (KeyCode::Home | KeyCode::Char('g'), _) => {
            app.viewport.user_scroll_to(0);
            app.snap_scroll();
        }
        (KeyCode::End | KeyCode::Char('G'), _) => {
            app.viewport.user_scroll_to_bottom();
            app.snap_scroll();
        }
        (KeyCode::Tab, _) => app.cycle_conversation(true),
        (KeyCode::BackTab, _) => app.cycle_conversation(false),
        (KeyCode::Char('r'), _) => app.jump_to_visible_reply(),
        (KeyCode::Char('s'), _) => app.send_message(DEMO_REPLY),
        _ => {}
    }
}

fn scroll(app: &mut App, delta: i64) {
    app.viewport.user_scroll_by(delta);
    app.snap_scroll();
}

pub fn handle_app_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Viewport(event) => {
            app.viewport.handle_event(event);
            app.maybe_issue_pending_jump();
        }
        AppEvent::MediaLoaded { conversation, key } => app.handle_media_loaded(&conversation, key),
        AppEvent::SendFailed { key, error } => {
            tracing::warn!(%key, "send failed: {error}");
            app.notice = Some(format!("Send failed: {error}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cli;
    use crate::app::create_app;
    use crate::config::{AppConfig, DemoConfig};
    use crate::model::{ConversationId, MessageKey, ServerId};
    use crate::store::MemoryStore;
    use crate::viewport::{Effect, FollowMode, PageRequest, ViewportEvent};
    use crossterm::event::KeyEventState;
    use pretty_assertions::assert_eq;
    use std::rc::Rc;

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    /// App with the first page of "design" already applied and 20 rows visible.
    fn loaded_app() -> App {
        let store = Rc::new(MemoryStore::synthetic(&DemoConfig {
            conversations: 2,
            messages_per_conversation: 200,
            latency_ms: 0,
            live_interval_ms: 0,
        }));
        let mut app = create_app(&Cli::default(), &AppConfig::default(), store).unwrap();
        app.viewport.set_viewport_height(20);
        let (ticket, request) = app
            .viewport
            .take_effects()
            .into_iter()
            .find_map(|e| match e {
                Effect::FetchPage { ticket, request } => Some((ticket, request)),
                _ => None,
            })
            .unwrap();
        let PageRequest::Latest { limit } = request else { panic!("expected latest") };
        let conversation = ConversationId::new("design");
        let all = (1..=200)
            .map(|n| crate::store::synthetic_message(&conversation, n, n as u64))
            .collect::<Vec<_>>();
        let page = all[200 - limit..].to_vec();
        handle_app_event(
            &mut app,
            AppEvent::Viewport(ViewportEvent::PageLoaded { ticket, request, result: Ok(page) }),
        );
        app.viewport.take_effects();
        app
    }

    #[test]
    fn q_and_ctrl_c_quit() {
        let mut app = loaded_app();
        handle_terminal_event(&mut app, press(KeyCode::Char('q')));
        assert!(app.should_quit);

        let mut app = loaded_app();
        handle_terminal_event(
            &mut app,
            Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
        );
        assert!(app.should_quit);
    }

    #[test]
    fn scrolling_up_holds_and_end_follows_again() {
        let mut app = loaded_app();
        let bottom = app.viewport.scroll_offset();
        handle_terminal_event(&mut app, press(KeyCode::PageUp));
        assert_eq!(app.viewport.scroll_offset(), bottom - 19);
        assert_eq!(app.viewport.follow_mode(), FollowMode::Holding);

        handle_terminal_event(&mut app, press(KeyCode::End));
        assert_eq!(app.viewport.scroll_offset(), bottom);
        assert_eq!(app.viewport.follow_mode(), FollowMode::Following);
    }

    #[test]
    fn mouse_wheel_scrolls_three_rows() {
        let mut app = loaded_app();
        let bottom = app.viewport.scroll_offset();
        handle_terminal_event(
            &mut app,
            Event::Mouse(MouseEvent {
                kind: MouseEventKind::ScrollUp,
                column: 0,
                row: 0,
                modifiers: KeyModifiers::NONE,
            }),
        );
        assert_eq!(app.viewport.scroll_offset(), bottom - 3);
    }

    #[test]
    fn tab_switches_conversation() {
        let mut app = loaded_app();
        handle_terminal_event(&mut app, press(KeyCode::Tab));
        assert_eq!(app.active_conversation(), Some(&ConversationId::new("general")));
        assert!(app.viewport.sequence().is_empty());
        let effects = app.viewport.take_effects();
        assert!(matches!(effects.first(), Some(Effect::ConversationChanged { .. })));
    }

    #[test]
    fn pending_jump_fires_after_first_page() {
        let mut app = loaded_app();
        app.pending_jump = Some(MessageKey::Server(ServerId::new("m190")));
        handle_app_event(
            &mut app,
            AppEvent::Viewport(ViewportEvent::Live(crate::store::synthetic_message(
                &ConversationId::new("design"),
                201,
                201,
            ))),
        );
        assert!(app.pending_jump.is_none());
        assert_eq!(app.viewport.highlighted(), Some(&MessageKey::Server(ServerId::new("m190"))));
    }

    #[test]
    fn media_for_other_conversation_is_ignored() {
        let mut app = loaded_app();
        let key = MessageKey::Server(ServerId::new("m199"));
        handle_app_event(
            &mut app,
            AppEvent::MediaLoaded { conversation: ConversationId::new("general"), key: key.clone() },
        );
        assert!(!app.media.is_loaded(&key));
        handle_app_event(
            &mut app,
            AppEvent::MediaLoaded { conversation: ConversationId::new("design"), key: key.clone() },
        );
        assert!(app.media.is_loaded(&key));
    }
}
