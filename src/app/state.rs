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

use super::driver::Driver;
use crate::Cli;
use crate::config::AppConfig;
use crate::error::{AppError, StoreError};
use crate::model::{ContentKind, ConversationId, LocalId, Message, MessageId, MessageKey, ServerId};
use crate::store::{MemoryStore, MessageStore};
use crate::viewport::{ScrollCommand, Viewport, ViewportEvent};
use std::collections::HashSet;
use std::rc::Rc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;

/// Everything that reaches the UI loop from background tasks.
#[derive(Debug)]
pub enum AppEvent {
    Viewport(ViewportEvent),
    /// A message's attachment finished loading; its row grows on next render.
    MediaLoaded { conversation: ConversationId, key: MessageKey },
    SendFailed { key: MessageKey, error: StoreError },
}

/// Attachment load state for the active conversation.
#[derive(Debug, Default)]
pub struct MediaState {
    loaded: HashSet<MessageKey>,
    pending: HashSet<MessageKey>,
}

impl MediaState {
    pub fn is_loaded(&self, key: &MessageKey) -> bool {
        self.loaded.contains(key)
    }

    /// Returns `true` the first time a key is requested.
    pub fn request(&mut self, key: &MessageKey) -> bool {
        !self.loaded.contains(key) && self.pending.insert(key.clone())
    }

    pub fn mark_loaded(&mut self, key: MessageKey) {
        self.pending.remove(&key);
        self.loaded.insert(key);
    }

    pub fn clear(&mut self) {
        self.loaded.clear();
        self.pending.clear();
    }
}

pub struct App {
    pub viewport: Viewport,
    pub conversations: Vec<ConversationId>,
    pub active: usize,
    pub driver: Driver,
    pub event_tx: mpsc::UnboundedSender<AppEvent>,
    pub event_rx: mpsc::UnboundedReceiver<AppEvent>,
    pub should_quit: bool,
    pub media: MediaState,
    /// Attachments requested during the last render, loaded after it.
    pub media_wanted: Vec<MessageKey>,
    pub media_delay: Duration,
    /// Jump requested on the command line, issued once the first page lands.
    pub pending_jump: Option<MessageKey>,
    /// Offset actually drawn; trails the engine's offset during smooth scrolls.
    pub scroll_pos: f32,
    pub animating: bool,
    /// Transient notice shown in the footer.
    pub notice: Option<String>,
    pub spinner_frame: usize,
    pub force_redraw: bool,
}

impl App {
    pub fn new(
        config: &AppConfig,
        store: Rc<dyn MessageStore>,
        conversations: Vec<ConversationId>,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let capabilities = store.capabilities();
        Self {
            viewport: Viewport::new(config.viewport.clone(), capabilities),
            conversations,
            active: 0,
            driver: Driver::new(store, event_tx.clone()),
            event_tx,
            event_rx,
            should_quit: false,
            media: MediaState::default(),
            media_wanted: Vec::new(),
            media_delay: Duration::from_millis(config.demo.latency_ms.max(1) * 2),
            pending_jump: None,
            scroll_pos: 0.0,
            animating: false,
            notice: None,
            spinner_frame: 0,
            force_redraw: false,
        }
    }

    pub fn active_conversation(&self) -> Option<&ConversationId> {
        self.conversations.get(self.active)
    }

    pub fn open(&mut self, index: usize) {
        let Some(conversation) = self.conversations.get(index).cloned() else {
            return;
        };
        self.active = index;
        self.media.clear();
        self.media_wanted.clear();
        self.notice = None;
        self.viewport.open_conversation(conversation);
    }

    pub fn cycle_conversation(&mut self, forward: bool) {
        let len = self.conversations.len();
        if len < 2 {
            return;
        }
        let next = if forward { (self.active + 1) % len } else { (self.active + len - 1) % len };
        self.open(next);
    }

    /// Run pending engine effects: collaborator work goes to the driver,
    /// scroll commands drive the drawn offset.
    pub fn flush_effects(&mut self) {
        for effect in self.viewport.take_effects() {
            match effect {
                crate::viewport::Effect::Scroll(command) => self.apply_scroll(&command),
                crate::viewport::Effect::Highlight { key, active } => {
                    tracing::trace!(%key, active, "highlight");
                }
                other => self.driver.execute(other),
            }
        }
        if let Some(conversation) = self.active_conversation().cloned() {
            for key in std::mem::take(&mut self.media_wanted) {
                self.driver.load_media(conversation.clone(), key, self.media_delay);
            }
        }
    }

    fn apply_scroll(&mut self, command: &ScrollCommand) {
        let smooth = match command {
            ScrollCommand::ToIndex { smooth, .. } | ScrollCommand::ToBottom { smooth } => *smooth,
            ScrollCommand::Anchor { .. } => false,
        };
        self.animating = smooth;
        if !smooth {
            self.snap_scroll();
        }
    }

    /// Jump the drawn offset straight to the engine's offset.
    #[allow(clippy::cast_precision_loss)]
    pub fn snap_scroll(&mut self) {
        self.scroll_pos = self.viewport.scroll_offset() as f32;
        self.animating = false;
    }

    /// Advance a smooth scroll by one frame and return the offset to draw.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn display_offset(&mut self) -> u64 {
        let target = self.viewport.scroll_offset() as f32;
        if self.animating {
            let delta = target - self.scroll_pos;
            if delta.abs() < 0.5 {
                self.scroll_pos = target;
                self.animating = false;
            } else {
                self.scroll_pos += delta * 0.5;
            }
        } else {
            self.scroll_pos = target;
        }
        self.scroll_pos.max(0.0).round() as u64
    }

    pub fn handle_media_loaded(&mut self, conversation: &ConversationId, key: MessageKey) {
        if self.active_conversation() == Some(conversation) {
            self.media.mark_loaded(key);
        }
    }

    /// Jump to what the newest visible reply quotes.
    pub fn jump_to_visible_reply(&mut self) {
        let target = self
            .viewport
            .visible_rows()
            .iter()
            .rev()
            .find_map(|row| row.message.reply_target().cloned());
        match target {
            Some(target) => self.viewport.jump_to(MessageKey::Server(target)),
            None => self.notice = Some("No reply in view".to_owned()),
        }
    }

    /// Show a local message immediately and ask the store to confirm it.
    pub fn send_message(&mut self, body: &str) {
        let Some(conversation) = self.active_conversation().cloned() else {
            return;
        };
        let message = Message::new(
            MessageId::local(LocalId::generate()),
            conversation,
            unix_now_ms(),
            ContentKind::Text,
            body,
        );
        tracing::debug!(key = %message.key(), "sending optimistic message");
        self.viewport.handle_event(ViewportEvent::Live(message.clone()));
        self.driver.send(message);
    }

    /// Issue the command-line jump once the initial page is in.
    pub fn maybe_issue_pending_jump(&mut self) {
        if self.viewport.sequence().is_empty() {
            return;
        }
        if let Some(target) = self.pending_jump.take() {
            self.viewport.jump_to(target);
        }
    }
}

/// Build the app over the demo store and open the requested conversation.
pub fn create_app(
    cli: &Cli,
    config: &AppConfig,
    store: Rc<MemoryStore>,
) -> Result<App, AppError> {
    let conversations = store.conversation_ids();
    let active = match cli.conversation.as_deref() {
        Some(name) => conversations
            .iter()
            .position(|c| c.as_str() == name)
            .ok_or(AppError::UnknownConversation)?,
        None => 0,
    };
    let mut app = App::new(config, store, conversations);
    app.pending_jump = cli.jump.as_deref().map(|id| MessageKey::Server(ServerId::new(id)));
    app.open(active);
    Ok(app)
}

fn unix_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DemoConfig;
    use crate::viewport::{Effect, PageRequest};
    use pretty_assertions::assert_eq;

    fn demo_store() -> Rc<MemoryStore> {
        Rc::new(MemoryStore::synthetic(&DemoConfig {
            conversations: 3,
            messages_per_conversation: 120,
            latency_ms: 0,
            live_interval_ms: 0,
        }))
    }

    #[test]
    fn create_app_opens_requested_conversation() {
        let cli = Cli { conversation: Some("design".into()), ..Cli::default() };
        let mut app = create_app(&cli, &AppConfig::default(), demo_store()).unwrap();
        assert_eq!(app.active_conversation(), Some(&ConversationId::new("design")));
        let effects = app.viewport.take_effects();
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::FetchPage { request: PageRequest::Latest { .. }, .. }
        )));
    }

    #[test]
    fn unknown_conversation_is_an_app_error() {
        let cli = Cli { conversation: Some("nope".into()), ..Cli::default() };
        let err = create_app(&cli, &AppConfig::default(), demo_store()).err();
        assert_eq!(err, Some(AppError::UnknownConversation));
    }

    #[test]
    fn cycling_wraps_around() {
        let mut app = create_app(&Cli::default(), &AppConfig::default(), demo_store()).unwrap();
        app.cycle_conversation(false);
        assert_eq!(app.active, 2);
        app.cycle_conversation(true);
        assert_eq!(app.active, 0);
    }

    #[test]
    fn media_requests_are_deduplicated() {
        let mut media = MediaState::default();
        let key = MessageKey::Server(ServerId::new("m1"));
        assert!(media.request(&key));
        assert!(!media.request(&key));
        media.mark_loaded(key.clone());
        assert!(media.is_loaded(&key));
        assert!(!media.request(&key));
    }
}
