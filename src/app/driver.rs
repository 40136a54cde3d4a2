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

use super::AppEvent;
use crate::model::{ConversationId, Message, MessageKey};
use crate::store::MessageStore;
use crate::viewport::{Effect, PageRequest, ViewportEvent};
use futures::StreamExt;
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Runs the engine's effects as local tasks and posts their results back
/// through the app event channel.
///
/// Every task belongs to the conversation that was active when it started;
/// switching conversations cancels them all at once.
pub struct Driver {
    store: Rc<dyn MessageStore>,
    event_tx: mpsc::UnboundedSender<AppEvent>,
    cancel: CancellationToken,
}

impl Driver {
    pub fn new(store: Rc<dyn MessageStore>, event_tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self { store, event_tx, cancel: CancellationToken::new() }
    }

    /// Execute a collaborator-facing effect. Surface effects (scroll,
    /// highlight) are the caller's business and are ignored here.
    pub fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::ConversationChanged { conversation } => self.switch(conversation),
            Effect::FetchPage { ticket, request } => {
                let store = Rc::clone(&self.store);
                let conversation = ticket.conversation.clone();
                self.spawn(async move {
                    let result = match &request {
                        PageRequest::Latest { limit } => {
                            store.fetch_older(&conversation, None, *limit).await
                        }
                        PageRequest::Older { before, limit } => {
                            store.fetch_older(&conversation, Some(before), *limit).await
                        }
                        PageRequest::Newer { after, limit } => {
                            store.fetch_newer(&conversation, after, *limit).await
                        }
                    };
                    Some(AppEvent::Viewport(ViewportEvent::PageLoaded { ticket, request, result }))
                });
            }
            Effect::FetchContext { ticket, target, before, after } => {
                let store = Rc::clone(&self.store);
                self.spawn(async move {
                    let result = store
                        .fetch_context_window(&ticket.conversation, &target, before, after)
                        .await;
                    Some(AppEvent::Viewport(ViewportEvent::ContextLoaded { ticket, target, result }))
                });
            }
            Effect::Schedule { ticket, task, delay } => {
                self.spawn(async move {
                    tokio::time::sleep(delay).await;
                    Some(AppEvent::Viewport(ViewportEvent::TimerFired { ticket, task }))
                });
            }
            Effect::Scroll(_) | Effect::Highlight { .. } => {}
        }
    }

    /// Hand an optimistic message to the store; only failures come back.
    pub fn send(&self, message: Message) {
        let store = Rc::clone(&self.store);
        let key = message.key();
        self.spawn(async move {
            match store.send(message).await {
                Ok(_) => None,
                Err(error) => Some(AppEvent::SendFailed { key, error }),
            }
        });
    }

    /// Simulate an attachment finishing its download after `delay`.
    pub fn load_media(&self, conversation: ConversationId, key: MessageKey, delay: Duration) {
        self.spawn(async move {
            tokio::time::sleep(delay).await;
            Some(AppEvent::MediaLoaded { conversation, key })
        });
    }

    fn switch(&mut self, conversation: ConversationId) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        tracing::debug!(%conversation, "subscribing to live messages");

        let mut live = self.store.subscribe(&conversation);
        let token = self.cancel.clone();
        let event_tx = self.event_tx.clone();
        tokio::task::spawn_local(async move {
            while let Some(Some(message)) = token.run_until_cancelled(live.next()).await {
                if event_tx.send(AppEvent::Viewport(ViewportEvent::Live(message))).is_err() {
                    break;
                }
            }
        });
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = Option<AppEvent>> + 'static,
    {
        let token = self.cancel.clone();
        let event_tx = self.event_tx.clone();
        tokio::task::spawn_local(async move {
            if let Some(Some(event)) = token.run_until_cancelled(task).await {
                let _ = event_tx.send(event);
            }
        });
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
