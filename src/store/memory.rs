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

use super::{ContextWindow, LiveStream, MessageStore};
use crate::config::DemoConfig;
use crate::error::StoreError;
use crate::model::{ContentKind, ConversationId, Linkage, Message, MessageId, ServerId};
use async_trait::async_trait;
use futures::StreamExt;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::broadcast;

const LIVE_CHANNEL_CAPACITY: usize = 256;
const CONVERSATION_NAMES: &[&str] =
    &["general", "design", "releases", "support", "random", "infra", "mobile", "ops"];
const WORDS: &[&str] = &[
    "ship", "the", "build", "is", "green", "again", "after", "rebasing", "onto", "main", "and",
    "the", "flaky", "test", "finally", "passes", "can", "someone", "review", "my", "patch",
    "before", "lunch", "tomorrow", "looks", "good", "to", "me", "thanks", "for", "checking",
];

/// Per-operation call counters, used to assert which collaborator calls happened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub older: usize,
    pub newer: usize,
    pub context: usize,
}

/// In-memory message store with optional latency and injected failures.
/// Single-threaded: meant to live on a `LocalSet`.
pub struct MemoryStore {
    conversations: RefCell<BTreeMap<ConversationId, Vec<Message>>>,
    latency: Duration,
    fail_next: Cell<usize>,
    calls: Cell<CallCounts>,
    live_tx: broadcast::Sender<Message>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (live_tx, _) = broadcast::channel(LIVE_CHANNEL_CAPACITY);
        Self {
            conversations: RefCell::new(BTreeMap::new()),
            latency: Duration::ZERO,
            fail_next: Cell::new(0),
            calls: Cell::new(CallCounts::default()),
            live_tx,
        }
    }

    /// Synthetic conversations with a mix of every content kind, replies and forwards.
    pub fn synthetic(config: &DemoConfig) -> Self {
        let store = Self::new().with_latency(Duration::from_millis(config.latency_ms));
        let base_ms = unix_now_ms().saturating_sub(
            u64::try_from(config.messages_per_conversation).unwrap_or(0) * 60_000,
        );
        for i in 0..config.conversations.max(1) {
            let conversation = ConversationId::new(conversation_name(i));
            let messages = (1..=config.messages_per_conversation)
                .map(|n| synthetic_message(&conversation, n, base_ms + n as u64 * 60_000))
                .collect();
            store.insert_conversation(conversation, messages);
        }
        store
    }

    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn insert_conversation(&self, conversation: ConversationId, messages: Vec<Message>) {
        self.conversations.borrow_mut().insert(conversation, messages);
    }

    pub fn conversation_ids(&self) -> Vec<ConversationId> {
        self.conversations.borrow().keys().cloned().collect()
    }

    pub fn len(&self, conversation: &ConversationId) -> usize {
        self.conversations.borrow().get(conversation).map_or(0, Vec::len)
    }

    /// Make the next `n` fetches fail with [`StoreError::Unavailable`].
    pub fn fail_next(&self, n: usize) {
        self.fail_next.set(n);
    }

    pub fn calls(&self) -> CallCounts {
        self.calls.get()
    }

    /// Deliver a message from another participant.
    pub fn push_live(&self, message: Message) {
        if let Some(messages) = self.conversations.borrow_mut().get_mut(&message.conversation) {
            messages.push(message.clone());
        }
        // No subscribers is fine; the message is persisted either way.
        let _ = self.live_tx.send(message);
    }

    /// Next synthetic message for `conversation`, numbered after the stored ones.
    pub fn next_synthetic(&self, conversation: &ConversationId) -> Option<Message> {
        let n = self.conversations.borrow().get(conversation)?.len() + 1;
        Some(synthetic_message(conversation, n, unix_now_ms()))
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn take_failure(&self) -> Result<(), StoreError> {
        let remaining = self.fail_next.get();
        if remaining == 0 {
            return Ok(());
        }
        self.fail_next.set(remaining - 1);
        Err(StoreError::Unavailable("injected failure".into()))
    }

    fn record_call(&self, f: impl FnOnce(&mut CallCounts)) {
        let mut calls = self.calls.get();
        f(&mut calls);
        self.calls.set(calls);
    }

    fn with_messages<T>(
        &self,
        conversation: &ConversationId,
        f: impl FnOnce(&[Message]) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let conversations = self.conversations.borrow();
        let messages = conversations
            .get(conversation)
            .ok_or_else(|| StoreError::UnknownConversation(conversation.clone()))?;
        f(messages)
    }
}

fn position_of(messages: &[Message], id: &ServerId) -> Result<usize, StoreError> {
    messages
        .iter()
        .position(|m| m.id.server_id() == Some(id))
        .ok_or_else(|| StoreError::UnknownMessage(id.clone()))
}

#[async_trait(?Send)]
impl MessageStore for MemoryStore {
    async fn fetch_older(
        &self,
        conversation: &ConversationId,
        before: Option<&ServerId>,
        limit: usize,
    ) -> Result<Vec<Message>, StoreError> {
        self.record_call(|c| c.older += 1);
        self.simulate_latency().await;
        self.take_failure()?;
        self.with_messages(conversation, |messages| {
            let end = match before {
                Some(id) => position_of(messages, id)?,
                None => messages.len(),
            };
            Ok(messages[end.saturating_sub(limit)..end].to_vec())
        })
    }

    async fn fetch_newer(
        &self,
        conversation: &ConversationId,
        after: &ServerId,
        limit: usize,
    ) -> Result<Vec<Message>, StoreError> {
        self.record_call(|c| c.newer += 1);
        self.simulate_latency().await;
        self.take_failure()?;
        self.with_messages(conversation, |messages| {
            let start = position_of(messages, after)? + 1;
            let end = (start + limit).min(messages.len());
            Ok(messages[start..end].to_vec())
        })
    }

    async fn fetch_context_window(
        &self,
        conversation: &ConversationId,
        target: &ServerId,
        before: usize,
        after: usize,
    ) -> Result<ContextWindow, StoreError> {
        self.record_call(|c| c.context += 1);
        self.simulate_latency().await;
        self.take_failure()?;
        self.with_messages(conversation, |messages| {
            let pos = position_of(messages, target)?;
            let start = pos.saturating_sub(before);
            let end = (pos + 1 + after).min(messages.len());
            Ok(ContextWindow {
                messages: messages[start..end].to_vec(),
                has_more_before: start > 0,
                has_more_after: end < messages.len(),
            })
        })
    }

    async fn send(&self, message: Message) -> Result<Message, StoreError> {
        self.simulate_latency().await;
        self.take_failure()?;
        let Some(local) = message.id.local_id() else {
            return Err(StoreError::Unavailable("message has no local id".into()));
        };
        let confirmed = {
            let mut conversations = self.conversations.borrow_mut();
            let messages = conversations
                .get_mut(&message.conversation)
                .ok_or_else(|| StoreError::UnknownConversation(message.conversation.clone()))?;
            let server = ServerId::new(format!("m{}", messages.len() + 1));
            let confirmed = Message { id: MessageId::confirmed(server, local), ..message };
            messages.push(confirmed.clone());
            confirmed
        };
        let _ = self.live_tx.send(confirmed.clone());
        Ok(confirmed)
    }

    fn subscribe(&self, conversation: &ConversationId) -> LiveStream {
        let rx = self.live_tx.subscribe();
        let conversation = conversation.clone();
        futures::stream::unfold(rx, move |mut rx| {
            let conversation = conversation.clone();
            async move {
                loop {
                    match rx.recv().await {
                        Ok(message) if message.conversation == conversation => {
                            return Some((message, rx));
                        }
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(%conversation, skipped, "live subscriber lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            }
        })
        .boxed_local()
    }
}

pub fn conversation_name(i: usize) -> String {
    match CONVERSATION_NAMES.get(i) {
        Some(name) => (*name).to_owned(),
        None => format!("room-{i}"),
    }
}

fn unix_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Deterministic pseudo-random message number `n` (1-based) of a conversation.
pub fn synthetic_message(conversation: &ConversationId, n: usize, created_at_ms: u64) -> Message {
    let seed = mix(n as u64 ^ conversation.as_str().len() as u64);
    let kind = match seed % 20 {
        0..=10 => ContentKind::Text,
        11 => ContentKind::Image,
        12 => ContentKind::Sticker,
        13 => ContentKind::File,
        14 => ContentKind::Video,
        15 => ContentKind::Album,
        16 => ContentKind::System,
        17 | 18 => ContentKind::Reply,
        _ => ContentKind::Forwarded,
    };
    let words = 3 + (seed >> 8) as usize % 40;
    let body: Vec<&str> =
        (0..words).map(|w| WORDS[(mix(seed + w as u64) as usize) % WORDS.len()]).collect();
    let body = match kind {
        ContentKind::File => format!("{}.tar.gz", body.first().copied().unwrap_or("archive")),
        ContentKind::System => format!("{} joined the conversation", body.first().copied().unwrap_or("someone")),
        _ => body.join(" "),
    };
    let message = Message::new(
        MessageId::server(ServerId::new(format!("m{n}"))),
        conversation.clone(),
        created_at_ms,
        kind,
        body,
    );
    match kind {
        ContentKind::Reply if n > 1 => {
            let back = 1 + (seed >> 16) as usize % n.saturating_sub(1).clamp(1, 400);
            message.with_linkage(Linkage::Reply { to: ServerId::new(format!("m{}", n - back)) })
        }
        ContentKind::Forwarded => {
            message.with_linkage(Linkage::Forward { from: conversation_name(n % 3 + 1) })
        }
        _ => message,
    }
}

fn mix(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}
