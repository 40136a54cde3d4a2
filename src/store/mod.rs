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

//! The message collaborator the engine pages through.

mod memory;

pub use memory::{CallCounts, MemoryStore, conversation_name, synthetic_message};

use crate::error::StoreError;
use crate::model::{ConversationId, Message, ServerId};
use async_trait::async_trait;
use futures::stream::LocalBoxStream;

/// Which paging directions a store supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub older: bool,
    pub newer: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self { older: true, newer: true }
    }
}

/// Messages around a jump target, plus whether more exist on either side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextWindow {
    pub messages: Vec<Message>,
    pub has_more_before: bool,
    pub has_more_after: bool,
}

pub type LiveStream = LocalBoxStream<'static, Message>;

/// Source of conversation history and live traffic. Pages are returned in
/// ascending chronological order.
#[async_trait(?Send)]
pub trait MessageStore {
    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    /// Up to `limit` messages immediately before `before`, or the newest
    /// `limit` messages when `before` is `None`.
    async fn fetch_older(
        &self,
        conversation: &ConversationId,
        before: Option<&ServerId>,
        limit: usize,
    ) -> Result<Vec<Message>, StoreError>;

    async fn fetch_newer(
        &self,
        conversation: &ConversationId,
        after: &ServerId,
        limit: usize,
    ) -> Result<Vec<Message>, StoreError>;

    async fn fetch_context_window(
        &self,
        conversation: &ConversationId,
        target: &ServerId,
        before: usize,
        after: usize,
    ) -> Result<ContextWindow, StoreError>;

    /// Persist an optimistic local message. The confirmed copy keeps the
    /// local correlation id and is also delivered through [`Self::subscribe`].
    async fn send(&self, _message: Message) -> Result<Message, StoreError> {
        Err(StoreError::Unavailable("sending is not supported".into()))
    }

    /// Newly sent or received messages for `conversation`, as they occur.
    fn subscribe(&self, conversation: &ConversationId) -> LiveStream;
}
