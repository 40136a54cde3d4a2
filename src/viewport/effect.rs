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

//! Everything that crosses the engine boundary: effects out, events in.

use super::index_offset::VirtualIndex;
use super::pagination::PageDirection;
use crate::error::StoreError;
use crate::model::{ConversationId, Message, MessageKey, ServerId};
use crate::store::ContextWindow;
use std::time::Duration;

/// Identifies the request an async result belongs to. A result whose ticket
/// no longer matches the active conversation and generation is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub conversation: ConversationId,
    /// Window epoch for page loads, jump generation for jumps and timers.
    pub epoch: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    /// Newest page of a freshly opened conversation.
    Latest { limit: usize },
    Older { before: ServerId, limit: usize },
    Newer { after: ServerId, limit: usize },
}

impl PageRequest {
    pub fn direction(&self) -> PageDirection {
        match self {
            Self::Latest { .. } | Self::Older { .. } => PageDirection::Older,
            Self::Newer { .. } => PageDirection::Newer,
        }
    }

    pub fn limit(&self) -> usize {
        match self {
            Self::Latest { limit } | Self::Older { limit, .. } | Self::Newer { limit, .. } => *limit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledTask {
    /// Second scroll pass after a jump, once late media has resized rows.
    CorrectiveScroll,
    ClearHighlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Start,
    Center,
    End,
}

/// Positioning instructions for the rendering surface. The engine has
/// already applied the resulting offset; surfaces use these to animate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrollCommand {
    ToIndex { index: VirtualIndex, align: Align, smooth: bool },
    /// Place the row's top edge `offset` units below the viewport top.
    Anchor { index: VirtualIndex, offset: i64 },
    ToBottom { smooth: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Previous conversation's pending work should be cancelled.
    ConversationChanged { conversation: ConversationId },
    FetchPage { ticket: Ticket, request: PageRequest },
    FetchContext { ticket: Ticket, target: ServerId, before: usize, after: usize },
    Schedule { ticket: Ticket, task: ScheduledTask, delay: Duration },
    Scroll(ScrollCommand),
    Highlight { key: MessageKey, active: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewportEvent {
    PageLoaded { ticket: Ticket, request: PageRequest, result: Result<Vec<Message>, StoreError> },
    ContextLoaded { ticket: Ticket, target: ServerId, result: Result<ContextWindow, StoreError> },
    TimerFired { ticket: Ticket, task: ScheduledTask },
    Live(Message),
}
