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

use crate::model::ConversationId;
use crate::store::MemoryStore;
use std::rc::Rc;
use std::time::Duration;

/// Deliver a synthetic incoming message every `interval`, rotating through
/// `conversations`. The task ends with the `LocalSet`.
pub fn start_live_feed(store: Rc<MemoryStore>, conversations: Vec<ConversationId>, interval: Duration) {
    if interval.is_zero() || conversations.is_empty() {
        tracing::debug!("live feed disabled");
        return;
    }
    tokio::task::spawn_local(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        for conversation in conversations.iter().cycle() {
            ticker.tick().await;
            if let Some(message) = store.next_synthetic(conversation) {
                tracing::trace!(%conversation, key = %message.key(), "live message");
                store.push_live(message);
            }
        }
    });
}
