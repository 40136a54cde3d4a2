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

//! Reconcile the store's message list into one ordered, identity-unique sequence.

use crate::model::{Message, MessageKey};
use std::collections::HashMap;

/// The deduplicated sequence backing the viewport, plus a key -> position map.
#[derive(Debug, Default, Clone)]
pub struct Sequence {
    items: Vec<Message>,
    positions: HashMap<MessageKey, usize>,
}

impl Sequence {
    pub fn items(&self) -> &[Message] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Message> {
        self.items.get(position)
    }

    pub fn first(&self) -> Option<&Message> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&Message> {
        self.items.last()
    }

    /// Position of a message under any of its keys.
    pub fn position(&self, key: &MessageKey) -> Option<usize> {
        self.positions.get(key).copied()
    }

    pub fn contains(&self, key: &MessageKey) -> bool {
        self.positions.contains_key(key)
    }
}

/// Single pass over `source`: first occurrence wins position, later copies
/// are dropped. A dropped copy that carries a server id the kept entry lacks
/// hands it over, so a confirmed message migrates identity in place.
pub fn dedup(source: &[Message]) -> Sequence {
    let mut items: Vec<Message> = Vec::with_capacity(source.len());
    // Doubles as the seen-identity set: every key of every kept item is registered.
    let mut positions: HashMap<MessageKey, usize> = HashMap::with_capacity(source.len() * 2);

    for message in source {
        let existing = message.id.keys().find_map(|k| positions.get(&k).copied());
        if let Some(pos) = existing {
            if let Some(server) = message.id.server_id() {
                let server_key = MessageKey::Server(server.clone());
                if !positions.contains_key(&server_key)
                    && items[pos].id.assign_server(server.clone())
                {
                    positions.insert(server_key, pos);
                }
            }
            continue;
        }
        let pos = items.len();
        for key in message.id.keys() {
            positions.insert(key, pos);
        }
        items.push(message.clone());
    }

    Sequence { items, positions }
}
