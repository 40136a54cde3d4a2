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

use super::estimate::EstimateTable;
use crate::model::{Message, MessageKey};
use std::collections::HashMap;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeightEntry {
    pub height: u32,
    pub last_updated: Instant,
}

/// Measured heights per message identity, scoped to one conversation.
///
/// Writes within `tolerance` of the cached value are ignored so sub-pixel
/// reflow noise cannot make rows oscillate.
#[derive(Debug)]
pub struct HeightCache {
    entries: HashMap<MessageKey, HeightEntry>,
    tolerance: u32,
}

impl HeightCache {
    pub fn new(tolerance: u32) -> Self {
        Self { entries: HashMap::new(), tolerance }
    }

    pub fn get(&self, key: &MessageKey) -> Option<u32> {
        self.entries.get(key).map(|e| e.height)
    }

    pub fn entry(&self, key: &MessageKey) -> Option<&HeightEntry> {
        self.entries.get(key)
    }

    /// Store a measurement. Returns `true` when the stored height changed.
    pub fn record(&mut self, key: MessageKey, measured: u32) -> bool {
        let measured = measured.max(1);
        let now = Instant::now();
        match self.entries.get_mut(&key) {
            Some(entry) if entry.height.abs_diff(measured) <= self.tolerance => false,
            Some(entry) => {
                tracing::trace!(%key, from = entry.height, to = measured, "height remeasured");
                entry.height = measured;
                entry.last_updated = now;
                true
            }
            None => {
                self.entries.insert(key, HeightEntry { height: measured, last_updated: now });
                true
            }
        }
    }

    /// The size answer for a row: the measurement if one exists, else the estimate.
    pub fn resolve(&self, message: &Message, estimates: &EstimateTable) -> u32 {
        self.get(&message.key()).unwrap_or_else(|| estimates.estimate(message))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
