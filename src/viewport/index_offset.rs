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

use super::dedup::Sequence;
use crate::model::MessageKey;
use std::fmt;

/// Stable row address: `first_index + position` in the current sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VirtualIndex(pub i64);

impl fmt::Display for VirtualIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceChange {
    Unchanged,
    Appended(usize),
    /// Number of new leading items; `first_index` moved down by the same amount.
    Prepended(usize),
    Reset,
}

/// Keeps already-rendered rows at the same virtual index when older history
/// is prepended, by lowering `first_index` instead of renumbering.
#[derive(Debug)]
pub struct IndexOffset {
    baseline: i64,
    first_index: i64,
    len: usize,
    first_key: Option<MessageKey>,
}

impl IndexOffset {
    pub fn new(baseline: i64) -> Self {
        Self { baseline, first_index: baseline, len: 0, first_key: None }
    }

    pub fn first_index(&self) -> i64 {
        self.first_index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn reset(&mut self) {
        self.first_index = self.baseline;
        self.len = 0;
        self.first_key = None;
    }

    /// Compare the new sequence with the last one observed and shift the
    /// index space in a single update.
    pub fn observe(&mut self, sequence: &Sequence) -> SequenceChange {
        let new_len = sequence.len();
        let new_first = sequence.first().map(crate::model::Message::key);
        let old_len = self.len;

        let change = match (&self.first_key, &new_first) {
            (None, None) => SequenceChange::Unchanged,
            (None, Some(_)) | (Some(_), None) => SequenceChange::Reset,
            (Some(old), Some(new)) if old == new => match new_len.cmp(&old_len) {
                std::cmp::Ordering::Greater => SequenceChange::Appended(new_len - old_len),
                std::cmp::Ordering::Equal => SequenceChange::Unchanged,
                std::cmp::Ordering::Less => SequenceChange::Reset,
            },
            (Some(old), Some(_)) => match sequence.position(old) {
                Some(leading) if new_len > old_len && leading > 0 => {
                    SequenceChange::Prepended(leading)
                }
                _ => SequenceChange::Reset,
            },
        };

        match change {
            SequenceChange::Prepended(leading) => {
                self.first_index -= i64::try_from(leading).unwrap_or(i64::MAX);
            }
            SequenceChange::Reset => self.first_index = self.baseline,
            SequenceChange::Unchanged | SequenceChange::Appended(_) => {}
        }
        self.len = new_len;
        self.first_key = new_first;
        change
    }

    pub fn virtual_index(&self, position: usize) -> VirtualIndex {
        VirtualIndex(self.first_index + i64::try_from(position).unwrap_or(i64::MAX))
    }

    /// Position in the sequence for a virtual index, if it is in range.
    pub fn position(&self, index: VirtualIndex) -> Option<usize> {
        let offset = index.0.checked_sub(self.first_index)?;
        let position = usize::try_from(offset).ok()?;
        (position < self.len).then_some(position)
    }
}
