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
use super::estimate::EstimateTable;
use super::height_cache::HeightCache;
use std::ops::Range;

/// Prefix sums over row heights, recomputed lazily when marked dirty.
#[derive(Debug, Default)]
pub struct Layout {
    /// `tops[i]` is the top of row `i`; the final entry is the content height.
    tops: Vec<u64>,
    dirty: bool,
}

impl Layout {
    pub fn new() -> Self {
        Self { tops: vec![0], dirty: true }
    }

    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub fn ensure(&mut self, sequence: &Sequence, heights: &HeightCache, estimates: &EstimateTable) {
        if !self.dirty && self.tops.len() == sequence.len() + 1 {
            return;
        }
        self.tops.clear();
        self.tops.reserve(sequence.len() + 1);
        let mut acc = 0u64;
        self.tops.push(acc);
        for message in sequence.items() {
            acc += u64::from(heights.resolve(message, estimates));
            self.tops.push(acc);
        }
        self.dirty = false;
    }

    pub fn len(&self) -> usize {
        self.tops.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total(&self) -> u64 {
        self.tops.last().copied().unwrap_or(0)
    }

    pub fn top(&self, position: usize) -> u64 {
        self.tops.get(position).copied().unwrap_or_else(|| self.total())
    }

    pub fn height(&self, position: usize) -> u64 {
        self.top(position + 1).saturating_sub(self.top(position))
    }

    pub fn max_offset(&self, viewport_height: u32) -> u64 {
        self.total().saturating_sub(u64::from(viewport_height))
    }

    /// Row containing `offset`, clamped to the last row.
    pub fn position_at(&self, offset: u64) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let after = self.tops.partition_point(|&top| top <= offset);
        Some(after.saturating_sub(1).min(self.len() - 1))
    }

    /// Rows intersecting `[offset, offset + viewport_height)`.
    pub fn visible_range(&self, offset: u64, viewport_height: u32) -> Range<usize> {
        let Some(first) = self.position_at(offset) else {
            return 0..0;
        };
        let bottom = offset + u64::from(viewport_height);
        let end = self.tops.partition_point(|&top| top < bottom).min(self.len());
        first..end.max(first + 1)
    }
}
