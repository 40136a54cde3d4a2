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

use super::effect::Align;
use crate::model::MessageKey;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JumpPhase {
    #[default]
    Idle,
    /// Waiting for the context window around an unloaded target.
    Fetching { target: MessageKey },
    /// Window replaced; waiting for the surface to lay it out.
    AwaitingLayout { target: MessageKey },
    /// First scroll done; corrective pass scheduled.
    Correcting { target: MessageKey },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Highlight {
    key: MessageKey,
    generation: u64,
}

/// Tracks the in-flight jump. Every new jump (and every conversation switch)
/// bumps the generation, so results and timers of older jumps go stale.
#[derive(Debug, Default)]
pub struct JumpController {
    phase: JumpPhase,
    generation: u64,
    highlight: Option<Highlight>,
}

impl JumpController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &JumpPhase {
        &self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_active(&self) -> bool {
        self.phase != JumpPhase::Idle
    }

    /// Start a new jump, superseding any in-flight one.
    pub fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.phase = JumpPhase::Idle;
        self.generation
    }

    pub fn set_phase(&mut self, phase: JumpPhase) {
        tracing::trace!(?phase, generation = self.generation, "jump phase");
        self.phase = phase;
    }

    /// Whether a result tagged with `generation` still belongs to the live jump.
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation && self.is_active()
    }

    pub fn finish(&mut self) {
        self.phase = JumpPhase::Idle;
    }

    /// Drop the in-flight jump and any highlight; returns the highlight to clear.
    pub fn cancel(&mut self) -> Option<MessageKey> {
        self.generation += 1;
        self.phase = JumpPhase::Idle;
        self.highlight.take().map(|h| h.key)
    }

    pub fn set_highlight(&mut self, key: MessageKey) {
        self.highlight = Some(Highlight { key, generation: self.generation });
    }

    pub fn take_highlight(&mut self) -> Option<MessageKey> {
        self.highlight.take().map(|h| h.key)
    }

    /// Clear the highlight set by `generation`, if it is still showing.
    pub fn expire_highlight(&mut self, generation: u64) -> Option<MessageKey> {
        match &self.highlight {
            Some(h) if h.generation == generation => self.take_highlight(),
            _ => None,
        }
    }

    pub fn highlighted(&self) -> Option<&MessageKey> {
        self.highlight.as_ref().map(|h| &h.key)
    }

    /// Targets near the start of the sequence align to the top, others center.
    pub fn alignment(position: usize, len: usize, start_fraction: f32) -> Align {
        #[allow(clippy::cast_precision_loss)]
        let ratio = if len == 0 { 0.0 } else { position as f32 / len as f32 };
        if ratio < start_fraction { Align::Start } else { Align::Center }
    }
}
