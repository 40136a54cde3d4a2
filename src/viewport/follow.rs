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

//! Follow/hold/jump state machine.
//!
//! Auto-following appends and compensating prepends are separate concerns:
//! the mode below only governs the former, while prepend anchors are restored
//! regardless of mode (except while a jump owns positioning).

use crate::model::MessageKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowMode {
    /// Auto-scroll to the newest content on growth.
    Following,
    /// Viewport must not move on growth.
    Holding,
    /// A jump owns positioning; follow logic is suspended.
    Jumping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

/// Where the viewport sits relative to the content edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edges {
    pub near_top: bool,
    pub at_bottom: bool,
}

/// Reference row captured before a content-length change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollAnchor {
    pub key: MessageKey,
    /// Row top minus scroll offset; negative when the row is partly above the viewport.
    pub offset: i64,
    pub direction: ScrollDirection,
}

#[derive(Debug)]
pub struct FollowController {
    mode: FollowMode,
    resume: FollowMode,
    last_direction: Option<ScrollDirection>,
    pending_anchor: Option<ScrollAnchor>,
}

impl Default for FollowController {
    fn default() -> Self {
        Self::new()
    }
}

impl FollowController {
    pub fn new() -> Self {
        Self {
            mode: FollowMode::Following,
            resume: FollowMode::Following,
            last_direction: None,
            pending_anchor: None,
        }
    }

    pub fn mode(&self) -> FollowMode {
        self.mode
    }

    pub fn last_direction(&self) -> Option<ScrollDirection> {
        self.last_direction
    }

    pub fn is_jumping(&self) -> bool {
        self.mode == FollowMode::Jumping
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn on_user_scroll(&mut self, direction: ScrollDirection, edges: Edges) {
        if self.is_jumping() {
            return;
        }
        match direction {
            ScrollDirection::Up => {
                if edges.near_top {
                    self.last_direction = Some(ScrollDirection::Up);
                }
                if !edges.at_bottom {
                    self.set_mode(FollowMode::Holding);
                }
            }
            ScrollDirection::Down => {
                if edges.at_bottom {
                    self.last_direction = Some(ScrollDirection::Down);
                    self.set_mode(FollowMode::Following);
                }
            }
        }
    }

    /// A non-prepend repositioning happened (resize, jump, programmatic scroll).
    pub fn on_position_changed(&mut self, edges: Edges) {
        if self.mode == FollowMode::Following && !edges.at_bottom {
            self.set_mode(FollowMode::Holding);
        }
    }

    /// Whether appended content should pull the viewport to the bottom.
    pub fn should_follow_appends(&self) -> bool {
        self.mode == FollowMode::Following && self.last_direction != Some(ScrollDirection::Up)
    }

    /// Remember an anchor until the layout settles. Ignored while jumping.
    pub fn hold_anchor(&mut self, anchor: ScrollAnchor) {
        if self.is_jumping() {
            return;
        }
        self.pending_anchor = Some(anchor);
    }

    pub fn pending_anchor(&self) -> Option<&ScrollAnchor> {
        self.pending_anchor.as_ref()
    }

    pub fn take_anchor(&mut self) -> Option<ScrollAnchor> {
        self.pending_anchor.take()
    }

    pub fn enter_jump(&mut self) {
        if self.mode != FollowMode::Jumping {
            self.resume = self.mode;
        }
        self.pending_anchor = None;
        self.set_mode(FollowMode::Jumping);
    }

    /// Return to the pre-jump mode, then apply the leaving-bottom rule.
    pub fn exit_jump(&mut self, edges: Edges) {
        if self.mode != FollowMode::Jumping {
            return;
        }
        self.set_mode(self.resume);
        self.on_position_changed(edges);
    }

    fn set_mode(&mut self, mode: FollowMode) {
        if self.mode != mode {
            tracing::debug!(from = ?self.mode, to = ?mode, "follow mode");
            self.mode = mode;
        }
    }
}
