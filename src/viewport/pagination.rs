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

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageDirection {
    Older,
    Newer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
}

/// Why a page request was not started. Only used for trace output and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blocked {
    NoCapability,
    InFlight,
    Exhausted,
    NotSettled,
    CoolingDown,
}

#[derive(Debug, Default)]
struct Lane {
    state: LoadState,
    has_more: bool,
    cooldown_until: Option<Instant>,
    capable: bool,
}

/// Two independent `idle -> loading -> idle` machines, one per direction.
#[derive(Debug)]
pub struct Pagination {
    older: Lane,
    newer: Lane,
    mounted_at: Option<Instant>,
    settle_delay: Duration,
    cooldown: Duration,
}

impl Pagination {
    pub fn new(settle_delay: Duration, cooldown: Duration, older: bool, newer: bool) -> Self {
        Self {
            older: Lane { capable: older, ..Lane::default() },
            newer: Lane { capable: newer, ..Lane::default() },
            mounted_at: None,
            settle_delay,
            cooldown,
        }
    }

    fn lane(&self, direction: PageDirection) -> &Lane {
        match direction {
            PageDirection::Older => &self.older,
            PageDirection::Newer => &self.newer,
        }
    }

    fn lane_mut(&mut self, direction: PageDirection) -> &mut Lane {
        match direction {
            PageDirection::Older => &mut self.older,
            PageDirection::Newer => &mut self.newer,
        }
    }

    pub fn state(&self, direction: PageDirection) -> LoadState {
        self.lane(direction).state
    }

    pub fn is_loading(&self, direction: PageDirection) -> bool {
        self.lane(direction).state == LoadState::Loading
    }

    pub fn has_more(&self, direction: PageDirection) -> bool {
        self.lane(direction).has_more
    }

    /// Back to a fresh conversation/window: both lanes idle, no cooldowns,
    /// the given `has_more` flags, and the settle guard re-armed.
    pub fn reset(&mut self, has_more_older: bool, has_more_newer: bool) {
        for (lane, has_more) in
            [(&mut self.older, has_more_older), (&mut self.newer, has_more_newer)]
        {
            lane.state = LoadState::Idle;
            lane.has_more = has_more;
            lane.cooldown_until = None;
        }
        self.mounted_at = None;
    }

    /// The initial positioning has happened; the settle guard counts from here.
    pub fn mark_mounted(&mut self, now: Instant) {
        self.mounted_at = Some(now);
    }

    pub fn check(&self, direction: PageDirection, now: Instant) -> Result<(), Blocked> {
        let lane = self.lane(direction);
        if !lane.capable {
            return Err(Blocked::NoCapability);
        }
        if lane.state == LoadState::Loading {
            return Err(Blocked::InFlight);
        }
        if !lane.has_more {
            return Err(Blocked::Exhausted);
        }
        if direction == PageDirection::Older {
            let settled = self
                .mounted_at
                .is_some_and(|mounted| now.saturating_duration_since(mounted) >= self.settle_delay);
            if !settled {
                return Err(Blocked::NotSettled);
            }
        }
        if lane.cooldown_until.is_some_and(|until| now < until) {
            return Err(Blocked::CoolingDown);
        }
        Ok(())
    }

    /// Move `direction` to loading if every guard passes.
    pub fn try_begin(&mut self, direction: PageDirection, now: Instant) -> Result<(), Blocked> {
        self.check(direction, now)?;
        self.lane_mut(direction).state = LoadState::Loading;
        Ok(())
    }

    /// Initial page load bypasses the settle guard and the `has_more` check.
    pub fn begin_initial(&mut self) {
        self.older.state = LoadState::Loading;
    }

    /// Return to idle. `has_more` is `None` on failure, leaving the flag as is.
    pub fn complete(&mut self, direction: PageDirection, has_more: Option<bool>, now: Instant) {
        let cooldown = self.cooldown;
        let lane = self.lane_mut(direction);
        lane.state = LoadState::Idle;
        lane.cooldown_until = Some(now + cooldown);
        if let Some(has_more) = has_more {
            lane.has_more = has_more;
        }
    }
}
