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

//! Bidirectional virtualized message viewport.
//!
//! [`Viewport`] is a synchronous state machine. Inputs are named events
//! (method calls or [`ViewportEvent`]s posted back by the host); outputs are
//! [`Effect`]s the host executes. It owns the sequence, the height cache,
//! the layout and the scroll offset, so nothing else mutates them.

mod dedup;
mod effect;
mod estimate;
mod follow;
mod height_cache;
mod index_offset;
mod jump;
mod layout;
mod pagination;

pub use dedup::{Sequence, dedup};
pub use effect::{
    Align, Effect, PageRequest, ScheduledTask, ScrollCommand, Ticket, ViewportEvent,
};
pub use estimate::EstimateTable;
pub use follow::{Edges, FollowController, FollowMode, ScrollAnchor, ScrollDirection};
pub use height_cache::{HeightCache, HeightEntry};
pub use index_offset::{IndexOffset, SequenceChange, VirtualIndex};
pub use jump::{JumpController, JumpPhase};
pub use layout::Layout;
pub use pagination::{Blocked, LoadState, PageDirection, Pagination};

use crate::config::ViewportConfig;
use crate::error::StoreError;
use crate::model::{ConversationId, Message, MessageKey, ServerId};
use crate::store::{Capabilities, ContextWindow};
use tokio::time::Instant;

/// A row intersecting the viewport, positioned relative to its top edge.
#[derive(Debug, Clone, Copy)]
pub struct VisibleRow<'a> {
    pub index: VirtualIndex,
    pub position: usize,
    /// Row top minus scroll offset; negative when clipped at the top.
    pub top: i64,
    pub height: u32,
    pub message: &'a Message,
}

pub struct Viewport {
    config: ViewportConfig,
    conversation: Option<ConversationId>,
    /// Bumped whenever the window is replaced; stale page loads are dropped.
    window_epoch: u64,
    /// The collaborator's view of the conversation, before dedup.
    source: Vec<Message>,
    sequence: Sequence,
    heights: HeightCache,
    offsets: IndexOffset,
    pagination: Pagination,
    follow: FollowController,
    jump: JumpController,
    layout: Layout,
    scroll_offset: u64,
    viewport_height: u32,
    effects: Vec<Effect>,
}

impl Viewport {
    pub fn new(config: ViewportConfig, capabilities: Capabilities) -> Self {
        Self {
            heights: HeightCache::new(config.height_tolerance),
            offsets: IndexOffset::new(config.first_index),
            pagination: Pagination::new(
                config.settle_delay(),
                config.cooldown(),
                capabilities.older,
                capabilities.newer,
            ),
            config,
            conversation: None,
            window_epoch: 0,
            source: Vec::new(),
            sequence: Sequence::default(),
            follow: FollowController::new(),
            jump: JumpController::new(),
            layout: Layout::new(),
            scroll_offset: 0,
            viewport_height: 0,
            effects: Vec::new(),
        }
    }

    // -- accessors ---------------------------------------------------------

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn conversation(&self) -> Option<&ConversationId> {
        self.conversation.as_ref()
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    pub fn first_index(&self) -> i64 {
        self.offsets.first_index()
    }

    pub fn heights(&self) -> &HeightCache {
        &self.heights
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn follow_mode(&self) -> FollowMode {
        self.follow.mode()
    }

    pub fn last_direction(&self) -> Option<ScrollDirection> {
        self.follow.last_direction()
    }

    pub fn pending_anchor(&self) -> Option<&ScrollAnchor> {
        self.follow.pending_anchor()
    }

    pub fn jump_phase(&self) -> &JumpPhase {
        self.jump.phase()
    }

    pub fn highlighted(&self) -> Option<&MessageKey> {
        self.jump.highlighted()
    }

    pub fn scroll_offset(&self) -> u64 {
        self.scroll_offset
    }

    pub fn viewport_height(&self) -> u32 {
        self.viewport_height
    }

    pub fn content_height(&mut self) -> u64 {
        self.ensure_layout();
        self.layout.total()
    }

    pub fn virtual_index_of(&self, key: &MessageKey) -> Option<VirtualIndex> {
        self.sequence.position(key).map(|p| self.offsets.virtual_index(p))
    }

    /// Row top relative to the viewport top, for any loaded message.
    pub fn viewport_offset_of(&mut self, key: &MessageKey) -> Option<i64> {
        let position = self.sequence.position(key)?;
        self.ensure_layout();
        Some(signed(self.layout.top(position)) - signed(self.scroll_offset))
    }

    pub fn edges(&mut self) -> Edges {
        self.ensure_layout();
        let max = self.layout.max_offset(self.viewport_height);
        Edges {
            near_top: self.scroll_offset <= u64::from(self.config.top_threshold),
            at_bottom: self.scroll_offset + u64::from(self.config.bottom_threshold) >= max,
        }
    }

    /// Drain everything the host has to execute.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    // -- conversation lifecycle -------------------------------------------

    /// Switch to `conversation`: wipe every conversation-scoped structure,
    /// cancel in-flight work and request the newest page.
    pub fn open_conversation(&mut self, conversation: ConversationId) {
        tracing::info!(%conversation, "opening conversation");
        if let Some(key) = self.jump.cancel() {
            self.effects.push(Effect::Highlight { key, active: false });
        }
        self.heights.clear();
        self.source.clear();
        self.sequence = Sequence::default();
        self.offsets.reset();
        self.layout.invalidate();
        self.follow.reset();
        self.pagination.reset(true, false);
        self.window_epoch += 1;
        self.scroll_offset = 0;
        self.conversation = Some(conversation.clone());
        self.effects.push(Effect::ConversationChanged { conversation });

        self.pagination.begin_initial();
        let ticket = self.page_ticket();
        if let Some(ticket) = ticket {
            self.effects.push(Effect::FetchPage {
                ticket,
                request: PageRequest::Latest { limit: self.config.page_size },
            });
        }
    }

    pub fn handle_event(&mut self, event: ViewportEvent) {
        match event {
            ViewportEvent::PageLoaded { ticket, request, result } => {
                self.on_page_loaded(&ticket, &request, result);
            }
            ViewportEvent::ContextLoaded { ticket, target, result } => {
                self.on_context_loaded(&ticket, &target, result);
            }
            ViewportEvent::TimerFired { ticket, task } => self.on_timer(&ticket, task),
            ViewportEvent::Live(message) => self.on_live(message),
        }
    }

    // -- rendering surface ------------------------------------------------

    pub fn set_viewport_height(&mut self, height: u32) {
        if height == self.viewport_height {
            return;
        }
        self.ensure_layout();
        let follow = self.follow.should_follow_appends() && self.edges().at_bottom;
        let anchor = if follow { None } else { self.capture_anchor(ScrollDirection::Down) };
        self.viewport_height = height;
        if self.follow.is_jumping() {
            self.clamp_offset();
        } else if follow {
            self.pin_to_bottom(false);
        } else if let Some(anchor) = anchor {
            self.restore_anchor(&anchor);
        }
    }

    /// Size query for a virtual index: the cached measurement, else the estimate.
    pub fn item_height(&self, index: VirtualIndex) -> Option<u32> {
        let message = self.offsets.position(index).and_then(|p| self.sequence.get(p))?;
        Some(self.heights.resolve(message, &self.config.estimates))
    }

    /// Feed an actual rendered height back into the cache and keep the
    /// content under the user still if the row above them changed size.
    pub fn record_measurement(&mut self, index: VirtualIndex, height: u32) {
        let Some(key) = self.offsets.position(index).and_then(|p| self.sequence.get(p)).map(Message::key)
        else {
            return;
        };
        self.ensure_layout();
        let pin = self.follow.should_follow_appends() && self.edges().at_bottom;
        let anchor = if pin || self.follow.is_jumping() || self.follow.pending_anchor().is_some() {
            None
        } else {
            self.capture_anchor(ScrollDirection::Down)
        };

        if !self.heights.record(key, height) {
            return;
        }
        self.layout.invalidate();
        self.ensure_layout();

        if self.follow.is_jumping() {
            self.clamp_offset();
        } else if let Some(pending) = self.follow.pending_anchor().cloned() {
            self.restore_anchor(&pending);
        } else if pin {
            self.pin_to_bottom(false);
        } else if let Some(anchor) = anchor {
            self.restore_anchor(&anchor);
        }
    }

    /// The surface finished a layout pass with the current sequence.
    pub fn layout_committed(&mut self) {
        if let Some(anchor) = self.follow.take_anchor() {
            self.restore_anchor(&anchor);
        }
        if let JumpPhase::AwaitingLayout { target } = self.jump.phase().clone() {
            self.land_jump(&target);
        }
    }

    pub fn user_scroll_by(&mut self, delta: i64) {
        self.ensure_layout();
        let max = signed(self.layout.max_offset(self.viewport_height));
        let next = (signed(self.scroll_offset) + delta).clamp(0, max.max(0));
        self.scroll_offset = u64::try_from(next).unwrap_or(0);

        let direction = match delta.signum() {
            -1 => ScrollDirection::Up,
            1 => ScrollDirection::Down,
            _ => return,
        };
        // The user took over positioning; a late anchor restore would fight them.
        self.follow.take_anchor();
        let edges = self.edges();
        self.follow.on_user_scroll(direction, edges);
        if self.follow.is_jumping() {
            return;
        }
        match direction {
            ScrollDirection::Up if edges.near_top => self.maybe_load_older(),
            ScrollDirection::Down if edges.at_bottom => self.maybe_load_newer(),
            _ => {}
        }
    }

    pub fn user_scroll_to(&mut self, offset: u64) {
        let delta = signed(offset) - signed(self.scroll_offset);
        self.user_scroll_by(delta);
    }

    pub fn user_scroll_to_bottom(&mut self) {
        self.ensure_layout();
        let max = self.layout.max_offset(self.viewport_height);
        // A zero delta would not register as "reaching the bottom".
        let delta = (signed(max) - signed(self.scroll_offset)).max(1);
        self.user_scroll_by(delta);
    }

    pub fn visible_rows(&mut self) -> Vec<VisibleRow<'_>> {
        self.rows_at(self.scroll_offset)
    }

    /// Rows intersecting a viewport placed at `offset`. Surfaces animating
    /// towards [`Self::scroll_offset`] draw intermediate frames with this.
    pub fn rows_at(&mut self, offset: u64) -> Vec<VisibleRow<'_>> {
        self.ensure_layout();
        let offset = offset.min(self.layout.max_offset(self.viewport_height));
        let range = self.layout.visible_range(offset, self.viewport_height);
        range
            .filter_map(|position| {
                let message = self.sequence.get(position)?;
                Some(VisibleRow {
                    index: self.offsets.virtual_index(position),
                    position,
                    top: signed(self.layout.top(position)) - signed(offset),
                    height: u32::try_from(self.layout.height(position)).unwrap_or(u32::MAX),
                    message,
                })
            })
            .collect()
    }

    // -- jumps -------------------------------------------------------------

    /// Navigate to `target`, loading a context window around it if needed.
    pub fn jump_to(&mut self, target: MessageKey) {
        let Some(conversation) = self.conversation.clone() else {
            return;
        };
        if let Some(previous) = self.jump.take_highlight() {
            self.effects.push(Effect::Highlight { key: previous, active: false });
        }
        let generation = self.jump.begin();
        self.follow.enter_jump();

        if let Some(position) = self.sequence.position(&target) {
            tracing::info!(%target, position, "jumping to loaded message");
            self.scroll_to_position(position, true);
            self.apply_highlight(target, generation);
            self.finish_jump();
            return;
        }

        let MessageKey::Server(server) = target.clone() else {
            tracing::warn!(%target, "jump target is local-only and not loaded");
            self.finish_jump();
            return;
        };
        tracing::info!(%target, "jump target not loaded; fetching context window");
        self.jump.set_phase(JumpPhase::Fetching { target });
        self.effects.push(Effect::FetchContext {
            ticket: Ticket { conversation, epoch: generation },
            target: server,
            before: self.config.context_before,
            after: self.config.context_after,
        });
    }

    fn on_context_loaded(
        &mut self,
        ticket: &Ticket,
        target: &ServerId,
        result: Result<ContextWindow, StoreError>,
    ) {
        if !self.is_active(&ticket.conversation) || !self.jump.is_current(ticket.epoch) {
            tracing::debug!(%target, "dropping stale context window");
            return;
        }
        let window = match result {
            Ok(window) => window,
            Err(err) => {
                tracing::warn!(%target, "context fetch failed: {err}");
                self.finish_jump();
                return;
            }
        };
        tracing::debug!(
            %target,
            len = window.messages.len(),
            has_more_before = window.has_more_before,
            has_more_after = window.has_more_after,
            "replacing window"
        );
        self.window_epoch += 1;
        self.source = window.messages;
        self.offsets.reset();
        self.rederive();
        self.pagination.reset(window.has_more_before, window.has_more_after);
        self.clamp_offset();
        self.jump.set_phase(JumpPhase::AwaitingLayout { target: MessageKey::Server(target.clone()) });
    }

    fn land_jump(&mut self, target: &MessageKey) {
        let Some(position) = self.sequence.position(target) else {
            tracing::warn!(%target, "jump target missing from context window");
            self.finish_jump();
            return;
        };
        self.scroll_to_position(position, false);
        self.jump.set_phase(JumpPhase::Correcting { target: target.clone() });
        self.schedule(ScheduledTask::CorrectiveScroll, self.config.corrective_delay());
    }

    fn on_timer(&mut self, ticket: &Ticket, task: ScheduledTask) {
        if !self.is_active(&ticket.conversation) {
            return;
        }
        match task {
            ScheduledTask::CorrectiveScroll => {
                if !self.jump.is_current(ticket.epoch) {
                    return;
                }
                let JumpPhase::Correcting { target } = self.jump.phase().clone() else {
                    return;
                };
                if let Some(position) = self.sequence.position(&target) {
                    self.scroll_to_position(position, false);
                    self.apply_highlight(target, ticket.epoch);
                } else {
                    tracing::warn!(%target, "jump target vanished before corrective pass");
                }
                self.finish_jump();
            }
            ScheduledTask::ClearHighlight => {
                if let Some(key) = self.jump.expire_highlight(ticket.epoch) {
                    self.effects.push(Effect::Highlight { key, active: false });
                }
            }
        }
    }

    fn apply_highlight(&mut self, key: MessageKey, generation: u64) {
        self.jump.set_highlight(key.clone());
        self.effects.push(Effect::Highlight { key, active: true });
        if let Some(conversation) = self.conversation.clone() {
            self.effects.push(Effect::Schedule {
                ticket: Ticket { conversation, epoch: generation },
                task: ScheduledTask::ClearHighlight,
                delay: self.config.highlight_duration(),
            });
        }
    }

    fn finish_jump(&mut self) {
        self.jump.finish();
        let edges = self.edges();
        self.follow.exit_jump(edges);
        self.pagination.mark_mounted(Instant::now());
    }

    fn schedule(&mut self, task: ScheduledTask, delay: std::time::Duration) {
        if let Some(conversation) = self.conversation.clone() {
            let ticket = Ticket { conversation, epoch: self.jump.generation() };
            self.effects.push(Effect::Schedule { ticket, task, delay });
        }
    }

    // -- pagination --------------------------------------------------------

    fn maybe_load_older(&mut self) {
        if let Err(blocked) = self.pagination.try_begin(PageDirection::Older, Instant::now()) {
            tracing::trace!(?blocked, "older page not requested");
            return;
        }
        if self.sequence.is_empty() {
            // The first page never arrived; ask for it again.
            if let Some(ticket) = self.page_ticket() {
                tracing::debug!("retrying latest page");
                self.effects.push(Effect::FetchPage {
                    ticket,
                    request: PageRequest::Latest { limit: self.config.page_size },
                });
            }
            return;
        }
        let before = self.sequence.items().iter().find_map(|m| m.id.server_id().cloned());
        let (Some(ticket), Some(before)) = (self.page_ticket(), before) else {
            self.pagination.complete(PageDirection::Older, None, Instant::now());
            return;
        };
        tracing::debug!(%before, "requesting older page");
        self.effects.push(Effect::FetchPage {
            ticket,
            request: PageRequest::Older { before, limit: self.config.page_size },
        });
    }

    // Newer pages only load once the user is caught up at the bottom, which
    // is how a jumped-to window is extended forward.
    fn maybe_load_newer(&mut self) {
        if let Err(blocked) = self.pagination.try_begin(PageDirection::Newer, Instant::now()) {
            tracing::trace!(?blocked, "newer page not requested");
            return;
        }
        let after = self.sequence.items().iter().rev().find_map(|m| m.id.server_id().cloned());
        let (Some(ticket), Some(after)) = (self.page_ticket(), after) else {
            self.pagination.complete(PageDirection::Newer, None, Instant::now());
            return;
        };
        tracing::debug!(%after, "requesting newer page");
        self.effects.push(Effect::FetchPage {
            ticket,
            request: PageRequest::Newer { after, limit: self.config.page_size },
        });
    }

    fn on_page_loaded(
        &mut self,
        ticket: &Ticket,
        request: &PageRequest,
        result: Result<Vec<Message>, StoreError>,
    ) {
        if !self.is_active(&ticket.conversation) || ticket.epoch != self.window_epoch {
            tracing::debug!(?request, "dropping stale page");
            return;
        }
        let direction = request.direction();
        let now = Instant::now();
        let messages = match result {
            Ok(messages) => messages,
            Err(err) => {
                tracing::warn!(?request, "page load failed: {err}");
                self.pagination.complete(direction, None, now);
                if matches!(request, PageRequest::Latest { .. }) {
                    // Nothing to position, but scrolling must be able to retry.
                    self.pagination.mark_mounted(now);
                }
                return;
            }
        };
        let has_more = messages.len() >= request.limit();
        self.pagination.complete(direction, Some(has_more), now);

        match request {
            PageRequest::Latest { .. } => self.apply_initial(messages, now),
            PageRequest::Older { .. } => self.apply_prepend(messages),
            PageRequest::Newer { .. } => self.apply_append(messages),
        }
    }

    fn apply_initial(&mut self, messages: Vec<Message>, now: Instant) {
        tracing::debug!(len = messages.len(), "initial page loaded");
        self.source = messages;
        self.offsets.reset();
        self.rederive();
        self.pin_to_bottom(false);
        self.pagination.mark_mounted(now);
    }

    fn apply_prepend(&mut self, messages: Vec<Message>) {
        let anchor =
            if self.follow.is_jumping() { None } else { self.capture_anchor(ScrollDirection::Up) };
        let mut merged = messages;
        merged.append(&mut self.source);
        self.source = merged;

        match self.rederive() {
            SequenceChange::Prepended(leading) => {
                tracing::debug!(leading, first_index = self.first_index(), "prepended history");
                if let Some(anchor) = anchor {
                    self.restore_anchor(&anchor);
                    self.follow.hold_anchor(anchor);
                }
            }
            change => tracing::debug!(?change, "older page added no leading rows"),
        }
    }

    fn apply_append(&mut self, messages: Vec<Message>) {
        for message in messages {
            self.upsert(message);
        }
        let change = self.rederive();
        self.after_tail_change(change);
    }

    fn on_live(&mut self, message: Message) {
        if !self.is_active(&message.conversation) {
            return;
        }
        let known = self.source.iter().any(|m| m.id.same_message(&message.id));
        let local_only = message.id.server_id().is_none();
        // A historical window is not contiguous with live traffic; new messages
        // arrive through newer paging instead.
        if !known && !local_only && self.pagination.has_more(PageDirection::Newer) {
            tracing::trace!(key = %message.key(), "live message beyond loaded window");
            return;
        }
        self.upsert(message);
        let change = self.rederive();
        self.after_tail_change(change);
    }

    fn after_tail_change(&mut self, change: SequenceChange) {
        if let SequenceChange::Appended(added) = change {
            if self.follow.should_follow_appends() {
                tracing::trace!(added, "following appended messages");
                self.pin_to_bottom(true);
            } else {
                let edges = self.edges();
                self.follow.on_position_changed(edges);
            }
        } else if change == SequenceChange::Reset {
            self.clamp_offset();
        }
    }

    /// Replace a known message in place (identity migrates) or append it.
    fn upsert(&mut self, message: Message) {
        if let Some(existing) = self.source.iter_mut().find(|m| m.id.same_message(&message.id)) {
            let mut id = existing.id.clone();
            if let Some(server) = message.id.server_id() {
                id.assign_server(server.clone());
            }
            *existing = Message { id, ..message };
        } else {
            self.source.push(message);
        }
    }

    // -- layout helpers ----------------------------------------------------

    fn rederive(&mut self) -> SequenceChange {
        self.sequence = dedup(&self.source);
        self.layout.invalidate();
        self.offsets.observe(&self.sequence)
    }

    fn ensure_layout(&mut self) {
        self.layout.ensure(&self.sequence, &self.heights, &self.config.estimates);
    }

    fn max_offset(&mut self) -> u64 {
        self.ensure_layout();
        self.layout.max_offset(self.viewport_height)
    }

    fn clamp_offset(&mut self) {
        let max = self.max_offset();
        self.scroll_offset = self.scroll_offset.min(max);
    }

    fn capture_anchor(&mut self, direction: ScrollDirection) -> Option<ScrollAnchor> {
        self.ensure_layout();
        let position = self.layout.position_at(self.scroll_offset)?;
        let message = self.sequence.get(position)?;
        Some(ScrollAnchor {
            key: message.key(),
            offset: signed(self.layout.top(position)) - signed(self.scroll_offset),
            direction,
        })
    }

    fn restore_anchor(&mut self, anchor: &ScrollAnchor) {
        let Some(position) = self.sequence.position(&anchor.key) else {
            return;
        };
        let max = signed(self.max_offset());
        let target = (signed(self.layout.top(position)) - anchor.offset).clamp(0, max.max(0));
        let target = u64::try_from(target).unwrap_or(0);
        if target == self.scroll_offset {
            return;
        }
        self.scroll_offset = target;
        self.effects.push(Effect::Scroll(ScrollCommand::Anchor {
            index: self.offsets.virtual_index(position),
            offset: anchor.offset,
        }));
    }

    fn pin_to_bottom(&mut self, smooth: bool) {
        let max = self.max_offset();
        if self.scroll_offset == max {
            return;
        }
        self.scroll_offset = max;
        self.effects.push(Effect::Scroll(ScrollCommand::ToBottom { smooth }));
    }

    fn scroll_to_position(&mut self, position: usize, smooth: bool) {
        self.ensure_layout();
        let align = JumpController::alignment(
            position,
            self.sequence.len(),
            self.config.start_align_fraction,
        );
        let top = signed(self.layout.top(position));
        let height = signed(self.layout.height(position));
        let viewport = i64::from(self.viewport_height);
        let target = match align {
            Align::Start => top,
            Align::Center => top + height / 2 - viewport / 2,
            Align::End => top + height - viewport,
        };
        let max = signed(self.layout.max_offset(self.viewport_height));
        self.scroll_offset = u64::try_from(target.clamp(0, max.max(0))).unwrap_or(0);
        self.effects.push(Effect::Scroll(ScrollCommand::ToIndex {
            index: self.offsets.virtual_index(position),
            align,
            smooth,
        }));
    }

    fn is_active(&self, conversation: &ConversationId) -> bool {
        self.conversation.as_ref() == Some(conversation)
    }

    fn page_ticket(&self) -> Option<Ticket> {
        let conversation = self.conversation.clone()?;
        Some(Ticket { conversation, epoch: self.window_epoch })
    }
}

fn signed(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
