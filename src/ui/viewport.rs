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

use crate::app::App;
use crate::model::Message;
use crate::ui::message::{self, RowState};
use crate::ui::theme;
use crate::viewport::{PageDirection, VirtualIndex};
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::Style;
use ratatui::widgets::Paragraph;

/// Measuring can move the offset, which can bring new rows into view.
const MAX_MEASURE_PASSES: usize = 4;

pub fn render(frame: &mut Frame, area: Rect, app: &mut App) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    app.viewport.set_viewport_height(u32::from(area.height));
    measure_visible(app, area.width);
    app.viewport.layout_committed();

    let offset = app.display_offset();
    let highlighted = app.viewport.highlighted().cloned();
    let rows: Vec<(i64, u32, Message)> = app
        .viewport
        .rows_at(offset)
        .iter()
        .map(|row| (row.top, row.height, row.message.clone()))
        .collect();

    if rows.is_empty() {
        let text = if app.viewport.pagination().is_loading(PageDirection::Older) {
            "Loading messages…"
        } else {
            "No messages yet"
        };
        let y = area.y + area.height / 2;
        frame.render_widget(
            Paragraph::new(text).style(Style::default().fg(theme::DIM)).alignment(Alignment::Center),
            Rect { y, height: 1, ..area },
        );
        return;
    }

    // Short conversations sit on the bottom edge, like a chat.
    let content = app.viewport.content_height();
    let pad = i64::from(area.height).saturating_sub(i64::try_from(content).unwrap_or(i64::MAX)).max(0);

    for (top, height, message) in rows {
        let key = message.key();
        let state = RowState {
            media_loaded: app.media.is_loaded(&key),
            highlighted: highlighted.as_ref() == Some(&key),
        };
        let top = top + pad;
        let clipped = u16::try_from((-top).max(0)).unwrap_or(u16::MAX);
        let y = i64::from(area.y) + top.max(0);
        let visible = (i64::from(height) - i64::from(clipped)).min(i64::from(area.bottom()) - y);
        let (Ok(y), Ok(visible)) = (u16::try_from(y), u16::try_from(visible)) else {
            continue;
        };
        if visible == 0 {
            continue;
        }
        let rect = Rect { x: area.x, y, width: area.width, height: visible };
        frame.render_widget(message::paragraph(&message, state).scroll((clipped, 0)), rect);
    }
}

/// Measure every row in view and feed heights that differ back to the engine.
fn measure_visible(app: &mut App, width: u16) {
    for _ in 0..MAX_MEASURE_PASSES {
        let rows: Vec<(VirtualIndex, Message)> = app
            .viewport
            .visible_rows()
            .iter()
            .map(|row| (row.index, row.message.clone()))
            .collect();
        let mut changed = false;
        for (index, message) in rows {
            let key = message.key();
            if message.kind.has_media() && app.media.request(&key) {
                app.media_wanted.push(key.clone());
            }
            let state = RowState { media_loaded: app.media.is_loaded(&key), highlighted: false };
            let height = message::measure(&message, state, width);
            if app.viewport.heights().get(&key) != Some(height) {
                app.viewport.record_measurement(index, height);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}
