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
use crate::ui::theme;
use crate::viewport::FollowMode;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

const HEADER_PAD: u16 = 2;

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let padded = Rect {
        x: area.x + HEADER_PAD,
        y: area.y,
        width: area.width.saturating_sub(HEADER_PAD * 2),
        height: area.height,
    };

    let sep = || Span::styled("  \u{2502}  ", Style::default().fg(theme::DIM));
    let conversation = app.active_conversation().map_or("-", |c| c.as_str()).to_owned();
    let (mode, mode_color) = mode_badge(app.viewport.follow_mode());

    let spans = vec![
        Span::styled(
            "chat-viewport",
            Style::default().fg(theme::RUST_ORANGE).add_modifier(Modifier::BOLD),
        ),
        sep(),
        Span::styled(format!("#{conversation}"), Style::default().fg(Color::White)),
        Span::styled(
            format!(" ({}/{})", app.active + 1, app.conversations.len()),
            Style::default().fg(theme::DIM),
        ),
        sep(),
        Span::styled(
            format!("{} loaded, first #{}", app.viewport.sequence().len(), app.viewport.first_index()),
            Style::default().fg(theme::DIM),
        ),
        sep(),
        Span::styled(mode, Style::default().fg(mode_color).add_modifier(Modifier::BOLD)),
    ];

    frame.render_widget(Paragraph::new(Line::from(spans)), padded);
}

fn mode_badge(mode: FollowMode) -> (&'static str, Color) {
    match mode {
        FollowMode::Following => ("FOLLOWING", theme::MODE_FOLLOWING),
        FollowMode::Holding => ("HOLDING", theme::MODE_HOLDING),
        FollowMode::Jumping => ("JUMPING", theme::MODE_JUMPING),
    }
}
