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

mod header;
mod message;
pub mod theme;
mod viewport;

pub use message::{RowState, measure, render_message};

use crate::app::App;
use crate::viewport::PageDirection;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const FOOTER_PAD: u16 = 2;
const FOOTER_SPINNER_FRAMES: &[char] = &[
    '\u{280B}', '\u{2819}', '\u{2839}', '\u{2838}', '\u{283C}', '\u{2834}', '\u{2826}', '\u{2827}',
    '\u{2807}', '\u{280F}',
];

pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    if area.height < 5 {
        // Too small for chrome: the message list gets everything.
        viewport::render(frame, area, app);
        return;
    }
    let [header, header_sep, body, footer_sep, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);

    header::render(frame, header, app);
    render_separator(frame, header_sep);
    viewport::render(frame, body, app);
    render_separator(frame, footer_sep);
    render_footer(frame, footer, app);
}

fn render_separator(frame: &mut Frame, area: Rect) {
    if area.height == 0 {
        return;
    }
    let sep_str = theme::SEPARATOR_CHAR.repeat(usize::from(area.width));
    let line = Line::from(Span::styled(sep_str, Style::default().fg(theme::DIM)));
    frame.render_widget(Paragraph::new(line), area);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let padded = Rect {
        x: area.x + FOOTER_PAD,
        y: area.y,
        width: area.width.saturating_sub(FOOTER_PAD * 2),
        height: area.height,
    };

    let hints = vec![
        Span::styled("↑↓ PgUp PgDn", Style::default().fg(Color::White)),
        Span::styled(" scroll  ", Style::default().fg(theme::DIM)),
        Span::styled("End", Style::default().fg(Color::White)),
        Span::styled(" latest  ", Style::default().fg(theme::DIM)),
        Span::styled("r", Style::default().fg(Color::White)),
        Span::styled(" jump to reply  ", Style::default().fg(theme::DIM)),
        Span::styled("s", Style::default().fg(Color::White)),
        Span::styled(" send  ", Style::default().fg(theme::DIM)),
        Span::styled("Tab", Style::default().fg(Color::White)),
        Span::styled(" switch  ", Style::default().fg(theme::DIM)),
        Span::styled("q", Style::default().fg(Color::White)),
        Span::styled(" quit", Style::default().fg(theme::DIM)),
    ];

    let (status, color) = footer_status(app);
    let max_status = usize::from(padded.width / 2);
    let Some(status) = fit_footer_status(&status, max_status) else {
        frame.render_widget(Paragraph::new(Line::from(hints)), padded);
        return;
    };
    let status_width = u16::try_from(UnicodeWidthStr::width(status.as_str())).unwrap_or(padded.width);
    let [left, right] =
        Layout::horizontal([Constraint::Min(0), Constraint::Length(status_width)]).areas(padded);
    frame.render_widget(Paragraph::new(Line::from(hints)), left);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(status, Style::default().fg(color))))
            .alignment(Alignment::Right),
        right,
    );
}

/// Right-hand footer text: a send/jump notice wins over the loading spinner.
fn footer_status(app: &App) -> (String, Color) {
    if let Some(notice) = &app.notice {
        return (notice.clone(), Color::Red);
    }
    let pagination = app.viewport.pagination();
    let loading = [PageDirection::Older, PageDirection::Newer]
        .into_iter()
        .filter(|d| pagination.is_loading(*d))
        .map(|d| match d {
            PageDirection::Older => "older",
            PageDirection::Newer => "newer",
        })
        .collect::<Vec<_>>();
    if loading.is_empty() {
        return (String::new(), theme::DIM);
    }
    let ch = FOOTER_SPINNER_FRAMES[app.spinner_frame % FOOTER_SPINNER_FRAMES.len()];
    (format!("{ch} loading {}", loading.join(" + ")), theme::RUST_ORANGE)
}

fn fit_footer_status(text: &str, max_width: usize) -> Option<String> {
    if max_width == 0 || text.trim().is_empty() {
        return None;
    }
    if UnicodeWidthStr::width(text) <= max_width {
        return Some(text.to_owned());
    }
    if max_width <= 3 {
        return Some(".".repeat(max_width));
    }

    let mut fitted = String::new();
    let mut width: usize = 0;
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if width.saturating_add(ch_width).saturating_add(3) > max_width {
            break;
        }
        fitted.push(ch);
        width = width.saturating_add(ch_width);
    }
    fitted.push_str("...");
    Some(fitted)
}
