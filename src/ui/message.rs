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

use crate::model::{ContentKind, Linkage, Message};
use crate::ui::theme;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Paragraph, Wrap};

const MS_PER_MINUTE: u64 = 60_000;
const MINUTES_PER_DAY: u64 = 24 * 60;

/// Per-row rendering inputs that are not part of the message itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowState {
    pub media_loaded: bool,
    pub highlighted: bool,
}

/// Render one message into lines. Every kind is handled explicitly so a new
/// kind cannot silently fall back to text.
pub fn render_message(message: &Message, state: RowState) -> Vec<Line<'static>> {
    let mut out = Vec::new();

    if message.kind == ContentKind::System {
        out.push(Line::from(Span::styled(
            format!("· {} ·", message.body),
            Style::default().fg(theme::SYSTEM).add_modifier(Modifier::ITALIC),
        )));
        return decorate(out, state);
    }

    out.push(header_line(message));
    match &message.linkage {
        Some(Linkage::Reply { to }) => out.push(Line::from(Span::styled(
            format!("│ ↳ reply to {to}  (r to jump)"),
            Style::default().fg(theme::QUOTE),
        ))),
        Some(Linkage::Forward { from }) => out.push(Line::from(Span::styled(
            format!("│ ⇢ forwarded from #{from}"),
            Style::default().fg(theme::FORWARD).add_modifier(Modifier::ITALIC),
        ))),
        None => {}
    }

    match message.kind {
        ContentKind::Text | ContentKind::Reply | ContentKind::Forwarded => {
            out.push(Line::from(message.body.clone()));
        }
        ContentKind::File => {
            let (icon, _) = theme::media_label(message.kind);
            out.push(Line::from(vec![
                Span::styled(format!("{icon} "), Style::default().fg(theme::MEDIA_FRAME)),
                Span::styled(message.body.clone(), Style::default().add_modifier(Modifier::UNDERLINED)),
            ]));
        }
        ContentKind::Image | ContentKind::Sticker | ContentKind::Video | ContentKind::Album => {
            render_media(message, state.media_loaded, &mut out);
        }
        ContentKind::System => {}
    }

    // Blank separator between messages
    out.push(Line::default());
    decorate(out, state)
}

/// Wrapped paragraph for a message; its line count is the row's height.
pub fn paragraph(message: &Message, state: RowState) -> Paragraph<'static> {
    Paragraph::new(Text::from(render_message(message, state))).wrap(Wrap { trim: false })
}

/// Rendered height in rows at `width`.
pub fn measure(message: &Message, state: RowState, width: u16) -> u32 {
    let rows = paragraph(message, state).line_count(width);
    u32::try_from(rows).unwrap_or(u32::MAX).max(1)
}

fn header_line(message: &Message) -> Line<'static> {
    let minutes = (message.created_at_ms / MS_PER_MINUTE) % MINUTES_PER_DAY;
    Line::from(vec![
        Span::styled(
            message.key().to_string(),
            Style::default().fg(theme::AUTHOR).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {:02}:{:02}", minutes / 60, minutes % 60),
            Style::default().fg(theme::DIM),
        ),
    ])
}

fn render_media(message: &Message, loaded: bool, out: &mut Vec<Line<'static>>) {
    let (icon, label) = theme::media_label(message.kind);
    let frame = Style::default().fg(theme::MEDIA_FRAME);
    if loaded {
        let rows = theme::media_rows(message.kind);
        out.push(Line::from(Span::styled(format!("┌ {icon} {label} ┐"), frame)));
        for _ in 0..rows.saturating_sub(2) {
            out.push(Line::from(Span::styled("│ ░░░░░░░░░░░░░░ │", frame)));
        }
        out.push(Line::from(Span::styled("└────────────────┘", frame)));
    } else {
        out.push(Line::from(Span::styled(
            format!("{icon} {label} loading…"),
            Style::default().fg(theme::DIM),
        )));
    }
    if !message.body.is_empty() {
        out.push(Line::from(Span::styled(message.body.clone(), Style::default().fg(theme::DIM))));
    }
}

fn decorate(lines: Vec<Line<'static>>, state: RowState) -> Vec<Line<'static>> {
    if !state.highlighted {
        return lines;
    }
    lines.into_iter().map(|line| line.patch_style(Style::default().bg(theme::HIGHLIGHT_BG))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConversationId, MessageId, ServerId};
    use pretty_assertions::assert_eq;

    fn message(kind: ContentKind, body: &str) -> Message {
        Message::new(
            MessageId::server(ServerId::new("m7")),
            ConversationId::new("general"),
            // 01:30 UTC
            90 * MS_PER_MINUTE,
            kind,
            body,
        )
    }

    fn text_of(lines: &[Line<'_>]) -> Vec<String> {
        lines.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn text_row_has_header_body_and_separator() {
        let lines = render_message(&message(ContentKind::Text, "hello"), RowState::default());
        assert_eq!(text_of(&lines), vec!["m7  01:30", "hello", ""]);
    }

    #[test]
    fn reply_row_shows_quote_line() {
        let reply = message(ContentKind::Reply, "agreed")
            .with_linkage(Linkage::Reply { to: ServerId::new("m3") });
        let lines = render_message(&reply, RowState::default());
        assert!(lines[1].to_string().contains("reply to m3"));
    }

    #[test]
    fn media_row_grows_once_loaded() {
        let image = message(ContentKind::Image, "");
        let loading = measure(&image, RowState::default(), 40);
        let loaded = measure(&image, RowState { media_loaded: true, highlighted: false }, 40);
        assert_eq!(loading, 3);
        assert_eq!(loaded, 8);
    }

    #[test]
    fn long_body_wraps_into_more_rows() {
        let long = message(ContentKind::Text, &"word ".repeat(40));
        assert!(measure(&long, RowState::default(), 20) > measure(&long, RowState::default(), 200));
    }

    #[test]
    fn system_row_is_one_line() {
        let system = message(ContentKind::System, "ana joined the conversation");
        assert_eq!(measure(&system, RowState::default(), 80), 1);
    }

    #[test]
    fn highlight_does_not_change_height() {
        let msg = message(ContentKind::Text, "hello");
        let plain = measure(&msg, RowState::default(), 40);
        let lit = measure(&msg, RowState { media_loaded: false, highlighted: true }, 40);
        assert_eq!(plain, lit);
    }
}
