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

use crate::model::ContentKind;
use ratatui::style::Color;

// Accent
pub const RUST_ORANGE: Color = Color::Rgb(244, 118, 0);

// UI chrome
pub const DIM: Color = Color::DarkGray;
pub const SEPARATOR_CHAR: &str = "─";

// Row decoration
pub const AUTHOR: Color = Color::White;
pub const QUOTE: Color = Color::Cyan;
pub const FORWARD: Color = Color::Magenta;
pub const SYSTEM: Color = Color::Yellow;
pub const MEDIA_FRAME: Color = Color::Blue;

/// Background of the jump target while its highlight is active.
pub const HIGHLIGHT_BG: Color = Color::Rgb(60, 52, 20);

// Follow mode badges
pub const MODE_FOLLOWING: Color = Color::Green;
pub const MODE_HOLDING: Color = Color::Yellow;
pub const MODE_JUMPING: Color = Color::Cyan;

/// Icon + label for attachment kinds. Monochrome Unicode symbols.
pub fn media_label(kind: ContentKind) -> (&'static str, &'static str) {
    match kind {
        ContentKind::Image => ("▣", "Image"),
        ContentKind::Sticker => ("✿", "Sticker"),
        ContentKind::Video => ("▶", "Video"),
        ContentKind::Album => ("▤", "Album"),
        ContentKind::File => ("⎙", "File"),
        ContentKind::Text
        | ContentKind::Forwarded
        | ContentKind::Reply
        | ContentKind::System => ("○", "Message"),
    }
}

/// Rows an attachment occupies once loaded.
pub fn media_rows(kind: ContentKind) -> usize {
    match kind {
        ContentKind::Image | ContentKind::Video => 6,
        ContentKind::Sticker => 4,
        ContentKind::Album => 8,
        _ => 0,
    }
}
