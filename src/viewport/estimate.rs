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

use crate::model::{ContentKind, Message};
use serde::{Deserialize, Serialize};

/// Default height per content kind, used until a real measurement exists.
///
/// Reply and forwarded messages render a quote/attribution header, so their
/// entries win over the entry for the message's base kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimateTable {
    pub text: u32,
    pub image: u32,
    pub sticker: u32,
    pub file: u32,
    pub video: u32,
    pub album: u32,
    pub forwarded: u32,
    pub reply: u32,
    pub system: u32,
}

impl Default for EstimateTable {
    fn default() -> Self {
        Self::pixels()
    }
}

impl EstimateTable {
    pub const fn pixels() -> Self {
        Self {
            text: 64,
            image: 260,
            sticker: 150,
            file: 76,
            video: 260,
            album: 340,
            forwarded: 112,
            reply: 104,
            system: 36,
        }
    }

    /// One unit per terminal row.
    pub const fn terminal_rows() -> Self {
        Self {
            text: 3,
            image: 8,
            sticker: 6,
            file: 3,
            video: 8,
            album: 10,
            forwarded: 4,
            reply: 4,
            system: 1,
        }
    }

    pub fn for_kind(&self, kind: ContentKind) -> u32 {
        match kind {
            ContentKind::Text => self.text,
            ContentKind::Image => self.image,
            ContentKind::Sticker => self.sticker,
            ContentKind::File => self.file,
            ContentKind::Video => self.video,
            ContentKind::Album => self.album,
            ContentKind::Forwarded => self.forwarded,
            ContentKind::Reply => self.reply,
            ContentKind::System => self.system,
        }
    }

    pub fn estimate(&self, message: &Message) -> u32 {
        let height = if message.is_reply() {
            self.reply
        } else if message.is_forwarded() {
            self.forwarded
        } else {
            self.for_kind(message.kind)
        };
        height.max(1)
    }
}
