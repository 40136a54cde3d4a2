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

use crate::model::{ConversationId, ServerId};

/// Failures reported by a [`crate::store::MessageStore`].
///
/// The engine never propagates these; it logs them and falls back to the
/// state it was in before the request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("message store unavailable: {0}")]
    Unavailable(String),
    #[error("unknown conversation {0}")]
    UnknownConversation(ConversationId),
    #[error("unknown message {0}")]
    UnknownMessage(ServerId),
    #[error("message store request timed out")]
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppError {
    #[error("Invalid configuration file")]
    InvalidConfig,
    #[error("Conversation not found")]
    UnknownConversation,
    #[error("Terminal unavailable")]
    TerminalUnavailable,
}

impl AppError {
    pub const INVALID_CONFIG_EXIT_CODE: i32 = 20;
    pub const UNKNOWN_CONVERSATION_EXIT_CODE: i32 = 21;
    pub const TERMINAL_UNAVAILABLE_EXIT_CODE: i32 = 22;

    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidConfig => Self::INVALID_CONFIG_EXIT_CODE,
            Self::UnknownConversation => Self::UNKNOWN_CONVERSATION_EXIT_CODE,
            Self::TerminalUnavailable => Self::TERMINAL_UNAVAILABLE_EXIT_CODE,
        }
    }

    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidConfig => {
                "The configuration file could not be parsed. Fix or remove it and retry."
            }
            Self::UnknownConversation => "The requested conversation does not exist.",
            Self::TerminalUnavailable => {
                "Could not take over the terminal. Run chat-viewport from an interactive shell."
            }
        }
    }
}
