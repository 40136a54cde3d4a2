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

pub mod app;
pub mod config;
pub mod error;
pub mod model;
pub mod store;
pub mod ui;
pub mod viewport;

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "chat-viewport", about = "Scroll-stable chat viewport over synthetic conversations")]
pub struct Cli {
    /// Config file (defaults to the user config dir)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Conversation to open first (defaults to the first one)
    #[arg(long, short)]
    pub conversation: Option<String>,

    /// Server message id to jump to once the conversation has loaded
    #[arg(long, value_name = "MESSAGE_ID")]
    pub jump: Option<String>,

    /// Simulated store latency in milliseconds (overrides config)
    #[arg(long, value_name = "MS")]
    pub latency_ms: Option<u64>,

    /// Disable synthetic incoming messages
    #[arg(long)]
    pub no_live: bool,

    /// Write tracing diagnostics to a file (disabled unless explicitly set)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Tracing filter directives (example: `info,chat_viewport::viewport=debug`)
    #[arg(long, value_name = "FILTER")]
    pub log_filter: Option<String>,

    /// Append to `--log-file` instead of truncating on startup
    #[arg(long)]
    pub log_append: bool,
}
