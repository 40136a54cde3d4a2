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

use crate::error::AppError;
use crate::viewport::EstimateTable;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_FIRST_INDEX: i64 = 100_000;
pub const DEFAULT_HEIGHT_TOLERANCE: u32 = 10;
pub const DEFAULT_TOP_THRESHOLD: u32 = 240;
pub const DEFAULT_BOTTOM_THRESHOLD: u32 = 4;
pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 200;
pub const DEFAULT_COOLDOWN_MS: u64 = 250;
pub const DEFAULT_CONTEXT_BEFORE: usize = 50;
pub const DEFAULT_CONTEXT_AFTER: usize = 50;
pub const DEFAULT_CORRECTIVE_DELAY_MS: u64 = 150;
pub const DEFAULT_HIGHLIGHT_MS: u64 = 2_000;
pub const DEFAULT_START_ALIGN_FRACTION: f32 = 0.1;

const CONFIG_DIR_NAME: &str = "chat-viewport";
const CONFIG_FILE: &str = "config.json";

/// Tunables for the viewport engine. Heights and thresholds share one unit
/// (pixels by default, rows for the terminal preset).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub first_index: i64,
    pub height_tolerance: u32,
    /// Distance from the top edge that counts as "near the top" for paging.
    pub top_threshold: u32,
    /// Slack at the bottom edge that still counts as "at bottom".
    pub bottom_threshold: u32,
    pub page_size: usize,
    pub settle_delay_ms: u64,
    pub cooldown_ms: u64,
    pub context_before: usize,
    pub context_after: usize,
    pub corrective_delay_ms: u64,
    pub highlight_ms: u64,
    pub start_align_fraction: f32,
    pub estimates: EstimateTable,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            first_index: DEFAULT_FIRST_INDEX,
            height_tolerance: DEFAULT_HEIGHT_TOLERANCE,
            top_threshold: DEFAULT_TOP_THRESHOLD,
            bottom_threshold: DEFAULT_BOTTOM_THRESHOLD,
            page_size: DEFAULT_PAGE_SIZE,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            context_before: DEFAULT_CONTEXT_BEFORE,
            context_after: DEFAULT_CONTEXT_AFTER,
            corrective_delay_ms: DEFAULT_CORRECTIVE_DELAY_MS,
            highlight_ms: DEFAULT_HIGHLIGHT_MS,
            start_align_fraction: DEFAULT_START_ALIGN_FRACTION,
            estimates: EstimateTable::pixels(),
        }
    }
}

impl ViewportConfig {
    /// Preset for a terminal surface where one height unit is one row.
    pub fn terminal() -> Self {
        Self {
            height_tolerance: 0,
            top_threshold: 3,
            bottom_threshold: 0,
            estimates: EstimateTable::terminal_rows(),
            ..Self::default()
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn corrective_delay(&self) -> Duration {
        Duration::from_millis(self.corrective_delay_ms)
    }

    pub fn highlight_duration(&self) -> Duration {
        Duration::from_millis(self.highlight_ms)
    }
}

/// Settings for the synthetic in-memory conversations the binary serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub conversations: usize,
    pub messages_per_conversation: usize,
    pub latency_ms: u64,
    /// Interval between synthetic incoming messages; 0 disables live traffic.
    pub live_interval_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            conversations: 3,
            messages_per_conversation: 2_000,
            latency_ms: 250,
            live_interval_ms: 4_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "ViewportConfig::terminal")]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { viewport: ViewportConfig::terminal(), demo: DemoConfig::default() }
    }
}

impl AppConfig {
    /// Load from an explicit path, or from the user config dir when a file
    /// exists there. A missing default file yields the built-in defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read config {}: {e}", path.display()))?;
        let config = serde_json::from_str::<Self>(&content).map_err(|e| {
            tracing::error!(path = %path.display(), "invalid config: {e}");
            anyhow::Error::new(AppError::InvalidConfig)
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE))
}
