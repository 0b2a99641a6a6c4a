/*
    spotify-rainbow-rs | Rust CLI tool to sort playlists into rainbow order.
    Copyright (C) 2025  Israel Alberto Roldan Vega

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use log::warn;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BATCH_SIZE: usize = 8;
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(100);

/// Tuning knobs for artwork analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RainbowConfig {
    /// How many covers are analyzed concurrently in one wave.
    pub batch_size: usize,
    /// Pause between waves.
    pub batch_delay: Duration,
}

impl Default for RainbowConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: DEFAULT_BATCH_DELAY,
        }
    }
}

impl RainbowConfig {
    /// Defaults overridden by `RAINBOW_BATCH_SIZE` and `RAINBOW_BATCH_DELAY_MS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(size) = parse_var::<usize>("RAINBOW_BATCH_SIZE") {
            config = config.with_batch_size(size);
        }
        if let Some(ms) = parse_var::<u64>("RAINBOW_BATCH_DELAY_MS") {
            config.batch_delay = Duration::from_millis(ms);
        }
        config
    }

    /// Sets the wave size. Zero is clamped to one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_batch_delay(mut self, batch_delay: Duration) -> Self {
        self.batch_delay = batch_delay;
        self
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid value for {}: {:?}", name, raw);
            None
        }
    }
}
