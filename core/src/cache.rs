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

use crate::color::Hsl;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

/// Memoized artwork colors keyed by image URL.
///
/// Album art URLs are content-addressed, so entries never go stale and the
/// cache may be shared across any number of sort operations. Concurrent
/// lookups of the same URL share a single computation; failed computations
/// are not stored and will be retried by the next caller.
#[derive(Debug, Default)]
pub struct ColorCache {
    entries: Mutex<HashMap<String, Arc<OnceCell<Hsl>>>>,
}

impl ColorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, url: &str) -> Option<Hsl> {
        let entries = self.entries.lock().await;
        entries.get(url).and_then(|cell| cell.get().copied())
    }

    /// Number of URLs with a computed color.
    pub async fn len(&self) -> usize {
        let entries = self.entries.lock().await;
        entries.values().filter(|cell| cell.initialized()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Returns the cached color for `url`, computing it with `init` on a miss.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, url: &str, init: F) -> Result<Hsl, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Hsl, E>>,
    {
        let cell = self.cell(url).await;
        cell.get_or_try_init(init).await.copied()
    }

    async fn cell(&self, url: &str) -> Arc<OnceCell<Hsl>> {
        let mut entries = self.entries.lock().await;
        entries
            .entry(url.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }
}
