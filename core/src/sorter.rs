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

use crate::cache::ColorCache;
use crate::config::RainbowConfig;
use crate::models::{ArtworkTrack, ClassifiedTrack};
use crate::resolver::ColorResolver;
use crate::scheduler::{BatchScheduler, Pacer};
use crate::sequencer::rainbow_order;
use crate::source::ImageSource;
use log::info;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Error, Debug)]
pub enum SortError {
    #[error("Color analysis was cancelled")]
    Cancelled,
}

/// Sorts tracks by the dominant color of their cover art.
#[derive(Clone)]
pub struct RainbowSorter {
    scheduler: BatchScheduler,
}

impl RainbowSorter {
    /// Builds a sorter with a fresh color cache.
    pub fn new(source: Arc<dyn ImageSource>, config: RainbowConfig) -> Self {
        Self::with_cache(source, Arc::new(ColorCache::new()), config)
    }

    /// Builds a sorter that shares `cache` with other sorters.
    pub fn with_cache(
        source: Arc<dyn ImageSource>,
        cache: Arc<ColorCache>,
        config: RainbowConfig,
    ) -> Self {
        let resolver = ColorResolver::new(source, cache);
        Self {
            scheduler: BatchScheduler::new(resolver, config),
        }
    }

    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.scheduler = self.scheduler.with_pacer(pacer);
        self
    }

    pub fn cache(&self) -> &Arc<ColorCache> {
        self.scheduler.resolver().cache()
    }

    /// Computes the color profile of every track, keeping input order.
    pub async fn classify<T: ArtworkTrack>(
        &self,
        tracks: Vec<T>,
        cancel: &CancellationToken,
    ) -> Result<Vec<ClassifiedTrack<T>>, SortError> {
        self.scheduler.annotate(tracks, cancel).await
    }

    /// Returns the same tracks in rainbow order.
    pub async fn sort_tracks_by_hue<T: ArtworkTrack>(
        &self,
        tracks: Vec<T>,
        cancel: &CancellationToken,
    ) -> Result<Vec<T>, SortError> {
        let total = tracks.len();
        let classified = self.classify(tracks, cancel).await?;
        let ordered = rainbow_order(classified);
        info!("Sorted {} tracks into rainbow order", total);
        Ok(ordered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlaylistTrack;
    use crate::source::ImageSourceError;
    use async_trait::async_trait;
    use image::{Rgba, RgbaImage};
    use std::collections::HashMap;
    use std::time::Duration;

    /// Serves a fixed color per URL; unknown URLs fail to load.
    struct PaletteSource {
        colors: HashMap<&'static str, [u8; 4]>,
    }

    #[async_trait]
    impl ImageSource for PaletteSource {
        async fn fetch(&self, url: &str) -> Result<RgbaImage, ImageSourceError> {
            match self.colors.get(url) {
                Some(&color) => Ok(RgbaImage::from_pixel(16, 16, Rgba(color))),
                None => Err(ImageSourceError::Status(404)),
            }
        }
    }

    struct NoPause;

    #[async_trait]
    impl Pacer for NoPause {
        async fn pause(&self, _delay: Duration) {}
    }

    fn track(id: &str, image_url: Option<&str>) -> PlaylistTrack {
        PlaylistTrack {
            id: id.to_string(),
            name: id.to_string(),
            artists: vec!["Artist".to_string()],
            album: "Album".to_string(),
            uri: format!("spotify:track:{}", id),
            image_url: image_url.map(str::to_string),
        }
    }

    fn sorter() -> RainbowSorter {
        let colors = HashMap::from([
            ("red", [224, 16, 16, 255]),
            ("yellow", [240, 224, 32, 255]),
            ("blue", [32, 64, 224, 255]),
            ("white", [250, 250, 250, 255]),
            ("black", [5, 5, 5, 255]),
        ]);
        let source = Arc::new(PaletteSource { colors });
        RainbowSorter::new(source, RainbowConfig::default().with_batch_size(2))
            .with_pacer(Arc::new(NoPause))
    }

    #[tokio::test]
    async fn test_sorts_playlist_into_rainbow() {
        let tracks = vec![
            track("no-art", None),
            track("blue", Some("blue")),
            track("black", Some("black")),
            track("broken", Some("missing")),
            track("white", Some("white")),
            track("yellow", Some("yellow")),
            track("red", Some("red")),
        ];

        let sorted = sorter()
            .sort_tracks_by_hue(tracks.clone(), &CancellationToken::new())
            .await
            .unwrap();

        let ids: Vec<&str> = sorted.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["red", "yellow", "blue", "white", "no-art", "broken", "black"]
        );

        // Records come back untouched.
        for t in &sorted {
            assert!(tracks.contains(t));
        }
    }

    #[tokio::test]
    async fn test_single_track_without_art_is_returned_unchanged() {
        let input = vec![track("lonely", None)];
        let sorted = sorter()
            .sort_tracks_by_hue(input.clone(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(sorted, input);
    }

    #[tokio::test]
    async fn test_cache_is_shared_across_sorts() {
        let sorter = sorter();
        let tracks = vec![track("a", Some("red")), track("b", Some("blue"))];
        sorter
            .sort_tracks_by_hue(tracks.clone(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(sorter.cache().len().await, 2);
        sorter
            .sort_tracks_by_hue(tracks, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(sorter.cache().len().await, 2);
    }
}
