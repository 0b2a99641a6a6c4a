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

use crate::config::RainbowConfig;
use crate::models::{ArtworkTrack, ClassifiedTrack};
use crate::resolver::ColorResolver;
use crate::sorter::SortError;
use async_trait::async_trait;
use futures::future::join_all;
use log::debug;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Waits between analysis waves.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, delay: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Resolves track colors in waves of at most `batch_size` concurrent lookups.
///
/// A wave must finish completely before the next one starts, and the pacer
/// runs between waves (never after the last one). Output order always
/// matches input order regardless of which lookup finishes first.
#[derive(Clone)]
pub struct BatchScheduler {
    resolver: ColorResolver,
    pacer: Arc<dyn Pacer>,
    config: RainbowConfig,
}

impl BatchScheduler {
    pub fn new(resolver: ColorResolver, config: RainbowConfig) -> Self {
        Self {
            resolver,
            pacer: Arc::new(TokioPacer),
            config,
        }
    }

    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn config(&self) -> &RainbowConfig {
        &self.config
    }

    pub fn resolver(&self) -> &ColorResolver {
        &self.resolver
    }

    /// Annotates every track with its color profile.
    ///
    /// Cancelling `cancel` drops the wave in flight and returns
    /// [`SortError::Cancelled`].
    pub async fn annotate<T: ArtworkTrack>(
        &self,
        tracks: Vec<T>,
        cancel: &CancellationToken,
    ) -> Result<Vec<ClassifiedTrack<T>>, SortError> {
        let batch_size = self.config.batch_size.max(1);
        let total_batches = tracks.len().div_ceil(batch_size);
        let mut profiles = Vec::with_capacity(tracks.len());

        for (i, batch) in tracks.chunks(batch_size).enumerate() {
            if i > 0 {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(SortError::Cancelled),
                    _ = self.pacer.pause(self.config.batch_delay) => {}
                }
            }

            debug!(
                "Analyzing artwork batch {}/{} ({} tracks)",
                i + 1,
                total_batches,
                batch.len()
            );

            let wave = join_all(batch.iter().map(|track| self.resolver.resolve(track)));
            let resolved = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SortError::Cancelled),
                resolved = wave => resolved,
            };
            profiles.extend(resolved);
        }

        Ok(tracks
            .into_iter()
            .zip(profiles)
            .map(|(track, color)| ClassifiedTrack::new(track, color))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ColorCache;
    use crate::classify::{ColorProfile, HueBucket, RainbowGroup};
    use crate::models::PlaylistTrack;
    use crate::source::{ImageSource, ImageSourceError};
    use image::{Rgba, RgbaImage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingSource {
        fetches: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl ImageSource for TrackingSource {
        async fn fetch(&self, _url: &str) -> Result<RgbaImage, ImageSourceError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(RgbaImage::from_pixel(8, 8, Rgba([224, 32, 32, 255])))
        }
    }

    /// Counts pauses and optionally cancels a token on the first one.
    #[derive(Default)]
    struct CountingPacer {
        pauses: AtomicUsize,
        cancel_on_pause: Option<CancellationToken>,
    }

    #[async_trait]
    impl Pacer for CountingPacer {
        async fn pause(&self, _delay: Duration) {
            self.pauses.fetch_add(1, Ordering::SeqCst);
            if let Some(token) = &self.cancel_on_pause {
                token.cancel();
            }
        }
    }

    fn tracks(n: usize) -> Vec<PlaylistTrack> {
        (0..n)
            .map(|i| PlaylistTrack {
                id: format!("t{}", i),
                name: format!("Song {}", i),
                artists: vec!["Artist".to_string()],
                album: "Album".to_string(),
                uri: format!("spotify:track:t{}", i),
                image_url: Some(format!("https://img/{}", i)),
            })
            .collect()
    }

    fn scheduler(
        source: Arc<TrackingSource>,
        pacer: Arc<CountingPacer>,
        batch_size: usize,
    ) -> BatchScheduler {
        let resolver = ColorResolver::new(source, Arc::new(ColorCache::new()));
        let config = RainbowConfig::default().with_batch_size(batch_size);
        BatchScheduler::new(resolver, config).with_pacer(pacer)
    }

    #[tokio::test]
    async fn test_nine_tracks_make_two_waves_with_one_pause() {
        let source = Arc::new(TrackingSource::default());
        let pacer = Arc::new(CountingPacer::default());
        let scheduler = scheduler(source.clone(), pacer.clone(), 8);

        let annotated = scheduler
            .annotate(tracks(9), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(annotated.len(), 9);
        assert_eq!(pacer.pauses.load(Ordering::SeqCst), 1);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 9);
        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 8);
    }

    #[tokio::test]
    async fn test_exactly_one_batch_has_no_pause() {
        let source = Arc::new(TrackingSource::default());
        let pacer = Arc::new(CountingPacer::default());
        let scheduler = scheduler(source, pacer.clone(), 8);

        scheduler
            .annotate(tracks(8), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(pacer.pauses.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_list_does_nothing() {
        let source = Arc::new(TrackingSource::default());
        let pacer = Arc::new(CountingPacer::default());
        let scheduler = scheduler(source.clone(), pacer.clone(), 8);

        let annotated = scheduler
            .annotate(Vec::<PlaylistTrack>::new(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(annotated.is_empty());
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
        assert_eq!(pacer.pauses.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_small_batches_bound_concurrency_and_keep_order() {
        let source = Arc::new(TrackingSource::default());
        let pacer = Arc::new(CountingPacer::default());
        let scheduler = scheduler(source.clone(), pacer.clone(), 3);

        let mut input = tracks(7);
        input[4].image_url = None;
        let annotated = scheduler
            .annotate(input, &CancellationToken::new())
            .await
            .unwrap();

        let ids: Vec<&str> = annotated.iter().map(|c| c.track.id.as_str()).collect();
        assert_eq!(ids, vec!["t0", "t1", "t2", "t3", "t4", "t5", "t6"]);
        assert_eq!(annotated[4].color, ColorProfile::undetermined());
        assert_eq!(annotated[0].color.group(), RainbowGroup::Hue(HueBucket::Red));
        assert_eq!(pacer.pauses.load(Ordering::SeqCst), 2);
        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let source = Arc::new(TrackingSource::default());
        let pacer = Arc::new(CountingPacer::default());
        let scheduler = scheduler(source.clone(), pacer, 8);

        let token = CancellationToken::new();
        token.cancel();
        let result = scheduler.annotate(tracks(4), &token).await;
        assert!(matches!(result, Err(SortError::Cancelled)));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_between_waves_stops_remaining_fetches() {
        let token = CancellationToken::new();
        let source = Arc::new(TrackingSource::default());
        let pacer = Arc::new(CountingPacer {
            pauses: AtomicUsize::new(0),
            cancel_on_pause: Some(token.clone()),
        });
        let scheduler = scheduler(source.clone(), pacer, 8);

        let result = scheduler.annotate(tracks(20), &token).await;
        assert!(matches!(result, Err(SortError::Cancelled)));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 8);
    }
}
