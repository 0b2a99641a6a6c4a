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
use crate::classify::ColorProfile;
use crate::color::{rgb_to_hsl, Hsl};
use crate::extract::dominant_color;
use crate::models::ArtworkTrack;
use crate::source::{ImageSource, ImageSourceError};
use log::{debug, warn};
use std::sync::Arc;

/// Computes the color profile of a single track.
///
/// This is the error boundary of the pipeline: a missing URL, a failed
/// download, or an undecodable image all produce an undetermined profile
/// instead of an error, so one bad cover never aborts a whole playlist.
#[derive(Clone)]
pub struct ColorResolver {
    source: Arc<dyn ImageSource>,
    cache: Arc<ColorCache>,
}

impl ColorResolver {
    pub fn new(source: Arc<dyn ImageSource>, cache: Arc<ColorCache>) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &Arc<ColorCache> {
        &self.cache
    }

    pub async fn resolve<T: ArtworkTrack + ?Sized>(&self, track: &T) -> ColorProfile {
        let Some(url) = track.image_url() else {
            debug!("Track {} has no artwork", track.track_id());
            return ColorProfile::undetermined();
        };

        match self.artwork_color(url).await {
            Ok(hsl) => ColorProfile::classify(hsl),
            Err(e) => {
                warn!(
                    "Could not analyze artwork for track {} ({}): {}",
                    track.track_id(),
                    url,
                    e
                );
                ColorProfile::undetermined()
            }
        }
    }

    async fn artwork_color(&self, url: &str) -> Result<Hsl, ImageSourceError> {
        if let Some(hsl) = self.cache.get(url).await {
            debug!("Color cache hit for {}", url);
            return Ok(hsl);
        }

        self.cache
            .get_or_try_insert_with(url, || async {
                let image = self.source.fetch(url).await?;
                let rgb = dominant_color(&image);
                debug!("Dominant color of {} is {}", url, rgb);
                Ok::<_, ImageSourceError>(rgb_to_hsl(rgb))
            })
            .await
    }
}
