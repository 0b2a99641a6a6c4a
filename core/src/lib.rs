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

pub mod auth;
pub mod cache;
pub mod classify;
pub mod color;
pub mod config;
pub mod extract;
pub mod models;
pub mod resolver;
pub mod scheduler;
pub mod sequencer;
pub mod sorter;
pub mod source;
pub mod spotify;

// Re-export key items for convenience
pub use auth::get_spotify_client;
pub use cache::ColorCache;
pub use classify::{ColorCategory, ColorProfile, HueBucket, RainbowGroup};
pub use color::{rgb_to_hsl, Hsl, Rgb};
pub use config::RainbowConfig;
pub use extract::dominant_color;
pub use models::{ArtworkTrack, PlaylistSummary, PlaylistTrack, RainbowPreview, ReorderReport};
pub use sorter::{RainbowSorter, SortError};
pub use source::{HttpImageSource, ImageSource};
pub use spotify::{plan_writes, write_in_chunks, PlaylistCurator, PlaylistWriter};
