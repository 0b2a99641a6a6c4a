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

use crate::classify::{ColorProfile, RainbowGroup};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A track record the color pipeline can work with.
///
/// The pipeline only ever reads these two fields; everything else about the
/// record is carried through untouched.
pub trait ArtworkTrack {
    /// Stable identifier, used by callers for deduplication.
    fn track_id(&self) -> &str;
    /// Cover-art URL, if the track has any.
    fn image_url(&self) -> Option<&str>;
}

/// A playlist entry as fetched from Spotify.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistTrack {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub album: String,
    pub uri: String,
    pub image_url: Option<String>,
}

impl ArtworkTrack for PlaylistTrack {
    fn track_id(&self) -> &str {
        &self.id
    }

    fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }
}

impl fmt::Display for PlaylistTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} (Album: {})",
            self.name,
            self.artists.join(", "),
            self.album
        )
    }
}

/// A track paired with the color computed for its artwork.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedTrack<T> {
    pub track: T,
    pub color: ColorProfile,
}

impl<T> ClassifiedTrack<T> {
    pub fn new(track: T, color: ColorProfile) -> Self {
        Self { track, color }
    }

    pub fn into_track(self) -> T {
        self.track
    }
}

/// Summary of a playlist for listing purposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
    pub total_tracks: u32,
    pub is_public: bool,
    pub is_collaborative: bool,
    pub is_editable: bool,
    pub owner_name: String,
}

/// How many tracks landed in one output group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCount {
    pub group: RainbowGroup,
    pub tracks: usize,
}

/// The proposed rainbow order of a playlist, before it is written back.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RainbowPreview {
    pub playlist_id: String,
    pub tracks: Vec<PlaylistTrack>,
    pub groups: Vec<GroupCount>,
    pub undetermined_count: usize,
    pub has_duplicates: bool,
}

impl RainbowPreview {
    /// Drops repeated track ids from the proposed order, keeping the first occurrence.
    /// Returns how many tracks were removed.
    pub fn purge_duplicates(&mut self) -> usize {
        let tracks = std::mem::take(&mut self.tracks);
        let (unique, removed) = purge_duplicates(tracks);
        self.tracks = unique;
        self.has_duplicates = false;
        removed
    }
}

/// Detailed log for one write request of a reorder operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderBatchLog {
    pub batch_index: usize,
    pub tracks_count: usize,
    pub track_ids: Vec<String>,
    pub status: String, // "Success", "Skipped" or error message
}

impl ReorderBatchLog {
    pub fn is_success(&self) -> bool {
        self.status == "Success"
    }
}

/// Report for writing a new order back to a playlist.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ReorderReport {
    pub playlist_id: String,
    pub tracks_written: u32,
    pub batch_logs: Vec<ReorderBatchLog>,
}

impl ReorderReport {
    pub fn is_success(&self) -> bool {
        self.batch_logs.iter().all(ReorderBatchLog::is_success)
    }

    /// Ids of every track whose write request failed or never ran, in playlist order.
    pub fn unwritten_track_ids(&self) -> Vec<&str> {
        self.batch_logs
            .iter()
            .filter(|log| !log.is_success())
            .flat_map(|log| log.track_ids.iter().map(String::as_str))
            .collect()
    }
}

pub fn has_duplicates<T: ArtworkTrack>(tracks: &[T]) -> bool {
    let mut seen = HashSet::new();
    !tracks.iter().all(|t| seen.insert(t.track_id()))
}

/// Removes tracks whose id was already seen, preserving order.
pub fn purge_duplicates<T: ArtworkTrack>(tracks: Vec<T>) -> (Vec<T>, usize) {
    let before = tracks.len();
    let mut seen: HashSet<String> = HashSet::new();
    let unique: Vec<T> = tracks
        .into_iter()
        .filter(|t| seen.insert(t.track_id().to_string()))
        .collect();
    let removed = before - unique.len();
    (unique, removed)
}
