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

use crate::models::{
    has_duplicates, PlaylistSummary, PlaylistTrack, RainbowPreview, ReorderBatchLog,
    ReorderReport,
};
use crate::sequencer::{group_counts, rainbow_order};
use crate::sorter::{RainbowSorter, SortError};
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use log::{debug, info, warn};
use rspotify::{
    model::{FullTrack, Image, Market, PlayableId, PlayableItem, PlaylistId, TrackId},
    prelude::*,
    AuthCodePkceSpotify,
};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Spotify accepts at most this many items per playlist write.
pub const MAX_ITEMS_PER_REQUEST: usize = 100;

#[derive(Error, Debug)]
pub enum PlaylistError {
    #[error("Spotify API error: {0}")]
    Spotify(#[from] rspotify::ClientError),
    #[error("Invalid Playlist ID: {0}")]
    InvalidId(String),
    #[error("Invalid Track ID: {0}")]
    InvalidTrackId(String),
    #[error(transparent)]
    Sort(#[from] SortError),
}

pub struct PlaylistCurator {
    spotify: Arc<AuthCodePkceSpotify>,
    sorter: RainbowSorter,
}

impl PlaylistCurator {
    pub fn new(spotify: AuthCodePkceSpotify, sorter: RainbowSorter) -> Self {
        Self {
            spotify: Arc::new(spotify),
            sorter,
        }
    }

    /// Playlists the current user may reorder (owned or collaborative), sorted by name.
    pub async fn list_editable_playlists(&self) -> Result<Vec<PlaylistSummary>, PlaylistError> {
        let me = self.spotify.current_user().await?;
        let mut playlists = Vec::new();
        let mut stream = self.spotify.current_user_playlists();

        while let Some(pl) = stream.try_next().await? {
            let owner_name = pl
                .owner
                .display_name
                .clone()
                .unwrap_or_else(|| pl.owner.id.id().to_string());

            playlists.push(PlaylistSummary {
                id: pl.id.id().to_string(),
                name: pl.name,
                total_tracks: pl.tracks.total,
                is_public: pl.public.unwrap_or(false),
                is_collaborative: pl.collaborative,
                is_editable: is_editable(pl.owner.id.id(), me.id.id(), pl.collaborative),
                owner_name,
            });
        }

        debug!("Fetched {} playlists", playlists.len());
        playlists.retain(|pl| pl.is_editable);
        sort_by_name(&mut playlists);
        Ok(playlists)
    }

    /// Every track of a playlist, in playlist order.
    ///
    /// Episodes and local files are skipped: they have no catalog id and
    /// cannot be written back through the API.
    pub async fn playlist_tracks(
        &self,
        playlist_id_str: &str,
    ) -> Result<Vec<PlaylistTrack>, PlaylistError> {
        let playlist_id = PlaylistId::from_id(playlist_id_str)
            .map_err(|_| PlaylistError::InvalidId(playlist_id_str.to_string()))?;

        let mut stream = self
            .spotify
            .playlist_items(playlist_id, None, Some(Market::FromToken));
        let mut tracks = Vec::new();

        while let Some(item) = stream.try_next().await? {
            match item.track {
                Some(PlayableItem::Track(track)) => {
                    let name = track.name.clone();
                    match playlist_track(track) {
                        Some(t) => tracks.push(t),
                        None => debug!("Skipping local track {}", name),
                    }
                }
                _ => debug!("Skipping non-track playlist item"),
            }
        }

        Ok(tracks)
    }

    /// Computes the rainbow order of a playlist without modifying it.
    pub async fn preview(
        &self,
        playlist_id_str: &str,
        cancel: &CancellationToken,
    ) -> Result<RainbowPreview, PlaylistError> {
        let tracks = self.playlist_tracks(playlist_id_str).await?;
        info!(
            "Analyzing artwork of {} tracks from playlist {}",
            tracks.len(),
            playlist_id_str
        );

        let classified = self.sorter.classify(tracks, cancel).await?;
        let groups = group_counts(&classified);
        let undetermined_count = classified
            .iter()
            .filter(|t| t.color.is_undetermined())
            .count();

        let ordered = rainbow_order(classified);
        let has_duplicates = has_duplicates(&ordered);

        Ok(RainbowPreview {
            playlist_id: playlist_id_str.to_string(),
            tracks: ordered,
            groups,
            undetermined_count,
            has_duplicates,
        })
    }

    /// Rewrites the playlist so it contains `tracks` in the given order.
    ///
    /// See [`write_in_chunks`] for how partial failures are handled.
    pub async fn apply_order(
        &self,
        playlist_id_str: &str,
        tracks: &[PlaylistTrack],
    ) -> Result<ReorderReport, PlaylistError> {
        parse_playlist_id(playlist_id_str)?;
        let track_ids: Vec<String> = tracks.iter().map(|t| t.id.clone()).collect();
        parse_track_ids(&track_ids)?;

        Ok(write_in_chunks(self.spotify.as_ref(), playlist_id_str, &track_ids).await)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace the whole playlist contents.
    Replace,
    /// Append after the current contents.
    Append,
}

/// One write request of a reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteStep<'a> {
    pub batch_index: usize,
    pub mode: WriteMode,
    pub track_ids: &'a [String],
}

/// Splits an ordered id list into API-sized requests: the first replaces, the rest append.
pub fn plan_writes(track_ids: &[String]) -> Vec<WriteStep<'_>> {
    track_ids
        .chunks(MAX_ITEMS_PER_REQUEST)
        .enumerate()
        .map(|(batch_index, chunk)| WriteStep {
            batch_index,
            mode: if batch_index == 0 {
                WriteMode::Replace
            } else {
                WriteMode::Append
            },
            track_ids: chunk,
        })
        .collect()
}

/// The playlist write calls a reorder needs.
#[async_trait]
pub trait PlaylistWriter: Send + Sync {
    async fn replace_items(&self, playlist_id: &str, track_ids: &[String])
        -> Result<(), PlaylistError>;
    async fn append_items(&self, playlist_id: &str, track_ids: &[String])
        -> Result<(), PlaylistError>;
}

#[async_trait]
impl PlaylistWriter for AuthCodePkceSpotify {
    async fn replace_items(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), PlaylistError> {
        let playlist_id = parse_playlist_id(playlist_id)?;
        let ids = parse_track_ids(track_ids)?;
        let items: Vec<PlayableId<'_>> = ids.iter().map(|id| PlayableId::Track(id.as_ref())).collect();
        self.playlist_replace_items(playlist_id, items).await?;
        Ok(())
    }

    async fn append_items(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), PlaylistError> {
        let playlist_id = parse_playlist_id(playlist_id)?;
        let ids = parse_track_ids(track_ids)?;
        let items: Vec<PlayableId<'_>> = ids.iter().map(|id| PlayableId::Track(id.as_ref())).collect();
        self.playlist_add_items(playlist_id, items, None).await?;
        Ok(())
    }
}

async fn send_step<W: PlaylistWriter + ?Sized>(
    writer: &W,
    playlist_id: &str,
    step: &WriteStep<'_>,
) -> Result<(), PlaylistError> {
    match step.mode {
        WriteMode::Replace => writer.replace_items(playlist_id, step.track_ids).await,
        WriteMode::Append => writer.append_items(playlist_id, step.track_ids).await,
    }
}

/// Writes `track_ids` to the playlist, one request per [`plan_writes`] step.
///
/// Each failed request is retried once. If the replace still fails the
/// playlist is untouched, so the remaining steps are skipped. A failed
/// append leaves a gap; later appends still run so as few tracks as
/// possible go missing. Every step is logged with its track ids, so
/// [`ReorderReport::unwritten_track_ids`] lists exactly what is missing.
pub async fn write_in_chunks<W: PlaylistWriter + ?Sized>(
    writer: &W,
    playlist_id: &str,
    track_ids: &[String],
) -> ReorderReport {
    let mut report = ReorderReport {
        playlist_id: playlist_id.to_string(),
        ..Default::default()
    };
    let mut replace_failed = false;

    for step in plan_writes(track_ids) {
        let status = if replace_failed {
            "Skipped".to_string()
        } else {
            let mut result = send_step(writer, playlist_id, &step).await;
            if let Err(e) = &result {
                warn!("Reorder request {} failed, retrying: {}", step.batch_index, e);
                result = send_step(writer, playlist_id, &step).await;
            }

            match result {
                Ok(()) => {
                    report.tracks_written += step.track_ids.len() as u32;
                    "Success".to_string()
                }
                Err(e) => {
                    warn!("Reorder request {} failed: {}", step.batch_index, e);
                    replace_failed = step.mode == WriteMode::Replace;
                    format!("Error: {}", e)
                }
            }
        };

        report.batch_logs.push(ReorderBatchLog {
            batch_index: step.batch_index,
            tracks_count: step.track_ids.len(),
            track_ids: step.track_ids.to_vec(),
            status,
        });
    }

    info!(
        "Wrote {}/{} tracks to playlist {}",
        report.tracks_written,
        track_ids.len(),
        playlist_id
    );
    report
}

fn parse_playlist_id(playlist_id: &str) -> Result<PlaylistId<'_>, PlaylistError> {
    PlaylistId::from_id(playlist_id).map_err(|_| PlaylistError::InvalidId(playlist_id.to_string()))
}

fn parse_track_ids(track_ids: &[String]) -> Result<Vec<TrackId<'_>>, PlaylistError> {
    track_ids
        .iter()
        .map(|id| {
            TrackId::from_id(id.as_str()).map_err(|_| PlaylistError::InvalidTrackId(id.clone()))
        })
        .collect()
}

fn playlist_track(track: FullTrack) -> Option<PlaylistTrack> {
    let id = track.id?;

    Some(PlaylistTrack {
        id: id.id().to_string(),
        uri: id.uri(),
        name: track.name,
        artists: track.artists.into_iter().map(|a| a.name).collect(),
        album: track.album.name,
        image_url: artwork_url(&track.album.images),
    })
}

/// Spotify lists album images largest first.
fn artwork_url(images: &[Image]) -> Option<String> {
    images.first().map(|image| image.url.clone())
}

fn is_editable(owner_id: &str, user_id: &str, collaborative: bool) -> bool {
    owner_id == user_id || collaborative
}

fn sort_by_name(playlists: &mut [PlaylistSummary]) {
    playlists.sort_by_cached_key(|pl| pl.name.to_lowercase());
}
