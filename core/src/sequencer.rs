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

//! Rainbow ordering of classified tracks.
//!
//! Tracks are grouped by [`RainbowGroup`] and the groups are emitted in
//! rainbow order (red through magenta), then white, then grayscale and
//! undetermined. Inside a hue group tracks flow by hue, then saturation,
//! then lightness.
//!
//! Hues within 0.01 of each other, and saturations within 0.1, are meant to
//! count as ties. Comparing raw differences against those thresholds is not
//! transitive, so instead each value is floored into a bin of that width and
//! the bins are compared. That is a total order, and with a stable sort true
//! ties keep their playlist order.

use crate::classify::{ColorProfile, RainbowGroup};
use crate::models::{ClassifiedTrack, GroupCount};
use std::cmp::Ordering;
use std::collections::BTreeMap;

const HUE_TIE_WIDTH: f64 = 0.01;
const SATURATION_TIE_WIDTH: f64 = 0.1;

fn bin(value: f64, width: f64) -> i64 {
    (value / width).floor() as i64
}

fn compare_within_hue(a: &ColorProfile, b: &ColorProfile) -> Ordering {
    bin(a.hue, HUE_TIE_WIDTH)
        .cmp(&bin(b.hue, HUE_TIE_WIDTH))
        // More saturated first.
        .then_with(|| {
            bin(b.saturation, SATURATION_TIE_WIDTH).cmp(&bin(a.saturation, SATURATION_TIE_WIDTH))
        })
        .then_with(|| a.lightness.total_cmp(&b.lightness))
}

/// Reorders classified tracks into a rainbow and strips the color annotations.
///
/// The result is always a permutation of the input: nothing is filtered or
/// deduplicated.
pub fn rainbow_order<T>(tracks: Vec<ClassifiedTrack<T>>) -> Vec<T> {
    let total = tracks.len();
    let mut ordered = Vec::with_capacity(total);

    for (group, mut members) in group_tracks(tracks) {
        match group {
            RainbowGroup::Hue(_) => members.sort_by(|a, b| compare_within_hue(&a.color, &b.color)),
            // Brightest first.
            RainbowGroup::White => {
                members.sort_by(|a, b| b.color.lightness.total_cmp(&a.color.lightness))
            }
            // Darkest first.
            RainbowGroup::Grayscale => {
                members.sort_by(|a, b| a.color.lightness.total_cmp(&b.color.lightness))
            }
        }
        ordered.extend(members.into_iter().map(ClassifiedTrack::into_track));
    }

    debug_assert_eq!(ordered.len(), total);
    ordered
}

/// Number of tracks per non-empty group, in output order.
pub fn group_counts<T>(tracks: &[ClassifiedTrack<T>]) -> Vec<GroupCount> {
    let mut counts: BTreeMap<RainbowGroup, usize> = BTreeMap::new();
    for track in tracks {
        *counts.entry(track.color.group()).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(group, tracks)| GroupCount { group, tracks })
        .collect()
}

fn group_tracks<T>(
    tracks: Vec<ClassifiedTrack<T>>,
) -> BTreeMap<RainbowGroup, Vec<ClassifiedTrack<T>>> {
    let mut groups: BTreeMap<RainbowGroup, Vec<ClassifiedTrack<T>>> = BTreeMap::new();
    for track in tracks {
        groups.entry(track.color.group()).or_default().push(track);
    }
    groups
}
