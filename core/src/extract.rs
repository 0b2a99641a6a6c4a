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

//! Dominant-color extraction for cover art.
//!
//! The extractor favors vivid, mid-brightness colors near the center of the
//! image. Borders, text overlays, and near-neutral tones are ignored because
//! they rarely describe what the artwork "looks like" at a glance.

use crate::color::{rgb_to_hsl, Rgb};
use image::imageops::{self, FilterType};
use image::RgbaImage;
use std::collections::HashMap;

/// Longest side, in pixels, of the buffer the analysis runs on.
pub const MAX_DIMENSION: u32 = 100;

/// Fraction of the width/height excluded on each side.
const BORDER_MARGIN: f64 = 0.25;
const MIN_ALPHA: u8 = 200;
const BUCKET_SIZE: u8 = 16;

const NEAR_BLACK: u8 = 30;
const NEAR_WHITE: u8 = 220;
const GRAY_SPREAD: u8 = 20;

const MIN_SATURATION_WEIGHT: f64 = 0.2;
const EXTREME_LIGHTNESS_WEIGHT: f64 = 0.5;

/// Returns the most representative color of `image`.
///
/// Never fails: when every sampled pixel is filtered out (monochrome or
/// near-neutral artwork) the plain average of the downscaled buffer is
/// returned instead.
pub fn dominant_color(image: &RgbaImage) -> Rgb {
    let scaled = downscale(image);
    let buffer = scaled.as_ref().unwrap_or(image);

    match best_candidate(buffer) {
        Some(rgb) => rgb,
        None => average_color(buffer),
    }
}

/// Shrinks the image so its longer side is at most [`MAX_DIMENSION`].
/// Returns `None` when the image is already small enough.
fn downscale(image: &RgbaImage) -> Option<RgbaImage> {
    let (width, height) = image.dimensions();
    let longest = width.max(height);
    if longest <= MAX_DIMENSION {
        return None;
    }

    let scale = f64::from(MAX_DIMENSION) / f64::from(longest);
    let new_width = ((f64::from(width) * scale).floor() as u32).max(1);
    let new_height = ((f64::from(height) * scale).floor() as u32).max(1);

    Some(imageops::resize(
        image,
        new_width,
        new_height,
        FilterType::Triangle,
    ))
}

/// Floors a channel to the nearest lower multiple of the bucket size.
fn quantize(channel: u8) -> u8 {
    (channel / BUCKET_SIZE) * BUCKET_SIZE
}

fn is_neutral(rgb: Rgb) -> bool {
    let Rgb { r, g, b } = rgb;
    let near_black = r < NEAR_BLACK && g < NEAR_BLACK && b < NEAR_BLACK;
    let near_white = r > NEAR_WHITE && g > NEAR_WHITE && b > NEAR_WHITE;
    let gray =
        r.abs_diff(g) < GRAY_SPREAD && g.abs_diff(b) < GRAY_SPREAD && r.abs_diff(b) < GRAY_SPREAD;

    near_black || near_white || gray
}

fn score(rgb: Rgb, count: u32) -> f64 {
    let hsl = rgb_to_hsl(rgb);
    let saturation_weight = hsl.s.max(MIN_SATURATION_WEIGHT);
    let brightness_weight = if hsl.l < 0.1 || hsl.l > 0.9 {
        EXTREME_LIGHTNESS_WEIGHT
    } else {
        1.0
    };

    f64::from(count) * saturation_weight * brightness_weight
}

/// Counts quantized colors in the central region and returns the best scored one.
fn best_candidate(buffer: &RgbaImage) -> Option<Rgb> {
    let (width, height) = buffer.dimensions();
    let margin_x = (f64::from(width) * BORDER_MARGIN).floor() as u32;
    let margin_y = (f64::from(height) * BORDER_MARGIN).floor() as u32;

    // Candidates keep first-seen order so equal scores resolve the same way every run.
    let mut index: HashMap<Rgb, usize> = HashMap::new();
    let mut candidates: Vec<(Rgb, u32)> = Vec::new();

    for y in margin_y..height.saturating_sub(margin_y) {
        for x in margin_x..width.saturating_sub(margin_x) {
            let [r, g, b, a] = buffer.get_pixel(x, y).0;
            if a < MIN_ALPHA {
                continue;
            }

            let key = Rgb::new(quantize(r), quantize(g), quantize(b));
            if is_neutral(key) {
                continue;
            }

            match index.get(&key) {
                Some(&slot) => candidates[slot].1 += 1,
                None => {
                    index.insert(key, candidates.len());
                    candidates.push((key, 1));
                }
            }
        }
    }

    let mut best: Option<(Rgb, f64)> = None;
    for (rgb, count) in candidates {
        let weighted = score(rgb, count);
        if best.map_or(true, |(_, top)| weighted > top) {
            best = Some((rgb, weighted));
        }
    }

    best.map(|(rgb, _)| rgb)
}

/// Floor of the per-channel mean over every pixel of the buffer.
fn average_color(buffer: &RgbaImage) -> Rgb {
    let pixel_count = u64::from(buffer.width()) * u64::from(buffer.height());
    if pixel_count == 0 {
        return Rgb::default();
    }

    let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
    for pixel in buffer.pixels() {
        r += u64::from(pixel[0]);
        g += u64::from(pixel[1]);
        b += u64::from(pixel[2]);
    }

    Rgb::new(
        (r / pixel_count) as u8,
        (g / pixel_count) as u8,
        (b / pixel_count) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(color))
    }

    #[test]
    fn test_solid_color_is_quantized() {
        let image = solid(40, 40, [200, 40, 40, 255]);
        assert_eq!(dominant_color(&image), Rgb::new(192, 32, 32));
    }

    #[test]
    fn test_border_is_ignored() {
        // Blue frame filling the outer quarter on every side, red center.
        let image = RgbaImage::from_fn(40, 40, |x, y| {
            if (10..30).contains(&x) && (10..30).contains(&y) {
                Rgba([224, 32, 32, 255])
            } else {
                Rgba([32, 32, 224, 255])
            }
        });
        assert_eq!(dominant_color(&image), Rgb::new(224, 32, 32));
    }

    #[test]
    fn test_saturated_color_beats_more_frequent_dull_one() {
        // 60% dull brown (low saturation), 40% vivid green in the center region.
        let image = RgbaImage::from_fn(40, 40, |x, _| {
            if x < 22 {
                Rgba([112, 96, 64, 255])
            } else {
                Rgba([0, 240, 0, 255])
            }
        });
        assert_eq!(dominant_color(&image), Rgb::new(0, 240, 0));
    }

    #[test]
    fn test_transparent_pixels_are_skipped() {
        let image = RgbaImage::from_fn(40, 40, |x, _| {
            if x < 25 {
                Rgba([240, 0, 0, 10])
            } else {
                Rgba([0, 0, 240, 255])
            }
        });
        assert_eq!(dominant_color(&image), Rgb::new(0, 0, 240));
    }

    #[test]
    fn test_monochrome_falls_back_to_average() {
        let image = RgbaImage::from_fn(10, 10, |x, _| {
            if x < 5 {
                Rgba([10, 10, 10, 255])
            } else {
                Rgba([100, 100, 100, 255])
            }
        });
        assert_eq!(dominant_color(&image), Rgb::new(55, 55, 55));
    }

    #[test]
    fn test_large_image_is_downscaled() {
        let image = solid(640, 320, [0, 136, 250, 255]);
        let scaled = downscale(&image).expect("should downscale");
        assert_eq!(scaled.dimensions(), (100, 50));
        assert_eq!(dominant_color(&image), Rgb::new(0, 128, 240));
    }

    #[test]
    fn test_small_image_is_not_downscaled() {
        assert!(downscale(&solid(100, 60, [0, 0, 0, 255])).is_none());
    }

    #[test]
    fn test_empty_image_returns_black() {
        assert_eq!(dominant_color(&RgbaImage::new(0, 0)), Rgb::default());
    }

    #[test]
    fn test_neutral_filters() {
        assert!(is_neutral(Rgb::new(16, 16, 16)));
        assert!(is_neutral(Rgb::new(240, 224, 240)));
        assert!(is_neutral(Rgb::new(96, 112, 96)));
        assert!(!is_neutral(Rgb::new(96, 128, 96)));
    }
}
