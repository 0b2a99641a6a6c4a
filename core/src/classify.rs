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
use serde::{Deserialize, Serialize};
use std::fmt;

const WHITE_MIN_LIGHTNESS: f64 = 0.9;
const WHITE_MAX_SATURATION: f64 = 0.15;
const GRAYSCALE_MAX_SATURATION: f64 = 0.2;

/// One of twelve hue ranges approximating the color wheel, in rainbow order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HueBucket {
    Red,
    RedOrange,
    Orange,
    OrangeYellow,
    Yellow,
    Green,
    Turquoise,
    LightBlue,
    Blue,
    Purple,
    Pink,
    Magenta,
}

impl HueBucket {
    pub const ALL: [HueBucket; 12] = [
        HueBucket::Red,
        HueBucket::RedOrange,
        HueBucket::Orange,
        HueBucket::OrangeYellow,
        HueBucket::Yellow,
        HueBucket::Green,
        HueBucket::Turquoise,
        HueBucket::LightBlue,
        HueBucket::Blue,
        HueBucket::Purple,
        HueBucket::Pink,
        HueBucket::Magenta,
    ];

    /// Buckets a normalized hue. Red wraps around the 0/1 boundary.
    pub fn from_hue(h: f64) -> Self {
        if !(0.025..0.975).contains(&h) {
            HueBucket::Red
        } else if h < 0.075 {
            HueBucket::RedOrange
        } else if h < 0.125 {
            HueBucket::Orange
        } else if h < 0.175 {
            HueBucket::OrangeYellow
        } else if h < 0.225 {
            HueBucket::Yellow
        } else if h < 0.375 {
            HueBucket::Green
        } else if h < 0.5 {
            HueBucket::Turquoise
        } else if h < 0.575 {
            HueBucket::LightBlue
        } else if h < 0.675 {
            HueBucket::Blue
        } else if h < 0.775 {
            HueBucket::Purple
        } else if h < 0.875 {
            HueBucket::Pink
        } else {
            HueBucket::Magenta
        }
    }

    /// Position in the rainbow, 0 (red) through 11 (magenta).
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            HueBucket::Red => "Red",
            HueBucket::RedOrange => "Red-Orange",
            HueBucket::Orange => "Orange",
            HueBucket::OrangeYellow => "Orange-Yellow",
            HueBucket::Yellow => "Yellow",
            HueBucket::Green => "Green",
            HueBucket::Turquoise => "Turquoise",
            HueBucket::LightBlue => "Light Blue",
            HueBucket::Blue => "Blue",
            HueBucket::Purple => "Purple",
            HueBucket::Pink => "Pink",
            HueBucket::Magenta => "Magenta",
        }
    }
}

impl fmt::Display for HueBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Hue category of a track, or `Undetermined` when no color could be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorCategory {
    Undetermined,
    Categorized(HueBucket),
}

/// Output group of the rainbow sequence. Variant order is output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RainbowGroup {
    Hue(HueBucket),
    White,
    Grayscale,
}

impl fmt::Display for RainbowGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RainbowGroup::Hue(bucket) => write!(f, "{}", bucket),
            RainbowGroup::White => f.write_str("White"),
            RainbowGroup::Grayscale => f.write_str("Grayscale"),
        }
    }
}

/// The color annotation attached to a track while it is being sequenced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorProfile {
    /// Normalized hue, or -1.0 when undetermined.
    pub hue: f64,
    pub saturation: f64,
    pub lightness: f64,
    pub category: ColorCategory,
    pub is_grayscale: bool,
    pub is_white: bool,
}

impl ColorProfile {
    /// Profile for a track whose artwork is missing or could not be analyzed.
    pub fn undetermined() -> Self {
        Self {
            hue: -1.0,
            saturation: 0.0,
            lightness: 0.0,
            category: ColorCategory::Undetermined,
            is_grayscale: true,
            is_white: false,
        }
    }

    pub fn classify(hsl: Hsl) -> Self {
        let is_white = hsl.l > WHITE_MIN_LIGHTNESS && hsl.s < WHITE_MAX_SATURATION;
        let is_grayscale = hsl.s < GRAYSCALE_MAX_SATURATION && !is_white;

        Self {
            hue: hsl.h,
            saturation: hsl.s,
            lightness: hsl.l,
            category: ColorCategory::Categorized(HueBucket::from_hue(hsl.h)),
            is_grayscale,
            is_white,
        }
    }

    pub fn is_undetermined(&self) -> bool {
        self.category == ColorCategory::Undetermined
    }

    /// White wins over grayscale, and grayscale (or undetermined) wins over hue.
    pub fn group(&self) -> RainbowGroup {
        if self.is_white {
            return RainbowGroup::White;
        }
        match self.category {
            ColorCategory::Categorized(bucket) if !self.is_grayscale => RainbowGroup::Hue(bucket),
            _ => RainbowGroup::Grayscale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hsl(h: f64, s: f64, l: f64) -> Hsl {
        Hsl { h, s, l }
    }

    #[test]
    fn test_red_wraps_around() {
        assert_eq!(HueBucket::from_hue(0.0), HueBucket::Red);
        assert_eq!(HueBucket::from_hue(0.999), HueBucket::Red);
        assert_eq!(HueBucket::from_hue(0.975), HueBucket::Red);
        assert_eq!(HueBucket::from_hue(0.0249), HueBucket::Red);
    }

    #[test]
    fn test_bucket_boundaries() {
        let cases = [
            (0.025, HueBucket::RedOrange),
            (0.075, HueBucket::Orange),
            (0.125, HueBucket::OrangeYellow),
            (0.175, HueBucket::Yellow),
            (0.225, HueBucket::Green),
            (0.375, HueBucket::Turquoise),
            (0.5, HueBucket::LightBlue),
            (0.575, HueBucket::Blue),
            (0.675, HueBucket::Purple),
            (0.775, HueBucket::Pink),
            (0.875, HueBucket::Magenta),
            (0.974, HueBucket::Magenta),
        ];
        for (hue, expected) in cases {
            assert_eq!(HueBucket::from_hue(hue), expected, "hue {}", hue);
        }
    }

    #[test]
    fn test_bucket_indices_follow_rainbow_order() {
        for (i, bucket) in HueBucket::ALL.iter().enumerate() {
            assert_eq!(bucket.index() as usize, i);
        }
    }

    #[test]
    fn test_white_and_grayscale_are_exclusive() {
        let white = ColorProfile::classify(hsl(0.1, 0.1, 0.95));
        assert!(white.is_white);
        assert!(!white.is_grayscale);
        assert_eq!(white.group(), RainbowGroup::White);

        let gray = ColorProfile::classify(hsl(0.1, 0.1, 0.5));
        assert!(!gray.is_white);
        assert!(gray.is_grayscale);
        assert_eq!(gray.group(), RainbowGroup::Grayscale);

        // Light but too saturated for white, too saturated for gray.
        let pastel = ColorProfile::classify(hsl(0.6, 0.3, 0.95));
        assert!(!pastel.is_white && !pastel.is_grayscale);
        assert_eq!(pastel.group(), RainbowGroup::Hue(HueBucket::Blue));
    }

    #[test]
    fn test_category_is_set_even_for_grayscale() {
        let gray = ColorProfile::classify(hsl(0.3, 0.05, 0.4));
        assert_eq!(gray.category, ColorCategory::Categorized(HueBucket::Green));
        assert_eq!(gray.group(), RainbowGroup::Grayscale);
    }

    #[test]
    fn test_undetermined_profile() {
        let profile = ColorProfile::undetermined();
        assert!(profile.is_undetermined());
        assert!(profile.is_grayscale);
        assert!(!profile.is_white);
        assert_eq!(profile.hue, -1.0);
        assert_eq!(profile.group(), RainbowGroup::Grayscale);
    }

    #[test]
    fn test_group_order() {
        assert!(RainbowGroup::Hue(HueBucket::Magenta) < RainbowGroup::White);
        assert!(RainbowGroup::White < RainbowGroup::Grayscale);
        assert!(RainbowGroup::Hue(HueBucket::Red) < RainbowGroup::Hue(HueBucket::Orange));
    }
}
