//! Color categories
//!
//! A [`Palette`] names the logical things the agent looks for ("water",
//! "wood", ...) and the color ranges that count as each of them.

use serde::{Deserialize, Serialize};

/// Channel layout of a pixel triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorSpace {
    #[default]
    #[serde(rename = "RGB", alias = "rgb")]
    Rgb,
    /// 8-bit HSV: hue in [0, 180), saturation and value in [0, 255]
    #[serde(rename = "HSV", alias = "hsv")]
    Hsv,
}

/// Inclusive per-channel bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl ColorRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    /// Component-wise `lower <= pixel <= upper`
    #[inline]
    pub fn contains(&self, pixel: [u8; 3]) -> bool {
        (0..3).all(|c| self.lower[c] <= pixel[c] && pixel[c] <= self.upper[c])
    }
}

/// A named category made of one or more ranges
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub ranges: Vec<ColorRange>,
}

impl Category {
    pub fn new(name: impl Into<String>, ranges: &[ColorRange]) -> Self {
        Self {
            name: name.into(),
            ranges: ranges.to_vec(),
        }
    }
}

/// Water shades (RGB)
pub const WATER_RANGES: [ColorRange; 3] = [
    ColorRange::new([30, 100, 150], [100, 180, 255]), // light blue
    ColorRange::new([20, 60, 120], [80, 120, 200]),   // deeper blue
    ColorRange::new([60, 140, 180], [120, 200, 255]), // bright surface
];

/// Foliage and trunk shades (RGB)
pub const TREE_RANGES: [ColorRange; 4] = [
    ColorRange::new([20, 80, 20], [100, 180, 100]),  // leaves
    ColorRange::new([40, 120, 40], [120, 200, 120]), // bright foliage
    ColorRange::new([60, 100, 30], [120, 160, 80]),  // yellowish green
    ColorRange::new([80, 60, 30], [140, 120, 80]),   // trunks
];

/// Terrain categories (HSV)
pub const TERRAIN: [(&str, ColorRange); 6] = [
    ("grass", ColorRange::new([35, 30, 30], [85, 255, 255])),
    ("leaves", ColorRange::new([30, 25, 25], [90, 255, 255])),
    ("wood", ColorRange::new([8, 50, 50], [30, 255, 200])),
    ("sky", ColorRange::new([90, 20, 80], [130, 255, 255])),
    ("dirt", ColorRange::new([0, 30, 30], [25, 255, 180])),
    ("stone", ColorRange::new([0, 0, 40], [180, 25, 120])),
];

/// An ordered set of categories sharing one color space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub space: ColorSpace,
    pub categories: Vec<Category>,
}

impl Palette {
    pub fn new(space: ColorSpace, categories: Vec<Category>) -> Self {
        Self { space, categories }
    }

    /// Single "water" category summing three blue ranges
    pub fn water() -> Self {
        Self::new(ColorSpace::Rgb, vec![Category::new("water", &WATER_RANGES)])
    }

    /// Single "tree" category summing foliage and trunk ranges
    pub fn trees() -> Self {
        Self::new(ColorSpace::Rgb, vec![Category::new("tree", &TREE_RANGES)])
    }

    /// Six terrain categories used by the shelter and model-driven agents
    pub fn terrain() -> Self {
        Self::new(
            ColorSpace::Hsv,
            TERRAIN
                .iter()
                .map(|(name, range)| Category::new(*name, &[*range]))
                .collect(),
        )
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }
}

/// Convert an RGB triple to 8-bit HSV
pub fn rgb_to_hsv([r, g, b]: [u8; 3]) -> [u8; 3] {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let s = if max == 0.0 { 0.0 } else { 255.0 * delta / max };

    let mut h = if delta == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (gf - bf) / delta
    } else if max == gf {
        120.0 + 60.0 * (bf - rf) / delta
    } else {
        240.0 + 60.0 * (rf - gf) / delta
    };
    if h < 0.0 {
        h += 360.0;
    }

    let h = ((h / 2.0).round() as u16 % 180) as u8;
    [h, s.round() as u8, max as u8]
}

/// Convert an 8-bit HSV triple back to RGB
pub fn hsv_to_rgb([h, s, v]: [u8; 3]) -> [u8; 3] {
    let s = s as f32 / 255.0;
    let v = v as f32;
    let c = v * s;
    let hp = (h as f32 * 2.0) / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());

    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = v - c;
    [
        (r + m).round() as u8,
        (g + m).round() as u8,
        (b + m).round() as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_is_inclusive() {
        let range = ColorRange::new([10, 20, 30], [40, 50, 60]);
        assert!(range.contains([10, 20, 30]));
        assert!(range.contains([40, 50, 60]));
        assert!(!range.contains([9, 20, 30]));
        assert!(!range.contains([40, 50, 61]));
    }

    #[test]
    fn test_builtin_palettes() {
        assert_eq!(Palette::water().category("water").unwrap().ranges.len(), 3);
        assert_eq!(Palette::trees().category("tree").unwrap().ranges.len(), 4);

        let terrain = Palette::terrain();
        assert_eq!(terrain.space, ColorSpace::Hsv);
        let names: Vec<_> = terrain.names().collect();
        assert_eq!(names, ["grass", "leaves", "wood", "sky", "dirt", "stone"]);
    }

    #[test]
    fn test_hsv_primaries() {
        assert_eq!(rgb_to_hsv([255, 0, 0]), [0, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 255, 0]), [60, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 0, 255]), [120, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 0, 0]), [0, 0, 0]);
        assert_eq!(rgb_to_hsv([128, 128, 128]), [0, 0, 128]);
    }

    #[test]
    fn test_hsv_round_trip_primaries() {
        for rgb in [[255, 0, 0], [0, 255, 0], [0, 0, 255], [255, 255, 255]] {
            assert_eq!(hsv_to_rgb(rgb_to_hsv(rgb)), rgb);
        }
    }

    #[test]
    fn test_color_space_names() {
        let space: ColorSpace = serde_yaml::from_str("HSV").unwrap();
        assert_eq!(space, ColorSpace::Hsv);
        let space: ColorSpace = serde_yaml::from_str("rgb").unwrap();
        assert_eq!(space, ColorSpace::Rgb);
    }
}
