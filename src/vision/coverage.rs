//! Per-category color coverage
//!
//! Reduces a [`Frame`] to the fraction of pixels matching each palette
//! category, globally and over six screen regions.

use std::fmt;

use super::capture::Frame;
use super::palette::{hsv_to_rgb, rgb_to_hsv, ColorSpace, Palette};

/// Area of the frame a coverage value refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Global,
    Left,
    Center,
    Right,
    Top,
    Middle,
    Bottom,
}

impl Region {
    pub const ALL: [Region; 7] = [
        Region::Global,
        Region::Left,
        Region::Center,
        Region::Right,
        Region::Top,
        Region::Middle,
        Region::Bottom,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Region::Global => "global",
            Region::Left => "left",
            Region::Center => "center",
            Region::Right => "right",
            Region::Top => "top",
            Region::Middle => "middle",
            Region::Bottom => "bottom",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Coverage fractions of one category, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RegionCoverage([f64; 7]);

impl RegionCoverage {
    /// Same value in every region
    pub fn uniform(value: f64) -> Self {
        Self([value.clamp(0.0, 1.0); 7])
    }

    pub fn with(mut self, region: Region, value: f64) -> Self {
        self.set(region, value);
        self
    }

    pub fn set(&mut self, region: Region, value: f64) {
        self.0[region.index()] = value.clamp(0.0, 1.0);
    }

    pub fn get(&self, region: Region) -> f64 {
        self.0[region.index()]
    }

    pub fn global(&self) -> f64 {
        self.get(Region::Global)
    }

    pub fn left(&self) -> f64 {
        self.get(Region::Left)
    }

    pub fn center(&self) -> f64 {
        self.get(Region::Center)
    }

    pub fn right(&self) -> f64 {
        self.get(Region::Right)
    }

    pub fn middle(&self) -> f64 {
        self.get(Region::Middle)
    }

    pub fn bottom(&self) -> f64 {
        self.get(Region::Bottom)
    }

    /// Detection confidence derived from global coverage
    pub fn confidence(&self) -> f64 {
        (self.global() * 10.0).min(1.0)
    }
}

/// Coverage of every category in a palette, in palette order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CoverageReport {
    entries: Vec<(String, RegionCoverage)>,
}

impl CoverageReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a category's coverage
    pub fn insert(&mut self, category: impl Into<String>, coverage: RegionCoverage) {
        let category = category.into();
        match self.entries.iter_mut().find(|(name, _)| *name == category) {
            Some((_, existing)) => *existing = coverage,
            None => self.entries.push((category, coverage)),
        }
    }

    pub fn with(mut self, category: impl Into<String>, coverage: RegionCoverage) -> Self {
        self.insert(category, coverage);
        self
    }

    pub fn get(&self, category: &str) -> Option<&RegionCoverage> {
        self.entries
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, coverage)| coverage)
    }

    /// Coverage of `category` in `region`, 0.0 for unknown categories
    pub fn value(&self, category: &str, region: Region) -> f64 {
        self.get(category).map_or(0.0, |c| c.get(region))
    }

    /// Global coverage of `category`, 0.0 for unknown categories
    pub fn global(&self, category: &str) -> f64 {
        self.value(category, Region::Global)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RegionCoverage)> {
        self.entries.iter().map(|(name, c)| (name.as_str(), c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Category with the highest global coverage
    pub fn dominant(&self) -> Option<(&str, f64)> {
        self.iter()
            .map(|(name, c)| (name, c.global()))
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }
}

/// Column or row band of a coordinate: 0, 1 or 2
#[inline]
fn band(pos: u32, extent: u32) -> usize {
    if pos < extent / 3 {
        0
    } else if pos < 2 * extent / 3 {
        1
    } else {
        2
    }
}

fn fraction(matches: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        matches as f64 / total as f64
    }
}

/// Measure how much of the frame each palette category covers
///
/// A category with several ranges reports the sum of the per-range
/// fractions, so a pixel inside two overlapping ranges counts twice. The
/// sum is clamped to 1.0.
pub fn extract(frame: &Frame, palette: &Palette) -> CoverageReport {
    let (width, height) = (frame.width(), frame.height());

    // Region pixel counts, indexed like Region::ALL
    let mut totals = [0u64; 7];
    // matches[category][range][region]
    let mut matches: Vec<Vec<[u64; 7]>> = palette
        .categories
        .iter()
        .map(|c| vec![[0u64; 7]; c.ranges.len()])
        .collect();

    let convert = |pixel: [u8; 3]| match (frame.space(), palette.space) {
        (ColorSpace::Rgb, ColorSpace::Hsv) => rgb_to_hsv(pixel),
        (ColorSpace::Hsv, ColorSpace::Rgb) => hsv_to_rgb(pixel),
        _ => pixel,
    };

    for (x, y, pixel) in frame.image().enumerate_pixels() {
        let regions = [
            Region::Global.index(),
            Region::Left.index() + band(x, width),
            Region::Top.index() + band(y, height),
        ];
        for r in regions {
            totals[r] += 1;
        }

        let value = convert(pixel.0);
        for (category, counts) in palette.categories.iter().zip(matches.iter_mut()) {
            for (range, count) in category.ranges.iter().zip(counts.iter_mut()) {
                if range.contains(value) {
                    for r in regions {
                        count[r] += 1;
                    }
                }
            }
        }
    }

    let mut report = CoverageReport::new();
    for (category, counts) in palette.categories.iter().zip(&matches) {
        let mut coverage = RegionCoverage::default();
        for region in Region::ALL {
            let i = region.index();
            let sum: f64 = counts.iter().map(|c| fraction(c[i], totals[i])).sum();
            coverage.set(region, sum);
        }
        report.insert(category.name.clone(), coverage);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::palette::{Category, ColorRange};
    use image::{Rgb, RgbImage};

    fn solid(width: u32, height: u32, color: [u8; 3]) -> Frame {
        Frame::new(RgbImage::from_pixel(width, height, Rgb(color)), ColorSpace::Rgb)
    }

    #[test]
    fn test_uniform_match() {
        // Inside the first water range only
        let frame = solid(30, 30, [50, 150, 160]);
        let report = extract(&frame, &Palette::water());
        for region in Region::ALL {
            assert_eq!(report.value("water", region), 1.0);
        }
    }

    #[test]
    fn test_no_match() {
        let frame = solid(30, 30, [255, 0, 0]);
        let report = extract(&frame, &Palette::water());
        for region in Region::ALL {
            assert_eq!(report.value("water", region), 0.0);
        }
    }

    #[test]
    fn test_overlapping_ranges_sum() {
        // (80, 160, 200) lies in water ranges 1 and 3
        let mut image = RgbImage::from_pixel(10, 10, Rgb([255, 0, 0]));
        for x in 0..10 {
            image.put_pixel(x, 0, Rgb([80, 160, 200]));
        }
        let frame = Frame::new(image, ColorSpace::Rgb);
        let report = extract(&frame, &Palette::water());
        assert!((report.global("water") - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_sum_is_clamped() {
        let frame = solid(9, 9, [80, 160, 200]);
        let report = extract(&frame, &Palette::water());
        for region in Region::ALL {
            let value = report.value("water", region);
            assert!((0.0..=1.0).contains(&value));
        }
        assert_eq!(report.global("water"), 1.0);
    }

    #[test]
    fn test_regions() {
        // Left third water, rest red; 30 columns, 9 rows
        let mut image = RgbImage::from_pixel(30, 9, Rgb([255, 0, 0]));
        for x in 0..10 {
            for y in 0..9 {
                image.put_pixel(x, y, Rgb([50, 150, 160]));
            }
        }
        let report = extract(&Frame::new(image, ColorSpace::Rgb), &Palette::water());
        let water = report.get("water").unwrap();

        assert_eq!(water.left(), 1.0);
        assert_eq!(water.center(), 0.0);
        assert_eq!(water.right(), 0.0);
        assert!((water.global() - 1.0 / 3.0).abs() < 1e-9);
        assert!((water.get(Region::Top) - 1.0 / 3.0).abs() < 1e-9);
        assert!((water.bottom() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_narrow_frame_has_empty_regions() {
        // width 1: left band is x < 0, so it has no pixels
        let frame = solid(1, 1, [50, 150, 160]);
        let report = extract(&frame, &Palette::water());
        assert_eq!(report.value("water", Region::Left), 0.0);
        assert_eq!(report.value("water", Region::Center), 0.0);
        assert_eq!(report.value("water", Region::Right), 1.0);
        assert_eq!(report.global("water"), 1.0);
    }

    #[test]
    fn test_rgb_frame_against_hsv_palette() {
        // Pure green: hue 60, saturated
        let frame = solid(6, 6, [0, 200, 0]);
        let report = extract(&frame, &Palette::terrain());
        assert_eq!(report.global("grass"), 1.0);
        assert_eq!(report.global("sky"), 0.0);
    }

    #[test]
    fn test_report_order_and_dominant() {
        let palette = Palette::new(
            ColorSpace::Rgb,
            vec![
                Category::new("red", &[ColorRange::new([200, 0, 0], [255, 50, 50])]),
                Category::new("blue", &[ColorRange::new([0, 0, 200], [50, 50, 255])]),
            ],
        );
        let mut image = RgbImage::from_pixel(4, 4, Rgb([0, 0, 255]));
        image.put_pixel(0, 0, Rgb([255, 0, 0]));
        let report = extract(&Frame::new(image, ColorSpace::Rgb), &palette);

        let names: Vec<_> = report.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["red", "blue"]);
        assert_eq!(report.dominant().map(|(n, _)| n), Some("blue"));
        assert_eq!(report.global("missing"), 0.0);
    }

    #[test]
    fn test_confidence() {
        assert_eq!(RegionCoverage::uniform(0.05).confidence(), 0.5);
        assert_eq!(RegionCoverage::uniform(0.5).confidence(), 1.0);
    }
}
