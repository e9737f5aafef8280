//! Screen capture handling
//!
//! Grabs the primary monitor, crops it to the configured region, scales it
//! down and converts it into the analysis color space.

use image::imageops::{self, FilterType};
use image::buffer::ConvertBuffer;
use image::{RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};

use super::palette::{hsv_to_rgb, rgb_to_hsv, ColorSpace};
use super::VisionError;

/// One captured screen image
#[derive(Debug, Clone)]
pub struct Frame {
    image: RgbImage,
    space: ColorSpace,
}

impl Frame {
    pub fn new(image: RgbImage, space: ColorSpace) -> Self {
        Self { image, space }
    }

    /// Drop the alpha channel of a raw RGBA capture
    pub fn from_rgba(rgba: &RgbaImage) -> Self {
        let image: RgbImage = rgba.convert();
        Self::new(image, ColorSpace::Rgb)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel_count(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn space(&self) -> ColorSpace {
        self.space
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        (x < self.width() && y < self.height()).then(|| self.image.get_pixel(x, y).0)
    }

    /// Re-express the pixels in another color space
    pub fn into_space(self, space: ColorSpace) -> Frame {
        let convert: fn([u8; 3]) -> [u8; 3] = match (self.space, space) {
            (ColorSpace::Rgb, ColorSpace::Hsv) => rgb_to_hsv,
            (ColorSpace::Hsv, ColorSpace::Rgb) => hsv_to_rgb,
            _ => return self,
        };
        let mut image = self.image;
        for pixel in image.pixels_mut() {
            pixel.0 = convert(pixel.0);
        }
        Frame { image, space }
    }
}

/// Rectangle of the monitor to analyze, in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenRegion {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// Anything that can produce frames
pub trait FrameSource {
    fn capture(&mut self) -> Result<Frame, VisionError>;
}

/// Crop, scale and convert a raw capture
pub fn prepare(
    raw: &RgbaImage,
    region: Option<ScreenRegion>,
    scale: f32,
    space: ColorSpace,
) -> Result<Frame, VisionError> {
    let cropped = match region {
        Some(r) => {
            if r.width == 0
                || r.height == 0
                || r.left.saturating_add(r.width) > raw.width()
                || r.top.saturating_add(r.height) > raw.height()
            {
                return Err(VisionError::InvalidRegion {
                    region: r,
                    width: raw.width(),
                    height: raw.height(),
                });
            }
            imageops::crop_imm(raw, r.left, r.top, r.width, r.height).to_image()
        }
        None => raw.clone(),
    };

    if cropped.width() == 0 || cropped.height() == 0 {
        return Err(VisionError::InvalidFrameData);
    }

    let scaled = if scale > 0.0 && (scale - 1.0).abs() > f32::EPSILON {
        let width = ((cropped.width() as f32 * scale) as u32).max(1);
        let height = ((cropped.height() as f32 * scale) as u32).max(1);
        imageops::resize(&cropped, width, height, FilterType::Triangle)
    } else {
        cropped
    };

    Ok(Frame::from_rgba(&scaled).into_space(space))
}

/// Captures the primary monitor through `xcap`
pub struct ScreenCapture {
    region: Option<ScreenRegion>,
    scale: f32,
    space: ColorSpace,
    /// Frame counter
    frame_count: u64,
}

impl ScreenCapture {
    pub fn new() -> Self {
        Self {
            region: None,
            scale: 1.0,
            space: ColorSpace::Rgb,
            frame_count: 0,
        }
    }

    pub fn with_region(mut self, region: Option<ScreenRegion>) -> Self {
        self.region = region;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_color_space(mut self, space: ColorSpace) -> Self {
        self.space = space;
        self
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Check that a monitor can be found
    pub fn probe(&self) -> Result<(), VisionError> {
        primary_monitor().map(|_| ())
    }
}

impl Default for ScreenCapture {
    fn default() -> Self {
        Self::new()
    }
}

fn primary_monitor() -> Result<xcap::Monitor, VisionError> {
    let monitors = xcap::Monitor::all().map_err(|e| VisionError::Capture(e.to_string()))?;
    let mut fallback = None;
    for monitor in monitors {
        if monitor.is_primary() {
            return Ok(monitor);
        }
        fallback.get_or_insert(monitor);
    }
    fallback.ok_or(VisionError::NoMonitor)
}

impl FrameSource for ScreenCapture {
    fn capture(&mut self) -> Result<Frame, VisionError> {
        let monitor = primary_monitor()?;
        let raw = monitor
            .capture_image()
            .map_err(|e| VisionError::Capture(e.to_string()))?;

        let frame = prepare(&raw, self.region, self.scale, self.space)?;
        self.frame_count += 1;
        log::trace!(
            "Captured frame {} ({}x{})",
            self.frame_count,
            frame.width(),
            frame.height()
        );
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn raw(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Rgba([0, 0, 255, 255])
            } else {
                Rgba([255, 0, 0, 255])
            }
        })
    }

    #[test]
    fn test_alpha_is_dropped() {
        let rgba = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 0]));
        let frame = Frame::from_rgba(&rgba);
        assert_eq!((frame.width(), frame.height()), (3, 2));
        assert_eq!(frame.pixel(2, 1), Some([10, 20, 30]));
        assert_eq!(frame.space(), ColorSpace::Rgb);
    }

    #[test]
    fn test_prepare_full_frame() {
        let frame = prepare(&raw(40, 20), None, 1.0, ColorSpace::Rgb).unwrap();
        assert_eq!((frame.width(), frame.height()), (40, 20));
        assert_eq!(frame.pixel(0, 0), Some([0, 0, 255]));
        assert_eq!(frame.pixel(39, 19), Some([255, 0, 0]));
        assert_eq!(frame.pixel(40, 0), None);
    }

    #[test]
    fn test_prepare_crop_and_scale() {
        let region = ScreenRegion {
            left: 20,
            top: 0,
            width: 20,
            height: 10,
        };
        let frame = prepare(&raw(40, 20), Some(region), 0.5, ColorSpace::Rgb).unwrap();
        assert_eq!((frame.width(), frame.height()), (10, 5));
        assert_eq!(frame.pixel(5, 2), Some([255, 0, 0]));
    }

    #[test]
    fn test_prepare_rejects_out_of_bounds_region() {
        let region = ScreenRegion {
            left: 30,
            top: 0,
            width: 20,
            height: 10,
        };
        assert!(matches!(
            prepare(&raw(40, 20), Some(region), 1.0, ColorSpace::Rgb),
            Err(VisionError::InvalidRegion { .. })
        ));
    }

    #[test]
    fn test_prepare_hsv() {
        let frame = prepare(&raw(4, 4), None, 1.0, ColorSpace::Hsv).unwrap();
        assert_eq!(frame.space(), ColorSpace::Hsv);
        assert_eq!(frame.pixel(0, 0), Some([120, 255, 255]));
        assert_eq!(frame.pixel(3, 0), Some([0, 255, 255]));
    }

    #[test]
    fn test_empty_capture_is_invalid() {
        assert!(prepare(&RgbaImage::new(0, 0), None, 1.0, ColorSpace::Rgb).is_err());
    }
}
