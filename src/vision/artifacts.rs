//! Debug frame recording

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;

use super::capture::Frame;
use super::palette::ColorSpace;
use super::VisionError;

/// Writes analyzed frames to disk as PNG files
#[derive(Debug, Clone)]
pub struct FrameRecorder {
    output_dir: PathBuf,
    /// Record every n-th attempt
    every: u32,
    saved: u32,
}

impl FrameRecorder {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            every: 10,
            saved: 0,
        }
    }

    pub fn with_every(mut self, every: u32) -> Self {
        self.every = every.max(1);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Number of frames written so far
    pub fn saved(&self) -> u32 {
        self.saved
    }

    pub fn should_record(&self, attempt: u32) -> bool {
        attempt % self.every == 0
    }

    /// Save the frame of a driver tick as `frame_<attempt>_<timestamp>.png`
    pub fn record(&mut self, frame: &Frame, attempt: u32) -> Result<PathBuf, VisionError> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        self.save(frame, &format!("frame_{attempt:04}_{stamp}.png"))
    }

    /// Save a frame under an explicit file name
    pub fn save(&mut self, frame: &Frame, file_name: &str) -> Result<PathBuf, VisionError> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(file_name);

        // HSV frames are written back as RGB so they stay viewable
        let frame = frame.clone().into_space(ColorSpace::Rgb);
        frame
            .image()
            .save(&path)
            .map_err(|e| VisionError::ImageProcessingError(e.to_string()))?;

        self.saved += 1;
        log::debug!("Saved frame to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_record_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = FrameRecorder::new(dir.path().join("frames")).with_every(5);
        let frame = Frame::new(RgbImage::from_pixel(8, 8, Rgb([10, 20, 30])), ColorSpace::Rgb);

        let path = recorder.record(&frame, 15).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("frame_0015_"));
        assert!(name.ends_with(".png"));
        assert!(path.exists());
        assert_eq!(recorder.saved(), 1);

        let loaded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(loaded.get_pixel(0, 0).0, [10, 20, 30]);
    }

    #[test]
    fn test_should_record() {
        let recorder = FrameRecorder::new("logs").with_every(10);
        assert!(recorder.should_record(0));
        assert!(!recorder.should_record(5));
        assert!(recorder.should_record(20));

        // zero is raised to one
        let recorder = FrameRecorder::new("logs").with_every(0);
        assert!(recorder.should_record(7));
    }
}
