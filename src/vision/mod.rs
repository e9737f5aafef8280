//! Vision and image processing module
//!
//! Handles screen capture, color classification and the per-region coverage
//! features the decision layer works from.

pub mod artifacts;
pub mod capture;
pub mod coverage;
pub mod palette;

pub use artifacts::FrameRecorder;
pub use capture::{Frame, FrameSource, ScreenCapture, ScreenRegion};
pub use coverage::{extract, CoverageReport, Region, RegionCoverage};
pub use palette::{Category, ColorRange, ColorSpace, Palette};

/// Result of one observation
#[derive(Debug, Clone)]
pub struct Observed {
    pub frame: Frame,
    pub coverage: CoverageReport,
}

/// Couples a frame source with a palette
pub struct VisionSystem {
    /// Screen capture handler
    source: Box<dyn FrameSource>,
    palette: Palette,
    recorder: Option<FrameRecorder>,
}

impl VisionSystem {
    pub fn new(source: Box<dyn FrameSource>, palette: Palette) -> Self {
        Self {
            source,
            palette,
            recorder: None,
        }
    }

    /// Save every n-th observed frame
    pub fn with_recorder(mut self, recorder: Option<FrameRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
    }

    pub fn recorder_mut(&mut self) -> Option<&mut FrameRecorder> {
        self.recorder.as_mut()
    }

    /// Capture one frame and measure it
    pub fn capture(&mut self) -> Result<Observed, VisionError> {
        let frame = self.source.capture()?;
        let coverage = extract(&frame, &self.palette);
        Ok(Observed { frame, coverage })
    }

    /// Capture and measure the frame of driver tick `attempt`
    ///
    /// Frames are recorded when a recorder is attached and the attempt
    /// falls on its stride. Recording failures are logged only.
    pub fn observe(&mut self, attempt: u32) -> Result<CoverageReport, VisionError> {
        let Observed { frame, coverage } = self.capture()?;

        if let Some(recorder) = self.recorder.as_mut() {
            if recorder.should_record(attempt) {
                if let Err(e) = recorder.record(&frame, attempt) {
                    log::warn!("Failed to save debug frame: {}", e);
                }
            }
        }

        Ok(coverage)
    }
}

/// Vision system errors
#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("Screen capture failed: {0}")]
    Capture(String),
    #[error("No monitor available for capture")]
    NoMonitor,
    #[error("Region {region:?} does not fit the {width}x{height} screen")]
    InvalidRegion {
        region: ScreenRegion,
        width: u32,
        height: u32,
    },
    #[error("Failed to process image: {0}")]
    ImageProcessingError(String),
    #[error("Invalid frame data")]
    InvalidFrameData,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    struct Solid([u8; 3]);

    impl FrameSource for Solid {
        fn capture(&mut self) -> Result<Frame, VisionError> {
            Ok(Frame::new(
                RgbImage::from_pixel(12, 12, Rgb(self.0)),
                ColorSpace::Rgb,
            ))
        }
    }

    struct Failing;

    impl FrameSource for Failing {
        fn capture(&mut self) -> Result<Frame, VisionError> {
            Err(VisionError::NoMonitor)
        }
    }

    #[test]
    fn test_observe_measures_palette() {
        let mut vision = VisionSystem::new(Box::new(Solid([50, 150, 160])), Palette::water());
        let coverage = vision.observe(0).unwrap();
        assert_eq!(coverage.global("water"), 1.0);

        vision.set_palette(Palette::trees());
        let coverage = vision.observe(1).unwrap();
        assert_eq!(coverage.global("tree"), 0.0);
        assert!(coverage.get("water").is_none());
    }

    #[test]
    fn test_observe_records_on_stride() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = FrameRecorder::new(dir.path()).with_every(2);
        let mut vision = VisionSystem::new(Box::new(Solid([0, 0, 0])), Palette::water())
            .with_recorder(Some(recorder));

        for attempt in 0..5 {
            vision.observe(attempt).unwrap();
        }
        assert_eq!(vision.recorder_mut().unwrap().saved(), 3);
    }

    #[test]
    fn test_capture_error_propagates() {
        let mut vision = VisionSystem::new(Box::new(Failing), Palette::water());
        assert!(matches!(vision.observe(0), Err(VisionError::NoMonitor)));
    }
}
