//! Scripted capture rig shared by the mission tests

use std::collections::VecDeque;

use image::{Rgb, RgbImage};

use crate::control::{Actuator, DryRunBackend, InputLog, NoopFocuser, PulseTimings};
use crate::vision::{ColorSpace, Frame, FrameSource, Palette, VisionError, VisionSystem};

const WATER: [u8; 3] = [50, 150, 160];
const OTHER: [u8; 3] = [200, 30, 30];

/// Replays a water coverage trace as 100x10 frames; `None` fails the capture
pub struct ScriptedSource {
    trace: VecDeque<Option<f64>>,
    last: Option<f64>,
}

impl ScriptedSource {
    pub fn new(trace: Vec<Option<f64>>) -> Self {
        Self {
            trace: trace.into(),
            last: Some(0.0),
        }
    }
}

impl FrameSource for ScriptedSource {
    fn capture(&mut self) -> Result<Frame, VisionError> {
        let next = self.trace.pop_front().unwrap_or(self.last);
        self.last = next;
        let coverage = next.ok_or(VisionError::Capture("scripted failure".into()))?;

        let water_pixels = (coverage * 1000.0).round() as u32;
        let image = RgbImage::from_fn(100, 10, |x, y| {
            if y * 100 + x < water_pixels {
                Rgb(WATER)
            } else {
                Rgb(OTHER)
            }
        });
        Ok(Frame::new(image, ColorSpace::Rgb))
    }
}

/// Vision over a scripted trace and a dry-run actuator with instant pulses
pub fn rig(trace: Vec<Option<f64>>) -> (VisionSystem, Actuator, InputLog) {
    let vision = VisionSystem::new(Box::new(ScriptedSource::new(trace)), Palette::water());
    let backend = DryRunBackend::new();
    let log = backend.log();
    let actuator = Actuator::new(Box::new(backend), Box::new(NoopFocuser), "Test")
        .with_timings(PulseTimings::instant());
    (vision, actuator, log)
}
