//! Typed settings
//!
//! Mirrors the YAML document section by section. Every section falls back to
//! its defaults, so a partial file is enough.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ai::llm::DEFAULT_OBJECTIVE;
use crate::ai::PhaseThresholds;
use crate::control::{KeyBindings, PulseTimings};
use crate::mission::EpisodeConfig;
use crate::vision::{ColorSpace, FrameRecorder, ScreenRegion};

/// Main settings structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub agent: AgentSettings,
    pub vision: VisionSettings,
    pub automation: AutomationSettings,
    pub ai: AiSettings,
    pub mission: MissionSettings,
    pub logging: LoggingSettings,
    pub debug: DebugSettings,
}

impl Settings {
    /// Episode parameters for a target category
    ///
    /// The tick delay never drops below what `max_actions_per_second`
    /// allows.
    pub fn episode(&self, target: &str) -> EpisodeConfig {
        let m = &self.mission;
        let mut config = EpisodeConfig::new(target)
            .with_max_steps(m.max_steps)
            .with_tick_delay(m.tick_delay().max(self.agent.min_action_interval()));
        config.thresholds = m.thresholds();
        config.success_threshold = m.success_threshold;
        config.partial_threshold = m.partial_threshold;
        config.detect_threshold = m.detect_threshold;
        config.notable_threshold = m.notable_threshold;
        config.progress_stride = m.progress_stride;
        config
    }
}

/// Identity and pacing of the agent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub name: String,
    pub update_rate: f64,
    pub max_actions_per_second: f64,
    /// Window that receives input
    pub target_app: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            name: "BlockPilot".to_string(),
            update_rate: 0.1,
            max_actions_per_second: 10.0,
            target_app: "iPhone Mirroring".to_string(),
        }
    }
}

impl AgentSettings {
    /// Shortest allowed pause between two actions
    pub fn min_action_interval(&self) -> Duration {
        if self.max_actions_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / self.max_actions_per_second)
        } else {
            Duration::ZERO
        }
    }
}

/// Screen capture settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionSettings {
    /// Crop of the primary monitor; the full screen when absent
    pub screen_region: Option<ScreenRegion>,
    pub image_scale: f32,
    pub color_space: ColorSpace,
}

impl Default for VisionSettings {
    fn default() -> Self {
        Self {
            screen_region: None,
            image_scale: 0.5,
            color_space: ColorSpace::Rgb,
        }
    }
}

/// Input timing and key bindings, durations in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationSettings {
    pub click_duration: f64,
    pub key_press_duration: f64,
    pub safety_bounds: bool,
    pub move_duration: f64,
    pub look_duration: f64,
    pub tap_duration: f64,
    pub wait_duration: f64,
    pub bindings: KeyBindings,
}

impl Default for AutomationSettings {
    fn default() -> Self {
        Self {
            click_duration: 0.1,
            key_press_duration: 0.05,
            safety_bounds: true,
            move_duration: 0.5,
            look_duration: 0.3,
            tap_duration: 0.1,
            wait_duration: 0.5,
            bindings: KeyBindings::default(),
        }
    }
}

impl AutomationSettings {
    pub fn pulse_timings(&self) -> PulseTimings {
        PulseTimings {
            movement: seconds(self.move_duration),
            look: seconds(self.look_duration),
            tap: seconds(self.tap_duration),
            wait: seconds(self.wait_duration),
        }
    }
}

/// Which decision maker drives the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    #[default]
    RuleBased,
    Llm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    pub model_type: ModelType,
    pub exploration_rate: f64,
    pub learning_rate: f64,
    pub llm: LlmSettings,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            model_type: ModelType::RuleBased,
            exploration_rate: 0.1,
            learning_rate: 0.001,
            llm: LlmSettings::default(),
        }
    }
}

/// Connection to the text-generation service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub objective: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "qwen2.5:7b".to_string(),
            temperature: 0.2,
            timeout_secs: 30,
            objective: DEFAULT_OBJECTIVE.to_string(),
        }
    }
}

impl LlmSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Episode thresholds and pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionSettings {
    pub low_threshold: f64,
    pub high_threshold: f64,
    pub search_budget: u32,
    pub success_threshold: f64,
    pub partial_threshold: f64,
    pub detect_threshold: f64,
    pub notable_threshold: f64,
    pub progress_stride: u32,
    pub seconds_per_step: u64,
    pub max_steps: u32,
    /// Seconds between ticks
    pub tick_delay: f64,
    pub start_delay_secs: u64,
}

impl Default for MissionSettings {
    fn default() -> Self {
        Self {
            low_threshold: 0.005,
            high_threshold: 0.08,
            search_budget: 80,
            success_threshold: 0.15,
            partial_threshold: 0.01,
            detect_threshold: 0.01,
            notable_threshold: 0.05,
            progress_stride: 20,
            seconds_per_step: 2,
            max_steps: 200,
            tick_delay: 0.2,
            start_delay_secs: 3,
        }
    }
}

impl MissionSettings {
    pub fn thresholds(&self) -> PhaseThresholds {
        PhaseThresholds::new(self.low_threshold, self.high_threshold, self.search_budget)
    }

    pub fn tick_delay(&self) -> Duration {
        seconds(self.tick_delay)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// One of ERROR, WARN, INFO, DEBUG, TRACE
    pub level: String,
    /// Write log records here instead of stderr
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: None,
        }
    }
}

impl LoggingSettings {
    /// Parsed level, `Info` when unrecognized
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

/// Debug frame recording
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugSettings {
    pub save_frames: bool,
    pub output_dir: PathBuf,
    /// Record every n-th frame
    pub every: u32,
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self {
            save_frames: false,
            output_dir: PathBuf::from("logs"),
            every: 10,
        }
    }
}

impl DebugSettings {
    /// Recorder for episode frames, if recording is enabled
    pub fn recorder(&self) -> Option<FrameRecorder> {
        self.save_frames
            .then(|| FrameRecorder::new(&self.output_dir).with_every(self.every))
    }
}

/// Non-negative seconds to a duration
fn seconds(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::from_secs_f64(value)
    } else {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.agent.target_app, "iPhone Mirroring");
        assert_eq!(settings.vision.image_scale, 0.5);
        assert_eq!(settings.ai.model_type, ModelType::RuleBased);
        assert_eq!(settings.ai.llm.model, "qwen2.5:7b");
        assert_eq!(settings.mission.max_steps, 200);
        assert!(settings.debug.recorder().is_none());
    }

    #[test]
    fn test_partial_document() {
        let yaml = "
vision:
  color_space: HSV
ai:
  model_type: llm
  llm:
    temperature: 0.5
mission:
  success_threshold: 0.2
";
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.vision.color_space, ColorSpace::Hsv);
        assert_eq!(settings.vision.image_scale, 0.5);
        assert_eq!(settings.ai.model_type, ModelType::Llm);
        assert_eq!(settings.ai.llm.temperature, 0.5);
        assert_eq!(settings.ai.llm.base_url, "http://localhost:11434");
        assert_eq!(settings.mission.success_threshold, 0.2);
        assert_eq!(settings.mission.search_budget, 80);
    }

    #[test]
    fn test_unknown_model_type() {
        assert!(serde_yaml::from_str::<Settings>("ai:\n  model_type: neural\n").is_err());
    }

    #[test]
    fn test_screen_region() {
        let yaml = "vision:\n  screen_region: {left: 10, top: 20, width: 640, height: 480}\n";
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            settings.vision.screen_region,
            Some(ScreenRegion {
                left: 10,
                top: 20,
                width: 640,
                height: 480
            })
        );
    }

    #[test]
    fn test_pulse_timings() {
        let mut automation = AutomationSettings::default();
        automation.look_duration = -1.0;
        let timings = automation.pulse_timings();
        assert_eq!(timings.movement, Duration::from_millis(500));
        assert_eq!(timings.look, Duration::ZERO);
    }

    #[test]
    fn test_episode_from_settings() {
        let mut settings = Settings::default();
        settings.mission.high_threshold = 0.1;
        settings.mission.tick_delay = 0.0;
        settings.agent.max_actions_per_second = 4.0;

        let config = settings.episode("tree");
        assert_eq!(config.target, "tree");
        assert_eq!(config.thresholds.high, 0.1);
        assert_eq!(config.max_steps, 200);
        // Rate limit wins over a zero delay
        assert_eq!(config.tick_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_level_filter() {
        let mut logging = LoggingSettings::default();
        assert_eq!(logging.level_filter(), log::LevelFilter::Info);
        logging.level = "debug".to_string();
        assert_eq!(logging.level_filter(), log::LevelFilter::Debug);
        logging.level = "chatty".to_string();
        assert_eq!(logging.level_filter(), log::LevelFilter::Info);
    }
}
