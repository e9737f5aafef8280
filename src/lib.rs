//! BlockPilot - screen-driven automation for a mirrored block-building game
//!
//! This library provides the core functionality for driving a game character
//! that is only reachable through a mirrored display: screen capture and
//! color coverage analysis, search phases and action policies, synthetic
//! keyboard and mouse input, and the mission loop tying them together.
//!
//! ## Decision Loop
//!
//! Each tick captures a frame, measures how much of it matches the target
//! palette, picks an action and sends it as a timed input pulse. See
//! [`mission::EpisodeDriver`].

pub mod ai;
pub mod config;
pub mod control;
pub mod mission;
pub mod vision;

use std::fmt;

use crate::ai::{
    ExplorePolicy, LlmError, LlmPolicy, OllamaClient, Policy, RulePolicy, RuleProfile,
    ShelterPolicy,
};
use crate::config::{ConfigError, ModelType, Settings};
use crate::control::{
    Actuator, AppleScriptFocuser, ControlError, DryRunBackend, EnigoBackend, InputBackend,
    NoopFocuser, WindowFocuser,
};
use crate::mission::{CancelToken, EpisodeDriver, EpisodeReport, GoalExecutor, GoalParser};
use crate::vision::{FrameSource, Palette, ScreenCapture, VisionError, VisionSystem};

/// Top-level errors
#[derive(Debug, thiserror::Error)]
pub enum PilotError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Vision(#[from] VisionError),
    #[error(transparent)]
    Control(#[from] ControlError),
    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Canned missions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mission {
    /// Long-range water search
    Water,
    /// Shorter water sweep that also looks down at nearby water
    CompactWater,
    /// Tree search
    Trees,
    /// Free exploration, never stops early
    Explore,
    /// Language-model agent over the terrain palette
    Llm,
    /// Gather wood and dirt, then build
    Shelter,
}

impl Mission {
    pub fn name(&self) -> &'static str {
        match self {
            Mission::Water => "water",
            Mission::CompactWater => "compact-water",
            Mission::Trees => "trees",
            Mission::Explore => "explore",
            Mission::Llm => "llm",
            Mission::Shelter => "shelter",
        }
    }

    /// Palette analyzed on every tick
    pub fn palette(&self) -> Palette {
        match self {
            Mission::Water | Mission::CompactWater | Mission::Explore => Palette::water(),
            Mission::Trees => Palette::trees(),
            Mission::Llm | Mission::Shelter => Palette::terrain(),
        }
    }

    /// Category whose coverage decides the verdict
    pub fn target(&self) -> &'static str {
        match self {
            Mission::Water | Mission::CompactWater | Mission::Explore => "water",
            Mission::Trees => "tree",
            Mission::Llm | Mission::Shelter => "wood",
        }
    }

    /// Whether a strong sighting ends the mission
    pub fn stops_on_success(&self) -> bool {
        matches!(
            self,
            Mission::Water | Mission::CompactWater | Mission::Trees
        )
    }

    /// Step budget when none is given
    pub fn default_steps(&self, settings: &Settings) -> u32 {
        match self {
            Mission::CompactWater => 150,
            _ => settings.mission.max_steps,
        }
    }
}

impl fmt::Display for Mission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The assembled agent: vision, input and settings
pub struct Pilot {
    pub settings: Settings,
    vision: VisionSystem,
    actuator: Actuator,
    cancel: CancelToken,
}

impl Pilot {
    /// Assemble a pilot from explicit parts
    pub fn new(
        settings: Settings,
        source: Box<dyn FrameSource>,
        backend: Box<dyn InputBackend>,
        focuser: Box<dyn WindowFocuser>,
        cancel: CancelToken,
    ) -> Self {
        let vision = VisionSystem::new(source, Palette::water())
            .with_recorder(settings.debug.recorder());
        let actuator = Actuator::new(backend, focuser, settings.agent.target_app.clone())
            .with_bindings(settings.automation.bindings.clone())
            .with_timings(settings.automation.pulse_timings());
        Self {
            settings,
            vision,
            actuator,
            cancel,
        }
    }

    /// Pilot on the primary monitor, sending real input unless `dry_run`
    pub fn live(
        settings: Settings,
        dry_run: bool,
        cancel: CancelToken,
    ) -> Result<Self, PilotError> {
        let capture = ScreenCapture::new()
            .with_region(settings.vision.screen_region)
            .with_scale(settings.vision.image_scale)
            .with_color_space(settings.vision.color_space);
        capture.probe()?;

        let (backend, focuser): (Box<dyn InputBackend>, Box<dyn WindowFocuser>) = if dry_run {
            log::info!("Dry run: input is logged, not sent");
            (Box::new(DryRunBackend::new()), Box::new(NoopFocuser))
        } else {
            (
                Box::new(EnigoBackend::new()?),
                Box::new(AppleScriptFocuser::new()),
            )
        };

        Ok(Self::new(settings, Box::new(capture), backend, focuser, cancel))
    }

    pub fn vision_mut(&mut self) -> &mut VisionSystem {
        &mut self.vision
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Decision maker for a mission
    ///
    /// With `ai.model_type: llm` the search missions ask the model too; the
    /// shelter mission keeps its own rules.
    pub fn policy_for(&self, mission: Mission) -> Result<Box<dyn Policy>, PilotError> {
        if mission == Mission::Llm
            || (self.settings.ai.model_type == ModelType::Llm && mission != Mission::Shelter)
        {
            return self.llm_policy();
        }

        let policy: Box<dyn Policy> = match mission {
            Mission::Water => Box::new(RulePolicy::new(RuleProfile::long_range_water())),
            Mission::CompactWater => Box::new(RulePolicy::new(RuleProfile::compact_water())),
            Mission::Trees => Box::new(RulePolicy::new(RuleProfile::trees())),
            Mission::Explore => Box::new(ExplorePolicy::default()),
            Mission::Shelter => Box::new(ShelterPolicy::new()),
            Mission::Llm => return self.llm_policy(),
        };
        Ok(policy)
    }

    fn llm_policy(&self) -> Result<Box<dyn Policy>, PilotError> {
        let llm = &self.settings.ai.llm;
        let client = OllamaClient::new(&llm.base_url, &llm.model, llm.timeout())?
            .with_temperature(llm.temperature);
        log::info!("Using model {} at {}", client.model(), llm.base_url);
        Ok(Box::new(
            LlmPolicy::new(Box::new(client)).with_objective(&llm.objective),
        ))
    }

    /// Run one mission to completion
    pub fn run(
        &mut self,
        mission: Mission,
        steps: Option<u32>,
    ) -> Result<EpisodeReport, PilotError> {
        let mut policy = self.policy_for(mission)?;
        let max_steps = steps.unwrap_or_else(|| mission.default_steps(&self.settings));
        let config = self
            .settings
            .episode(mission.target())
            .with_max_steps(max_steps)
            .with_stop_on_success(mission.stops_on_success());

        self.vision.set_palette(mission.palette());
        log::info!("Starting {} mission ({} steps)", mission, max_steps);

        let report = EpisodeDriver::new(&mut self.vision, &mut self.actuator, self.cancel.clone())
            .run(policy.as_mut(), &config);
        Ok(report)
    }

    /// Hand the stack to a goal executor for typed commands
    pub fn into_executor(self) -> GoalExecutor {
        let mission = &self.settings.mission;
        let parser = GoalParser::new();
        let template = self.settings.episode("water");
        let seconds_per_step = mission.seconds_per_step;
        GoalExecutor::new(self.vision, self.actuator, self.cancel)
            .with_parser(parser)
            .with_template(template)
            .with_seconds_per_step(seconds_per_step)
    }
}
