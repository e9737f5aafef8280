//! Language-model driven decisions
//!
//! Renders the current coverage report into a prompt, asks an
//! Ollama-compatible service for the next move and parses the reply back
//! into an [`Action`]. The service is advisory: whenever it fails the
//! policy falls back to a fixed action.

use std::fmt::Write as _;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::policy::{Observation, Policy};
use crate::control::Action;
use crate::vision::CoverageReport;

/// Default objective handed to the model
pub const DEFAULT_OBJECTIVE: &str =
    "Build a small shelter by gathering wood and dirt, then constructing a basic structure";

/// Decision service errors
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Request to decision service failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Decision service returned an empty response")]
    EmptyResponse,
    #[error("Could not find an action in response: {0}")]
    Unparseable(String),
}

/// Produces text from a prompt
pub trait TextGenerator {
    fn generate(&self, prompt: &str, system: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
    top_k: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Blocking client for an Ollama `/api/generate` endpoint
pub struct OllamaClient {
    http: reqwest::blocking::Client,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OllamaClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            model: model.into(),
            temperature: 0.2,
        })
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }
}

impl TextGenerator for OllamaClient {
    fn generate(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            system,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
                top_p: 0.9,
                top_k: 40,
            },
        };

        let reply: GenerateResponse = self
            .http
            .post(self.endpoint())
            .json(&request)
            .send()?
            .error_for_status()?
            .json()?;

        let text = reply.response.trim();
        if text.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}

/// System instruction: objective, vocabulary and reply format
pub fn system_prompt(objective: &str) -> String {
    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "You are an agent controlling a game character through a mirrored phone screen."
    );
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "OBJECTIVE: {objective}");
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "AVAILABLE ACTIONS:");
    for action in Action::ALL {
        let _ = writeln!(prompt, "- {}: {}", action.name(), action.describe());
    }
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "RESPONSE FORMAT:");
    let _ = writeln!(
        prompt,
        "Analyze the situation briefly, then answer with exactly one action:"
    );
    let _ = writeln!(prompt, "ACTION: [action_name]");
    let _ = write!(prompt, "REASON: [brief explanation]");
    prompt
}

/// Per-tick prompt describing what is on screen
pub fn user_prompt(coverage: &CoverageReport, target: &str, recent: &[Action]) -> String {
    let mut prompt = String::from("CURRENT GAME STATE:\nColors visible on screen:\n");
    for (name, c) in coverage.iter() {
        let _ = writeln!(prompt, "- {}: {:.1}%", name, c.global() * 100.0);
    }

    if let Some(c) = coverage.get(target) {
        let _ = writeln!(
            prompt,
            "\n{} by screen side: left {:.1}%, center {:.1}%, right {:.1}%",
            target,
            c.left() * 100.0,
            c.center() * 100.0,
            c.right() * 100.0
        );
    }

    let last: Vec<&str> = recent
        .iter()
        .rev()
        .take(3)
        .rev()
        .map(|a| a.name())
        .collect();
    let _ = writeln!(
        prompt,
        "\nRecent actions: {}",
        if last.is_empty() {
            "None".to_string()
        } else {
            last.join(", ")
        }
    );
    prompt.push_str("\nChoose your next action:");
    prompt
}

fn keyword_action(reply: &str) -> Option<Action> {
    let lower = reply.to_lowercase();
    let has = |word: &str| lower.contains(word);

    if has("move") && has("forward") {
        Some(Action::MoveForward)
    } else if has("look") && has("left") {
        Some(Action::LookLeft)
    } else if has("look") && has("right") {
        Some(Action::LookRight)
    } else if has("mine") || has("chop") {
        Some(Action::Mine)
    } else if has("center") {
        Some(Action::CenterView)
    } else {
        None
    }
}

/// Extract an action from a model reply
///
/// An `ACTION:` line wins; otherwise a few keywords are recognized.
pub fn parse_response(reply: &str) -> Result<Action, LlmError> {
    for line in reply.lines() {
        let line = line.trim().trim_start_matches(['*', '-', ' ']);
        let is_action_line = line
            .get(..7)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("action:"));
        if is_action_line {
            let name = line[7..].trim_matches(|c: char| c == '*' || c.is_whitespace());
            match name.parse::<Action>() {
                Ok(action) => return Ok(action),
                Err(_) => break,
            }
        }
    }

    keyword_action(reply).ok_or_else(|| {
        let excerpt: String = reply.chars().take(80).collect();
        LlmError::Unparseable(excerpt)
    })
}

/// Policy that delegates every decision to a [`TextGenerator`]
pub struct LlmPolicy {
    generator: Box<dyn TextGenerator>,
    objective: String,
    fallback: Action,
    /// Decisions that had to use the fallback
    fallbacks: u32,
}

impl LlmPolicy {
    pub fn new(generator: Box<dyn TextGenerator>) -> Self {
        Self {
            generator,
            objective: DEFAULT_OBJECTIVE.to_string(),
            fallback: Action::LookRight,
            fallbacks: 0,
        }
    }

    pub fn with_objective(mut self, objective: impl Into<String>) -> Self {
        self.objective = objective.into();
        self
    }

    pub fn with_fallback(mut self, fallback: Action) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn fallbacks(&self) -> u32 {
        self.fallbacks
    }

    fn decide(&self, observation: &Observation<'_>) -> Result<Action, LlmError> {
        let system = system_prompt(&self.objective);
        let prompt = user_prompt(observation.coverage, observation.target, observation.recent);
        let reply = self.generator.generate(&prompt, &system)?;
        log::debug!("Model reply: {}", reply);
        parse_response(&reply)
    }
}

impl Policy for LlmPolicy {
    fn name(&self) -> &str {
        "llm"
    }

    fn select_action(&mut self, observation: &Observation<'_>) -> Action {
        match self.decide(observation) {
            Ok(action) => {
                log::info!("Model decision: {}", action);
                action
            }
            Err(e) => {
                self.fallbacks += 1;
                log::warn!("{} - falling back to {}", e, self.fallback);
                self.fallback
            }
        }
    }
}
