//! Natural-language goal parser
//!
//! Turns short commands like "find water within 30 blocks" or "go north" into
//! [`Goal`]s. Matching is keyword based and case-insensitive; find patterns
//! are tried first, then navigation, then exploration.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::goals::{
    Direction, ExplorePattern, Goal, GoalKind, Priority, Target, DEFAULT_EXPLORE_RADIUS,
    DEFAULT_TIMEOUT_SECS,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error(
        "Could not understand command: '{0}'. Try 'find water', 'go north', or 'explore area'."
    )]
    Unrecognized(String),
}

fn compile<S: AsRef<str>>(patterns: &[S]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p.as_ref()).unwrap())
        .collect()
}

const TARGETS: &str = "water|trees|tree|animals|animal|structure|building|player|item";
const HEADINGS: &str = "north|south|east|west|left|right";

static FIND_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        format!(r"find\s+({TARGETS})"),
        format!(r"look\s+for\s+({TARGETS})"),
        format!(r"search\s+for\s+({TARGETS})"),
        format!(r"locate\s+({TARGETS})"),
    ])
});

static TARGET_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        format!(r"go\s+to\s+({TARGETS})"),
        format!(r"navigate\s+to\s+({TARGETS})"),
        format!(r"move\s+to\s+({TARGETS})"),
        format!(r"walk\s+to\s+({TARGETS})"),
    ])
});

static HEADING_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        format!(r"go\s+({HEADINGS})"),
        format!(r"move\s+({HEADINGS})"),
        format!(r"head\s+({HEADINGS})"),
    ])
});

static EXPLORE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"explore\s+(?:the\s+)?area",
        r"explore\s+around",
        r"look\s+around",
        r"scout\s+(?:the\s+)?area",
        r"survey\s+(?:the\s+)?area",
    ])
});

static DISTANCE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(\d+)\s*blocks?",
        r"within\s+(\d+)",
        r"radius\s+(\d+)",
        r"(\d+)\s*units?",
    ])
});

static DIRECTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"towards?\s+(north|south|east|west)",
        r"to\s+the\s+(north|south|east|west)",
        r"(north|south|east|west)ward",
    ])
});

/// Checked in order; the first keyword contained in the text wins
const PRIORITY_KEYWORDS: [(&str, Priority); 7] = [
    ("urgent", Priority::Urgent),
    ("high", Priority::High),
    ("important", Priority::High),
    ("medium", Priority::Medium),
    ("low", Priority::Low),
    ("quick", Priority::High),
    ("slowly", Priority::Low),
];

fn target_from_word(word: &str) -> Option<Target> {
    match word {
        "water" => Some(Target::Water),
        "tree" | "trees" => Some(Target::Tree),
        "animal" | "animals" => Some(Target::Animal),
        "structure" | "building" => Some(Target::Structure),
        "player" => Some(Target::Player),
        "item" => Some(Target::Item),
        _ => None,
    }
}

/// Left and right are taken relative to the current facing
fn direction_from_word(word: &str) -> Option<Direction> {
    match word {
        "north" => Some(Direction::North),
        "south" => Some(Direction::South),
        "east" | "right" => Some(Direction::East),
        "west" | "left" => Some(Direction::West),
        _ => None,
    }
}

/// First capture of the first pattern that matches
fn first_capture<'t>(patterns: &[Regex], text: &'t str) -> Option<&'t str> {
    patterns
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Parses typed commands into goals
#[derive(Debug, Clone)]
pub struct GoalParser {
    timeout_secs: u64,
}

impl Default for GoalParser {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl GoalParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timeout given to every parsed goal
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn parse(&self, text: &str) -> Result<Goal, ParseError> {
        let text = text.trim().to_lowercase();

        let goal = self
            .parse_find(&text)
            .or_else(|| self.parse_navigate(&text))
            .or_else(|| self.parse_explore(&text))
            .ok_or_else(|| ParseError::Unrecognized(text.clone()))?;

        log::debug!("Parsed '{}' as: {}", text, goal);
        Ok(goal.with_timeout(self.timeout_secs))
    }

    fn parse_find(&self, text: &str) -> Option<Goal> {
        let target = first_capture(&FIND_PATTERNS, text).and_then(target_from_word)?;
        let goal = Goal::new(GoalKind::Find {
            target,
            max_distance: extract_distance(text),
            preferred_direction: extract_direction(text),
        });
        Some(goal.with_priority(extract_priority(text)))
    }

    fn parse_navigate(&self, text: &str) -> Option<Goal> {
        if let Some(target) = first_capture(&TARGET_PATTERNS, text).and_then(target_from_word) {
            return Some(Goal::navigate_to(target).with_priority(extract_priority(text)));
        }
        let direction = first_capture(&HEADING_PATTERNS, text).and_then(direction_from_word)?;
        Some(Goal::head(direction, extract_distance(text)).with_priority(extract_priority(text)))
    }

    fn parse_explore(&self, text: &str) -> Option<Goal> {
        if !EXPLORE_PATTERNS.iter().any(|re| re.is_match(text)) {
            return None;
        }
        let radius = extract_distance(text).unwrap_or(DEFAULT_EXPLORE_RADIUS);
        let pattern = if text.contains("random") {
            ExplorePattern::Random
        } else if text.contains("grid") {
            ExplorePattern::Grid
        } else {
            ExplorePattern::Spiral
        };
        Some(Goal::explore(radius, pattern).with_priority(extract_priority(text)))
    }
}

fn extract_priority(text: &str) -> Priority {
    PRIORITY_KEYWORDS
        .iter()
        .find(|(keyword, _)| text.contains(keyword))
        .map(|(_, priority)| *priority)
        .unwrap_or_default()
}

fn extract_distance(text: &str) -> Option<u32> {
    first_capture(&DISTANCE_PATTERNS, text).and_then(|n| n.parse().ok())
}

fn extract_direction(text: &str) -> Option<Direction> {
    first_capture(&DIRECTION_PATTERNS, text).and_then(direction_from_word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mission::goals::Destination;

    fn parse(text: &str) -> Goal {
        GoalParser::new().parse(text).unwrap()
    }

    #[test]
    fn test_find_with_modifiers() {
        let goal = parse("  Find WATER within 30 blocks towards north, urgent ");
        assert_eq!(goal.priority, Priority::Urgent);
        assert_eq!(
            goal.kind,
            GoalKind::Find {
                target: Target::Water,
                max_distance: Some(30),
                preferred_direction: Some(Direction::North),
            }
        );
    }

    #[test]
    fn test_find_synonyms() {
        for text in ["look for trees", "search for tree", "locate trees"] {
            assert!(matches!(
                parse(text).kind,
                GoalKind::Find {
                    target: Target::Tree,
                    ..
                }
            ));
        }
        assert!(GoalParser::new().parse("find a building").is_err());
        assert!(matches!(
            parse("locate building westward").kind,
            GoalKind::Find {
                target: Target::Structure,
                preferred_direction: Some(Direction::West),
                ..
            }
        ));
    }

    #[test]
    fn test_navigate_to_target() {
        let goal = parse("walk to animals quickly");
        assert_eq!(goal.priority, Priority::High);
        assert_eq!(
            goal.kind,
            GoalKind::Navigate {
                destination: Destination::Target(Target::Animal)
            }
        );
        assert_eq!(goal.description(), "Navigate to animal");
    }

    #[test]
    fn test_navigate_by_heading() {
        let goal = parse("go north 40 blocks");
        assert_eq!(goal.description(), "Move north 40 blocks");

        let left = parse("head left slowly");
        assert_eq!(left.priority, Priority::Low);
        assert_eq!(
            left.kind,
            GoalKind::Navigate {
                destination: Destination::Heading {
                    direction: Direction::West,
                    distance: None
                }
            }
        );
        assert_eq!(parse("move right").description(), "Move east");
    }

    #[test]
    fn test_explore_variants() {
        let goal = parse("explore the area");
        assert_eq!(
            goal.kind,
            GoalKind::Explore {
                radius: 50,
                pattern: ExplorePattern::Spiral
            }
        );
        assert_eq!(
            parse("scout area radius 80 in a grid").kind,
            GoalKind::Explore {
                radius: 80,
                pattern: ExplorePattern::Grid
            }
        );
        assert!(matches!(
            parse("look around at random").kind,
            GoalKind::Explore {
                pattern: ExplorePattern::Random,
                ..
            }
        ));
    }

    #[test]
    fn test_find_wins_over_explore() {
        // "look for" is a find pattern even though the text also explores
        let goal = parse("look for water then explore area");
        assert!(matches!(goal.kind, GoalKind::Find { .. }));
    }

    #[test]
    fn test_priority_keywords() {
        assert_eq!(parse("find water").priority, Priority::Medium);
        assert_eq!(parse("important: find water").priority, Priority::High);
        assert_eq!(parse("find water, low priority").priority, Priority::Low);
    }

    #[test]
    fn test_timeout_applied() {
        let goal = GoalParser::new().with_timeout(60).parse("go east").unwrap();
        assert_eq!(goal.timeout_secs, 60);
    }

    #[test]
    fn test_unrecognized() {
        let err = GoalParser::new().parse("  Dance  ").unwrap_err();
        assert_eq!(err, ParseError::Unrecognized("dance".into()));
        assert_eq!(
            err.to_string(),
            "Could not understand command: 'dance'. Try 'find water', 'go north', or 'explore area'."
        );
        assert!(GoalParser::new().parse("").is_err());
    }
}
