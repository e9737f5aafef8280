//! Goal model
//!
//! Structured goals produced by the command parser and consumed by the
//! executor.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::vision::Palette;

/// Default time budget of a goal
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
/// Default exploration radius in blocks
pub const DEFAULT_EXPLORE_RADIUS: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        })
    }
}

/// Things a goal can be about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Water,
    Tree,
    Animal,
    Structure,
    Player,
    Item,
}

impl Target {
    pub fn name(&self) -> &'static str {
        match self {
            Target::Water => "water",
            Target::Tree => "tree",
            Target::Animal => "animal",
            Target::Structure => "structure",
            Target::Player => "player",
            Target::Item => "item",
        }
    }

    /// Palette used to look for this target
    ///
    /// Only water and trees have a dedicated palette; every other target is
    /// searched with the water palette.
    pub fn palette(&self) -> Palette {
        match self {
            Target::Tree => Palette::trees(),
            _ => Palette::water(),
        }
    }

    /// Palette category matched for this target
    pub fn category(&self) -> &'static str {
        match self {
            Target::Tree => "tree",
            _ => "water",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compass heading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    South,
    East,
    West,
    Northeast,
    Northwest,
    Southeast,
    Southwest,
}

impl Direction {
    pub fn name(&self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
            Direction::Northeast => "northeast",
            Direction::Northwest => "northwest",
            Direction::Southeast => "southeast",
            Direction::Southwest => "southwest",
        }
    }

    /// Whether the heading runs along the north/south axis
    pub fn is_meridional(&self) -> bool {
        matches!(self, Direction::North | Direction::South)
    }

    pub fn is_westward(&self) -> bool {
        matches!(
            self,
            Direction::West | Direction::Northwest | Direction::Southwest
        )
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplorePattern {
    #[default]
    Spiral,
    Grid,
    Random,
}

impl fmt::Display for ExplorePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExplorePattern::Spiral => "spiral",
            ExplorePattern::Grid => "grid",
            ExplorePattern::Random => "random",
        })
    }
}

/// What a navigate goal heads for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    Target(Target),
    Heading {
        direction: Direction,
        distance: Option<u32>,
    },
}

/// Goal-specific parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "goal_type", rename_all = "snake_case")]
pub enum GoalKind {
    Find {
        target: Target,
        max_distance: Option<u32>,
        preferred_direction: Option<Direction>,
    },
    Navigate {
        destination: Destination,
    },
    Explore {
        radius: u32,
        pattern: ExplorePattern,
    },
}

/// A goal with its shared attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub kind: GoalKind,
    pub priority: Priority,
    pub timeout_secs: u64,
    pub status: GoalStatus,
}

impl Goal {
    pub fn new(kind: GoalKind) -> Self {
        Self {
            kind,
            priority: Priority::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            status: GoalStatus::Pending,
        }
    }

    pub fn find(target: Target) -> Self {
        Self::new(GoalKind::Find {
            target,
            max_distance: None,
            preferred_direction: None,
        })
    }

    pub fn navigate_to(target: Target) -> Self {
        Self::new(GoalKind::Navigate {
            destination: Destination::Target(target),
        })
    }

    pub fn head(direction: Direction, distance: Option<u32>) -> Self {
        Self::new(GoalKind::Navigate {
            destination: Destination::Heading {
                direction,
                distance,
            },
        })
    }

    pub fn explore(radius: u32, pattern: ExplorePattern) -> Self {
        Self::new(GoalKind::Explore { radius, pattern })
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Human readable description
    pub fn description(&self) -> String {
        match &self.kind {
            GoalKind::Find { target, .. } => format!("Find {}", target),
            GoalKind::Navigate {
                destination: Destination::Target(target),
            } => format!("Navigate to {}", target),
            GoalKind::Navigate {
                destination: Destination::Heading { direction, distance },
            } => match distance {
                Some(d) => format!("Move {} {} blocks", direction, d),
                None => format!("Move {}", direction),
            },
            GoalKind::Explore { radius, pattern } => {
                format!("Explore {} block radius using {} pattern", radius, pattern)
            }
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptions() {
        assert_eq!(Goal::find(Target::Water).description(), "Find water");
        assert_eq!(Goal::navigate_to(Target::Tree).description(), "Navigate to tree");
        assert_eq!(
            Goal::head(Direction::North, Some(30)).description(),
            "Move north 30 blocks"
        );
        assert_eq!(Goal::head(Direction::East, None).description(), "Move east");
        assert_eq!(
            Goal::explore(50, ExplorePattern::Spiral).description(),
            "Explore 50 block radius using spiral pattern"
        );
    }

    #[test]
    fn test_defaults() {
        let goal = Goal::find(Target::Item);
        assert_eq!(goal.priority, Priority::Medium);
        assert_eq!(goal.timeout_secs, 300);
        assert_eq!(goal.status, GoalStatus::Pending);
    }

    #[test]
    fn test_target_palettes() {
        assert_eq!(Target::Tree.category(), "tree");
        assert!(Target::Tree.palette().category("tree").is_some());
        assert_eq!(Target::Animal.category(), "water");
        assert!(Target::Animal.palette().category("water").is_some());
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(Goal::explore(20, ExplorePattern::Grid)).unwrap();
        assert_eq!(json["kind"]["goal_type"], "explore");
        assert_eq!(json["kind"]["pattern"], "grid");
    }
}
