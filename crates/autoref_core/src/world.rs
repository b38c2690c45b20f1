//! Fused world snapshot
//!
//! A [`World`] is produced once per completed tracker round and never
//! mutated afterwards; every frame is a fresh value.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::robot::VISIBILITY_CONFIDENCE;
use crate::geometry::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Team {
    Blue,
    Yellow,
}

impl Team {
    pub const ALL: [Team; 2] = [Team::Blue, Team::Yellow];

    pub fn opponent(self) -> Team {
        match self {
            Team::Blue => Team::Yellow,
            Team::Yellow => Team::Blue,
        }
    }

    /// Index into per-team arrays
    pub fn index(self) -> usize {
        match self {
            Team::Blue => 0,
            Team::Yellow => 1,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::Blue => write!(f, "Blue"),
            Team::Yellow => write!(f, "Yellow"),
        }
    }
}

/// A robot identity. "No robot" is `Option::<RobotId>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RobotId {
    pub team: Team,
    pub id: u32,
}

impl RobotId {
    pub fn new(team: Team, id: u32) -> Self {
        Self { team, id }
    }
}

impl fmt::Display for RobotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.team, self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldRobot {
    pub id: RobotId,
    pub confidence: f64,
    pub position: Vec2,
    /// Radians, counter-clockwise from +x
    pub heading: f64,
    pub velocity: Vec2,
}

impl WorldRobot {
    pub fn visible(&self) -> bool {
        self.confidence > VISIBILITY_CONFIDENCE
    }

    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBall {
    pub confidence: f64,
    pub position: Vec2,
    pub velocity: Vec2,
}

impl WorldBall {
    pub fn hidden() -> Self {
        Self { confidence: 0.0, position: Vec2::zeros(), velocity: Vec2::zeros() }
    }

    pub fn visible(&self) -> bool {
        self.confidence > VISIBILITY_CONFIDENCE
    }

    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }
}

impl Default for WorldBall {
    fn default() -> Self {
        Self::hidden()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    /// Capture time of the newest camera frame in the round (s)
    pub time: f64,
    /// Visible robots, ordered by team then id
    pub robots: Vec<WorldRobot>,
    pub ball: WorldBall,
}

impl World {
    pub fn new(time: f64, mut robots: Vec<WorldRobot>, ball: WorldBall) -> Self {
        robots.retain(WorldRobot::visible);
        robots.sort_by_key(|r| r.id);
        Self { time, robots, ball }
    }

    pub fn robot(&self, id: RobotId) -> Option<&WorldRobot> {
        self.robots.iter().find(|r| r.id == id)
    }

    pub fn team_robots(&self, team: Team) -> impl Iterator<Item = &WorldRobot> {
        self.robots.iter().filter(move |r| r.id.team == team)
    }

    pub fn team_count(&self, team: Team) -> usize {
        self.team_robots(team).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn robot(team: Team, id: u32, confidence: f64) -> WorldRobot {
        WorldRobot {
            id: RobotId::new(team, id),
            confidence,
            position: Vec2::zeros(),
            heading: 0.0,
            velocity: Vec2::zeros(),
        }
    }

    #[test]
    fn test_world_keeps_only_visible_robots_sorted() {
        let world = World::new(
            1.0,
            vec![
                robot(Team::Yellow, 2, 0.9),
                robot(Team::Blue, 5, 0.05),
                robot(Team::Blue, 1, 0.8),
            ],
            WorldBall::hidden(),
        );
        let ids: Vec<_> = world.robots.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![RobotId::new(Team::Blue, 1), RobotId::new(Team::Yellow, 2)]);
        assert_eq!(world.team_count(Team::Blue), 1);
        assert!(world.robot(RobotId::new(Team::Blue, 5)).is_none());
        assert!(!world.ball.visible());
    }

    #[test]
    fn test_team_helpers() {
        assert_eq!(Team::Blue.opponent(), Team::Yellow);
        assert_eq!(Team::Yellow.index(), 1);
        assert_eq!(RobotId::new(Team::Blue, 3).to_string(), "Blue 3");
    }
}
