//! Foul records handed to the orchestrator for enforcement and replay

use serde::{Deserialize, Serialize};

use crate::constants::rules::MAX_REPLAY_WINDOW;
use crate::geometry::Vec2;
use crate::world::{RobotId, Team};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FoulKind {
    BallSpeed,
    NoProgress,
    BallLeftField,
    Icing,
    MultipleDefender,
    MultipleDefenderPartial,
    AttackerInDefenseArea,
    AttackerTooCloseToDefenseArea,
    KickTimeout,
    BallDribbling,
    NumberOfPlayers,
    RobotStopSpeed,
    StopBallDistance,
}

/// Time span worth replaying for a foul, never longer than
/// [`MAX_REPLAY_WINDOW`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplayWindow {
    pub start: f64,
    pub end: f64,
}

impl ReplayWindow {
    pub fn new(start: f64, end: f64) -> Self {
        let start = start.min(end).max(end - MAX_REPLAY_WINDOW);
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Foul {
    pub kind: FoulKind,
    /// Offending team, when the foul has one
    pub team: Option<Team>,
    pub robot: Option<RobotId>,
    pub designated_point: Option<Vec2>,
    pub replay: ReplayWindow,
}

impl Foul {
    /// A foul that developed between `since` and `now`.
    pub fn new(kind: FoulKind, since: f64, now: f64) -> Self {
        Self { kind, team: None, robot: None, designated_point: None, replay: ReplayWindow::new(since, now) }
    }

    pub fn by_team(mut self, team: Team) -> Self {
        self.team = Some(team);
        self
    }

    pub fn by_robot(mut self, robot: RobotId) -> Self {
        self.team = Some(robot.team);
        self.robot = Some(robot);
        self
    }

    pub fn at(mut self, point: Vec2) -> Self {
        self.designated_point = Some(point);
        self
    }
}
