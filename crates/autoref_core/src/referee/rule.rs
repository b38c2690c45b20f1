//! Rule contract
//!
//! A rule reads the fused world and the current [`AutorefVariables`] through
//! a [`RuleContext`] and, when its condition holds, proposes a complete
//! replacement state in a [`Firing`]. Rules never write shared state.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::foul::Foul;
use super::state::AutorefVariables;
use crate::geometry::FieldGeometry;
use crate::messages::RefereeRecord;
use crate::world::World;

/// Closed set of rule modules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleKind {
    Init,
    RefboxUpdate,
    RobotsStarted,
    KickReady,
    BallSpeed,
    BallStuck,
    GoalScored,
    BallExit,
    DelayDone,
    KickTaken,
    KickExpired,
    BallTouched,
    LongDribble,
    StageTimeEnded,
    TooManyRobots,
    RobotSpeedDuringStop,
    StopDistanceToBall,
}

impl RuleKind {
    /// Evaluation order when the referee runs the whole match.
    ///
    /// KickReady sits ahead of every rule that can stop play so a restart
    /// and an immediate stoppage resolve within one frame.
    pub const AUTONOMOUS_ORDER: [RuleKind; 17] = [
        RuleKind::Init,
        RuleKind::RefboxUpdate,
        RuleKind::RobotsStarted,
        RuleKind::KickReady,
        RuleKind::BallSpeed,
        RuleKind::BallStuck,
        RuleKind::GoalScored,
        RuleKind::BallExit,
        RuleKind::DelayDone,
        RuleKind::KickTaken,
        RuleKind::KickExpired,
        RuleKind::BallTouched,
        RuleKind::LongDribble,
        RuleKind::StageTimeEnded,
        RuleKind::TooManyRobots,
        RuleKind::RobotSpeedDuringStop,
        RuleKind::StopDistanceToBall,
    ];

    /// Evaluation order when observing a match run by a human referee
    pub const EVALUATION_ORDER: [RuleKind; 11] = [
        RuleKind::RefboxUpdate,
        RuleKind::KickTaken,
        RuleKind::BallSpeed,
        RuleKind::GoalScored,
        RuleKind::BallExit,
        RuleKind::BallTouched,
        RuleKind::LongDribble,
        RuleKind::TooManyRobots,
        RuleKind::RobotSpeedDuringStop,
        RuleKind::StopDistanceToBall,
        RuleKind::BallStuck,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RuleKind::Init => "Init",
            RuleKind::RefboxUpdate => "RefboxUpdate",
            RuleKind::RobotsStarted => "RobotsStarted",
            RuleKind::KickReady => "KickReady",
            RuleKind::BallSpeed => "BallSpeed",
            RuleKind::BallStuck => "BallStuck",
            RuleKind::GoalScored => "GoalScored",
            RuleKind::BallExit => "BallExit",
            RuleKind::DelayDone => "DelayDone",
            RuleKind::KickTaken => "KickTaken",
            RuleKind::KickExpired => "KickExpired",
            RuleKind::BallTouched => "BallTouched",
            RuleKind::LongDribble => "LongDribble",
            RuleKind::StageTimeEnded => "StageTimeEnded",
            RuleKind::TooManyRobots => "TooManyRobots",
            RuleKind::RobotSpeedDuringStop => "RobotSpeedDuringStop",
            RuleKind::StopDistanceToBall => "StopDistanceToBall",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read-only inputs available to every rule
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub vars: &'a AutorefVariables,
    pub field: &'a FieldGeometry,
    pub refbox: Option<&'a RefereeRecord>,
    pub max_team_robots: usize,
    /// Index of the world being processed, shared by every pass of one frame
    pub frame: u64,
}

/// A proposed state replacement
#[derive(Debug, Clone, PartialEq)]
pub struct Firing {
    pub vars: AutorefVariables,
    pub description: String,
    pub foul: Option<Foul>,
}

impl Firing {
    pub fn new(vars: AutorefVariables, description: impl Into<String>) -> Self {
        Self { vars, description: description.into(), foul: None }
    }

    pub fn with_foul(mut self, foul: Foul) -> Self {
        self.foul = Some(foul);
        self
    }
}

pub trait Rule: Send {
    fn kind(&self) -> RuleKind;

    /// Evaluate against one world. Called once per sweep pass, so possibly
    /// several times per frame; per-frame bookkeeping goes behind a
    /// [`FrameGate`].
    fn evaluate(&mut self, world: &World, ctx: &RuleContext<'_>) -> Option<Firing>;
}

/// Lets a rule update its counters and histories once per frame no matter
/// how many passes the sweep takes.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameGate {
    last: Option<u64>,
}

impl FrameGate {
    pub fn first_visit(&mut self, frame: u64) -> bool {
        if self.last == Some(frame) {
            return false;
        }
        self.last = Some(frame);
        true
    }
}
