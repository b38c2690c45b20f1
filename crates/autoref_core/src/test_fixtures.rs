//! Test Fixtures Module
//!
//! Shared builders for worlds, referee states and rule contexts.
//!
//! ## Usage
//! ```ignore
//! #[cfg(test)]
//! use crate::test_fixtures::*;
//! ```

use crate::constants::time::FRAME_PERIOD;
use crate::geometry::{FieldGeometry, Vec2};
use crate::messages::{RefereeRecord, TeamRecord};
use crate::referee::rule::RuleContext;
use crate::referee::{AutorefVariables, Command, GameState, Stage};
use crate::world::{RobotId, Team, World, WorldBall, WorldRobot};

// =============================================================================
// World Helpers
// =============================================================================

/// Capture time of frame `i` at the nominal frame rate.
pub fn frame_time(i: u32) -> f64 {
    f64::from(i) * FRAME_PERIOD
}

/// A stationary robot facing +x.
pub fn robot_at(team: Team, id: u32, x: f64, y: f64) -> WorldRobot {
    moving_robot(team, id, Vec2::new(x, y), Vec2::zeros())
}

pub fn moving_robot(team: Team, id: u32, position: Vec2, velocity: Vec2) -> WorldRobot {
    WorldRobot { id: RobotId::new(team, id), confidence: 1.0, position, heading: 0.0, velocity }
}

/// A stationary, fully visible ball.
pub fn ball_at(x: f64, y: f64) -> WorldBall {
    moving_ball(Vec2::new(x, y), Vec2::zeros())
}

pub fn moving_ball(position: Vec2, velocity: Vec2) -> WorldBall {
    WorldBall { confidence: 1.0, position, velocity }
}

pub fn hidden_ball() -> WorldBall {
    WorldBall::hidden()
}

pub fn world_at(time: f64, robots: Vec<WorldRobot>, ball: WorldBall) -> World {
    World::new(time, robots, ball)
}

// =============================================================================
// Referee Helpers
// =============================================================================

/// Play running in the first half, Blue defending negative x.
pub fn running_vars() -> AutorefVariables {
    AutorefVariables::evaluation()
}

/// Game stopped in the first half with `next` queued.
pub fn stopped_vars(next: Command) -> AutorefVariables {
    let mut vars = running_vars();
    vars.state = GameState::WaitStop;
    vars.cmd = Command::Stop;
    vars.next_cmd = next;
    vars
}

/// Rule context for frame `frame` with no external referee.
pub fn context<'a>(vars: &'a AutorefVariables, field: &'a FieldGeometry, frame: u64) -> RuleContext<'a> {
    RuleContext { vars, field, refbox: None, max_team_robots: 6, frame }
}

pub fn referee_record(stage: Stage, command: Command) -> RefereeRecord {
    RefereeRecord {
        stage,
        command,
        blue: TeamRecord::default(),
        yellow: TeamRecord::default(),
        blue_team_on_positive_half: None,
    }
}
