//! Authoritative referee state
//!
//! [`AutorefVariables`] is the only state the rule engine writes. Rules
//! receive a read-only view, propose a full replacement, and the engine
//! commits it after validation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;
use crate::world::{RobotId, Team};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    Init,
    WaitStart,
    WaitStop,
    WaitKick,
    Run,
    Break,
    DelayGoal,
}

impl GameState {
    pub const ALL: [GameState; 7] = [
        GameState::Init,
        GameState::WaitStart,
        GameState::WaitStop,
        GameState::WaitKick,
        GameState::Run,
        GameState::Break,
        GameState::DelayGoal,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    FirstHalfPre,
    FirstHalf,
    HalfTime,
    SecondHalfPre,
    SecondHalf,
    PostGame,
}

impl Stage {
    /// Stages in which restarts are administered
    pub fn is_playing(self) -> bool {
        matches!(
            self,
            Stage::FirstHalfPre | Stage::FirstHalf | Stage::SecondHalfPre | Stage::SecondHalf
        )
    }

    /// The running stage a pre-game stage advances to on kickoff
    pub fn started(self) -> Stage {
        match self {
            Stage::FirstHalfPre => Stage::FirstHalf,
            Stage::SecondHalfPre => Stage::SecondHalf,
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    Halt,
    Stop,
    NormalStart,
    ForceStart,
    PrepareKickoff(Team),
    PreparePenalty(Team),
    DirectFree(Team),
    IndirectFree(Team),
    Timeout(Team),
    Goal(Team),
    BallPlacement(Team),
}

impl Command {
    pub fn team(self) -> Option<Team> {
        match self {
            Command::PrepareKickoff(t)
            | Command::PreparePenalty(t)
            | Command::DirectFree(t)
            | Command::IndirectFree(t)
            | Command::Timeout(t)
            | Command::Goal(t)
            | Command::BallPlacement(t) => Some(t),
            Command::Halt | Command::Stop | Command::NormalStart | Command::ForceStart => None,
        }
    }

    pub fn is_free_kick(self) -> bool {
        matches!(self, Command::DirectFree(_) | Command::IndirectFree(_))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.team() {
            Some(team) => {
                let name = match self {
                    Command::PrepareKickoff(_) => "PrepareKickoff",
                    Command::PreparePenalty(_) => "PreparePenalty",
                    Command::DirectFree(_) => "DirectFree",
                    Command::IndirectFree(_) => "IndirectFree",
                    Command::Timeout(_) => "Timeout",
                    Command::Goal(_) => "Goal",
                    _ => "BallPlacement",
                };
                write!(f, "{}{}", name, team)
            }
            None => write!(f, "{:?}", self),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamInfo {
    pub score: u32,
    pub timeouts: u32,
    /// Timeout time left (s)
    pub timeout_time: f64,
}

/// Referee state shared by every rule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutorefVariables {
    pub state: GameState,
    pub stage: Stage,
    pub cmd: Command,
    /// Command issued once the current stoppage is over; `Halt` when none
    pub next_cmd: Command,
    /// A ball placement is pending at `reset_loc`
    pub reset: bool,
    pub reset_loc: Vec2,
    /// Where the next restart takes place
    pub designated_point: Vec2,
    /// World time the current stage ends; 0 for untimed stages
    pub stage_end: f64,
    pub kick_deadline: f64,
    /// Team taking the pending or current restart
    pub kicker: Option<Team>,
    pub toucher: Option<RobotId>,
    pub touch_time: f64,
    pub touch_loc: Vec2,
    /// Sign of the x half Blue occupies; 0 until the first half starts
    pub blue_side: i8,
    pub team: [TeamInfo; 2],
}

impl Default for AutorefVariables {
    fn default() -> Self {
        Self::new()
    }
}

impl AutorefVariables {
    /// Pre-match state for a fully autonomous referee
    pub fn new() -> Self {
        Self {
            state: GameState::Init,
            stage: Stage::FirstHalfPre,
            cmd: Command::Halt,
            next_cmd: Command::Halt,
            reset: false,
            reset_loc: Vec2::zeros(),
            designated_point: Vec2::zeros(),
            stage_end: 0.0,
            kick_deadline: 0.0,
            kicker: None,
            toucher: None,
            touch_time: 0.0,
            touch_loc: Vec2::zeros(),
            blue_side: 0,
            team: [TeamInfo::default(); 2],
        }
    }

    /// Mid-match state for observing a game run by a human referee
    pub fn evaluation() -> Self {
        Self {
            state: GameState::Run,
            stage: Stage::FirstHalf,
            cmd: Command::ForceStart,
            blue_side: -1,
            ..Self::new()
        }
    }

    pub fn team_info(&self, team: Team) -> &TeamInfo {
        &self.team[team.index()]
    }

    pub fn team_info_mut(&mut self, team: Team) -> &mut TeamInfo {
        &mut self.team[team.index()]
    }

    /// Request a ball placement at `loc` and make it the restart point.
    pub fn designate(&mut self, loc: Vec2) {
        self.reset = true;
        self.reset_loc = loc;
        self.designated_point = loc;
    }

    /// Sign of the x half `team` defends (-1 before sides are known for Blue)
    pub fn team_side(&self, team: Team) -> f64 {
        let blue = if self.blue_side == 0 { -1.0 } else { f64::from(self.blue_side) };
        match team {
            Team::Blue => blue,
            Team::Yellow => -blue,
        }
    }

    /// Whether `team` defends the negative-x goal, the "own side" of the
    /// field geometry functions.
    pub fn defends_negative_x(&self, team: Team) -> bool {
        self.team_side(team) < 0.0
    }

    /// Team whose half contains `x`
    pub fn defending_team_at(&self, x: f64) -> Team {
        if self.team_side(Team::Blue) * x > 0.0 {
            Team::Blue
        } else {
            Team::Yellow
        }
    }

    /// Team of the last toucher, or the team defending the half `x` lies
    /// in when nobody has touched the ball yet.
    pub fn touching_team_or(&self, x: f64) -> Team {
        self.toucher.map(|r| r.team).unwrap_or_else(|| self.defending_team_at(x))
    }

    /// Check the invariants a committed state must hold.
    pub fn validate(&self) -> Result<(), String> {
        if !(-1..=1).contains(&self.blue_side) {
            return Err(format!("blue_side {} out of range", self.blue_side));
        }
        if self.blue_side == 0 && !matches!(self.stage, Stage::FirstHalfPre) {
            return Err(format!("blue_side unknown in stage {:?}", self.stage));
        }
        if self.reset && !(self.reset_loc.x.is_finite() && self.reset_loc.y.is_finite()) {
            return Err("non-finite reset location".to_string());
        }
        if !(self.designated_point.x.is_finite() && self.designated_point.y.is_finite()) {
            return Err("non-finite designated point".to_string());
        }
        if !self.stage_end.is_finite() || !self.kick_deadline.is_finite() {
            return Err("non-finite deadline".to_string());
        }
        Ok(())
    }

    /// Names of the fields that differ from `other`, for commit logging.
    pub fn changed_fields(&self, other: &AutorefVariables) -> Vec<&'static str> {
        let mut changed = Vec::new();
        let mut check = |name: &'static str, differs: bool| {
            if differs {
                changed.push(name);
            }
        };
        check("state", self.state != other.state);
        check("stage", self.stage != other.stage);
        check("cmd", self.cmd != other.cmd);
        check("next_cmd", self.next_cmd != other.next_cmd);
        check("reset", self.reset != other.reset);
        check("reset_loc", self.reset_loc != other.reset_loc);
        check("designated_point", self.designated_point != other.designated_point);
        check("stage_end", self.stage_end != other.stage_end);
        check("kick_deadline", self.kick_deadline != other.kick_deadline);
        check("kicker", self.kicker != other.kicker);
        check("toucher", self.toucher != other.toucher);
        check("touch_time", self.touch_time != other.touch_time);
        check("touch_loc", self.touch_loc != other.touch_loc);
        check("blue_side", self.blue_side != other.blue_side);
        check("team", self.team != other.team);
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_states() {
        let vars = AutorefVariables::new();
        assert_eq!(vars.state, GameState::Init);
        assert_eq!(vars.blue_side, 0);
        assert!(vars.validate().is_ok());

        let eval = AutorefVariables::evaluation();
        assert_eq!(eval.state, GameState::Run);
        assert_eq!(eval.stage, Stage::FirstHalf);
        assert!(eval.validate().is_ok());
    }

    #[test]
    fn test_sides() {
        let mut vars = AutorefVariables::new();
        // Unknown sides: Blue defends -x
        assert!(vars.defends_negative_x(Team::Blue));
        assert_eq!(vars.defending_team_at(-100.0), Team::Blue);

        vars.blue_side = 1;
        assert!(vars.defends_negative_x(Team::Yellow));
        assert_eq!(vars.defending_team_at(-100.0), Team::Yellow);
        assert_eq!(vars.defending_team_at(2000.0), Team::Blue);
    }

    #[test]
    fn test_validate_rejects_broken_states() {
        let mut vars = AutorefVariables::new();
        vars.stage = Stage::FirstHalf;
        assert!(vars.validate().is_err());

        let mut vars = AutorefVariables::evaluation();
        vars.designate(Vec2::new(f64::NAN, 0.0));
        assert!(vars.validate().is_err());

        let mut vars = AutorefVariables::evaluation();
        vars.blue_side = 3;
        assert!(vars.validate().is_err());
    }

    #[test]
    fn test_command_helpers() {
        assert!(Command::DirectFree(Team::Yellow).is_free_kick());
        assert!(!Command::NormalStart.is_free_kick());
        assert_eq!(Command::Stop.team(), None);
        assert_eq!(Command::Goal(Team::Blue).to_string(), "GoalBlue");
        assert_eq!(Stage::SecondHalfPre.started(), Stage::SecondHalf);
    }

    #[test]
    fn test_changed_fields() {
        let a = AutorefVariables::new();
        let mut b = a;
        b.state = GameState::WaitStart;
        b.cmd = Command::Stop;
        assert_eq!(b.changed_fields(&a), vec!["state", "cmd"]);
    }
}
