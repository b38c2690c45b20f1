//! Records crossing the core boundary
//!
//! Inbound: per-camera detection frames, field geometry and the external
//! referee record. Outbound: the referee message and remote-control request
//! built by [`crate::autoref::Autoref`].

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;
use crate::referee::{Command, Stage, TeamInfo};
use crate::world::Team;

// =============================================================================
// Inbound
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotDetection {
    pub team: Team,
    pub id: u32,
    pub position: Vec2,
    pub heading: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallDetection {
    pub position: Vec2,
    pub confidence: f64,
}

/// One camera's detections for one capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionFrame {
    pub camera: u32,
    pub t_capture: f64,
    #[serde(default)]
    pub robots: Vec<RobotDetection>,
    #[serde(default)]
    pub balls: Vec<BallDetection>,
}

/// Field dimensions as reported by vision (full lengths, mm)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryRecord {
    pub field_length: f64,
    pub field_width: f64,
    pub goal_depth: f64,
    pub goal_width: f64,
    #[serde(default)]
    pub defense_radius: Option<f64>,
    #[serde(default)]
    pub defense_stretch: Option<f64>,
}

/// Per-team part of the external referee record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub score: u32,
    #[serde(default)]
    pub timeouts: u32,
    #[serde(default)]
    pub timeout_time: f64,
    #[serde(default)]
    pub goalie: Option<u32>,
    /// Yellow cards currently running
    #[serde(default)]
    pub yellow_cards: u32,
    #[serde(default)]
    pub red_cards: u32,
}

/// State published by the human-operated referee box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefereeRecord {
    pub stage: Stage,
    pub command: Command,
    pub blue: TeamRecord,
    pub yellow: TeamRecord,
    #[serde(default)]
    pub blue_team_on_positive_half: Option<bool>,
}

impl RefereeRecord {
    pub fn team(&self, team: Team) -> &TeamRecord {
        match team {
            Team::Blue => &self.blue,
            Team::Yellow => &self.yellow,
        }
    }

    pub fn goalie(&self, team: Team) -> Option<u32> {
        self.team(team).goalie
    }
}

// =============================================================================
// Outbound
// =============================================================================

/// Referee state in the shape the game controller publishes it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefereeMessage {
    pub stage: Stage,
    /// Seconds until the current stage ends; 0 for untimed stages
    pub stage_time_left: f64,
    pub command: Command,
    pub command_counter: u32,
    pub command_timestamp: f64,
    pub blue: TeamInfo,
    pub yellow: TeamInfo,
}

/// A change the remote-control client should request from the game controller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RemoteRequest {
    Command { command: Command, designated_point: Option<Vec2> },
    Stage(Stage),
}
