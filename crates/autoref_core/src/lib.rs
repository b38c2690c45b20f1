//! # autoref_core - Deterministic Automatic Referee
//!
//! Fuses multi-camera detections into one world per frame, detects ball
//! touches and runs a fixed-point rule engine that maintains the referee
//! state and reports fouls.
//!
//! ## Features
//! - Replayable: the same sequence of worlds always yields the same decisions
//! - Bounded per-frame rule sweep with fault reporting instead of panics
//! - Autonomous and evaluation (observer) modes
//! - YAML configuration with environment overrides

pub mod autoref;
pub mod config;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod history;
pub mod messages;
pub mod referee;
pub mod touch;
pub mod tracker;
pub mod world;

#[cfg(test)]
mod test_fixtures;

pub use autoref::Autoref;
pub use config::{AutorefConfig, AutorefMode, Division};
pub use error::{AutorefError, Result};
pub use geometry::{FieldGeometry, Vec2};
pub use messages::{DetectionFrame, GeometryRecord, RefereeMessage, RefereeRecord, RemoteRequest};
pub use referee::{
    AutorefVariables, Command, EngineConfig, FiredRule, Foul, FoulKind, FrameOutcome, GameState,
    RuleEngine, RuleKind, Stage,
};
pub use tracker::{Tracker, TrackerConfig};
pub use world::{RobotId, Team, World};
