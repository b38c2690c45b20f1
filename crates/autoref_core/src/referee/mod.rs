//! Referee state machine and rule engine
//!
//! - `state`: game state enums and [`AutorefVariables`]
//! - `foul`: foul records handed to the orchestrator
//! - `rule`: the [`Rule`] contract
//! - `engine`: fixed-point sweep over the rule roster
//! - `rules`: one module per rule

pub mod engine;
pub mod foul;
pub mod rule;
pub mod rules;
pub mod state;

pub use engine::{EngineConfig, FiredRule, FrameOutcome, RuleEngine};
pub use foul::{Foul, FoulKind, ReplayWindow};
pub use rule::{Firing, FrameGate, Rule, RuleContext, RuleKind};
pub use state::{AutorefVariables, Command, GameState, Stage, TeamInfo};
