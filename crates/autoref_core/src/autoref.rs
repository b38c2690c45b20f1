//! Orchestrator
//!
//! Owns the tracker, the rule engine and the latest field geometry and
//! referee record. Each completed tracker round runs one engine frame;
//! committed decisions are queued for the caller, who also polls the
//! outbound referee message and remote-control request.

use tracing::{debug, info, warn};

use crate::config::AutorefConfig;
use crate::error::Result;
use crate::geometry::FieldGeometry;
use crate::messages::{DetectionFrame, GeometryRecord, RefereeMessage, RefereeRecord, RemoteRequest};
use crate::referee::{AutorefVariables, FrameOutcome, RuleEngine};
use crate::tracker::Tracker;
use crate::world::Team;

pub struct Autoref {
    config: AutorefConfig,
    tracker: Tracker,
    engine: RuleEngine,
    field: FieldGeometry,
    geometry_received: bool,
    refbox: Option<RefereeRecord>,
    /// Referee state before the last processed world
    previous: AutorefVariables,
    last_time: f64,
    command_counter: u32,
    command_timestamp: f64,
    decisions: Vec<FrameOutcome>,
}

impl Autoref {
    pub fn new(config: AutorefConfig) -> Self {
        let engine = RuleEngine::new(config.mode, &config.engine);
        let previous = *engine.vars();
        info!(mode = %config.mode, division = ?config.division, "Autoref started");
        Self {
            tracker: Tracker::new(config.tracker.clone()),
            engine,
            config,
            field: FieldGeometry::default(),
            geometry_received: false,
            refbox: None,
            previous,
            last_time: 0.0,
            command_counter: 0,
            command_timestamp: 0.0,
            decisions: Vec::new(),
        }
    }

    pub fn config(&self) -> &AutorefConfig {
        &self.config
    }

    pub fn vars(&self) -> &AutorefVariables {
        self.engine.vars()
    }

    pub fn field(&self) -> &FieldGeometry {
        &self.field
    }

    /// Feed one camera frame. When it completes a tracker round the engine
    /// runs on the fused world and the frame's outcome is returned.
    ///
    /// An internal engine fault is returned as an error; the referee state
    /// stays at its last good value and later frames are processed normally.
    pub fn update_vision(&mut self, frame: &DetectionFrame) -> Result<Option<FrameOutcome>> {
        let Some(world) = self.tracker.update(frame)? else {
            return Ok(None);
        };

        let before = *self.engine.vars();
        let max_team_robots = self.config.max_team_robots();
        let outcome = self.engine.process(&world, &self.field, self.refbox.as_ref(), max_team_robots)?;

        self.previous = before;
        self.last_time = world.time;

        let after = self.engine.vars();
        if after.cmd != before.cmd {
            self.command_counter += 1;
            self.command_timestamp = world.time;
        }
        if before.stage != after.stage {
            info!(from = ?before.stage, to = ?after.stage, time = world.time, "Stage changed");
        }
        if let Some(point) = outcome.placement {
            debug!(x = point.x, y = point.y, "Ball placement requested");
        }
        if !outcome.fired.is_empty() {
            self.decisions.push(outcome.clone());
        }
        Ok(Some(outcome))
    }

    /// Adopt new field dimensions. Rules read the geometry on every frame,
    /// so nothing else needs rebuilding.
    pub fn update_geometry(&mut self, record: &GeometryRecord) {
        let field = FieldGeometry::from(record);
        if !self.geometry_received {
            info!(
                length = record.field_length,
                width = record.field_width,
                goal_width = record.goal_width,
                "Field geometry received"
            );
        } else if field != self.field {
            warn!(length = record.field_length, width = record.field_width, "Field geometry changed");
        }
        self.geometry_received = true;
        self.field = field;
    }

    pub fn update_referee(&mut self, record: RefereeRecord) {
        if self.refbox.as_ref().map_or(true, |r| r.command != record.command || r.stage != record.stage) {
            debug!(command = %record.command, stage = ?record.stage, "Referee box update");
        }
        self.refbox = Some(record);
    }

    pub fn referee(&self) -> Option<&RefereeRecord> {
        self.refbox.as_ref()
    }

    /// Decisions committed since the last call, oldest first
    pub fn take_decisions(&mut self) -> Vec<FrameOutcome> {
        std::mem::take(&mut self.decisions)
    }

    pub fn referee_message(&self) -> RefereeMessage {
        let vars = self.engine.vars();
        let stage_time_left =
            if vars.stage_end > 0.0 { (vars.stage_end - self.last_time).max(0.0) } else { 0.0 };
        RefereeMessage {
            stage: vars.stage,
            stage_time_left,
            command: vars.cmd,
            command_counter: self.command_counter,
            command_timestamp: self.command_timestamp,
            blue: *vars.team_info(Team::Blue),
            yellow: *vars.team_info(Team::Yellow),
        }
    }

    /// What to ask the game controller for after the last processed world:
    /// the new command if it changed, otherwise the new stage if that
    /// changed.
    pub fn remote_request(&self) -> Option<RemoteRequest> {
        let vars = self.engine.vars();
        if vars.cmd != self.previous.cmd {
            let designated_point = vars.reset.then_some(vars.designated_point);
            return Some(RemoteRequest::Command { command: vars.cmd, designated_point });
        }
        if vars.stage != self.previous.stage {
            return Some(RemoteRequest::Stage(vars.stage));
        }
        None
    }
}
