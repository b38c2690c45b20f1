//! Fixed-point rule sweep
//!
//! Per world the rules are swept in their fixed order. The first rule that
//! newly fires commits its proposed state and the sweep restarts from the
//! top; the frame is done when a full pass commits nothing. A rule that
//! keeps firing commits only on its rising edge.
//!
//! The number of passes is bounded. Running out of passes, or a rule
//! proposing a state that fails validation, abandons the frame and restores
//! the state held before it.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::foul::Foul;
use super::rule::{Rule, RuleContext, RuleKind};
use super::rules;
use super::state::AutorefVariables;
use crate::config::AutorefMode;
use crate::constants::rules::MAX_PASSES;
use crate::error::{AutorefError, Result};
use crate::geometry::{FieldGeometry, Vec2};
use crate::messages::RefereeRecord;
use crate::world::World;

/// Rule engine tuning, part of [`crate::config::AutorefConfig`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on sweep passes per frame
    pub max_passes: usize,
    /// Rules that are never evaluated
    pub disabled_rules: Vec<RuleKind>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { max_passes: MAX_PASSES, disabled_rules: Vec::new() }
    }
}

/// One committed firing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiredRule {
    pub kind: RuleKind,
    pub description: String,
    pub foul: Option<Foul>,
}

/// Everything committed while processing one world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameOutcome {
    pub time: f64,
    pub fired: Vec<FiredRule>,
    /// Ball placement requested by the last committed update
    pub placement: Option<Vec2>,
}

impl FrameOutcome {
    fn new(time: f64) -> Self {
        Self { time, fired: Vec::new(), placement: None }
    }

    pub fn fouls(&self) -> impl Iterator<Item = &Foul> {
        self.fired.iter().filter_map(|f| f.foul.as_ref())
    }
}

struct RuleSlot {
    rule: Box<dyn Rule>,
    enabled: bool,
    fired: bool,
    fired_last: bool,
}

pub struct RuleEngine {
    slots: Vec<RuleSlot>,
    vars: AutorefVariables,
    max_passes: usize,
    frame: u64,
}

impl RuleEngine {
    /// Engine with the standard roster for `mode`.
    pub fn new(mode: AutorefMode, config: &EngineConfig) -> Self {
        let (order, vars): (&[RuleKind], _) = match mode {
            AutorefMode::Autonomous => (&RuleKind::AUTONOMOUS_ORDER, AutorefVariables::new()),
            AutorefMode::Evaluation => (&RuleKind::EVALUATION_ORDER, AutorefVariables::evaluation()),
        };
        let rules = order.iter().map(|kind| rules::build(*kind)).collect();
        Self::from_rules(rules, vars, config)
    }

    /// Engine over an explicit rule list, evaluated in the given order.
    pub fn from_rules(rules: Vec<Box<dyn Rule>>, vars: AutorefVariables, config: &EngineConfig) -> Self {
        let slots = rules
            .into_iter()
            .map(|rule| {
                let enabled = !config.disabled_rules.contains(&rule.kind());
                RuleSlot { rule, enabled, fired: false, fired_last: false }
            })
            .collect();
        Self { slots, vars, max_passes: config.max_passes, frame: 0 }
    }

    pub fn vars(&self) -> &AutorefVariables {
        &self.vars
    }

    pub fn rule_kinds(&self) -> Vec<RuleKind> {
        self.slots.iter().map(|s| s.rule.kind()).collect()
    }

    /// Enable or disable a rule; returns false when it is not in the roster.
    pub fn set_enabled(&mut self, kind: RuleKind, enabled: bool) -> bool {
        let mut found = false;
        for slot in self.slots.iter_mut().filter(|s| s.rule.kind() == kind) {
            slot.enabled = enabled;
            found = true;
        }
        found
    }

    /// Run the sweep for one world to a fixed point.
    pub fn process(
        &mut self,
        world: &World,
        field: &FieldGeometry,
        refbox: Option<&RefereeRecord>,
        max_team_robots: usize,
    ) -> Result<FrameOutcome> {
        self.frame += 1;
        let start = self.vars;
        let mut outcome = FrameOutcome::new(world.time);

        for _pass in 0..self.max_passes {
            let mut committed = false;

            for slot in self.slots.iter_mut() {
                slot.fired_last = slot.fired;
                slot.fired = false;
                if !slot.enabled {
                    continue;
                }

                let ctx = RuleContext {
                    vars: &self.vars,
                    field,
                    refbox,
                    max_team_robots,
                    frame: self.frame,
                };
                let Some(firing) = slot.rule.evaluate(world, &ctx) else {
                    continue;
                };
                slot.fired = true;
                if slot.fired_last {
                    continue;
                }

                let kind = slot.rule.kind();
                if let Err(reason) = firing.vars.validate() {
                    error!(rule = %kind, %reason, time = world.time, "Rule proposed an invalid state");
                    self.vars = start;
                    return Err(AutorefError::InvalidState { rule: kind, reason });
                }

                info!(
                    rule = %kind,
                    state = ?firing.vars.state,
                    cmd = %firing.vars.cmd,
                    time = world.time,
                    "{}",
                    firing.description
                );
                debug!(changed = ?firing.vars.changed_fields(&self.vars), "Referee state updated");

                let new = firing.vars;
                if new.reset && (!self.vars.reset || self.vars.reset_loc != new.reset_loc) {
                    outcome.placement = Some(new.reset_loc);
                }
                self.vars = new;
                outcome.fired.push(FiredRule { kind, description: firing.description, foul: firing.foul });
                committed = true;
                break;
            }

            if !committed {
                return Ok(outcome);
            }
        }

        error!(passes = self.max_passes, time = world.time, "Rule sweep did not settle");
        self.vars = start;
        Err(AutorefError::SweepLimitExceeded { passes: self.max_passes, time: world.time })
    }
}
