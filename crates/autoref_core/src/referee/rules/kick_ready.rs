use crate::constants::rules::{
    PLACEMENT_TOLERANCE, SETTLED_BALL_SPEED, SETTLED_ROBOT_SPEED, SETTLE_TIME, SETTLE_TIMEOUT,
};
use crate::constants::time::{KICK_DEADLINE, TIME_IN_HALF};
use crate::referee::rule::{Firing, Rule, RuleContext, RuleKind};
use crate::referee::state::{AutorefVariables, Command, GameState, Stage};
use crate::world::World;

use super::initial_blue_side;

/// Issues the queued restart once a stoppage has settled.
///
/// Robots must stay below [`SETTLED_ROBOT_SPEED`] and the ball must rest
/// on its placement spot for [`SETTLE_TIME`]; after [`SETTLE_TIMEOUT`] the
/// restart goes ahead regardless.
///
/// A restart issued while the ball is occluded keeps the old restart point;
/// the point is moved to the ball as soon as it is seen again.
///
/// Only timestamps are kept, and re-evaluating within a frame writes the
/// same values, so no frame gate is needed.
pub struct KickReadyRule {
    stopped_since: Option<f64>,
    robots_settled_since: Option<f64>,
    ball_settled_since: Option<f64>,
    point_pending: bool,
}

impl KickReadyRule {
    pub fn new() -> Self {
        Self {
            stopped_since: None,
            robots_settled_since: None,
            ball_settled_since: None,
            point_pending: false,
        }
    }

    fn restart_clock(&mut self, now: f64) {
        self.stopped_since = Some(now);
        self.robots_settled_since = Some(now);
        self.ball_settled_since = Some(now);
    }

    fn ready(&self, now: f64) -> bool {
        let elapsed = |since: Option<f64>| since.map_or(0.0, |t| now - t);
        elapsed(self.stopped_since) > SETTLE_TIMEOUT
            || (elapsed(self.robots_settled_since) > SETTLE_TIME
                && elapsed(self.ball_settled_since) > SETTLE_TIME)
    }
}

impl Default for KickReadyRule {
    fn default() -> Self {
        Self::new()
    }
}

fn await_kick(vars: &mut AutorefVariables, now: f64) {
    vars.state = GameState::WaitKick;
    vars.kick_deadline = now + KICK_DEADLINE;
}

impl Rule for KickReadyRule {
    fn kind(&self) -> RuleKind {
        RuleKind::KickReady
    }

    fn evaluate(&mut self, world: &World, ctx: &RuleContext<'_>) -> Option<Firing> {
        let now = world.time;
        let current = ctx.vars;
        if current.state != GameState::WaitKick {
            self.point_pending = false;
        } else if self.point_pending && world.ball.visible() {
            self.point_pending = false;
            let mut vars = *current;
            vars.designated_point = world.ball.position;
            return Some(Firing::new(vars, "Ball visible again, restart point updated"));
        }

        if !current.stage.is_playing()
            || current.state != GameState::WaitStop
            || self.stopped_since.is_none()
        {
            self.restart_clock(now);
            return None;
        }

        if world.robots.iter().any(|r| r.speed() > SETTLED_ROBOT_SPEED) {
            self.robots_settled_since = Some(now);
        }
        let ball = &world.ball;
        let misplaced = current.reset && (ball.position - current.reset_loc).norm() >= PLACEMENT_TOLERANCE;
        if ball.visible() && (ball.speed() >= SETTLED_BALL_SPEED || misplaced) {
            self.ball_settled_since = Some(now);
        }

        if matches!(current.next_cmd, Command::Halt | Command::Stop) || !self.ready(now) {
            return None;
        }

        let mut vars = *current;
        vars.toucher = None;
        vars.cmd = current.next_cmd;
        vars.next_cmd = Command::Halt;
        vars.reset = false;
        if ball.visible() {
            vars.designated_point = ball.position;
        }

        match current.next_cmd {
            Command::DirectFree(team) | Command::IndirectFree(team) => {
                vars.kicker = Some(team);
                await_kick(&mut vars, now);
            }
            Command::NormalStart => {
                vars.stage = current.stage.started();
                if vars.stage != current.stage {
                    vars.blue_side = if vars.stage == Stage::FirstHalf {
                        initial_blue_side(world, ctx.refbox)
                    } else {
                        -current.blue_side
                    };
                    vars.stage_end = now + TIME_IN_HALF;
                }
                await_kick(&mut vars, now);
            }
            Command::ForceStart => {
                vars.state = GameState::Run;
            }
            Command::PrepareKickoff(team) | Command::PreparePenalty(team) => {
                vars.next_cmd = Command::NormalStart;
                vars.kicker = Some(team);
                vars.state = GameState::WaitStop;
                self.restart_clock(now);
            }
            Command::Halt
            | Command::Stop
            | Command::Timeout(_)
            | Command::Goal(_)
            | Command::BallPlacement(_) => return None,
        }

        self.point_pending = vars.state == GameState::WaitKick && !ball.visible();
        Some(Firing::new(vars, format!("Robots settled, issuing {}", vars.cmd)))
    }
}
