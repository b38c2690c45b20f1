use crate::constants::robot::MAX_ROBOT_RADIUS;
use crate::constants::rules::{STOP_BALL_DISTANCE, STOP_DISTANCE_FRAMES};
use crate::constants::time::FRAME_PERIOD;
use crate::referee::foul::{Foul, FoulKind};
use crate::referee::rule::{Firing, FrameGate, Rule, RuleContext, RuleKind};
use crate::referee::state::GameState;
use crate::world::{Team, World};

/// Reports teams that crowd the ball while the game is stopped.
///
/// Like the stop speed check, violation frames add up over the match and the
/// state is left alone.
pub struct StopDistanceToBallRule {
    gate: FrameGate,
    violations: [u32; 2],
    pending: Option<Team>,
}

impl StopDistanceToBallRule {
    pub fn new() -> Self {
        Self { gate: FrameGate::default(), violations: [0; 2], pending: None }
    }
}

impl Default for StopDistanceToBallRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for StopDistanceToBallRule {
    fn kind(&self) -> RuleKind {
        RuleKind::StopDistanceToBall
    }

    fn evaluate(&mut self, world: &World, ctx: &RuleContext<'_>) -> Option<Firing> {
        if ctx.vars.state != GameState::WaitStop || !world.ball.visible() {
            self.pending = None;
            return None;
        }

        if self.gate.first_visit(ctx.frame) {
            let ball = world.ball.position;
            for team in Team::ALL {
                let crowding = world
                    .team_robots(team)
                    .any(|r| (r.position - ball).norm() < STOP_BALL_DISTANCE + MAX_ROBOT_RADIUS);
                if crowding {
                    self.violations[team.index()] += 1;
                }
            }
            self.pending = Team::ALL.into_iter().find(|t| self.violations[t.index()] > STOP_DISTANCE_FRAMES);
            if let Some(team) = self.pending {
                self.violations[team.index()] = 0;
            }
        }
        let team = self.pending.take()?;

        let since = world.time - f64::from(STOP_DISTANCE_FRAMES) * FRAME_PERIOD;
        let foul = Foul::new(FoulKind::StopBallDistance, since, world.time)
            .by_team(team)
            .at(ctx.field.legal_position(world.ball.position));
        let description = format!("{} robots too close to the ball during stop", team);
        Some(Firing::new(*ctx.vars, description).with_foul(foul))
    }
}
