use crate::geometry::{segment_intersects, Vec2};
use crate::referee::rule::{Firing, FrameGate, Rule, RuleContext, RuleKind};
use crate::referee::state::{Command, GameState};
use crate::world::World;

use super::extrapolation::{BallEstimate, BallExtrapolator};
use super::in_running_half;

/// Awards a goal when the ball, seen or briefly extrapolated, is inside a
/// goal box.
pub struct GoalScoredRule {
    gate: FrameGate,
    extrapolator: BallExtrapolator,
    estimate: Option<BallEstimate>,
}

impl GoalScoredRule {
    pub fn new() -> Self {
        Self { gate: FrameGate::default(), extrapolator: BallExtrapolator::new(), estimate: None }
    }
}

impl Default for GoalScoredRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for GoalScoredRule {
    fn kind(&self) -> RuleKind {
        RuleKind::GoalScored
    }

    fn evaluate(&mut self, world: &World, ctx: &RuleContext<'_>) -> Option<Firing> {
        if self.gate.first_visit(ctx.frame) {
            self.estimate = self.extrapolator.update(world);
        }

        let current = ctx.vars;
        if current.state != GameState::Run || !in_running_half(current.stage) {
            return None;
        }

        let estimate = self.estimate?;
        let loc = estimate.position();
        if let BallEstimate::Extrapolated { last_seen, .. } = estimate {
            // An occluded ball projected through the side of a goal went
            // past the post, not in.
            let field = ctx.field;
            let post = Vec2::new(field.field_length_h, field.goal_width_h);
            let back = Vec2::new(field.field_length_h + field.goal_depth, field.goal_width_h);
            let from = Vec2::new(last_seen.x.abs(), last_seen.y.abs());
            let to = Vec2::new(loc.x.abs(), loc.y.abs());
            if segment_intersects(to, from, post, back) {
                return None;
            }
        }
        if !ctx.field.is_in_goal(loc) {
            return None;
        }

        let scorer = current.defending_team_at(loc.x).opponent();
        let mut vars = *current;
        vars.team_info_mut(scorer).score += 1;
        vars.cmd = Command::Stop;
        vars.next_cmd = Command::Goal(scorer);
        vars.kicker = Some(scorer.opponent());
        vars.state = GameState::DelayGoal;
        vars.designate(Vec2::zeros());
        Some(Firing::new(
            vars,
            format!("Goal for {} ({}:{})", scorer, vars.team[0].score, vars.team[1].score),
        ))
    }
}
