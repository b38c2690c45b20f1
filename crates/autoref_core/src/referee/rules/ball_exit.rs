use crate::constants::ball::BALL_RADIUS;
use crate::constants::rules::{BALL_EXIT_FRAMES, CORNER_OFFSET, GOAL_KICK_OFFSET, TOUCHLINE_OFFSET};
use crate::geometry::{sign, Vec2};
use crate::referee::foul::{Foul, FoulKind};
use crate::referee::rule::{Firing, FrameGate, Rule, RuleContext, RuleKind};
use crate::referee::state::{Command, GameState};
use crate::world::World;

use super::extrapolation::BallExtrapolator;
use super::in_running_half;

/// Sign that treats 0 as positive
fn sign_positive(x: f64) -> f64 {
    if x < 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// Awards the restart when the ball has left the field: throw-in, corner,
/// goal kick, or an indirect free kick for icing.
pub struct BallExitRule {
    gate: FrameGate,
    extrapolator: BallExtrapolator,
    loc: Option<Vec2>,
    last_inside: Option<Vec2>,
    outside: u32,
}

impl BallExitRule {
    pub fn new() -> Self {
        Self {
            gate: FrameGate::default(),
            extrapolator: BallExtrapolator::new(),
            loc: None,
            last_inside: None,
            outside: 0,
        }
    }
}

impl Default for BallExitRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for BallExitRule {
    fn kind(&self) -> RuleKind {
        RuleKind::BallExit
    }

    fn evaluate(&mut self, world: &World, ctx: &RuleContext<'_>) -> Option<Firing> {
        let field = ctx.field;
        if self.gate.first_visit(ctx.frame) {
            self.loc = self.extrapolator.update(world).map(|e| e.position());
            if let Some(loc) = self.loc {
                if field.is_in_field(loc, -BALL_RADIUS, false) {
                    self.last_inside = Some(loc);
                    self.outside = 0;
                } else {
                    self.outside += 1;
                }
            }
        }

        let current = ctx.vars;
        if current.state != GameState::Run || !in_running_half(current.stage) {
            return None;
        }
        let loc = self.loc?;
        if self.outside < BALL_EXIT_FRAMES {
            return None;
        }

        let team = current.touching_team_or(loc.x);
        let kicker = team.opponent();
        let last_inside = self.last_inside.unwrap_or_else(Vec2::zeros);
        let out = field.out_of_bounds_location(last_inside, loc - last_inside);

        let own_half = current.team_side(team) * out.x > 0.0;
        let past_goal_line = out.x.abs() - out.y.abs() > field.field_length_h - field.field_width_h;
        let crossed_midline = current.toucher.is_some() && current.touch_loc.x * out.x < 0.0;

        let mut vars = *current;
        vars.cmd = Command::Stop;
        vars.state = GameState::WaitStop;
        vars.kicker = Some(kicker);

        let (kind, description) = if past_goal_line && crossed_midline && !own_half {
            vars.next_cmd = Command::IndirectFree(kicker);
            vars.designate(field.legal_position(current.touch_loc));
            (FoulKind::Icing, format!("Icing by {}", team))
        } else if past_goal_line {
            let offset = if own_half { CORNER_OFFSET } else { GOAL_KICK_OFFSET };
            vars.next_cmd = Command::DirectFree(kicker);
            vars.designate(Vec2::new(
                sign(out.x) * (field.field_length_h - offset),
                sign_positive(out.y) * (field.field_width_h - TOUCHLINE_OFFSET),
            ));
            let restart = if own_half { "Corner kick" } else { "Goal kick" };
            (FoulKind::BallLeftField, format!("{} for {}", restart, kicker))
        } else {
            vars.next_cmd = Command::IndirectFree(kicker);
            let y = sign_positive(out.y) * (field.field_width_h - TOUCHLINE_OFFSET);
            vars.designate(Vec2::new(out.x, y));
            (FoulKind::BallLeftField, format!("Throw-in for {}", kicker))
        };

        let foul = Foul::new(kind, current.touch_time, world.time).at(vars.designated_point);
        let foul = match current.toucher {
            Some(robot) => foul.by_robot(robot),
            None => foul.by_team(team),
        };
        Some(Firing::new(vars, description).with_foul(foul))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::FieldGeometry;
    use crate::referee::state::AutorefVariables;
    use crate::test_fixtures::{ball_at, context, frame_time, running_vars, world_at};
    use crate::world::{RobotId, Team};

    fn play(vars: &AutorefVariables, path: &[(f64, f64)]) -> Option<Firing> {
        let field = FieldGeometry::default();
        let mut rule = BallExitRule::new();
        path.iter().enumerate().find_map(|(i, (x, y))| {
            let i = i as u32;
            let world = world_at(frame_time(i), vec![], ball_at(*x, *y));
            rule.evaluate(&world, &context(vars, &field, u64::from(i) + 1))
        })
    }

    fn touched_by(team: Team, at: Vec2) -> AutorefVariables {
        let mut vars = running_vars();
        vars.toucher = Some(RobotId::new(team, 1));
        vars.touch_loc = at;
        vars
    }

    #[test]
    fn test_icing() {
        let vars = touched_by(Team::Blue, Vec2::new(-1000.0, 500.0));
        let path: Vec<_> = [4350.0, 4420.0, 4480.0, 4540.0, 4600.0].iter().map(|x| (*x, 1500.0)).collect();
        let firing = play(&vars, &path).expect("ball exit");
        assert_eq!(firing.vars.next_cmd, Command::IndirectFree(Team::Yellow));
        assert_eq!(firing.vars.designated_point, Vec2::new(-1000.0, 500.0));
        let foul = firing.foul.unwrap();
        assert_eq!(foul.kind, FoulKind::Icing);
        assert_eq!(foul.team, Some(Team::Blue));
    }

    #[test]
    fn test_goal_kick_without_midline_crossing() {
        let vars = touched_by(Team::Blue, Vec2::new(1000.0, 500.0));
        let path = [(4480.0, 1500.0), (4540.0, 1500.0), (4600.0, 1500.0)];
        let firing = play(&vars, &path).unwrap();
        assert_eq!(firing.vars.next_cmd, Command::DirectFree(Team::Yellow));
        assert_eq!(firing.vars.designated_point, Vec2::new(4000.0, 2900.0));
        assert_eq!(firing.foul.unwrap().kind, FoulKind::BallLeftField);
    }

    #[test]
    fn test_corner_when_defender_plays_it_out() {
        // Yellow defends positive x and put the ball over its own goal line
        let vars = touched_by(Team::Yellow, Vec2::new(3000.0, -500.0));
        let path = [(4480.0, -1500.0), (4540.0, -1500.0), (4600.0, -1500.0)];
        let firing = play(&vars, &path).unwrap();
        assert_eq!(firing.vars.next_cmd, Command::DirectFree(Team::Blue));
        assert_eq!(firing.vars.designated_point, Vec2::new(4400.0, -2900.0));
    }

    #[test]
    fn test_throw_in() {
        let vars = touched_by(Team::Blue, Vec2::new(0.0, 2000.0));
        let path = [(200.0, 2980.0), (220.0, 3030.0), (240.0, 3080.0)];
        let firing = play(&vars, &path).unwrap();
        assert_eq!(firing.vars.next_cmd, Command::IndirectFree(Team::Yellow));
        let p = firing.vars.designated_point;
        assert!((p.x - 200.0).abs() < 20.0);
        assert_eq!(p.y, 2900.0);
    }

    #[test]
    fn test_single_frame_outside_is_ignored() {
        let vars = running_vars();
        let path = [(4480.0, 0.0), (4530.0, 1500.0), (4480.0, 1500.0), (4530.0, 1500.0)];
        assert!(play(&vars, &path).is_none());
    }
}
