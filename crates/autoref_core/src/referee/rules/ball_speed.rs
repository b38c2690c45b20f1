use crate::constants::ball::MAX_KICK_SPEED;
use crate::constants::rules::{BALL_SPEED_SAMPLES, BALL_SPEED_TOLERANCE, TOUCHLINE_OFFSET};
use crate::geometry::TimedPoint;
use crate::referee::foul::{Foul, FoulKind};
use crate::referee::rule::{Firing, FrameGate, Rule, RuleContext, RuleKind};
use crate::referee::state::{Command, GameState};
use crate::world::World;

use super::in_running_half;

/// Stops play when the ball travels faster than a legal kick.
///
/// Speed is measured between consecutive visible samples rather than taken
/// from the tracker so a single noisy fit cannot trigger it.
pub struct BallSpeedRule {
    gate: FrameGate,
    last: Option<TimedPoint>,
    violations: u32,
}

impl BallSpeedRule {
    pub fn new() -> Self {
        Self { gate: FrameGate::default(), last: None, violations: 0 }
    }
}

impl Default for BallSpeedRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for BallSpeedRule {
    fn kind(&self) -> RuleKind {
        RuleKind::BallSpeed
    }

    fn evaluate(&mut self, world: &World, ctx: &RuleContext<'_>) -> Option<Firing> {
        let current = ctx.vars;
        if current.state != GameState::Run {
            self.last = None;
            self.violations = 0;
            return None;
        }
        if !in_running_half(current.stage) || !world.ball.visible() {
            return None;
        }

        if self.gate.first_visit(ctx.frame) {
            let sample = TimedPoint::new(world.time, world.ball.position);
            if let Some(last) = self.last.replace(sample) {
                let dt = sample.t - last.t;
                if dt > 0.0 {
                    let speed = (sample.p - last.p).norm() / dt;
                    if speed > MAX_KICK_SPEED * BALL_SPEED_TOLERANCE {
                        self.violations += 1;
                    } else {
                        self.violations = 0;
                    }
                }
            }
        }

        if self.violations < BALL_SPEED_SAMPLES {
            return None;
        }
        self.violations = 0;

        let ball = world.ball.position;
        let team = current.touching_team_or(ball.x);
        let kicker = team.opponent();

        let mut vars = *current;
        vars.cmd = Command::Stop;
        vars.state = GameState::WaitStop;
        vars.kicker = Some(kicker);
        vars.next_cmd = Command::IndirectFree(kicker);
        let spot = ctx.field.bound_to_field(ball, TOUCHLINE_OFFSET, false);
        vars.designate(ctx.field.legal_position(spot));

        let foul = Foul::new(FoulKind::BallSpeed, current.touch_time, world.time);
        let foul = match current.toucher {
            Some(robot) => foul.by_robot(robot),
            None => foul.by_team(team),
        };
        Some(
            Firing::new(vars, format!("Ball kicked too fast by {}", team))
                .with_foul(foul.at(vars.designated_point)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::time::FRAME_PERIOD;
    use crate::geometry::{FieldGeometry, Vec2};
    use crate::test_fixtures::{ball_at, context, frame_time, running_vars, world_at};
    use crate::world::{RobotId, Team};

    #[test]
    fn test_fast_ball_stops_play() {
        let field = FieldGeometry::default();
        let vars = running_vars();
        let mut rule = BallSpeedRule::new();
        let mut fired = None;
        for i in 0..10u32 {
            let world = world_at(frame_time(i), vec![], ball_at(700.0 * f64::from(i), 0.0));
            if let Some(f) = rule.evaluate(&world, &context(&vars, &field, u64::from(i) + 1)) {
                fired = Some((i, f));
                break;
            }
        }
        let (frame, firing) = fired.expect("ball speed foul");
        // Frame 0 only seeds the sample; frames 1-4 are the violations
        assert_eq!(frame, 4);
        assert_eq!(firing.vars.state, GameState::WaitStop);
        // Yellow defends the half the ball is in, so Blue restarts
        assert_eq!(firing.vars.next_cmd, Command::IndirectFree(Team::Blue));
        assert!(field.is_in_field(firing.vars.reset_loc, 0.0, false));
        let foul = firing.foul.unwrap();
        assert_eq!(foul.kind, FoulKind::BallSpeed);
        assert_eq!(foul.team, Some(Team::Yellow));
        assert!(foul.replay.duration() <= 5.0);
    }

    #[test]
    fn test_toucher_is_blamed() {
        let field = FieldGeometry::default();
        let mut vars = running_vars();
        vars.toucher = Some(RobotId::new(Team::Blue, 3));
        vars.touch_loc = Vec2::new(-4400.0, 2900.0);
        vars.touch_time = 0.0;
        let mut rule = BallSpeedRule::new();
        let firing = (0..10u32)
            .find_map(|i| {
                let world = world_at(frame_time(i), vec![], ball_at(-4000.0 + 700.0 * f64::from(i), 0.0));
                rule.evaluate(&world, &context(&vars, &field, u64::from(i) + 1))
            })
            .unwrap();
        assert_eq!(firing.vars.kicker, Some(Team::Yellow));
        assert_eq!(firing.foul.unwrap().robot, Some(RobotId::new(Team::Blue, 3)));
        // Restart is where the ball is, not where it was kicked from
        let ball = Vec2::new(-1200.0, 0.0);
        let p = firing.vars.reset_loc;
        assert!((p - ball).norm() < 200.0, "restart at {:?}", p);
        assert!(field.is_in_field(p, 99.0, false));
        assert!(field.distance_to_defense_area(p, true) >= 699.0);
    }

    #[test]
    fn test_restart_clamped_near_defense_area() {
        let field = FieldGeometry::default();
        let mut vars = running_vars();
        vars.toucher = Some(RobotId::new(Team::Yellow, 2));
        vars.touch_loc = Vec2::new(0.0, 0.0);
        let mut rule = BallSpeedRule::new();
        // Ball ends up deep in Blue's defense area
        let firing = (0..10u32)
            .find_map(|i| {
                let world = world_at(frame_time(i), vec![], ball_at(-1000.0 - 700.0 * f64::from(i), 0.0));
                rule.evaluate(&world, &context(&vars, &field, u64::from(i) + 1))
            })
            .unwrap();
        assert_eq!(firing.vars.kicker, Some(Team::Blue));
        let p = firing.vars.reset_loc;
        assert!(field.distance_to_defense_area(p, true) >= 699.0);
        assert!(p.x < -2000.0, "restart at {:?}", p);
    }

    #[test]
    fn test_slow_ball_resets_count() {
        let field = FieldGeometry::default();
        let vars = running_vars();
        let mut rule = BallSpeedRule::new();
        let mut x = 0.0;
        for i in 0..40u32 {
            // Three fast frames, then a slow one
            x += if i % 4 == 3 { 1.0 } else { 700.0 };
            let world = world_at(f64::from(i) * FRAME_PERIOD, vec![], ball_at(x, 0.0));
            assert!(rule.evaluate(&world, &context(&vars, &field, u64::from(i) + 1)).is_none());
        }
    }
}
