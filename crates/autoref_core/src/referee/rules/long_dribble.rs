use std::collections::BTreeMap;

use crate::constants::ball::BALL_RADIUS;
use crate::constants::robot::DRIBBLER_OFFSET;
use crate::constants::rules::{DRIBBLE_RELEASE_FRAMES, MAX_DRIBBLE_DISTANCE};
use crate::geometry::{rotate, Vec2};
use crate::referee::foul::{Foul, FoulKind};
use crate::referee::rule::{Firing, FrameGate, Rule, RuleContext, RuleKind};
use crate::referee::state::{Command, GameState};
use crate::world::{RobotId, World, WorldRobot};

/// Half width of the dribbler contact zone (mm)
const DRIBBLER_HALF_WIDTH: f64 = 50.0;
/// Slack beyond a ball resting against the dribbler (mm)
const DRIBBLER_SLACK: f64 = 5.0;

#[derive(Debug, Clone, Copy)]
struct Dribble {
    start: Vec2,
    since: f64,
    off_frames: u32,
}

fn on_dribbler(robot: &WorldRobot, ball: Vec2) -> bool {
    let local = rotate(ball - robot.position, -robot.heading);
    local.y.abs() < DRIBBLER_HALF_WIDTH
        && local.x > DRIBBLER_OFFSET
        && local.x < DRIBBLER_OFFSET + BALL_RADIUS + DRIBBLER_SLACK
}

/// Calls a robot that carries the ball on its dribbler further than
/// [`MAX_DRIBBLE_DISTANCE`].
pub struct LongDribbleRule {
    gate: FrameGate,
    dribbles: BTreeMap<RobotId, Dribble>,
}

impl LongDribbleRule {
    pub fn new() -> Self {
        Self { gate: FrameGate::default(), dribbles: BTreeMap::new() }
    }

    fn track(&mut self, world: &World) {
        let ball = world.ball.position;
        for robot in &world.robots {
            if on_dribbler(robot, ball) {
                self.dribbles
                    .entry(robot.id)
                    .and_modify(|d| d.off_frames = 0)
                    .or_insert(Dribble { start: ball, since: world.time, off_frames: 0 });
            }
        }
        self.dribbles.retain(|id, dribble| {
            let touching = world.robot(*id).is_some_and(|r| on_dribbler(r, ball));
            if !touching {
                dribble.off_frames += 1;
            }
            dribble.off_frames <= DRIBBLE_RELEASE_FRAMES
        });
    }
}

impl Default for LongDribbleRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for LongDribbleRule {
    fn kind(&self) -> RuleKind {
        RuleKind::LongDribble
    }

    fn evaluate(&mut self, world: &World, ctx: &RuleContext<'_>) -> Option<Firing> {
        let current = ctx.vars;
        if current.state != GameState::Run {
            self.dribbles.clear();
            return None;
        }
        if !world.ball.visible() {
            return None;
        }
        if self.gate.first_visit(ctx.frame) {
            self.track(world);
        }

        let ball = world.ball.position;
        let (robot, dribble) = self
            .dribbles
            .iter()
            .find(|(_, d)| (ball - d.start).norm() > MAX_DRIBBLE_DISTANCE)
            .map(|(id, d)| (*id, *d))?;
        self.dribbles.remove(&robot);

        let opponent = robot.team.opponent();
        let mut vars = *current;
        vars.cmd = Command::Stop;
        vars.state = GameState::WaitStop;
        vars.kicker = Some(opponent);
        vars.next_cmd = Command::IndirectFree(opponent);
        vars.designate(ctx.field.legal_position(dribble.start));

        let foul = Foul::new(FoulKind::BallDribbling, dribble.since, world.time)
            .by_robot(robot)
            .at(vars.designated_point);
        Some(Firing::new(vars, format!("{} dribbled too far", robot)).with_foul(foul))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::FieldGeometry;
    use crate::test_fixtures::{ball_at, context, frame_time, robot_at, running_vars, world_at};
    use crate::world::Team;

    #[test]
    fn test_dribbler_zone() {
        let mut robot = robot_at(Team::Blue, 0, 0.0, 0.0);
        assert!(on_dribbler(&robot, Vec2::new(95.0, 10.0)));
        assert!(!on_dribbler(&robot, Vec2::new(95.0, 60.0)));
        assert!(!on_dribbler(&robot, Vec2::new(-95.0, 0.0)));
        // Facing +y
        robot.heading = std::f64::consts::FRAC_PI_2;
        assert!(on_dribbler(&robot, Vec2::new(0.0, 95.0)));
    }

    #[test]
    fn test_long_dribble_called() {
        let field = FieldGeometry::default();
        let vars = running_vars();
        let mut rule = LongDribbleRule::new();
        let mut fired = None;
        for i in 0..120u32 {
            // 20 mm per frame with the ball glued to the dribbler
            let x = -1000.0 + 20.0 * f64::from(i);
            let robots = vec![robot_at(Team::Yellow, 7, x, 0.0)];
            let world = world_at(frame_time(i), robots, ball_at(x + 95.0, 0.0));
            if let Some(firing) = rule.evaluate(&world, &context(&vars, &field, u64::from(i) + 1)) {
                fired = Some((i, firing));
                break;
            }
        }
        let (frame, firing) = fired.expect("dribble foul");
        assert_eq!(frame, 51);
        assert_eq!(firing.vars.next_cmd, Command::IndirectFree(Team::Blue));
        assert_eq!(firing.vars.reset_loc, Vec2::new(-905.0, 0.0));
        assert_eq!(firing.foul.unwrap().robot, Some(RobotId::new(Team::Yellow, 7)));
    }

    #[test]
    fn test_release_resets_dribble() {
        let field = FieldGeometry::default();
        let vars = running_vars();
        let mut rule = LongDribbleRule::new();
        for i in 0..200u32 {
            let x = -1000.0 + 20.0 * f64::from(i);
            // Ball pushed ahead for a dozen frames every 40
            let gap = if i % 40 >= 28 { 200.0 } else { 95.0 };
            let robots = vec![robot_at(Team::Yellow, 7, x, 0.0)];
            let world = world_at(frame_time(i), robots, ball_at(x + gap, 0.0));
            assert!(rule.evaluate(&world, &context(&vars, &field, u64::from(i) + 1)).is_none());
        }
    }
}
