use crate::constants::rules::{STOP_GRACE_FRAMES, STOP_ROBOT_SPEED, STOP_SPEED_FRAMES};
use crate::constants::time::FRAME_PERIOD;
use crate::referee::foul::{Foul, FoulKind};
use crate::referee::rule::{Firing, FrameGate, Rule, RuleContext, RuleKind};
use crate::referee::state::GameState;
use crate::world::{Team, World};

/// Reports teams that keep driving too fast while the game is stopped.
///
/// Violation frames accumulate over the match and are only cleared when a
/// foul is reported. The state itself is left alone.
pub struct RobotSpeedDuringStopRule {
    gate: FrameGate,
    stopped_frames: u32,
    violations: [u32; 2],
    pending: Option<Team>,
}

impl RobotSpeedDuringStopRule {
    pub fn new() -> Self {
        Self { gate: FrameGate::default(), stopped_frames: 0, violations: [0; 2], pending: None }
    }
}

impl Default for RobotSpeedDuringStopRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for RobotSpeedDuringStopRule {
    fn kind(&self) -> RuleKind {
        RuleKind::RobotSpeedDuringStop
    }

    fn evaluate(&mut self, world: &World, ctx: &RuleContext<'_>) -> Option<Firing> {
        if ctx.vars.state != GameState::WaitStop {
            self.stopped_frames = 0;
            self.pending = None;
            return None;
        }

        if self.gate.first_visit(ctx.frame) {
            self.stopped_frames = self.stopped_frames.saturating_add(1);
            if self.stopped_frames > STOP_GRACE_FRAMES {
                for team in Team::ALL {
                    if world.team_robots(team).any(|r| r.speed() > STOP_ROBOT_SPEED) {
                        self.violations[team.index()] += 1;
                    }
                }
            }
            self.pending = Team::ALL.into_iter().find(|t| self.violations[t.index()] > STOP_SPEED_FRAMES);
            if let Some(team) = self.pending {
                self.violations[team.index()] = 0;
            }
        }
        let team = self.pending.take()?;

        let since = world.time - f64::from(STOP_SPEED_FRAMES) * FRAME_PERIOD;
        let foul = Foul::new(FoulKind::RobotStopSpeed, since, world.time).by_team(team);
        let description = format!("{} robots too fast during stop", team);
        Some(Firing::new(*ctx.vars, description).with_foul(foul))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{FieldGeometry, Vec2};
    use crate::referee::state::Command;
    use crate::test_fixtures::{
        ball_at, context, frame_time, moving_robot, running_vars, stopped_vars, world_at,
    };

    fn fast_blue(i: u32) -> World {
        world_at(
            frame_time(i),
            vec![moving_robot(Team::Blue, 1, Vec2::new(-2000.0, 0.0), Vec2::new(2000.0, 0.0))],
            ball_at(0.0, 0.0),
        )
    }

    #[test]
    fn test_speeding_after_grace() {
        let field = FieldGeometry::default();
        let vars = stopped_vars(Command::ForceStart);
        let mut rule = RobotSpeedDuringStopRule::new();
        let fired = (0..1000u32).find_map(|i| {
            rule.evaluate(&fast_blue(i), &context(&vars, &field, u64::from(i) + 1)).map(|f| (i, f))
        });
        let (frame, firing) = fired.unwrap();
        assert_eq!(frame, STOP_GRACE_FRAMES + STOP_SPEED_FRAMES);
        assert_eq!(firing.vars, vars);
        let foul = firing.foul.unwrap();
        assert_eq!(foul.kind, FoulKind::RobotStopSpeed);
        assert_eq!(foul.team, Some(Team::Blue));
    }

    #[test]
    fn test_violations_accumulate_across_stoppages() {
        let field = FieldGeometry::default();
        let stopped = stopped_vars(Command::ForceStart);
        let running = running_vars();
        let mut rule = RobotSpeedDuringStopRule::new();

        // 300 stopped frames: 180 violations counted
        for i in 0..300u32 {
            let ctx = context(&stopped, &field, u64::from(i) + 1);
            assert!(rule.evaluate(&fast_blue(i), &ctx).is_none());
        }
        rule.evaluate(&fast_blue(300), &context(&running, &field, 301));

        // After a fresh grace period, 69 more violations tip it over
        let fired = (301..1000u32).find_map(|i| {
            rule.evaluate(&fast_blue(i), &context(&stopped, &field, u64::from(i) + 1)).map(|_| i)
        });
        assert_eq!(fired, Some(301 + STOP_GRACE_FRAMES + 69 - 1));
    }
}
