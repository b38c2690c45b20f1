use crate::constants::robot::MAX_ROBOT_RADIUS;
use crate::referee::foul::{Foul, FoulKind};
use crate::referee::rule::{Firing, FrameGate, Rule, RuleContext, RuleKind};
use crate::referee::state::{Command, GameState};
use crate::touch::{Touch, TouchDetector};
use crate::world::World;

/// Records who touched the ball last and calls touches made from inside a
/// defense area.
///
/// A defender other than the goalie touching the ball from fully inside its
/// own area concedes a penalty; partially inside, play is restarted. An
/// attacker touching inside the opponent area concedes an indirect free kick.
/// Goalies are only known with a referee box, so the defender checks need one.
pub struct BallTouchedRule {
    gate: FrameGate,
    detector: TouchDetector,
    pending: Option<Touch>,
}

impl BallTouchedRule {
    pub fn new() -> Self {
        Self { gate: FrameGate::default(), detector: TouchDetector::new(), pending: None }
    }
}

impl Default for BallTouchedRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for BallTouchedRule {
    fn kind(&self) -> RuleKind {
        RuleKind::BallTouched
    }

    fn evaluate(&mut self, world: &World, ctx: &RuleContext<'_>) -> Option<Firing> {
        if self.gate.first_visit(ctx.frame) {
            self.pending = self.detector.process(world);
        }
        let touch = self.pending.take()?;

        let current = ctx.vars;
        let mut vars = *current;
        vars.toucher = Some(touch.robot);
        vars.touch_time = touch.time;
        vars.touch_loc = world.ball.position;
        let touched = Firing::new(vars, format!("Ball touched by {}", touch.robot));

        if current.state != GameState::Run {
            return Some(touched);
        }
        let Some(robot) = world.robot(touch.robot) else {
            return Some(touched);
        };

        let team = touch.robot.team;
        let opponent = team.opponent();
        let field = ctx.field;
        let is_goalie = ctx.refbox.map(|r| r.goalie(team) == Some(touch.robot.id));
        let own_area = field.distance_to_defense_area(robot.position, current.defends_negative_x(team));
        let their_area = field.distance_to_defense_area(robot.position, current.defends_negative_x(opponent));

        let (kind, what) = match is_goalie {
            Some(false) if own_area < -MAX_ROBOT_RADIUS => {
                vars.next_cmd = Command::PreparePenalty(opponent);
                vars.kicker = Some(opponent);
                (FoulKind::MultipleDefender, "inside its own defense area")
            }
            Some(false) if own_area < MAX_ROBOT_RADIUS => {
                vars.next_cmd = Command::ForceStart;
                (FoulKind::MultipleDefenderPartial, "partially inside its own defense area")
            }
            _ if their_area < MAX_ROBOT_RADIUS => {
                vars.next_cmd = Command::IndirectFree(opponent);
                vars.kicker = Some(opponent);
                (FoulKind::AttackerInDefenseArea, "inside the opponent defense area")
            }
            _ => return Some(touched),
        };

        vars.cmd = Command::Stop;
        vars.state = GameState::WaitStop;
        vars.designate(field.legal_position(vars.touch_loc));
        let foul = Foul::new(kind, touch.time, world.time)
            .by_robot(touch.robot)
            .at(vars.designated_point);
        let description = format!("{} touched the ball {}", touch.robot, what);
        Some(Firing::new(vars, description).with_foul(foul))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{FieldGeometry, Vec2};
    use crate::messages::{RefereeRecord, TeamRecord};
    use crate::referee::state::{AutorefVariables, Stage};
    use crate::test_fixtures::{
        ball_at, context, frame_time, referee_record, robot_at, running_vars, world_at,
    };
    use crate::world::{RobotId, Team};

    /// Ball resting on the dribbler of Blue robot `id` at `(x, 0)`
    fn first_touch(
        vars: &AutorefVariables,
        refbox: Option<&RefereeRecord>,
        id: u32,
        x: f64,
    ) -> Firing {
        let field = FieldGeometry::default();
        let mut rule = BallTouchedRule::new();
        (1..40u32)
            .find_map(|i| {
                let robots = vec![robot_at(Team::Blue, id, x, 0.0)];
                let world = world_at(frame_time(i), robots, ball_at(x + 95.0, 0.0));
                let mut ctx = context(vars, &field, u64::from(i));
                ctx.refbox = refbox;
                rule.evaluate(&world, &ctx)
            })
            .expect("touch")
    }

    fn with_goalie(goalie: u32) -> RefereeRecord {
        let mut record = referee_record(Stage::FirstHalf, Command::ForceStart);
        record.blue = TeamRecord { goalie: Some(goalie), ..Default::default() };
        record
    }

    #[test]
    fn test_touch_is_recorded() {
        let vars = running_vars();
        let firing = first_touch(&vars, None, 2, 0.0);
        assert_eq!(firing.vars.toucher, Some(RobotId::new(Team::Blue, 2)));
        assert_eq!(firing.vars.touch_loc.x, 95.0);
        assert_eq!(firing.vars.state, GameState::Run);
        assert!(firing.foul.is_none());
    }

    #[test]
    fn test_defender_inside_own_area() {
        let vars = running_vars();
        let record = with_goalie(0);
        let firing = first_touch(&vars, Some(&record), 3, -4200.0);
        assert_eq!(firing.vars.next_cmd, Command::PreparePenalty(Team::Yellow));
        assert_eq!(firing.foul.unwrap().kind, FoulKind::MultipleDefender);

        // The goalie may play the ball there
        let firing = first_touch(&vars, Some(&record), 0, -4200.0);
        assert!(firing.foul.is_none());
    }

    #[test]
    fn test_defender_partially_inside() {
        let vars = running_vars();
        let record = with_goalie(0);
        // 40 mm outside the area line
        let firing = first_touch(&vars, Some(&record), 3, -3460.0);
        assert_eq!(firing.vars.next_cmd, Command::ForceStart);
        assert_eq!(firing.foul.unwrap().kind, FoulKind::MultipleDefenderPartial);
    }

    #[test]
    fn test_attacker_inside_opponent_area() {
        let vars = running_vars();
        let firing = first_touch(&vars, None, 5, 3600.0);
        assert_eq!(firing.vars.next_cmd, Command::IndirectFree(Team::Yellow));
        assert_eq!(firing.vars.state, GameState::WaitStop);
        let foul = firing.foul.unwrap();
        assert_eq!(foul.kind, FoulKind::AttackerInDefenseArea);
        assert_eq!(foul.robot, Some(RobotId::new(Team::Blue, 5)));
        assert!(field_clear(firing.vars.reset_loc));
    }

    fn field_clear(p: Vec2) -> bool {
        let field = FieldGeometry::default();
        field.distance_to_defense_area(p, false) >= 699.0
            && field.distance_to_defense_area(p, true) >= 699.0
    }
}
