use crate::constants::robot::MAX_ROBOT_RADIUS;
use crate::constants::rules::{KICK_DEFENSE_DISTANCE, KICK_DISTANCE, KICK_SPEED};
use crate::constants::time::KICK_DEADLINE;
use crate::referee::foul::{Foul, FoulKind};
use crate::referee::rule::{Firing, Rule, RuleContext, RuleKind};
use crate::referee::state::{Command, GameState};
use crate::world::World;

/// Puts the ball in play once the restart kick has moved it.
///
/// If a robot of the kicking team stood too close to the opponent defense
/// area at that moment, the restart goes to the other team instead.
pub struct KickTakenRule;

impl Rule for KickTakenRule {
    fn kind(&self) -> RuleKind {
        RuleKind::KickTaken
    }

    fn evaluate(&mut self, world: &World, ctx: &RuleContext<'_>) -> Option<Firing> {
        let current = ctx.vars;
        let ball = &world.ball;
        if current.state != GameState::WaitKick || !ball.visible() {
            return None;
        }
        let kicked = ball.speed() > KICK_SPEED
            || (ball.position - current.designated_point).norm() > KICK_DISTANCE;
        if !kicked {
            return None;
        }

        let mut vars = *current;
        let offender = current.kicker.and_then(|kicker| {
            let opponent_area = current.defends_negative_x(kicker.opponent());
            world.team_robots(kicker).find(|r| {
                ctx.field.distance_to_defense_area(r.position, opponent_area)
                    < MAX_ROBOT_RADIUS + KICK_DEFENSE_DISTANCE
            })
        });

        let Some(offender) = offender else {
            vars.state = GameState::Run;
            let by = current.kicker.map_or_else(|| "either team".to_string(), |t| t.to_string());
            return Some(Firing::new(vars, format!("Kick taken by {}", by)));
        };

        let kicker = offender.id.team.opponent();
        vars.state = GameState::WaitStop;
        vars.cmd = Command::Stop;
        vars.kicker = Some(kicker);
        vars.next_cmd = Command::IndirectFree(kicker);
        vars.designate(ctx.field.legal_position(offender.position));

        let awaited_since = current.kick_deadline - KICK_DEADLINE;
        let foul = Foul::new(FoulKind::AttackerTooCloseToDefenseArea, awaited_since, world.time)
            .by_robot(offender.id)
            .at(vars.designated_point);
        let description = format!("{} too close to the defense area at the kick", offender.id);
        Some(Firing::new(vars, description).with_foul(foul))
    }
}
