use crate::constants::rules::REFBOX_STABLE_FRAMES;
use crate::constants::time::KICK_DEADLINE;
use crate::referee::rule::{Firing, FrameGate, Rule, RuleContext, RuleKind};
use crate::referee::state::{Command, GameState, Stage};
use crate::world::{Team, World};

use super::initial_blue_side;

/// Follows a human-operated referee box.
///
/// A command/stage pair that disagrees with the referee state is adopted
/// once the box has published it unchanged for [`REFBOX_STABLE_FRAMES`]
/// frames, so a single glitched packet never moves the game.
pub struct RefboxUpdateRule {
    gate: FrameGate,
    last_seen: Option<(Command, Stage)>,
    stable: u32,
}

impl RefboxUpdateRule {
    pub fn new() -> Self {
        Self { gate: FrameGate::default(), last_seen: None, stable: 0 }
    }
}

impl Default for RefboxUpdateRule {
    fn default() -> Self {
        Self::new()
    }
}

/// State the referee enters when the box issues `command`
fn state_for(command: Command) -> GameState {
    match command {
        Command::Halt | Command::Timeout(_) => GameState::Break,
        Command::ForceStart => GameState::Run,
        Command::Stop | Command::Goal(_) | Command::BallPlacement(_) => GameState::WaitStop,
        Command::DirectFree(_)
        | Command::IndirectFree(_)
        | Command::PrepareKickoff(_)
        | Command::PreparePenalty(_)
        | Command::NormalStart => GameState::WaitKick,
    }
}

impl Rule for RefboxUpdateRule {
    fn kind(&self) -> RuleKind {
        RuleKind::RefboxUpdate
    }

    fn evaluate(&mut self, world: &World, ctx: &RuleContext<'_>) -> Option<Firing> {
        let refbox = ctx.refbox?;
        let published = (refbox.command, refbox.stage);

        if self.gate.first_visit(ctx.frame) {
            let ours = (ctx.vars.cmd, ctx.vars.stage);
            if published == ours {
                self.stable = 0;
            } else if self.last_seen == Some(published) {
                self.stable = self.stable.saturating_add(1);
            } else {
                self.stable = 1;
            }
            self.last_seen = Some(published);
        }

        if self.stable < REFBOX_STABLE_FRAMES {
            return None;
        }

        let mut vars = *ctx.vars;
        vars.cmd = refbox.command;
        vars.state = state_for(refbox.command);
        if vars.state == GameState::WaitKick {
            if world.ball.visible() {
                vars.designated_point = world.ball.position;
            }
            vars.kick_deadline = world.time + KICK_DEADLINE;
        }
        if refbox.command.is_free_kick()
            || matches!(refbox.command, Command::PrepareKickoff(_) | Command::PreparePenalty(_))
        {
            vars.kicker = refbox.command.team();
        }

        for team in Team::ALL {
            let record = refbox.team(team);
            let info = vars.team_info_mut(team);
            info.score = record.score;
            info.timeouts = record.timeouts;
            info.timeout_time = record.timeout_time;
        }
        vars.reset = false;

        if refbox.stage != vars.stage {
            vars.stage = refbox.stage;
            vars.stage_end = 0.0;
            if let Some(positive) = refbox.blue_team_on_positive_half {
                vars.blue_side = if positive { 1 } else { -1 };
            } else if vars.blue_side == 0 && vars.stage != Stage::FirstHalfPre {
                vars.blue_side = initial_blue_side(world, Some(refbox));
            }
        }

        self.stable = 0;
        Some(Firing::new(vars, format!("Adopted referee box command {} in {:?}", refbox.command, refbox.stage)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::FieldGeometry;
    use crate::messages::{RefereeRecord, TeamRecord};
    use crate::referee::state::AutorefVariables;
    use crate::test_fixtures::{ball_at, context, frame_time, referee_record, running_vars, world_at};

    fn run(
        rule: &mut RefboxUpdateRule,
        vars: &AutorefVariables,
        record: &RefereeRecord,
        frames: u32,
    ) -> Option<Firing> {
        let field = FieldGeometry::default();
        let mut last = None;
        for i in 0..frames {
            let world = world_at(frame_time(i), vec![], ball_at(300.0, -200.0));
            let mut ctx = context(vars, &field, u64::from(i) + 1);
            ctx.refbox = Some(record);
            last = rule.evaluate(&world, &ctx);
            if last.is_some() {
                return last;
            }
        }
        last
    }

    #[test]
    fn test_requires_stable_command() {
        let vars = running_vars();
        let mut record = referee_record(Stage::FirstHalf, Command::IndirectFree(Team::Yellow));
        record.yellow = TeamRecord { score: 2, ..Default::default() };

        let mut rule = RefboxUpdateRule::new();
        assert!(run(&mut rule, &vars, &record, REFBOX_STABLE_FRAMES - 1).is_none());

        let mut rule = RefboxUpdateRule::new();
        let firing = run(&mut rule, &vars, &record, REFBOX_STABLE_FRAMES).unwrap();
        assert_eq!(firing.vars.state, GameState::WaitKick);
        assert_eq!(firing.vars.kicker, Some(Team::Yellow));
        assert_eq!(firing.vars.team_info(Team::Yellow).score, 2);
        assert_eq!(firing.vars.designated_point.x, 300.0);
    }

    #[test]
    fn test_agreeing_box_never_fires() {
        let vars = running_vars();
        let record = referee_record(vars.stage, vars.cmd);
        let mut rule = RefboxUpdateRule::new();
        assert!(run(&mut rule, &vars, &record, 500).is_none());
    }

    #[test]
    fn test_stage_change_resolves_sides() {
        let vars = AutorefVariables::new();
        let mut record = referee_record(Stage::SecondHalf, Command::Halt);
        record.blue_team_on_positive_half = Some(true);
        let mut rule = RefboxUpdateRule::new();
        let firing = run(&mut rule, &vars, &record, REFBOX_STABLE_FRAMES).unwrap();
        assert_eq!(firing.vars.stage, Stage::SecondHalf);
        assert_eq!(firing.vars.state, GameState::Break);
        assert_eq!(firing.vars.blue_side, 1);
        assert!(firing.vars.validate().is_ok());
    }

    #[test]
    fn test_state_table() {
        assert_eq!(state_for(Command::Timeout(Team::Blue)), GameState::Break);
        assert_eq!(state_for(Command::ForceStart), GameState::Run);
        assert_eq!(state_for(Command::BallPlacement(Team::Yellow)), GameState::WaitStop);
        assert_eq!(state_for(Command::PrepareKickoff(Team::Blue)), GameState::WaitKick);
    }
}
