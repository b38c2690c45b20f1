use crate::constants::time::TIME_IN_HALFTIME;
use crate::geometry::Vec2;
use crate::referee::rule::{Firing, Rule, RuleContext, RuleKind};
use crate::referee::state::{Command, GameState, Stage};
use crate::world::{Team, World};

/// Moves the match to its next stage when the stage clock runs out.
pub struct StageTimeEndedRule;

impl Rule for StageTimeEndedRule {
    fn kind(&self) -> RuleKind {
        RuleKind::StageTimeEnded
    }

    fn evaluate(&mut self, world: &World, ctx: &RuleContext<'_>) -> Option<Firing> {
        let current = ctx.vars;
        let now = world.time;
        if current.stage_end <= 0.0 || now < current.stage_end {
            return None;
        }

        let mut vars = *current;
        match current.stage {
            Stage::FirstHalf => {
                vars.cmd = Command::Halt;
                vars.state = GameState::Break;
                vars.stage = Stage::HalfTime;
                vars.stage_end = now + TIME_IN_HALFTIME;
            }
            Stage::HalfTime => {
                vars.cmd = Command::Stop;
                vars.next_cmd = Command::PrepareKickoff(Team::Yellow);
                vars.state = GameState::WaitStop;
                vars.stage = Stage::SecondHalfPre;
                vars.stage_end = 0.0;
                vars.designate(Vec2::zeros());
            }
            Stage::SecondHalf => {
                vars.cmd = Command::Halt;
                vars.state = GameState::Break;
                vars.stage = Stage::PostGame;
                vars.stage_end = 0.0;
            }
            Stage::FirstHalfPre | Stage::SecondHalfPre | Stage::PostGame => {
                vars.stage_end = 0.0;
            }
        }
        Some(Firing::new(vars, format!("{:?} over, now {:?}", current.stage, vars.stage)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::FieldGeometry;
    use crate::referee::state::AutorefVariables;
    use crate::test_fixtures::{ball_at, context, running_vars, world_at};

    fn check(vars: &AutorefVariables, now: f64) -> Option<AutorefVariables> {
        let field = FieldGeometry::default();
        let world = world_at(now, vec![], ball_at(0.0, 0.0));
        StageTimeEndedRule.evaluate(&world, &context(vars, &field, 1)).map(|f| f.vars)
    }

    #[test]
    fn test_full_match_clock() {
        let mut vars = running_vars();
        vars.stage_end = 600.0;
        assert!(check(&vars, 599.9).is_none());

        let vars = check(&vars, 600.0).unwrap();
        assert_eq!(vars.stage, Stage::HalfTime);
        assert_eq!(vars.state, GameState::Break);
        assert_eq!(vars.stage_end, 900.0);

        let vars = check(&vars, 900.5).unwrap();
        assert_eq!(vars.stage, Stage::SecondHalfPre);
        assert_eq!(vars.next_cmd, Command::PrepareKickoff(Team::Yellow));
        assert_eq!(vars.stage_end, 0.0);
        assert!(check(&vars, 2000.0).is_none());

        let mut second = vars;
        second.stage = Stage::SecondHalf;
        second.stage_end = 1500.0;
        let vars = check(&second, 1500.0).unwrap();
        assert_eq!(vars.stage, Stage::PostGame);
        assert_eq!(vars.stage_end, 0.0);
        assert!(vars.validate().is_ok());
    }

    #[test]
    fn test_stale_clock_is_cleared() {
        let mut vars = running_vars();
        vars.stage = Stage::PostGame;
        vars.stage_end = 10.0;
        let vars = check(&vars, 11.0).unwrap();
        assert_eq!(vars.stage, Stage::PostGame);
        assert_eq!(vars.stage_end, 0.0);
    }
}
