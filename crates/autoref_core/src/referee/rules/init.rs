use crate::geometry::Vec2;
use crate::referee::rule::{Firing, Rule, RuleContext, RuleKind};
use crate::referee::state::{Command, GameState, Stage};
use crate::world::World;

/// Leaves the pre-match state on the first frame: game stopped, ball to
/// the centre, waiting for the robots to move.
pub struct InitRule;

impl Rule for InitRule {
    fn kind(&self) -> RuleKind {
        RuleKind::Init
    }

    fn evaluate(&mut self, _world: &World, ctx: &RuleContext<'_>) -> Option<Firing> {
        if ctx.vars.state != GameState::Init {
            return None;
        }

        let mut vars = *ctx.vars;
        vars.cmd = Command::Stop;
        vars.stage = Stage::FirstHalfPre;
        vars.state = GameState::WaitStart;
        vars.designate(Vec2::zeros());
        Some(Firing::new(vars, "Referee started, waiting for robots"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::FieldGeometry;
    use crate::referee::state::AutorefVariables;
    use crate::test_fixtures::{ball_at, context, world_at};

    #[test]
    fn test_init_only_from_init_state() {
        let field = FieldGeometry::default();
        let world = world_at(0.0, vec![], ball_at(0.0, 0.0));

        let vars = AutorefVariables::new();
        let firing = InitRule.evaluate(&world, &context(&vars, &field, 1)).unwrap();
        assert_eq!(firing.vars.state, GameState::WaitStart);
        assert!(firing.vars.reset);
        assert_eq!(firing.vars.reset_loc, Vec2::zeros());

        assert!(InitRule.evaluate(&world, &context(&firing.vars, &field, 1)).is_none());
    }
}
