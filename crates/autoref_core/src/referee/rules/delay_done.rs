use crate::constants::rules::GOAL_DELAY_FRAMES;
use crate::geometry::Vec2;
use crate::referee::rule::{Firing, FrameGate, Rule, RuleContext, RuleKind};
use crate::referee::state::{Command, GameState};
use crate::world::{Team, World};

/// Ends the short pause after a goal and queues the kickoff for the
/// conceding team.
pub struct DelayDoneRule {
    gate: FrameGate,
    frames: u32,
}

impl DelayDoneRule {
    pub fn new() -> Self {
        Self { gate: FrameGate::default(), frames: 0 }
    }
}

impl Default for DelayDoneRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for DelayDoneRule {
    fn kind(&self) -> RuleKind {
        RuleKind::DelayDone
    }

    fn evaluate(&mut self, _world: &World, ctx: &RuleContext<'_>) -> Option<Firing> {
        let current = ctx.vars;
        if current.state != GameState::DelayGoal {
            self.frames = 0;
            return None;
        }
        if self.gate.first_visit(ctx.frame) {
            self.frames += 1;
        }
        if self.frames <= GOAL_DELAY_FRAMES {
            return None;
        }

        // The kicker was set to the conceding team when the goal was scored
        let kicker = current.kicker.unwrap_or(Team::Blue);
        let mut vars = *current;
        vars.state = GameState::WaitStop;
        vars.cmd = Command::Goal(kicker.opponent());
        vars.next_cmd = Command::PrepareKickoff(kicker);
        vars.designate(Vec2::zeros());
        Some(Firing::new(vars, format!("Kickoff for {}", kicker)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::FieldGeometry;
    use crate::test_fixtures::{ball_at, context, frame_time, running_vars, world_at};

    #[test]
    fn test_kickoff_after_delay() {
        let field = FieldGeometry::default();
        let mut vars = running_vars();
        vars.state = GameState::DelayGoal;
        vars.kicker = Some(Team::Yellow);
        let mut rule = DelayDoneRule::new();

        let fired_at = (0..50u32).find_map(|i| {
            let world = world_at(frame_time(i), vec![], ball_at(4600.0, 0.0));
            rule.evaluate(&world, &context(&vars, &field, u64::from(i) + 1)).map(|f| (i, f))
        });
        let (frame, firing) = fired_at.unwrap();
        assert_eq!(frame, GOAL_DELAY_FRAMES);
        assert_eq!(firing.vars.state, GameState::WaitStop);
        assert_eq!(firing.vars.cmd, Command::Goal(Team::Blue));
        assert_eq!(firing.vars.next_cmd, Command::PrepareKickoff(Team::Yellow));
        assert_eq!(firing.vars.reset_loc, Vec2::zeros());
    }
}
