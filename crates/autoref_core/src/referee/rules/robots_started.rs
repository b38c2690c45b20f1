use crate::constants::rules::ROBOTS_STARTED_SPEED;
use crate::constants::time::FRAME_RATE_INT;
use crate::geometry::Vec2;
use crate::referee::rule::{Firing, FrameGate, Rule, RuleContext, RuleKind};
use crate::referee::state::{Command, GameState};
use crate::world::{Team, World};

/// Frames both teams must keep a robot moving before the match is set up
const STARTED_FRAMES: u32 = FRAME_RATE_INT / 2;

/// Begins the match once both teams have shown signs of life.
pub struct RobotsStartedRule {
    gate: FrameGate,
    moving: u32,
}

impl RobotsStartedRule {
    pub fn new() -> Self {
        Self { gate: FrameGate::default(), moving: 0 }
    }
}

impl Default for RobotsStartedRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for RobotsStartedRule {
    fn kind(&self) -> RuleKind {
        RuleKind::RobotsStarted
    }

    fn evaluate(&mut self, world: &World, ctx: &RuleContext<'_>) -> Option<Firing> {
        if ctx.vars.state != GameState::WaitStart {
            return None;
        }

        if self.gate.first_visit(ctx.frame) {
            let both_moving = Team::ALL
                .iter()
                .all(|team| world.team_robots(*team).any(|r| r.speed() > ROBOTS_STARTED_SPEED));
            self.moving = if both_moving { self.moving + 1 } else { 0 };
        }

        if self.moving <= STARTED_FRAMES {
            return None;
        }

        self.moving = 0;
        let mut vars = *ctx.vars;
        vars.next_cmd = Command::PrepareKickoff(Team::Blue);
        vars.state = GameState::WaitStop;
        vars.designate(Vec2::zeros());
        Some(Firing::new(vars, "Robots are moving, preparing kickoff"))
    }
}
