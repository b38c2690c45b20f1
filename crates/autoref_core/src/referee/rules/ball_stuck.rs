use crate::constants::rules::{STUCK_CHECK_FRAMES, STUCK_DISTANCE, STUCK_INTERVALS};
use crate::geometry::Vec2;
use crate::referee::foul::{Foul, FoulKind};
use crate::referee::rule::{Firing, FrameGate, Rule, RuleContext, RuleKind};
use crate::referee::state::{Command, GameState};
use crate::world::World;

/// Seconds of play replayed for a no-progress stoppage
const STUCK_REPLAY: f64 = 3.0;

/// Restarts play when the ball has barely moved for a long time.
///
/// The ball is sampled once every [`STUCK_CHECK_FRAMES`] frames; play is
/// stopped after more than [`STUCK_INTERVALS`] consecutive samples with
/// less than [`STUCK_DISTANCE`] of movement.
pub struct BallStuckRule {
    gate: FrameGate,
    frames: u32,
    last_loc: Option<Vec2>,
    stuck: u32,
}

impl BallStuckRule {
    pub fn new() -> Self {
        Self { gate: FrameGate::default(), frames: 0, last_loc: None, stuck: 0 }
    }

    fn clear(&mut self) {
        self.frames = 0;
        self.last_loc = None;
        self.stuck = 0;
    }
}

impl Default for BallStuckRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for BallStuckRule {
    fn kind(&self) -> RuleKind {
        RuleKind::BallStuck
    }

    fn evaluate(&mut self, world: &World, ctx: &RuleContext<'_>) -> Option<Firing> {
        let current = ctx.vars;
        if current.state != GameState::Run {
            self.clear();
            return None;
        }

        if self.gate.first_visit(ctx.frame) {
            self.frames += 1;
            if self.frames >= STUCK_CHECK_FRAMES && world.ball.visible() {
                self.frames = 0;
                let loc = world.ball.position;
                if let Some(last) = self.last_loc.replace(loc) {
                    if (loc - last).norm() < STUCK_DISTANCE {
                        self.stuck += 1;
                    } else {
                        self.stuck = 0;
                    }
                }
            }
        }

        if self.stuck <= STUCK_INTERVALS {
            return None;
        }
        let last = self.last_loc.unwrap_or(world.ball.position);
        self.clear();

        let mut vars = *current;
        vars.cmd = Command::Stop;
        vars.state = GameState::WaitStop;
        vars.next_cmd = Command::ForceStart;
        vars.designate(ctx.field.legal_position(last));

        let foul = Foul::new(FoulKind::NoProgress, world.time - STUCK_REPLAY, world.time)
            .at(vars.designated_point);
        Some(Firing::new(vars, "Ball stuck, forcing a restart").with_foul(foul))
    }
}
