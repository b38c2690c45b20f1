use crate::constants::rules::TOO_MANY_ROBOTS_FRAMES;
use crate::constants::time::FRAME_PERIOD;
use crate::referee::foul::{Foul, FoulKind};
use crate::referee::rule::{Firing, FrameGate, Rule, RuleContext, RuleKind};
use crate::referee::state::{Command, GameState};
use crate::world::{Team, World};

/// Stops the game when a team keeps more robots on the field than it may.
///
/// The allowance is the division's team size minus any robots sent off
/// with a card, which is only known with a referee box.
pub struct TooManyRobotsRule {
    gate: FrameGate,
    over: [u32; 2],
    pending: Option<Team>,
}

impl TooManyRobotsRule {
    pub fn new() -> Self {
        Self { gate: FrameGate::default(), over: [0; 2], pending: None }
    }
}

impl Default for TooManyRobotsRule {
    fn default() -> Self {
        Self::new()
    }
}

fn allowed(team: Team, ctx: &RuleContext<'_>) -> usize {
    let carded = ctx.refbox.map_or(0, |r| {
        let record = r.team(team);
        record.yellow_cards + record.red_cards
    });
    ctx.max_team_robots.saturating_sub(carded as usize)
}

impl Rule for TooManyRobotsRule {
    fn kind(&self) -> RuleKind {
        RuleKind::TooManyRobots
    }

    fn evaluate(&mut self, world: &World, ctx: &RuleContext<'_>) -> Option<Firing> {
        let current = ctx.vars;
        if !matches!(current.state, GameState::Run | GameState::WaitStop) {
            self.over = [0; 2];
            self.pending = None;
            return None;
        }

        if self.gate.first_visit(ctx.frame) {
            for team in Team::ALL {
                let count = &mut self.over[team.index()];
                *count = if world.team_count(team) > allowed(team, ctx) { *count + 1 } else { 0 };
            }
            // One team per frame; a second offender is reported on the next one
            self.pending = Team::ALL.into_iter().find(|t| self.over[t.index()] > TOO_MANY_ROBOTS_FRAMES);
            if let Some(team) = self.pending {
                self.over[team.index()] = 0;
            }
        }
        let team = self.pending.take()?;

        let mut vars = *current;
        vars.cmd = Command::Stop;
        vars.state = GameState::WaitStop;
        vars.next_cmd = Command::ForceStart;

        let since = world.time - f64::from(TOO_MANY_ROBOTS_FRAMES) * FRAME_PERIOD;
        let foul = Foul::new(FoulKind::NumberOfPlayers, since, world.time).by_team(team);
        let description = format!("{} has {} robots on the field", team, world.team_count(team));
        Some(Firing::new(vars, description).with_foul(foul))
    }
}
