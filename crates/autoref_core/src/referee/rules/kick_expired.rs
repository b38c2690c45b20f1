use crate::constants::time::KICK_DEADLINE;
use crate::referee::foul::{Foul, FoulKind};
use crate::referee::rule::{Firing, Rule, RuleContext, RuleKind};
use crate::referee::state::{Command, GameState};
use crate::world::World;

/// Forces play on when the kicking team lets the restart deadline pass.
pub struct KickExpiredRule;

impl Rule for KickExpiredRule {
    fn kind(&self) -> RuleKind {
        RuleKind::KickExpired
    }

    fn evaluate(&mut self, world: &World, ctx: &RuleContext<'_>) -> Option<Firing> {
        let current = ctx.vars;
        if current.state != GameState::WaitKick || world.time <= current.kick_deadline {
            return None;
        }

        let mut vars = *current;
        vars.cmd = Command::Stop;
        vars.state = GameState::WaitStop;
        vars.next_cmd = Command::ForceStart;
        vars.designate(current.designated_point);

        let mut foul = Foul::new(FoulKind::KickTimeout, current.kick_deadline - KICK_DEADLINE, world.time)
            .at(current.designated_point);
        if let Some(kicker) = current.kicker {
            foul = foul.by_team(kicker);
        }
        Some(Firing::new(vars, "Kick deadline passed, forcing a restart").with_foul(foul))
    }
}
