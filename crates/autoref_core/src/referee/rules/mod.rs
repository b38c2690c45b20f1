//! Rule modules, one per file
//!
//! Each module owns its counters and histories privately and proposes
//! whole-state replacements through [`Firing`](super::rule::Firing).

mod ball_exit;
mod ball_speed;
mod ball_stuck;
mod ball_touched;
mod delay_done;
mod extrapolation;
mod goal_scored;
mod init;
mod kick_expired;
mod kick_ready;
mod kick_taken;
mod long_dribble;
mod refbox_update;
mod robot_speed;
mod robots_started;
mod stage_time_ended;
mod stop_distance;
mod too_many_robots;

pub use ball_exit::BallExitRule;
pub use ball_speed::BallSpeedRule;
pub use ball_stuck::BallStuckRule;
pub use ball_touched::BallTouchedRule;
pub use delay_done::DelayDoneRule;
pub use goal_scored::GoalScoredRule;
pub use init::InitRule;
pub use kick_expired::KickExpiredRule;
pub use kick_ready::KickReadyRule;
pub use kick_taken::KickTakenRule;
pub use long_dribble::LongDribbleRule;
pub use refbox_update::RefboxUpdateRule;
pub use robot_speed::RobotSpeedDuringStopRule;
pub use robots_started::RobotsStartedRule;
pub use stage_time_ended::StageTimeEndedRule;
pub use stop_distance::StopDistanceToBallRule;
pub use too_many_robots::TooManyRobotsRule;

use super::rule::{Rule, RuleKind};
use super::state::Stage;
use crate::messages::RefereeRecord;
use crate::world::{Team, World};

/// Fresh rule instance for `kind`
pub fn build(kind: RuleKind) -> Box<dyn Rule> {
    match kind {
        RuleKind::Init => Box::new(InitRule),
        RuleKind::RefboxUpdate => Box::new(RefboxUpdateRule::new()),
        RuleKind::RobotsStarted => Box::new(RobotsStartedRule::new()),
        RuleKind::KickReady => Box::new(KickReadyRule::new()),
        RuleKind::BallSpeed => Box::new(BallSpeedRule::new()),
        RuleKind::BallStuck => Box::new(BallStuckRule::new()),
        RuleKind::GoalScored => Box::new(GoalScoredRule::new()),
        RuleKind::BallExit => Box::new(BallExitRule::new()),
        RuleKind::DelayDone => Box::new(DelayDoneRule::new()),
        RuleKind::KickTaken => Box::new(KickTakenRule),
        RuleKind::KickExpired => Box::new(KickExpiredRule),
        RuleKind::BallTouched => Box::new(BallTouchedRule::new()),
        RuleKind::LongDribble => Box::new(LongDribbleRule::new()),
        RuleKind::StageTimeEnded => Box::new(StageTimeEndedRule),
        RuleKind::TooManyRobots => Box::new(TooManyRobotsRule::new()),
        RuleKind::RobotSpeedDuringStop => Box::new(RobotSpeedDuringStopRule::new()),
        RuleKind::StopDistanceToBall => Box::new(StopDistanceToBallRule::new()),
    }
}

/// Halves in which the ball is live and play can be judged
fn in_running_half(stage: Stage) -> bool {
    matches!(stage, Stage::FirstHalf | Stage::SecondHalf)
}

/// Side Blue plays on when the first half starts: the referee box's
/// assignment if it has one, else wherever Blue lined up (negative x when
/// that is not clear).
fn initial_blue_side(world: &World, refbox: Option<&RefereeRecord>) -> i8 {
    if let Some(positive) = refbox.and_then(|r| r.blue_team_on_positive_half) {
        return if positive { 1 } else { -1 };
    }
    let (sum, n) = world
        .team_robots(Team::Blue)
        .fold((0.0, 0usize), |(sum, n), r| (sum + r.position.x, n + 1));
    if n > 0 && sum / n as f64 > 0.0 {
        1
    } else {
        -1
    }
}
