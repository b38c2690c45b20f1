//! Short-horizon ball extrapolation for the goal and ball-exit rules

use crate::constants::rules::{EXTRAPOLATION_SAMPLES, MAX_EXTRAPOLATE_FRAMES};
use crate::constants::time::FRAME_PERIOD;
use crate::geometry::{linear_fit, TimedPoint, Vec2};
use crate::history::History;
use crate::world::World;

/// Where the ball is judged to be this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum BallEstimate {
    Seen(Vec2),
    /// Projected from `last_seen` while the ball is occluded
    Extrapolated { position: Vec2, last_seen: Vec2 },
}

impl BallEstimate {
    pub(super) fn position(&self) -> Vec2 {
        match *self {
            BallEstimate::Seen(p) => p,
            BallEstimate::Extrapolated { position, .. } => position,
        }
    }
}

#[derive(Debug, Clone)]
pub(super) struct BallExtrapolator {
    history: History<TimedPoint>,
    lost: u32,
}

impl BallExtrapolator {
    pub(super) fn new() -> Self {
        Self { history: History::new(EXTRAPOLATION_SAMPLES), lost: 0 }
    }

    /// Advance by one frame. Call once per world.
    pub(super) fn update(&mut self, world: &World) -> Option<BallEstimate> {
        if world.ball.visible() {
            self.lost = 0;
            self.history.push(TimedPoint::new(world.time, world.ball.position));
            return Some(BallEstimate::Seen(world.ball.position));
        }

        self.lost = self.lost.saturating_add(1);
        let newest = *self.history.newest()?;
        let fit = linear_fit(&self.history.chronological())?;
        let frames = self.lost.min(MAX_EXTRAPOLATE_FRAMES);
        let position = fit.at(newest.t + f64::from(frames) * FRAME_PERIOD);
        Some(BallEstimate::Extrapolated { position, last_seen: newest.p })
    }

    pub(super) fn clear(&mut self) {
        self.history.clear();
        self.lost = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{ball_at, frame_time, hidden_ball, world_at};

    #[test]
    fn test_extrapolation_is_capped() {
        let mut ex = BallExtrapolator::new();
        for i in 0..5 {
            let est = ex.update(&world_at(frame_time(i), vec![], ball_at(100.0 * i as f64, 0.0)));
            assert_eq!(est, Some(BallEstimate::Seen(Vec2::new(100.0 * i as f64, 0.0))));
        }
        let mut last = Vec2::zeros();
        for i in 5..15 {
            let est = ex.update(&world_at(frame_time(i), vec![], hidden_ball())).unwrap();
            last = est.position();
            if let BallEstimate::Extrapolated { last_seen, .. } = est {
                assert_eq!(last_seen, Vec2::new(400.0, 0.0));
            } else {
                panic!("expected extrapolation");
            }
        }
        // Never projected beyond five frames past the last sighting
        assert!((last - Vec2::new(900.0, 0.0)).norm() < 1e-6);
    }

    #[test]
    fn test_no_estimate_without_history() {
        let mut ex = BallExtrapolator::new();
        assert!(ex.update(&world_at(0.0, vec![], hidden_ball())).is_none());
        ex.update(&world_at(0.1, vec![], ball_at(0.0, 0.0)));
        // One sample cannot be fitted
        assert!(ex.update(&world_at(0.2, vec![], hidden_ball())).is_none());
    }
}
