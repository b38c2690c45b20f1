//! Backward-extrapolation touch detector
//!
//! Fits the newest relative samples and runs the fit back one or two frames
//! before the window. If that lands inside the robot body the ball must
//! have left the robot just then.

use super::{Debounce, RelativeHistories, Touch};
use crate::constants::ball::BALL_RADIUS;
use crate::constants::robot::MAX_ROBOT_RADIUS;
use crate::constants::time::FRAME_PERIOD;
use crate::geometry::{distance_to_segment, linear_fit, Vec2};
use crate::world::World;

/// Samples in the backward fit
const FIT_SAMPLES: usize = 4;
/// Older samples checked for a pass through the robot
const COMPARE_SAMPLES: usize = 4;
const HISTORY_LEN: usize = FIT_SAMPLES + COMPARE_SAMPLES;

#[derive(Debug, Clone)]
pub struct BackTrackDetector {
    histories: RelativeHistories,
    debounce: Debounce,
}

impl Default for BackTrackDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl BackTrackDetector {
    pub fn new() -> Self {
        Self { histories: RelativeHistories::new(HISTORY_LEN), debounce: Debounce::new() }
    }

    pub fn record(&mut self, world: &World) {
        self.debounce.tick();
        self.histories.record(world);
    }

    pub fn detect(&mut self, world: &World) -> Option<Touch> {
        if !world.ball.visible() {
            return None;
        }

        let mut found = None;
        for robot in &world.robots {
            let Some(hist) = self.histories.get(robot.id) else {
                continue;
            };
            if !hist.is_full() {
                continue;
            }
            let samples = hist.chronological();
            let oldest = samples[0];
            if world.time - oldest.t > 3.0 * HISTORY_LEN as f64 * FRAME_PERIOD {
                continue;
            }

            // Ball already went past the body: chipped over, not touched
            let through = samples[..=COMPARE_SAMPLES].windows(2).any(|w| {
                distance_to_segment(w[0].p, w[1].p, Vec2::zeros()) < MAX_ROBOT_RADIUS - BALL_RADIUS
            });
            if through {
                continue;
            }

            let Some(fit) = linear_fit(&samples[COMPARE_SAMPLES..]) else {
                continue;
            };
            for back in [1.0, 2.0] {
                let t = fit.t0 - back * FRAME_PERIOD;
                if fit.at(t).norm() < MAX_ROBOT_RADIUS + BALL_RADIUS - 10.0 {
                    found = Some(Touch { robot: robot.id, time: t });
                    break;
                }
            }
        }

        match found {
            Some(touch) if self.debounce.allow() => Some(touch),
            _ => None,
        }
    }
}
