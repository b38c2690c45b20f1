//! Segment-intersection touch detector
//!
//! Looks for a bend in the ball's relative path: two locally straight
//! three-sample segments that are not collinear and meet near the robot.

use super::{Debounce, RelativeHistories, Touch};
use crate::constants::ball::BALL_RADIUS;
use crate::constants::robot::MAX_ROBOT_RADIUS;
use crate::constants::time::FRAME_PERIOD;
use crate::geometry::{cosine, line_intersection, point_on_segment_t};
use crate::world::World;

const HISTORY_LEN: usize = 6;
/// Longest time span of a usable history, in frame periods
const MAX_SPAN_FRAMES: f64 = 15.0;
/// Both segments must end at the intersection to at least this parameter
const MIN_END_PARAMETER: f64 = 0.9;
const CONTACT_SLACK: f64 = 30.0;

#[derive(Debug, Clone)]
pub struct SegmentDetector {
    histories: RelativeHistories,
    debounce: Debounce,
}

impl Default for SegmentDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentDetector {
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
            let s = hist.chronological();
            if world.time - s[0].t > MAX_SPAN_FRAMES * FRAME_PERIOD {
                continue;
            }

            if !s[1].between(&s[0], &s[2]) || !s[4].between(&s[5], &s[3]) {
                continue;
            }
            if cosine(s[0].p - s[2].p, s[5].p - s[3].p) < -0.99 {
                continue;
            }

            let Some(inter) = line_intersection(s[0].p, s[2].p, s[3].p, s[5].p) else {
                continue;
            };
            let t_in = point_on_segment_t(s[0].p, s[2].p, inter);
            let t_out = point_on_segment_t(s[5].p, s[3].p, inter);
            if t_in < MIN_END_PARAMETER || t_out < MIN_END_PARAMETER {
                continue;
            }

            let d = inter.norm();
            if d < MAX_ROBOT_RADIUS + BALL_RADIUS + CONTACT_SLACK && d < s[0].p.norm() && d < s[5].p.norm() {
                found = Some(Touch { robot: robot.id, time: world.time - 2.0 * FRAME_PERIOD });
            }
        }

        match found {
            Some(touch) if self.debounce.allow() => Some(touch),
            _ => None,
        }
    }
}
