//! Ball contact detection
//!
//! Both detectors watch the ball's position relative to each visible robot.
//! Histories are updated every frame; detection runs [`BackTrackDetector`]
//! first and only falls back to [`SegmentDetector`] when it finds nothing.

pub mod backtrack;
pub mod segment;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use backtrack::BackTrackDetector;
pub use segment::SegmentDetector;

use crate::geometry::TimedPoint;
use crate::history::History;
use crate::world::{RobotId, World};
use std::collections::BTreeMap;

/// Frames that must pass after a report before a detector reports again
pub const TOUCH_DEBOUNCE_FRAMES: u32 = 3;

/// A detected contact between a robot and the ball
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Touch {
    pub robot: RobotId,
    pub time: f64,
}

/// Ball-minus-robot position histories, one per robot
#[derive(Debug, Clone)]
pub(crate) struct RelativeHistories {
    capacity: usize,
    by_robot: BTreeMap<RobotId, History<TimedPoint>>,
}

impl RelativeHistories {
    pub(crate) fn new(capacity: usize) -> Self {
        Self { capacity, by_robot: BTreeMap::new() }
    }

    /// Record the relative ball position for every visible robot; frames
    /// without a visible ball add nothing.
    pub(crate) fn record(&mut self, world: &World) {
        if !world.ball.visible() {
            return;
        }
        for robot in &world.robots {
            let rel = world.ball.position - robot.position;
            self.by_robot
                .entry(robot.id)
                .or_insert_with(|| History::new(self.capacity))
                .push(TimedPoint::new(world.time, rel));
        }
    }

    pub(crate) fn get(&self, robot: RobotId) -> Option<&History<TimedPoint>> {
        self.by_robot.get(&robot)
    }
}

/// Frame counter that lets a detector report at most once per
/// [`TOUCH_DEBOUNCE_FRAMES`] + 1 frames.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Debounce {
    since_report: u32,
}

impl Debounce {
    pub(crate) fn new() -> Self {
        Self { since_report: 0 }
    }

    pub(crate) fn tick(&mut self) {
        self.since_report = self.since_report.saturating_add(1);
    }

    /// Whether a detection may be reported now; resets the counter if so.
    pub(crate) fn allow(&mut self) -> bool {
        if self.since_report > TOUCH_DEBOUNCE_FRAMES {
            self.since_report = 0;
            return true;
        }
        false
    }
}

#[derive(Debug, Clone)]
pub struct TouchDetector {
    backtrack: BackTrackDetector,
    segment: SegmentDetector,
}

impl Default for TouchDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl TouchDetector {
    pub fn new() -> Self {
        Self { backtrack: BackTrackDetector::new(), segment: SegmentDetector::new() }
    }

    /// Feed one world; returns the contact reported this frame, if any.
    pub fn process(&mut self, world: &World) -> Option<Touch> {
        self.backtrack.record(world);
        self.segment.record(world);

        let touch = self.backtrack.detect(world).or_else(|| self.segment.detect(world));
        if let Some(t) = &touch {
            debug!(robot = %t.robot, time = t.time, "Touch detected");
        }
        touch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::time::FRAME_PERIOD;
    use crate::geometry::Vec2;
    use crate::test_fixtures::{ball_at, robot_at, world_at};
    use crate::world::Team;

    #[test]
    fn test_resting_ball_reported_once_per_debounce_window() {
        let mut detector = TouchDetector::new();
        let mut frames_reported = Vec::new();
        for frame in 1..=20 {
            let t = frame as f64 * FRAME_PERIOD;
            let world = world_at(t, vec![robot_at(Team::Blue, 0, 0.0, 0.0)], ball_at(95.0, 0.0));
            if let Some(touch) = detector.process(&world) {
                assert_eq!(touch.robot, RobotId::new(Team::Blue, 0));
                frames_reported.push(frame);
            }
        }
        assert_eq!(frames_reported, vec![8, 12, 16, 20]);
    }

    #[test]
    fn test_no_touch_for_distant_ball() {
        let mut detector = TouchDetector::new();
        for frame in 1..=30 {
            let t = frame as f64 * FRAME_PERIOD;
            let x = 1000.0 + frame as f64 * 30.0;
            let world = world_at(t, vec![robot_at(Team::Yellow, 1, 0.0, 0.0)], ball_at(x, 0.0));
            assert!(detector.process(&world).is_none());
        }
    }

    #[test]
    fn test_segment_detector_used_when_backtrack_silent() {
        // Six samples: not enough history for the back-track window
        let path = [
            Vec2::new(240.0, 0.0),
            Vec2::new(180.0, 0.0),
            Vec2::new(126.0, 0.0),
            Vec2::new(120.0, 8.0),
            Vec2::new(120.0, 68.0),
            Vec2::new(120.0, 128.0),
        ];
        let mut detector = TouchDetector::new();
        let mut touch = None;
        for (i, p) in path.iter().enumerate() {
            let t = 1.0 + i as f64 * FRAME_PERIOD;
            touch = detector.process(&world_at(t, vec![robot_at(Team::Blue, 2, 0.0, 0.0)], ball_at(p.x, p.y)));
        }
        let touch = touch.expect("deflection detected");
        assert_eq!(touch.robot, RobotId::new(Team::Blue, 2));
    }
}
