//! Multi-camera sensor fusion
//!
//! Every camera overwrites its own observation slot per object. Once each
//! expected camera has reported, one [`World`] is synthesized from the
//! per-object camera "affinity" and the slots are cleared for the next
//! round. The camera set is learned during a short calibration window
//! whose frames are discarded; cameras that appear later still contribute
//! observations but never complete a round.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::constants::robot::MAX_ROBOT_IDS;
use crate::constants::time::FRAME_PERIOD;
use crate::constants::tracker::{
    BALL_GATE_BASE, BALL_GATE_GROWTH, BALL_REACQUIRE_ROUNDS, CALIBRATION_FRAMES, MAX_CAMERAS,
    PERSISTENCE_ROUNDS, VEL_SAMPLES,
};
use crate::error::{AutorefError, Result};
use crate::geometry::{linear_fit, TimedPoint, Vec2};
use crate::history::History;
use crate::messages::{BallDetection, DetectionFrame};
use crate::world::{RobotId, World, WorldBall, WorldRobot};

/// Tracker tuning, part of [`crate::config::AutorefConfig`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub calibration_frames: u32,
    pub persistence_rounds: u32,
    /// Force a round to complete when it has been open this long (s).
    /// `None` waits for every expected camera indefinitely.
    pub stall_timeout: Option<f64>,
    pub ball_gate_base: f64,
    pub ball_gate_growth: f64,
    pub ball_reacquire_rounds: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            calibration_frames: CALIBRATION_FRAMES,
            persistence_rounds: PERSISTENCE_ROUNDS,
            stall_timeout: None,
            ball_gate_base: BALL_GATE_BASE,
            ball_gate_growth: BALL_GATE_GROWTH,
            ball_reacquire_rounds: BALL_REACQUIRE_ROUNDS,
        }
    }
}

// =============================================================================
// Per-object state
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
struct Observation {
    valid: bool,
    /// Rounds since this slot last held a valid observation
    age: u32,
    time: f64,
    confidence: f64,
    position: Vec2,
    heading: f64,
}

/// The observation chosen for one object this round
#[derive(Debug, Clone, Copy)]
struct Selected {
    obs: Observation,
    fresh: bool,
}

#[derive(Debug, Clone)]
struct Track {
    slots: [Observation; MAX_CAMERAS],
    affinity: Option<usize>,
    samples: History<TimedPoint>,
}

impl Track {
    fn new() -> Self {
        Self {
            slots: [Observation::default(); MAX_CAMERAS],
            affinity: None,
            samples: History::new(VEL_SAMPLES),
        }
    }

    fn observe(&mut self, camera: usize, obs: Observation) {
        let slot = &mut self.slots[camera];
        // Duplicate detections within one camera frame: keep the most confident
        if slot.valid && slot.time == obs.time && slot.confidence >= obs.confidence {
            return;
        }
        *slot = obs;
    }

    /// Pick this round's source camera and feed fresh data to the velocity fit.
    fn select(&mut self, persistence: u32) -> Option<Selected> {
        if let Some(camera) = self.slots.iter().position(|s| s.valid) {
            self.affinity = Some(camera);
            let obs = self.slots[camera];
            self.samples.push(TimedPoint::new(obs.time, obs.position));
            return Some(Selected { obs, fresh: true });
        }

        match self.affinity {
            Some(camera) if self.slots[camera].age < persistence => {
                Some(Selected { obs: self.slots[camera], fresh: false })
            }
            _ => {
                self.affinity = None;
                None
            }
        }
    }

    fn end_round(&mut self) {
        for slot in &mut self.slots {
            if slot.valid {
                slot.age = 0;
            } else {
                slot.age = slot.age.saturating_add(1);
            }
            slot.valid = false;
        }
    }

    fn velocity(&self) -> Vec2 {
        fit_velocity(&self.samples)
    }
}

/// OLS velocity over a full sample window; zero when the window is not
/// full or too sparse to trust.
fn fit_velocity(samples: &History<TimedPoint>) -> Vec2 {
    if samples.len() < VEL_SAMPLES {
        return Vec2::zeros();
    }
    let (Some(newest), Some(oldest)) = (samples.newest(), samples.oldest()) else {
        return Vec2::zeros();
    };
    if newest.t - oldest.t > 2.0 * VEL_SAMPLES as f64 * FRAME_PERIOD {
        return Vec2::zeros();
    }
    linear_fit(&samples.chronological()).map(|fit| fit.velocity).unwrap_or_else(Vec2::zeros)
}

// =============================================================================
// Tracker
// =============================================================================

#[derive(Debug, Clone)]
enum Phase {
    Calibrating { frames: u32, cameras: BTreeSet<u32> },
    /// `None` without calibration: any single camera completes a round
    Running { cameras: Option<BTreeSet<u32>> },
}

#[derive(Debug, Clone)]
pub struct Tracker {
    config: TrackerConfig,
    phase: Phase,
    robots: BTreeMap<RobotId, Track>,
    ball: Track,
    reported: [bool; MAX_CAMERAS],
    round_time: f64,
    round_opened: Option<f64>,
    last_ball: Option<Vec2>,
    ball_unseen: u32,
    rounds: u64,
}

impl Tracker {
    pub fn new(config: TrackerConfig) -> Self {
        let phase = if config.calibration_frames == 0 {
            Phase::Running { cameras: None }
        } else {
            Phase::Calibrating { frames: 0, cameras: BTreeSet::new() }
        };
        Self {
            config,
            phase,
            robots: BTreeMap::new(),
            ball: Track::new(),
            reported: [false; MAX_CAMERAS],
            round_time: f64::NEG_INFINITY,
            round_opened: None,
            last_ball: None,
            ball_unseen: 0,
            rounds: 0,
        }
    }

    /// Number of cameras a round waits for; `None` while calibrating.
    pub fn expected_cameras(&self) -> Option<usize> {
        match &self.phase {
            Phase::Running { cameras: Some(cameras) } => Some(cameras.len()),
            Phase::Running { cameras: None } => Some(1),
            Phase::Calibrating { .. } => None,
        }
    }

    /// Expected cameras that have reported this round, and how many are expected
    fn round_progress(&self) -> (usize, usize) {
        match &self.phase {
            Phase::Running { cameras: Some(cameras) } => {
                let reported = cameras.iter().filter(|c| self.reported[**c as usize]).count();
                (reported, cameras.len())
            }
            _ => (self.reported.iter().filter(|r| **r).count().min(1), 1),
        }
    }

    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Ingest one camera frame. Returns a world when it completes a round
    /// (or when a stalled round is flushed).
    pub fn update(&mut self, frame: &DetectionFrame) -> Result<Option<World>> {
        let camera = frame.camera as usize;
        if camera >= MAX_CAMERAS {
            warn!(camera = frame.camera, "Rejecting detection frame from unsupported camera");
            return Err(AutorefError::InvalidCamera { camera: frame.camera, max: MAX_CAMERAS });
        }

        if let Phase::Calibrating { frames, cameras } = &mut self.phase {
            *frames += 1;
            cameras.insert(frame.camera);
            if *frames >= self.config.calibration_frames {
                let cameras = std::mem::take(cameras);
                info!(cameras = ?cameras, "Camera calibration complete");
                self.phase = Phase::Running { cameras: Some(cameras) };
            }
            return Ok(None);
        }

        let flushed = self.flush_if_stalled(frame.t_capture);

        if let Phase::Running { cameras: Some(cameras) } = &self.phase {
            if !cameras.contains(&frame.camera) {
                debug!(camera = frame.camera, "Frame from a camera not seen during calibration");
            }
        }
        self.ingest(camera, frame);

        let (reported, expected) = self.round_progress();
        if reported >= expected {
            return Ok(Some(self.finish_round()));
        }
        Ok(flushed)
    }

    fn flush_if_stalled(&mut self, now: f64) -> Option<World> {
        let timeout = self.config.stall_timeout?;
        let opened = self.round_opened?;
        if now - opened <= timeout {
            return None;
        }
        let (reported, expected) = self.round_progress();
        let missing = expected.saturating_sub(reported);
        warn!(missing, waited = now - opened, "Flushing stalled tracker round");
        Some(self.finish_round())
    }

    fn ingest(&mut self, camera: usize, frame: &DetectionFrame) {
        self.reported[camera] = true;
        self.round_time = self.round_time.max(frame.t_capture);
        if self.round_opened.is_none() {
            self.round_opened = Some(frame.t_capture);
        }

        for det in &frame.robots {
            if det.id >= MAX_ROBOT_IDS {
                warn!(team = %det.team, id = det.id, "Dropping robot with out-of-range id");
                continue;
            }
            let obs = Observation {
                valid: true,
                age: 0,
                time: frame.t_capture,
                confidence: det.confidence,
                position: det.position,
                heading: det.heading,
            };
            self.robots.entry(RobotId::new(det.team, det.id)).or_insert_with(Track::new).observe(camera, obs);
        }

        if let Some(ball) = self.ball_candidate(&frame.balls) {
            let obs = Observation {
                valid: true,
                age: 0,
                time: frame.t_capture,
                confidence: ball.confidence,
                position: ball.position,
                heading: 0.0,
            };
            self.ball.observe(camera, obs);
        }
    }

    /// Nearest candidate to the last ball inside a gate that widens while
    /// the ball goes unseen; ungated when there is nothing to compare with.
    fn ball_candidate<'a>(&self, balls: &'a [BallDetection]) -> Option<&'a BallDetection> {
        let gated = self.ball_unseen <= self.config.ball_reacquire_rounds;
        match self.last_ball {
            Some(last) => {
                let gate = self.config.ball_gate_base + self.config.ball_gate_growth * f64::from(self.ball_unseen);
                let mut best: Option<(&BallDetection, f64)> = None;
                for ball in balls {
                    let d = (ball.position - last).norm();
                    if gated && d > gate {
                        continue;
                    }
                    if best.map_or(true, |(_, min)| d < min) {
                        best = Some((ball, d));
                    }
                }
                best.map(|(ball, _)| ball)
            }
            None => balls.iter().fold(None, |best: Option<&BallDetection>, ball| match best {
                Some(b) if b.confidence >= ball.confidence => Some(b),
                _ => Some(ball),
            }),
        }
    }

    fn finish_round(&mut self) -> World {
        let persistence = self.config.persistence_rounds;
        let time = self.round_time;

        let mut robots = Vec::with_capacity(self.robots.len());
        for (id, track) in &mut self.robots {
            if let Some(sel) = track.select(persistence) {
                robots.push(WorldRobot {
                    id: *id,
                    confidence: sel.obs.confidence,
                    position: sel.obs.position,
                    heading: sel.obs.heading,
                    velocity: track.velocity(),
                });
            }
            track.end_round();
        }

        let ball = match self.ball.select(persistence) {
            Some(sel) => {
                if sel.fresh {
                    self.last_ball = Some(sel.obs.position);
                    self.ball_unseen = 0;
                } else {
                    self.ball_unseen += 1;
                }
                WorldBall {
                    confidence: sel.obs.confidence,
                    position: sel.obs.position,
                    velocity: self.ball.velocity(),
                }
            }
            None => {
                self.ball_unseen += 1;
                WorldBall::hidden()
            }
        };
        self.ball.end_round();

        self.reported = [false; MAX_CAMERAS];
        self.round_time = f64::NEG_INFINITY;
        self.round_opened = None;
        self.rounds += 1;

        let world = World::new(time, robots, ball);
        debug!(
            round = self.rounds,
            time = world.time,
            robots = world.robots.len(),
            ball = world.ball.visible(),
            "Tracker round complete"
        );
        world
    }
}
