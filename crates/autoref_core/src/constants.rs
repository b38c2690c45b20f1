//! Fixed referee constants
//!
//! Distances are in millimetres, speeds in mm/s and times in seconds, the
//! units the vision system reports in. Field dimensions here are only the
//! defaults; the live values arrive through a geometry record and are held
//! in [`crate::geometry::FieldGeometry`].

/// Frame timing
pub mod time {
    /// Nominal vision frame rate (Hz)
    pub const FRAME_RATE: f64 = 61.51;
    /// Nominal vision frame period (s)
    pub const FRAME_PERIOD: f64 = 1.0 / FRAME_RATE;
    /// Frame rate rounded up, used for frame-count thresholds
    pub const FRAME_RATE_INT: u32 = 62;

    /// Length of each half (s)
    pub const TIME_IN_HALF: f64 = 600.0;
    /// Length of the half-time break (s)
    pub const TIME_IN_HALFTIME: f64 = 300.0;
    /// Time a team has to take a free kick or kickoff (s)
    pub const KICK_DEADLINE: f64 = 10.0;
}

/// Robot identity and body dimensions
pub mod robot {
    /// Robot ids per team are in `0..MAX_ROBOT_IDS`
    pub const MAX_ROBOT_IDS: u32 = 16;
    /// Robot radius (mm)
    pub const MAX_ROBOT_RADIUS: f64 = 90.0;
    /// Distance from robot centre to dribbler face (mm)
    pub const DRIBBLER_OFFSET: f64 = 79.0;
    /// Objects at or below this confidence are treated as not visible
    pub const VISIBILITY_CONFIDENCE: f64 = 0.1;
}

/// Ball dimensions and limits
pub mod ball {
    /// Ball radius (mm)
    pub const BALL_RADIUS: f64 = 21.0;
    /// Maximum legal ball speed after a kick (mm/s)
    pub const MAX_KICK_SPEED: f64 = 6500.0;
}

/// Default field geometry (division B)
pub mod field {
    /// Half of the field length (mm)
    pub const FIELD_LENGTH_H: f64 = 4500.0;
    /// Half of the field width (mm)
    pub const FIELD_WIDTH_H: f64 = 3000.0;
    /// Goal depth behind the goal line (mm)
    pub const GOAL_DEPTH: f64 = 180.0;
    /// Half of the goal mouth width (mm)
    pub const GOAL_WIDTH_H: f64 = 500.0;
    /// Half of the straight stretch of the defense area (mm)
    pub const DEFENSE_STRETCH_H: f64 = 250.0;
    /// Radius of the defense-area quarter circles (mm)
    pub const DEFENSE_RADIUS: f64 = 1000.0;
    /// Clearance kept between a designated restart point and either defense area (mm)
    pub const LEGAL_DEFENSE_CLEARANCE: f64 = 700.0;
}

/// Tracker tuning
pub mod tracker {
    /// Number of camera slots per tracked object
    pub const MAX_CAMERAS: usize = 8;
    /// Samples in the velocity fit window
    pub const VEL_SAMPLES: usize = 5;
    /// Detection frames observed before the camera count is fixed
    pub const CALIBRATION_FRAMES: u32 = 100;
    /// Rounds a camera affinity survives without a fresh observation
    pub const PERSISTENCE_ROUNDS: u32 = 5;
    /// Ball association gate while the ball is being seen (mm)
    pub const BALL_GATE_BASE: f64 = 500.0;
    /// Gate growth per round without a ball observation (mm)
    pub const BALL_GATE_GROWTH: f64 = 110.0;
    /// Rounds without a ball after which any candidate is accepted
    pub const BALL_REACQUIRE_ROUNDS: u32 = 60;
}

/// Rule thresholds
pub mod rules {
    /// Upper bound on restart-from-top passes per frame
    pub const MAX_PASSES: usize = 32;

    /// Frames a ball position may be extrapolated while occluded
    pub const MAX_EXTRAPOLATE_FRAMES: u32 = 5;
    /// Ball history length used for extrapolation
    pub const EXTRAPOLATION_SAMPLES: usize = 5;

    /// Ball speed counts as a violation above `MAX_KICK_SPEED * BALL_SPEED_TOLERANCE`
    pub const BALL_SPEED_TOLERANCE: f64 = 1.02;
    /// Consecutive over-speed samples needed to call a ball-speed foul
    pub const BALL_SPEED_SAMPLES: u32 = 4;

    /// Consecutive out-of-field frames needed to call a ball exit
    pub const BALL_EXIT_FRAMES: u32 = 2;
    /// Offset of a corner kick position from the goal line (mm)
    pub const CORNER_OFFSET: f64 = 100.0;
    /// Offset of a goal kick position from the goal line (mm)
    pub const GOAL_KICK_OFFSET: f64 = 500.0;
    /// Offset of restart positions from the touch line (mm)
    pub const TOUCHLINE_OFFSET: f64 = 100.0;

    /// Robot speed above which a robot counts as "started" (mm/s)
    pub const ROBOTS_STARTED_SPEED: f64 = 30.0;

    /// Robots slower than this count as settled (mm/s)
    pub const SETTLED_ROBOT_SPEED: f64 = 400.0;
    /// Ball slower than this counts as settled (mm/s)
    pub const SETTLED_BALL_SPEED: f64 = 100.0;
    /// Ball within this distance of its target counts as placed (mm)
    pub const PLACEMENT_TOLERANCE: f64 = 500.0;
    /// Robots and ball must stay settled this long before a kick is started (s)
    pub const SETTLE_TIME: f64 = 1.0;
    /// A kick is started after this long regardless of settling (s)
    pub const SETTLE_TIMEOUT: f64 = 15.0;

    /// Ball displacement that counts as a kick (mm)
    pub const KICK_DISTANCE: f64 = 50.0;
    /// Ball speed that counts as a kick (mm/s)
    pub const KICK_SPEED: f64 = 400.0;
    /// Required distance of the kicking team from the opponent defense area (mm)
    pub const KICK_DEFENSE_DISTANCE: f64 = 200.0;

    /// Frames spent in DelayGoal before the restart is queued
    pub const GOAL_DELAY_FRAMES: u32 = 10;

    /// Longest legal dribble (mm)
    pub const MAX_DRIBBLE_DISTANCE: f64 = 1000.0;
    /// Frames off the dribbler before a dribble record is dropped
    pub const DRIBBLE_RELEASE_FRAMES: u32 = 10;

    /// Ball stuck check interval in frames
    pub const STUCK_CHECK_FRAMES: u32 = super::time::FRAME_RATE_INT;
    /// Ball movement below this over one interval counts as stuck (mm)
    pub const STUCK_DISTANCE: f64 = 250.0;
    /// Stuck intervals before play is restarted
    pub const STUCK_INTERVALS: u32 = 12;

    /// Frames a team may field too many robots before a foul
    pub const TOO_MANY_ROBOTS_FRAMES: u32 = 300;

    /// Robot speed limit while the game is stopped (mm/s)
    pub const STOP_ROBOT_SPEED: f64 = 1600.0;
    /// Frames after a stop before the speed limit is enforced
    pub const STOP_GRACE_FRAMES: u32 = 120;
    /// Violation frames allowed before a stop-speed foul (4 s of frames)
    pub const STOP_SPEED_FRAMES: u32 = 4 * super::time::FRAME_RATE_INT;

    /// Required robot distance from the ball while stopped (mm)
    pub const STOP_BALL_DISTANCE: f64 = 450.0;
    /// Violation frames allowed before a stop-distance foul (10 s of frames)
    pub const STOP_DISTANCE_FRAMES: u32 = 10 * super::time::FRAME_RATE_INT;

    /// Consecutive frames an external referee command must disagree before it is adopted
    pub const REFBOX_STABLE_FRAMES: u32 = 120;

    /// Longest replay window attached to a foul (s)
    pub const MAX_REPLAY_WINDOW: f64 = 5.0;
}
