//! 2D vector helpers
//!
//! Positions and velocities are `nalgebra::Vector2<f64>` in field
//! coordinates (mm, mm/s).

use serde::{Deserialize, Serialize};

pub type Vec2 = nalgebra::Vector2<f64>;

const EPSILON: f64 = 1e-9;

/// -1, 0 or 1
#[inline]
pub fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Rotate `v` counter-clockwise by `angle` radians.
#[inline]
pub fn rotate(v: Vec2, angle: f64) -> Vec2 {
    let (s, c) = angle.sin_cos();
    Vec2::new(c * v.x - s * v.y, s * v.x + c * v.y)
}

/// Cosine of the angle between two vectors; 0 when either is degenerate.
pub fn cosine(a: Vec2, b: Vec2) -> f64 {
    let n = a.norm() * b.norm();
    if n < EPSILON {
        return 0.0;
    }
    a.dot(&b) / n
}

#[inline]
fn cross(a: Vec2, b: Vec2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Intersection of the infinite lines through `a0,a1` and `b0,b1`.
///
/// Returns `None` for parallel or degenerate lines.
pub fn line_intersection(a0: Vec2, a1: Vec2, b0: Vec2, b1: Vec2) -> Option<Vec2> {
    let da = a1 - a0;
    let db = b1 - b0;
    let denom = cross(da, db);
    if denom.abs() < EPSILON {
        return None;
    }
    let t = cross(b0 - a0, db) / denom;
    Some(a0 + da * t)
}

/// Parameter of the projection of `p` onto the line `a -> b`
/// (0 at `a`, 1 at `b`, unbounded).
pub fn point_on_segment_t(a: Vec2, b: Vec2, p: Vec2) -> f64 {
    let d = b - a;
    let len_sq = d.norm_squared();
    if len_sq < EPSILON {
        return 0.0;
    }
    (p - a).dot(&d) / len_sq
}

/// Distance from `p` to the closed segment `a..b`.
pub fn distance_to_segment(a: Vec2, b: Vec2, p: Vec2) -> f64 {
    let t = point_on_segment_t(a, b, p).clamp(0.0, 1.0);
    (a + (b - a) * t - p).norm()
}

/// Whether the closed segments `a0..a1` and `b0..b1` touch or cross.
pub fn segment_intersects(a0: Vec2, a1: Vec2, b0: Vec2, b1: Vec2) -> bool {
    let d1 = cross(b1 - b0, a0 - b0);
    let d2 = cross(b1 - b0, a1 - b0);
    let d3 = cross(a1 - a0, b0 - a0);
    let d4 = cross(a1 - a0, b1 - a0);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    let on_segment = |p: Vec2, q: Vec2, r: Vec2| {
        r.x >= p.x.min(q.x) && r.x <= p.x.max(q.x) && r.y >= p.y.min(q.y) && r.y <= p.y.max(q.y)
    };

    (d1.abs() < EPSILON && on_segment(b0, b1, a0))
        || (d2.abs() < EPSILON && on_segment(b0, b1, a1))
        || (d3.abs() < EPSILON && on_segment(a0, a1, b0))
        || (d4.abs() < EPSILON && on_segment(a0, a1, b1))
}

/// A time-stamped 2D sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedPoint {
    pub t: f64,
    pub p: Vec2,
}

impl TimedPoint {
    pub fn new(t: f64, p: Vec2) -> Self {
        Self { t, p }
    }

    /// Whether this sample lies close to the straight-line interpolation
    /// between `start` and `end` at its own time.
    pub fn between(&self, start: &TimedPoint, end: &TimedPoint) -> bool {
        let span = end.t - start.t;
        if span.abs() < EPSILON {
            return false;
        }
        let c = (self.t - start.t) / span;
        let expected = start.p * (1.0 - c) + end.p * c;
        (self.p - expected).norm() < 0.1 * (start.p - end.p).norm()
    }
}

/// Result of [`linear_fit`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    /// Time of the first sample; `position` is the fitted value there
    pub t0: f64,
    pub position: Vec2,
    pub velocity: Vec2,
}

impl LinearFit {
    /// Fitted position at absolute time `t`.
    pub fn at(&self, t: f64) -> Vec2 {
        self.position + self.velocity * (t - self.t0)
    }
}

/// Ordinary least-squares fit of `p = position + velocity * (t - t0)`.
///
/// `t0` is the time of the first sample. Returns `None` with fewer than two
/// samples or when all samples share one timestamp.
pub fn linear_fit(samples: &[TimedPoint]) -> Option<LinearFit> {
    if samples.len() < 2 {
        return None;
    }

    let n = samples.len() as f64;
    let t0 = samples[0].t;
    let (mut st, mut stt) = (0.0, 0.0);
    let mut sp = Vec2::zeros();
    let mut stp = Vec2::zeros();
    for s in samples {
        let t = s.t - t0;
        st += t;
        stt += t * t;
        sp += s.p;
        stp += s.p * t;
    }

    let denom = n * stt - st * st;
    if denom.abs() < EPSILON {
        return None;
    }

    let velocity = (stp * n - sp * st) / denom;
    let position = (sp - velocity * st) / n;
    Some(LinearFit { t0, position, velocity })
}
