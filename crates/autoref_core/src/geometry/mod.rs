//! Geometry and kinematics primitives
//!
//! Pure, stateless helpers shared by the tracker, the touch detector and
//! the rules:
//! - [`vector`]: 2D vector algebra, segment/line helpers and the
//!   least-squares [`linear_fit`]
//! - [`field`]: field boundary and defense-area functions parameterized by
//!   a [`FieldGeometry`]

pub mod field;
pub mod vector;

pub use field::FieldGeometry;
pub use vector::{
    cosine, distance_to_segment, line_intersection, linear_fit, point_on_segment_t, rotate,
    segment_intersects, sign, LinearFit, TimedPoint, Vec2,
};
