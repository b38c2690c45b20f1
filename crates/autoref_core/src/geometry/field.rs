//! Field boundary and defense-area geometry
//!
//! Coordinates are centred on the field: x runs goal to goal, y touchline
//! to touchline. "Own side" is the negative-x half; callers translate a
//! team's half into that flag through the referee state's side indicator.

use serde::{Deserialize, Serialize};

use super::vector::{sign, Vec2};
use crate::constants::field;
use crate::messages::GeometryRecord;

/// Live field dimensions, replaced whenever a geometry record arrives
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldGeometry {
    pub field_length_h: f64,
    pub field_width_h: f64,
    pub goal_depth: f64,
    pub goal_width_h: f64,
    pub defense_radius: f64,
    pub defense_stretch_h: f64,
}

impl Default for FieldGeometry {
    fn default() -> Self {
        Self {
            field_length_h: field::FIELD_LENGTH_H,
            field_width_h: field::FIELD_WIDTH_H,
            goal_depth: field::GOAL_DEPTH,
            goal_width_h: field::GOAL_WIDTH_H,
            defense_radius: field::DEFENSE_RADIUS,
            defense_stretch_h: field::DEFENSE_STRETCH_H,
        }
    }
}

impl From<&GeometryRecord> for FieldGeometry {
    fn from(g: &GeometryRecord) -> Self {
        let defaults = FieldGeometry::default();
        Self {
            field_length_h: g.field_length / 2.0,
            field_width_h: g.field_width / 2.0,
            goal_depth: g.goal_depth,
            goal_width_h: g.goal_width / 2.0,
            defense_radius: g.defense_radius.unwrap_or(defaults.defense_radius),
            defense_stretch_h: g
                .defense_stretch
                .map(|s| s / 2.0)
                .unwrap_or(defaults.defense_stretch_h),
        }
    }
}

impl FieldGeometry {
    /// Signed distance from `loc` to a defense area; negative inside.
    ///
    /// `own_side` selects the area on the negative-x half. Points behind
    /// that goal line measure to the goal line or to the area's outer corner.
    pub fn distance_to_defense_area(&self, loc: Vec2, own_side: bool) -> f64 {
        let lh = self.field_length_h;
        let reach = self.defense_stretch_h + self.defense_radius;

        let behind = if own_side { loc.x < -lh } else { loc.x > lh };
        if behind {
            let x = loc.x.abs();
            let y = loc.y.abs();
            if y < reach {
                return x - lh;
            }
            return (x - lh).hypot(y - reach);
        }

        let goal_x = if own_side { -lh } else { lh };
        let dx = (goal_x - loc.x).abs();
        let dy = loc.y.abs() - self.defense_stretch_h;
        if dy > 0.0 {
            return dx.hypot(dy) - self.defense_radius;
        }
        dx - self.defense_radius
    }

    /// Closest point that lies `dist` outside the selected defense area.
    pub fn closest_point_outside_defense_area(&self, loc: Vec2, own_side: bool, dist: f64) -> Vec2 {
        let lh = self.field_length_h;
        if own_side && loc.x < -lh {
            return Vec2::new(-lh - dist, loc.y);
        }
        if !own_side && loc.x > lh {
            return Vec2::new(lh + dist, loc.y);
        }

        let goal_x = if own_side { -lh } else { lh };
        let dy = loc.y.abs() - self.defense_stretch_h;
        if dy > 0.0 {
            let centre = Vec2::new(goal_x, self.defense_stretch_h * sign(loc.y));
            let to_centre = centre - loc;
            let n = to_centre.norm();
            if n < 1e-9 {
                return centre + Vec2::new(-sign(goal_x) * (self.defense_radius + dist), 0.0);
            }
            return centre - to_centre * ((self.defense_radius + dist) / n);
        }

        Vec2::new(goal_x - sign(goal_x) * (self.defense_radius + dist), loc.y)
    }

    /// Whether `loc` lies at least `margin` inside the field (negative
    /// margins extend the field), optionally also outside the own defense area.
    pub fn is_in_field(&self, loc: Vec2, margin: f64, avoid_defense: bool) -> bool {
        if loc.x.abs() > self.field_length_h - margin {
            return false;
        }
        if loc.y.abs() > self.field_width_h - margin {
            return false;
        }

        if avoid_defense {
            let corner = Vec2::new(-self.field_length_h, self.defense_stretch_h);
            let folded = Vec2::new(loc.x, loc.y.abs());
            if folded.y > self.defense_stretch_h {
                if (corner - folded).norm() < self.defense_radius + margin {
                    return false;
                }
            } else if (corner.x - loc.x).abs() < self.defense_radius + margin {
                return false;
            }
        }

        true
    }

    /// Clamp `loc` into the playing region shrunk by `margin`.
    ///
    /// With `avoid_defense`, a point inside the own defense area is pushed
    /// out radially when it sits in front of a quarter circle and along x
    /// when it sits in front of the straight stretch.
    pub fn bound_to_field(&self, loc: Vec2, margin: f64, avoid_defense: bool) -> Vec2 {
        let x_max = (self.field_length_h - margin).max(0.0);
        let y_max = (self.field_width_h - margin).max(0.0);
        let mut loc = Vec2::new(loc.x.clamp(-x_max, x_max), loc.y.clamp(-y_max, y_max));

        if avoid_defense {
            let clearance = self.defense_radius + margin;
            if loc.y.abs() > self.defense_stretch_h {
                let centre = Vec2::new(-self.field_length_h, sign(loc.y) * self.defense_stretch_h);
                let offset = loc - centre;
                let d = offset.norm();
                if d < clearance && d > 1e-9 {
                    loc = centre + offset * (clearance / d);
                }
            } else if (-self.field_length_h - loc.x).abs() < clearance {
                loc.x = -self.field_length_h + clearance;
            }
        }
        loc
    }

    /// Point where a ray from `last_inside` along `direction` first crosses
    /// the field boundary (goal line or touchline).
    pub fn out_of_bounds_location(&self, last_inside: Vec2, direction: Vec2) -> Vec2 {
        let (lh, wh) = (self.field_length_h, self.field_width_h);
        let sx = sign(direction.x);
        let sy = sign(direction.y);

        if sx == 0.0 && sy == 0.0 {
            return last_inside;
        }
        if sx == 0.0 {
            return Vec2::new(last_inside.x, sy * wh);
        }
        if sy == 0.0 {
            return Vec2::new(sx * lh, last_inside.y);
        }

        let dir = direction.normalize();
        let x_time = ((sx * lh - last_inside.x) / dir.x).abs();
        let y_time = ((sy * wh - last_inside.y) / dir.y).abs();
        if x_time < y_time {
            Vec2::new(sx * lh, last_inside.y + x_time * dir.y)
        } else {
            Vec2::new(last_inside.x + y_time * dir.x, sy * wh)
        }
    }

    /// Whether `loc` is inside either goal box (behind the goal line,
    /// within the posts and the goal depth).
    pub fn is_in_goal(&self, loc: Vec2) -> bool {
        loc.y.abs() < self.goal_width_h
            && loc.x.abs() > self.field_length_h
            && loc.x.abs() < self.field_length_h + self.goal_depth
    }

    /// A restart position inside the field and clear of both defense areas.
    pub fn legal_position(&self, loc: Vec2) -> Vec2 {
        let clearance = field::LEGAL_DEFENSE_CLEARANCE;
        let mut loc = loc;
        if loc.x.abs() > self.field_length_h {
            loc.x = sign(loc.x) * self.field_length_h;
        }
        if loc.y.abs() > self.field_width_h {
            loc.y = sign(loc.y) * self.field_width_h;
        }

        if self.distance_to_defense_area(loc, true) < clearance {
            return self.closest_point_outside_defense_area(loc, true, clearance);
        }
        if self.distance_to_defense_area(loc, false) < clearance {
            return self.closest_point_outside_defense_area(loc, false, clearance);
        }
        loc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn field() -> FieldGeometry {
        FieldGeometry::default()
    }

    #[test]
    fn test_distance_to_defense_area_front_and_arc() {
        let f = field();
        // Straight stretch: 1000 mm radius in front of the goal line
        assert!((f.distance_to_defense_area(Vec2::new(-4000.0, 0.0), true) + 500.0).abs() < 1e-9);
        assert!((f.distance_to_defense_area(Vec2::new(-3000.0, 100.0), true) - 500.0).abs() < 1e-9);
        // Arc part, centred at (-4500, 250)
        let d = f.distance_to_defense_area(Vec2::new(-4500.0, 1750.0), true);
        assert!((d - 500.0).abs() < 1e-9);
        // Opponent side mirrors
        assert!((f.distance_to_defense_area(Vec2::new(4000.0, 0.0), false) + 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_distance_behind_goal_line() {
        let f = field();
        assert!((f.distance_to_defense_area(Vec2::new(-4600.0, 0.0), true) - 100.0).abs() < 1e-9);
        let corner = f.distance_to_defense_area(Vec2::new(-4600.0, 1350.0), true);
        assert!((corner - 100.0f64.hypot(100.0)).abs() < 1e-9);
    }

    #[test]
    fn test_closest_point_outside_defense_area() {
        let f = field();
        let p = f.closest_point_outside_defense_area(Vec2::new(-4000.0, 0.0), true, 700.0);
        assert!((p - Vec2::new(-2800.0, 0.0)).norm() < 1e-9);

        let p = f.closest_point_outside_defense_area(Vec2::new(4000.0, -800.0), false, 700.0);
        assert!((f.distance_to_defense_area(p, false) - 700.0).abs() < 1e-6);
    }

    #[test]
    fn test_is_in_field() {
        let f = field();
        assert!(f.is_in_field(Vec2::new(0.0, 0.0), 0.0, false));
        assert!(!f.is_in_field(Vec2::new(4510.0, 0.0), 0.0, false));
        assert!(f.is_in_field(Vec2::new(4510.0, 0.0), -21.0, false));
        assert!(!f.is_in_field(Vec2::new(0.0, 2950.0), 100.0, false));
        assert!(!f.is_in_field(Vec2::new(-4000.0, 0.0), 0.0, true));
        assert!(f.is_in_field(Vec2::new(4000.0, 0.0), 0.0, true));
    }

    #[test]
    fn test_bound_to_field_axis_and_arc() {
        let f = field();
        let p = f.bound_to_field(Vec2::new(6000.0, -4000.0), 100.0, false);
        assert_eq!(p, Vec2::new(4400.0, -2900.0));

        // Straight face: clamp along x
        let p = f.bound_to_field(Vec2::new(-4200.0, 100.0), 100.0, true);
        assert!((p.x - (-4500.0 + 1100.0)).abs() < 1e-9);
        assert_eq!(p.y, 100.0);

        // Arc face: project radially
        let p = f.bound_to_field(Vec2::new(-4200.0, 800.0), 100.0, true);
        let centre = Vec2::new(-4500.0, 250.0);
        assert!(((p - centre).norm() - 1100.0).abs() < 1e-6);
    }

    #[test]
    fn test_out_of_bounds_location() {
        let f = field();
        let p = f.out_of_bounds_location(Vec2::new(4000.0, 0.0), Vec2::new(1.0, 1.0));
        assert!((p - Vec2::new(4500.0, 500.0)).norm() < 1e-9);

        let p = f.out_of_bounds_location(Vec2::new(0.0, 2000.0), Vec2::new(-1.0, 2.0));
        assert!((p - Vec2::new(-500.0, 3000.0)).norm() < 1e-9);

        let p = f.out_of_bounds_location(Vec2::new(100.0, 200.0), Vec2::new(0.0, -3.0));
        assert_eq!(p, Vec2::new(100.0, -3000.0));
        let p = f.out_of_bounds_location(Vec2::new(100.0, 200.0), Vec2::zeros());
        assert_eq!(p, Vec2::new(100.0, 200.0));
    }

    #[test]
    fn test_legal_position_clears_both_areas() {
        let f = field();
        let p = f.legal_position(Vec2::new(4300.0, 0.0));
        assert!(f.distance_to_defense_area(p, false) >= 700.0 - 1e-6);
        let p = f.legal_position(Vec2::new(-5000.0, 100.0));
        assert!(f.distance_to_defense_area(p, true) >= 700.0 - 1e-6);
        assert_eq!(f.legal_position(Vec2::new(0.0, 0.0)), Vec2::new(0.0, 0.0));
    }

    #[test]
    fn test_from_geometry_record() {
        let record = GeometryRecord {
            field_length: 12000.0,
            field_width: 9000.0,
            goal_depth: 180.0,
            goal_width: 1200.0,
            defense_radius: None,
            defense_stretch: Some(500.0),
        };
        let f = FieldGeometry::from(&record);
        assert_eq!(f.field_length_h, 6000.0);
        assert_eq!(f.field_width_h, 4500.0);
        assert_eq!(f.goal_width_h, 600.0);
        assert_eq!(f.defense_stretch_h, 250.0);
        assert_eq!(f.defense_radius, field::DEFENSE_RADIUS);
    }

    proptest! {
        #[test]
        fn prop_bound_to_field_lands_inside(x in -8000.0f64..8000.0, y in -6000.0f64..6000.0) {
            let f = field();
            let p = f.bound_to_field(Vec2::new(x, y), 100.0, false);
            prop_assert!(f.is_in_field(p, 99.9, false));
        }

        #[test]
        fn prop_out_of_bounds_on_boundary(
            x in -4000.0f64..4000.0,
            y in -2500.0f64..2500.0,
            angle in 0.0f64..std::f64::consts::TAU,
        ) {
            let f = field();
            let dir = Vec2::new(angle.cos(), angle.sin());
            let p = f.out_of_bounds_location(Vec2::new(x, y), dir);
            let on_goal_line = (p.x.abs() - 4500.0).abs() < 1e-6 && p.y.abs() <= 3000.0 + 1e-6;
            let on_touchline = (p.y.abs() - 3000.0).abs() < 1e-6 && p.x.abs() <= 4500.0 + 1e-6;
            prop_assert!(on_goal_line || on_touchline, "{:?}", p);
        }
    }
}
