//! Relative geometry between two aircraft: antenna-train angle (ATA),
//! aspect angle (AA) and horizontal range.
//!
//! Angles are degrees. Headings and lines of sight share one frame:
//! counter-clockwise from +x, normalized to [0, 360).

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::kinematics::{wrap_heading, Airframe};

/// Separations below this (metres) have no defined line of sight.
pub const GEOMETRY_EPSILON: f64 = 1e-6;

/// Angle-off pair for one aircraft against its opponent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleOff {
    /// Angle between own nose and the line of sight to the opponent.
    pub antenna_train: f64,
    /// Angle between the opponent's tail and the line of sight from it.
    pub aspect: f64,
}

/// Line-of-sight bearing from `from` to `to`, in [0, 360).
///
/// Coincident points report a bearing of 0.
pub fn bearing(from: DVec2, to: DVec2) -> f64 {
    let d = to - from;
    if d.length() < GEOMETRY_EPSILON {
        return 0.0;
    }
    wrap_heading(d.y.atan2(d.x).to_degrees())
}

/// Reflect an angle difference back into [-180, 180]. Only magnitudes are
/// consumed downstream, so the sign of a reflected value is not meaningful.
pub fn fold_angle(x: f64) -> f64 {
    if x > 180.0 {
        360.0 - x
    } else if x < -180.0 {
        360.0 + x
    } else {
        x
    }
}

/// Horizontal distance.
pub fn range(a: DVec2, b: DVec2) -> f64 {
    a.distance(b)
}

/// ATA and AA of aircraft B, where A is the opponent.
pub fn solve(pos_a: DVec2, pos_b: DVec2, heading_a: f64, heading_b: f64) -> AngleOff {
    let los_ba = bearing(pos_b, pos_a);
    let los_ab = bearing(pos_a, pos_b);
    AngleOff {
        antenna_train: fold_angle(heading_b - los_ba),
        aspect: fold_angle(180.0 + heading_a - los_ab),
    }
}

/// Full engagement geometry from both sides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub range: f64,
    pub red: AngleOff,
    pub blue: AngleOff,
    /// Aircraft are effectively coincident.
    pub degenerate: bool,
}

impl Geometry {
    pub fn between(red_pos: DVec2, red_heading: f64, blue_pos: DVec2, blue_heading: f64) -> Self {
        let range = range(red_pos, blue_pos);
        Self {
            range,
            blue: solve(red_pos, blue_pos, red_heading, blue_heading),
            red: solve(blue_pos, red_pos, blue_heading, red_heading),
            degenerate: range < GEOMETRY_EPSILON,
        }
    }

    pub fn of<S: Airframe>(red: &S, blue: &S) -> Self {
        Self::between(
            red.position_xy(),
            red.heading(),
            blue.position_xy(),
            blue.heading(),
        )
    }
}
