//! Plane geometry for agent movement.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A point on the simulation plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Build a position from coordinates.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// The point `distance` units away along `angle` (radians).
    pub fn offset(self, angle: f64, distance: f64) -> Self {
        Self {
            x: angle.cos().mul_add(distance, self.x),
            y: angle.sin().mul_add(distance, self.y),
        }
    }

    /// Move up to `step` units toward `target`.
    ///
    /// Never overshoots: when the target is within `step`, the result is the
    /// target itself and the flag is `true`.
    pub fn step_towards(self, target: Self, step: f64) -> (Self, bool) {
        let dist = self.distance(target);
        if dist <= step || dist <= f64::EPSILON {
            return (target, true);
        }
        let ratio = step / dist;
        (
            Self {
                x: (target.x - self.x).mul_add(ratio, self.x),
                y: (target.y - self.y).mul_add(ratio, self.y),
            },
            false,
        )
    }
}
