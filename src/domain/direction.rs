// Orientation and position values plus the single-wrap angle arithmetic.

use std::f32::consts::PI;
use std::f64::consts::TAU;

/// Entity orientation in radians. Each component is expected in (-PI, PI].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Direction {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

impl Direction {
    pub fn new(roll: f32, pitch: f32, yaw: f32) -> Self {
        Self { roll, pitch, yaw }
    }

    /// Direction with only a heading set.
    pub fn from_yaw(yaw: f32) -> Self {
        Self {
            roll: 0.0,
            pitch: 0.0,
            yaw,
        }
    }

    pub fn with_yaw(self, yaw: f32) -> Self {
        Self { yaw, ..self }
    }

    pub fn is_finite(&self) -> bool {
        self.roll.is_finite() && self.pitch.is_finite() && self.yaw.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Brings an angle back into (-PI, PI] by adding or subtracting one full turn.
///
/// Only a single wrap is applied, so inputs further than one turn outside the
/// range stay out of range. The wrap itself is done in f64 so the f32 result does
/// not pick up the rounding error of a single-precision TAU.
pub fn normalize_angle(angle: f32) -> f32 {
    if angle > PI {
        (angle as f64 - TAU) as f32
    } else if angle <= -PI {
        (angle as f64 + TAU) as f32
    } else {
        angle
    }
}
