//! Gameplay tuning for entity turns.
//!
//! Keep this separate from runtime/server configuration (tick rates, buffer sizes, etc.).

/// Angular distance in radians below which a turn counts as finished.
pub const TURN_EPSILON: f32 = 0.01;

#[derive(Debug, Clone, Copy)]
pub struct TurnTuning {
    /// Per-tick yaw change used when a request does not name one, in radians.
    pub default_velocity: f32,
}

impl Default for TurnTuning {
    fn default() -> Self {
        Self {
            default_velocity: 0.5,
        }
    }
}
