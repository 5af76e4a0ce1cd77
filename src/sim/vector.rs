//! 2D vector helpers on top of `glam::Vec2`
//!
//! glam already covers add/scale/length; what lives here is the movement
//! smoothing used everywhere in the tick.

use glam::Vec2;

/// Weight of the current value in an `approach` blend (target gets 1 part)
pub const APPROACH_WEIGHT: f32 = 4.0;

/// Blend `current` toward `target` at a fixed 4:1 ratio.
///
/// Called once per tick this behaves like exponential smoothing with a fixed
/// time constant, giving movement inertia instead of instant velocity changes.
#[inline]
pub fn approach(current: Vec2, target: Vec2) -> Vec2 {
    (current * APPROACH_WEIGHT + target) / (APPROACH_WEIGHT + 1.0)
}

/// Scalar version of [`approach`]
#[inline]
pub fn approach_scalar(current: f32, target: f32) -> f32 {
    (current * APPROACH_WEIGHT + target) / (APPROACH_WEIGHT + 1.0)
}

/// Clamp a vector to unit length, leaving shorter vectors untouched
#[inline]
pub fn clamp_unit(v: Vec2) -> Vec2 {
    if v.length_squared() > 1.0 {
        v.normalize_or_zero()
    } else {
        v
    }
}

/// Unit vector pointing from `from` to `to`, or zero if they coincide
#[inline]
pub fn direction(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}
