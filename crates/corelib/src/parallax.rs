//! Pointer-driven camera drift.

use crate::Vec3;

/// Normalised pointer position, each axis in `[-0.5, 0.5]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CursorState {
    pub x: f32,
    pub y: f32,
}

impl CursorState {
    /// Normalise pixel coordinates against the surface size. Positions
    /// outside the surface are clamped onto its edge.
    pub fn from_pointer(px: f64, py: f64, width: f64, height: f64) -> Self {
        let w = width.max(1.0);
        let h = height.max(1.0);
        Self {
            x: ((px / w).clamp(0.0, 1.0) - 0.5) as f32,
            y: ((py / h).clamp(0.0, 1.0) - 0.5) as f32,
        }
    }
}

/// Frame-rate independent exponential follow:
/// `current + (target - current) * k * dt`, with the step factor capped
/// at 1 so a long frame lands on the target instead of past it.
#[inline]
pub fn damp(current: f32, target: f32, k: f32, dt: f32) -> f32 {
    let factor = (k * dt).clamp(0.0, 1.0);
    current + (target - current) * factor
}

/// [`damp`] applied to all three components with one shared factor.
#[inline]
pub fn damp_vec3(current: Vec3, target: Vec3, k: f32, dt: f32) -> Vec3 {
    let factor = (k * dt).clamp(0.0, 1.0);
    current + (target - current) * factor
}

/// Maps cursor state to a rig offset and eases the rig towards it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParallaxRig {
    pub amplitude: f32,
    pub damping: f32,
}

impl Default for ParallaxRig {
    fn default() -> Self {
        Self {
            amplitude: 0.5,
            damping: 4.0,
        }
    }
}

impl ParallaxRig {
    /// Screen y grows downwards, world y upwards.
    pub fn target(&self, cursor: CursorState) -> Vec3 {
        Vec3::new(cursor.x * self.amplitude, -cursor.y * self.amplitude, 0.0)
    }

    /// Ease the x/y of `position` towards the cursor target; z is left alone.
    pub fn step(&self, position: Vec3, cursor: CursorState, dt: f32) -> Vec3 {
        let target = self.target(cursor).with_z(position.z);
        damp_vec3(position, target, self.damping, dt)
    }
}
