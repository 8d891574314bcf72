//! Output-surface sizing: logical size, capped pixel density, aspect.

/// Device pixel density above this is not rendered.
pub const MAX_PIXEL_RATIO: f64 = 2.0;

/// Pixel density actually rendered for a device scale factor. Invalid
/// factors fall back to 1.
pub fn capped_pixel_ratio(scale_factor: f64) -> f64 {
    if scale_factor.is_finite() && scale_factor > 0.0 {
        scale_factor.min(MAX_PIXEL_RATIO)
    } else {
        1.0
    }
}

/// Which signal drives [`Viewport::resize`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResizeSignal {
    /// Custom `reset` event. Nothing emits it, so the camera keeps its
    /// startup aspect when the window changes size.
    #[default]
    Reset,
    /// Real window resizes.
    Resize,
}

/// Tracked output-surface dimensions in logical pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub pixel_ratio: f64,
}

impl Viewport {
    /// From a physical size and the window's device scale factor.
    pub fn from_physical(width: u32, height: u32, scale_factor: f64) -> Self {
        let mut viewport = Self {
            width: 1.0,
            height: 1.0,
            pixel_ratio: 1.0,
        };
        viewport.resize(width, height, scale_factor);
        viewport
    }

    /// Re-read the surface size and recompute pixel density.
    pub fn resize(&mut self, width: u32, height: u32, scale_factor: f64) {
        let scale = if scale_factor.is_finite() && scale_factor > 0.0 {
            scale_factor
        } else {
            1.0
        };
        self.width = (width.max(1) as f64 / scale).max(1.0);
        self.height = (height.max(1) as f64 / scale).max(1.0);
        self.pixel_ratio = capped_pixel_ratio(scale);
    }

    #[inline]
    pub fn aspect(&self) -> f32 {
        (self.width / self.height) as f32
    }

    /// Render-target size: logical size times the capped pixel ratio.
    pub fn physical_size(&self) -> (u32, u32) {
        let w = (self.width * self.pixel_ratio).round().max(1.0) as u32;
        let h = (self.height * self.pixel_ratio).round().max(1.0) as u32;
        (w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_is_width_over_height() {
        for (w, h, s) in [(1280, 720, 1.0), (800, 1200, 1.5), (3840, 2160, 2.0), (1, 1, 1.0)] {
            let v = Viewport::from_physical(w, h, s);
            assert!((v.aspect() - (w as f32 / h as f32)).abs() < 1e-5);
        }
    }

    #[test]
    fn capped_ratio_handles_odd_factors() {
        assert_eq!(capped_pixel_ratio(3.0), 2.0);
        assert_eq!(capped_pixel_ratio(1.5), 1.5);
        assert_eq!(capped_pixel_ratio(0.0), 1.0);
        assert_eq!(capped_pixel_ratio(f64::NAN), 1.0);
    }

    #[test]
    fn pixel_ratio_is_capped_at_two() {
        let v = Viewport::from_physical(2560, 1440, 3.0);
        assert_eq!(v.pixel_ratio, 2.0);
        assert_eq!(v.physical_size(), (1707, 960));

        let v = Viewport::from_physical(1280, 720, 1.25);
        assert_eq!(v.pixel_ratio, 1.25);
        assert_eq!(v.physical_size(), (1280, 720));
    }

    #[test]
    fn zero_sizes_and_bad_scale_are_tolerated() {
        let v = Viewport::from_physical(0, 0, f64::NAN);
        assert_eq!(v.physical_size(), (1, 1));
        assert!(v.aspect().is_finite());
    }
}
