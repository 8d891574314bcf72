use crate::{Mat4, Vec3};

/// Perspective projection parameters (right-handed, depth in [0, 1]).
///
/// The view half lives in the scene graph: the camera is a node, usually
/// mounted in a rig group, and its world matrix supplies the eye.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PerspectiveCamera {
    pub fov_y_deg: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl PerspectiveCamera {
    pub fn new(fov_y_deg: f32, aspect: f32, z_near: f32, z_far: f32) -> Self {
        Self {
            fov_y_deg,
            aspect,
            z_near,
            z_far,
        }
    }

    /// Projection matrix recomputed from the current fields.
    #[inline]
    pub fn proj(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_deg.to_radians(),
            self.aspect.max(1e-6),
            self.z_near,
            self.z_far,
        )
    }

    #[inline]
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(35.0, 1.0, 0.1, 100.0)
    }
}

/// View + projection pair resolved for one draw.
#[derive(Clone, Copy, Debug)]
pub struct CameraView {
    pub view: Mat4,
    pub proj: Mat4,
    pub eye: Vec3,
}

impl CameraView {
    /// Build from the camera node's world matrix.
    pub fn from_world(world: Mat4, camera: &PerspectiveCamera) -> Self {
        Self {
            view: world.inverse(),
            proj: camera.proj(),
            eye: world.transform_point3(Vec3::ZERO),
        }
    }

    #[inline]
    pub fn proj_view(&self) -> Mat4 {
        self.proj * self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eye_follows_world_translation() {
        let world = Mat4::from_translation(Vec3::new(0.5, -0.25, 6.0));
        let view = CameraView::from_world(world, &PerspectiveCamera::default());
        assert!((view.eye - Vec3::new(0.5, -0.25, 6.0)).length() < 1e-6);
        // Eye maps to the view-space origin.
        let p = view.view.transform_point3(view.eye);
        assert!(p.length() < 1e-5);
    }

    #[test]
    fn set_aspect_changes_projection() {
        let mut cam = PerspectiveCamera::default();
        let before = cam.proj();
        cam.set_aspect(2.0);
        assert_ne!(before, cam.proj());
        assert_eq!(cam.aspect, 2.0);
    }
}
