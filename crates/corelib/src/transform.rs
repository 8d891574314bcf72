use crate::{EulerRot, Mat4, Quat, Vec3};

/// Node transform: position, Euler rotation (XYZ, radians) and scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    /// Euler angles in radians (XYZ order).
    pub rotation_euler: Vec3,
    pub scale: Vec3,
}

impl Transform {
    #[inline]
    pub const fn identity() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation_euler: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }

    #[inline]
    pub fn from_trs(translation: Vec3, rotation_euler: Vec3, scale: Vec3) -> Self {
        Self {
            translation,
            rotation_euler,
            scale,
        }
    }

    #[inline]
    pub fn from_position(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    /// Build from a quaternion rotation (as stored by glTF).
    pub fn from_quat(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        let (x, y, z) = rotation.to_euler(EulerRot::XYZ);
        Self {
            translation,
            rotation_euler: Vec3::new(x, y, z),
            scale,
        }
    }

    #[inline]
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation_euler.x,
            self.rotation_euler.y,
            self.rotation_euler.z,
        )
    }

    /// Build matrix = T * R * S (column-major Mat4 per glam).
    #[inline]
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation(), self.translation)
    }

    /// True when every component is finite.
    pub fn is_finite(&self) -> bool {
        self.translation.is_finite() && self.rotation_euler.is_finite() && self.scale.is_finite()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quat_round_trips_through_euler() {
        let probes = [Vec3::X, Vec3::Y, Vec3::Z, Vec3::new(0.3, -1.2, 2.0)];
        let rotations = [
            Quat::from_rotation_y(0.75),
            Quat::from_rotation_x(-1.1),
            Quat::from_rotation_z(2.5),
            Quat::from_euler(EulerRot::XYZ, 0.4, -0.9, 1.3),
        ];
        for q in rotations {
            let t = Transform::from_quat(Vec3::ZERO, q, Vec3::ONE);
            let r = t.rotation();
            for v in probes {
                // Compare action on vectors; q and -q are the same rotation.
                assert!((r * v - q * v).length() < 1e-5, "{q:?} vs {r:?}");
            }
        }
    }

    #[test]
    fn default_is_origin() {
        let t = Transform::default();
        assert_eq!(t.translation, Vec3::ZERO);
        assert_eq!(t.rotation_euler, Vec3::ZERO);
        assert!(t.is_finite());
    }
}
