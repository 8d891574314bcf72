//! Core types: math re-exports, Transform, Camera, scene graph, and the
//! small pieces of per-frame math (viewport sizing, parallax, clock).

pub use glam::{EulerRot, Mat4, Quat, Vec3, vec3};

pub mod camera;
pub mod clock;
pub mod mesh;
pub mod parallax;
pub mod scene;
pub mod transform;
pub mod viewport;
