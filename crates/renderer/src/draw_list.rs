//! Flattens the scene graph into lights and draw items for one frame.

use std::f32::consts::PI;
use std::sync::Arc;

use corelib::Vec3;
use corelib::mesh::{MeshData, PointCloud};
use corelib::scene::{Light, NodeKind, Scene};
use glam::Mat4;

/// Light totals for the frame. Radiance is pre-divided by pi (Lambert).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameLights {
    pub ambient: [f32; 3],
    /// Unit vector pointing towards the light.
    pub direction: Vec3,
    pub directional: [f32; 3],
}

impl Default for FrameLights {
    fn default() -> Self {
        Self {
            ambient: [0.0; 3],
            direction: Vec3::Y,
            directional: [0.0; 3],
        }
    }
}

pub enum DrawItem {
    Mesh {
        mesh: Arc<MeshData>,
        model: Mat4,
        color: [f32; 3],
        intensity: f32,
    },
    Points {
        cloud: Arc<PointCloud>,
        model: Mat4,
    },
}

#[derive(Default)]
pub struct DrawList {
    pub lights: FrameLights,
    pub items: Vec<DrawItem>,
}

impl DrawList {
    /// Only the first directional light is shaded; ambient lights add up.
    pub fn collect(scene: &Scene) -> Self {
        let mut list = DrawList::default();
        let mut have_directional = false;
        scene.walk(|_, node, world| match &node.kind {
            NodeKind::Mesh {
                mesh, material, ..
            } => list.items.push(DrawItem::Mesh {
                mesh: Arc::clone(mesh),
                model: world,
                color: material.color,
                intensity: node.intensity,
            }),
            NodeKind::Points(cloud) => list.items.push(DrawItem::Points {
                cloud: Arc::clone(cloud),
                model: world,
            }),
            NodeKind::Light(Light::Ambient { color, intensity }) => {
                for (acc, c) in list.lights.ambient.iter_mut().zip(color) {
                    *acc += c * intensity / PI;
                }
            }
            NodeKind::Light(Light::Directional {
                color, intensity, ..
            }) if !have_directional => {
                have_directional = true;
                let position = world.transform_point3(Vec3::ZERO);
                list.lights.direction = position.try_normalize().unwrap_or(Vec3::Y);
                list.lights.directional = color.map(|c| c * intensity / PI);
            }
            _ => {}
        });
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::scene::{Material, Node, ShadowParams};
    use corelib::transform::Transform;

    #[test]
    fn collects_meshes_points_and_lights() {
        let mut scene = Scene::new();
        let root = scene.root();
        scene.spawn(
            root,
            Node::new(
                "box",
                NodeKind::mesh(Arc::new(MeshData::cuboid(1.0, 1.0, 1.0)), Material::default()),
            ),
        );
        scene.spawn(
            root,
            Node::new("stars", NodeKind::Points(Arc::new(PointCloud::default()))),
        );
        scene.spawn(
            root,
            Node::new(
                "ambient",
                NodeKind::Light(Light::Ambient {
                    color: [1.0, 1.0, 1.0],
                    intensity: PI,
                }),
            ),
        );
        scene.spawn(
            root,
            Node::new(
                "sun",
                NodeKind::Light(Light::Directional {
                    color: [1.0, 0.5, 0.0],
                    intensity: 2.0 * PI,
                    cast_shadow: true,
                    shadow: ShadowParams::default(),
                }),
            )
            .with_transform(Transform::from_position(Vec3::new(0.0, 0.0, 5.0))),
        );

        let list = DrawList::collect(&scene);
        assert_eq!(list.items.len(), 2);
        assert!((list.lights.ambient[0] - 1.0).abs() < 1e-6);
        assert!((list.lights.direction - Vec3::Z).length() < 1e-6);
        assert!((list.lights.directional[0] - 2.0).abs() < 1e-5);
        assert!((list.lights.directional[1] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn hidden_meshes_are_not_drawn() {
        let mut scene = Scene::new();
        let id = scene.spawn(
            scene.root(),
            Node::new(
                "box",
                NodeKind::mesh(Arc::new(MeshData::cuboid(1.0, 1.0, 1.0)), Material::default()),
            ),
        );
        scene.node_mut(id).unwrap().visible = false;
        assert!(DrawList::collect(&scene).items.is_empty());
    }
}
