//! Hand-authored scene layout.

use std::f32::consts::PI;
use std::sync::Arc;

use corelib::camera::PerspectiveCamera;
use corelib::mesh::{MeshData, PointCloud};
use corelib::scene::{Light, Material, Node, NodeId, NodeKind, Scene, ShadowParams};
use corelib::transform::Transform;
use corelib::vec3;
use rand::SeedableRng;
use rand::rngs::StdRng;

pub const BACKGROUND: [f32; 3] = [0.05, 0.05, 0.08];

pub const CAMERA_FOV_DEG: f32 = 35.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 100.0;
pub const CAMERA_DISTANCE: f32 = 6.0;

pub const PARTICLE_COUNT: usize = 400;
pub const PARTICLE_SHELL: (f32, f32) = (4.0, 8.0);
const PARTICLE_SEED: u64 = 42;

/// Nodes the frame scheduler and the debug panel touch.
#[derive(Clone, Copy, Debug)]
pub struct SceneHandles {
    pub floor: NodeId,
    pub test_mesh: NodeId,
    pub torus: NodeId,
    pub ambient: NodeId,
    pub sun: NodeId,
    pub rig: NodeId,
    pub camera: NodeId,
    pub particles: NodeId,
}

/// Build the scene once at startup.
pub fn build_scene(aspect: f32) -> (Scene, SceneHandles) {
    let mut scene = Scene::new();
    scene.background = BACKGROUND;
    let root = scene.root();

    let mut floor = Node::new(
        "Floor",
        NodeKind::mesh(
            Arc::new(MeshData::plane(20.0, 20.0)),
            Material::with_color([0.45, 0.45, 0.45]),
        ),
    )
    .with_transform(Transform::from_position(vec3(0.0, -1.0, 0.0)));
    floor.set_shadows(false, true);
    let floor = scene.spawn(root, floor);

    let mut test_mesh = Node::new(
        "TestMesh",
        NodeKind::mesh(Arc::new(MeshData::cuboid(1.0, 1.0, 1.0)), Material::default()),
    );
    test_mesh.set_shadows(true, true);
    let test_mesh = scene.spawn(root, test_mesh);

    let mut torus = Node::new(
        "Torus",
        NodeKind::mesh(
            Arc::new(MeshData::torus(0.6, 0.2, 24, 64)),
            Material::with_color([1.0, 0.48, 0.35]),
        ),
    )
    .with_transform(Transform::from_position(vec3(2.0, 0.0, -1.0)));
    torus.set_shadows(true, true);
    let torus = scene.spawn(root, torus);

    let ambient = scene.spawn(
        root,
        Node::new(
            "AmbientLight",
            NodeKind::Light(Light::Ambient {
                color: [1.0, 1.0, 1.0],
                intensity: 0.8,
            }),
        ),
    );

    let sun = scene.spawn(
        root,
        Node::new(
            "DirectionalLight",
            NodeKind::Light(Light::Directional {
                color: [1.0, 1.0, 1.0],
                intensity: 2.5,
                cast_shadow: true,
                shadow: ShadowParams {
                    map_size: 1024,
                    near: 1.0,
                    far: 20.0,
                    extent: 8.0,
                    normal_bias: 0.05,
                },
            }),
        )
        .with_transform(Transform::from_position(vec3(3.0, 5.0, 2.0))),
    );

    let rig = scene.spawn(root, Node::group("CameraRig"));
    let camera = scene.spawn(
        rig,
        Node::new(
            "Camera",
            NodeKind::Camera(PerspectiveCamera::new(
                CAMERA_FOV_DEG,
                aspect,
                CAMERA_NEAR,
                CAMERA_FAR,
            )),
        )
        .with_transform(Transform::from_position(vec3(0.0, 0.0, CAMERA_DISTANCE))),
    );

    let mut rng = StdRng::seed_from_u64(PARTICLE_SEED);
    let cloud = PointCloud {
        positions: PointCloud::sphere_shell(&mut rng, PARTICLE_COUNT, PARTICLE_SHELL.0, PARTICLE_SHELL.1),
        color: [1.0, 1.0, 1.0],
        size: 0.03,
    };
    let particles = scene.spawn(root, Node::new("Particles", NodeKind::Points(Arc::new(cloud))));

    log::info!("Scene built: {} nodes", scene.len());
    (
        scene,
        SceneHandles {
            floor,
            test_mesh,
            torus,
            ambient,
            sun,
            rig,
            camera,
            particles,
        },
    )
}

/// Particle field spin at elapsed time `t`, same angle on x and y.
#[inline]
pub fn particle_rotation(t: f32) -> f32 {
    PI * t * 0.01
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_sits_inside_rig() {
        let (scene, h) = build_scene(16.0 / 9.0);
        assert_eq!(scene.parent(h.camera), Some(h.rig));
        assert_eq!(scene.parent(h.rig), Some(scene.root()));
        match scene.node(h.camera).map(|n| &n.kind) {
            Some(NodeKind::Camera(cam)) => {
                assert_eq!(cam.fov_y_deg, 35.0);
                assert!((cam.aspect - 16.0 / 9.0).abs() < 1e-6);
            }
            other => panic!("expected camera, got {other:?}"),
        }
    }

    #[test]
    fn shadow_flags_and_frustum() {
        let (scene, h) = build_scene(1.0);
        match &scene.node(h.floor).unwrap().kind {
            NodeKind::Mesh {
                cast_shadow,
                receive_shadow,
                ..
            } => assert!(!cast_shadow && *receive_shadow),
            _ => unreachable!(),
        }
        match &scene.node(h.sun).unwrap().kind {
            NodeKind::Light(Light::Directional {
                cast_shadow, shadow, ..
            }) => {
                assert!(cast_shadow);
                assert_eq!(shadow.map_size, 1024);
                assert_eq!(shadow.far, 20.0);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn particles_sampled_deterministically() {
        let (a, ha) = build_scene(1.0);
        let (b, hb) = build_scene(1.0);
        let points = |s: &Scene, id| match &s.node(id).unwrap().kind {
            NodeKind::Points(cloud) => cloud.positions.clone(),
            _ => unreachable!(),
        };
        let pa = points(&a, ha.particles);
        assert_eq!(pa.len(), PARTICLE_COUNT);
        assert_eq!(pa, points(&b, hb.particles));
    }

    #[test]
    fn every_node_has_finite_transform() {
        let (scene, _) = build_scene(1.0);
        scene.walk(|_, node, world| {
            assert!(node.transform.is_finite(), "{}", node.name);
            assert!(world.is_finite());
        });
    }
}
