//! Scene graph: an arena of nodes with parent/child links.
//!
//! Nodes are addressed by [`NodeId`] (dense index into the arena). The root
//! is created with the scene and is never removed; nothing is ever removed,
//! the scene lives as long as the program.

use std::sync::Arc;

use crate::Mat4;
use crate::camera::PerspectiveCamera;
use crate::mesh::{MeshData, PointCloud};
use crate::transform::Transform;

/// Node id (dense, index into the arena).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Surface parameters for a mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub color: [f32; 3],
    pub roughness: f32,
    pub metalness: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            roughness: 1.0,
            metalness: 0.0,
        }
    }
}

impl Material {
    pub fn with_color(color: [f32; 3]) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }
}

/// Orthographic shadow frustum of a directional light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowParams {
    pub map_size: u32,
    pub near: f32,
    pub far: f32,
    /// Half-size of the square frustum (left = -extent, right = extent, ...).
    pub extent: f32,
    pub normal_bias: f32,
}

impl Default for ShadowParams {
    fn default() -> Self {
        Self {
            map_size: 512,
            near: 0.5,
            far: 500.0,
            extent: 5.0,
            normal_bias: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Light {
    Ambient {
        color: [f32; 3],
        intensity: f32,
    },
    /// Shines from the node position towards the origin.
    Directional {
        color: [f32; 3],
        intensity: f32,
        cast_shadow: bool,
        shadow: ShadowParams,
    },
}

impl Light {
    pub fn color(&self) -> [f32; 3] {
        match *self {
            Light::Ambient { color, .. } | Light::Directional { color, .. } => color,
        }
    }

    pub fn color_mut(&mut self) -> &mut [f32; 3] {
        match self {
            Light::Ambient { color, .. } | Light::Directional { color, .. } => color,
        }
    }

    pub fn intensity_mut(&mut self) -> &mut f32 {
        match self {
            Light::Ambient { intensity, .. } | Light::Directional { intensity, .. } => intensity,
        }
    }
}

/// Payload of a node.
#[derive(Clone, Debug)]
pub enum NodeKind {
    Group,
    Mesh {
        mesh: Arc<MeshData>,
        material: Material,
        cast_shadow: bool,
        receive_shadow: bool,
    },
    Light(Light),
    Points(Arc<PointCloud>),
    Camera(PerspectiveCamera),
}

impl NodeKind {
    pub fn mesh(mesh: Arc<MeshData>, material: Material) -> Self {
        NodeKind::Mesh {
            mesh,
            material,
            cast_shadow: false,
            receive_shadow: false,
        }
    }

    #[inline]
    pub fn is_mesh(&self) -> bool {
        matches!(self, NodeKind::Mesh { .. })
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub kind: NodeKind,
    /// Per-node light response scalar; the model loader forces it on
    /// every node of an imported subtree.
    pub intensity: f32,
    pub visible: bool,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            transform: Transform::identity(),
            kind,
            intensity: 1.0,
            visible: true,
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn set_shadows(&mut self, cast: bool, receive: bool) {
        if let NodeKind::Mesh {
            cast_shadow,
            receive_shadow,
            ..
        } = &mut self.kind
        {
            *cast_shadow = cast;
            *receive_shadow = receive;
        }
    }
}

/// Detached node hierarchy, built outside a scene (e.g. by a loader) and
/// attached in one step.
#[derive(Clone, Debug)]
pub struct NodeTree {
    pub node: Node,
    pub children: Vec<NodeTree>,
}

impl NodeTree {
    pub fn leaf(node: Node) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }

    /// Visit this node and every descendant, parents first.
    pub fn for_each_mut(&mut self, f: &mut impl FnMut(&mut Node)) {
        f(&mut self.node);
        for child in &mut self.children {
            child.for_each_mut(f);
        }
    }

    /// Number of nodes in the tree including this one.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(NodeTree::node_count).sum::<usize>()
    }
}

struct Slot {
    node: Node,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Ownership root of all visual nodes.
pub struct Scene {
    slots: Vec<Slot>,
    pub background: [f32; 3],
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                node: Node::group("Scene"),
                parent: None,
                children: Vec::new(),
            }],
            background: [0.0, 0.0, 0.0],
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes including the root.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Add `node` as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` does not belong to this scene.
    pub fn spawn(&mut self, parent: NodeId, node: Node) -> NodeId {
        assert!(parent.index() < self.slots.len(), "unknown parent {parent:?}");
        let id = NodeId(self.slots.len() as u32);
        self.slots.push(Slot {
            node,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.slots[parent.index()].children.push(id);
        id
    }

    /// Add a detached hierarchy under `parent`; returns the id of its top node.
    pub fn attach_tree(&mut self, parent: NodeId, tree: NodeTree) -> NodeId {
        let NodeTree { node, children } = tree;
        let id = self.spawn(parent, node);
        for child in children {
            self.attach_tree(id, child);
        }
        id
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.index()).map(|s| &s.node)
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots.get_mut(id.index()).map(|s| &mut s.node)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slots.get(id.index()).and_then(|s| s.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slots
            .get(id.index())
            .map(|s| s.children.as_slice())
            .unwrap_or(&[])
    }

    /// All nodes below `id` (not including `id`), depth-first.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Accumulated transform from the root down to `id`.
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let mut m = Mat4::IDENTITY;
        let mut cursor = Some(id);
        while let Some(cur) = cursor {
            let Some(slot) = self.slots.get(cur.index()) else {
                break;
            };
            m = slot.node.transform.matrix() * m;
            cursor = slot.parent;
        }
        m
    }

    /// Depth-first walk with world matrices. Invisible nodes are skipped
    /// together with their subtree.
    pub fn walk(&self, mut f: impl FnMut(NodeId, &Node, Mat4)) {
        let mut stack = vec![(self.root(), Mat4::IDENTITY)];
        while let Some((id, parent_world)) = stack.pop() {
            let slot = &self.slots[id.index()];
            if !slot.node.visible {
                continue;
            }
            let world = parent_world * slot.node.transform.matrix();
            f(id, &slot.node, world);
            for child in slot.children.iter().rev() {
                stack.push((*child, world));
            }
        }
    }

    /// First node with the given name, in insertion order.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.slots
            .iter()
            .position(|s| s.node.name == name)
            .map(|i| NodeId(i as u32))
    }
}
