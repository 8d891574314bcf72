//! glTF 2.0 / GLB import into a [`NodeTree`].
//!
//! Only geometry, node hierarchy and base colour are read. Images are not
//! decoded; the renderer shades with flat material colours.

use std::path::Path;
use std::sync::Arc;

use corelib::mesh::{MeshData, MeshVertex};
use corelib::scene::{Material, Node, NodeKind, NodeTree};
use corelib::transform::Transform;
use corelib::{Quat, Vec3};

use crate::error::{AssetError, AssetResult};

const DRACO_EXTENSION: &str = "KHR_draco_mesh_compression";

/// Load a `.glb`/`.gltf` file. External buffers resolve next to the file.
pub fn load_model(path: impl AsRef<Path>) -> AssetResult<NodeTree> {
    let path = path.as_ref();
    log::info!("Loading model from {:?}", path);
    let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    import(&bytes, path.parent())
}

/// Load a self-contained model (GLB or glTF with data URIs) from memory.
pub fn load_model_from_slice(bytes: &[u8]) -> AssetResult<NodeTree> {
    import(bytes, None)
}

/// Force `intensity` onto every node of the tree and make every mesh cast
/// and receive shadows.
pub fn prepare_model(tree: &mut NodeTree, intensity: f32) {
    tree.for_each_mut(&mut |node| {
        node.intensity = intensity;
        node.set_shadows(true, true);
    });
}

fn import(bytes: &[u8], base: Option<&Path>) -> AssetResult<NodeTree> {
    // Draco files fail validation with a generic message; name the cause.
    let unchecked = gltf::Gltf::from_slice_without_validation(bytes)?;
    if unchecked
        .document
        .extensions_required()
        .any(|ext| ext == DRACO_EXTENSION)
    {
        return Err(AssetError::Unsupported(DRACO_EXTENSION.to_owned()));
    }

    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes)?;
    let buffers = gltf::import_buffers(&document, base, blob)?;

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(AssetError::Empty)?;

    let children = scene
        .nodes()
        .map(|node| convert_node(&node, &buffers))
        .collect::<AssetResult<Vec<_>>>()?;
    if children.is_empty() {
        return Err(AssetError::Empty);
    }

    let tree = NodeTree {
        node: Node::group(scene.name().unwrap_or("Model")),
        children,
    };
    log::info!("Model imported: {} nodes", tree.node_count());
    Ok(tree)
}

fn convert_node(node: &gltf::Node<'_>, buffers: &[gltf::buffer::Data]) -> AssetResult<NodeTree> {
    let (t, r, s) = node.transform().decomposed();
    let transform = Transform::from_quat(Vec3::from(t), Quat::from_array(r), Vec3::from(s));
    let name = node
        .name()
        .map(str::to_owned)
        .unwrap_or_else(|| format!("node{}", node.index()));

    let mut children = Vec::new();
    let kind = match node.mesh() {
        Some(mesh) => {
            let mut primitives = read_primitives(&mesh, buffers)?;
            if primitives.len() == 1 {
                let (data, material) = primitives.remove(0);
                NodeKind::mesh(Arc::new(data), material)
            } else {
                // One mesh child per primitive under a group.
                children.extend(primitives.into_iter().enumerate().map(|(i, (data, material))| {
                    NodeTree::leaf(Node::new(
                        format!("{name}_{i}"),
                        NodeKind::mesh(Arc::new(data), material),
                    ))
                }));
                NodeKind::Group
            }
        }
        None => NodeKind::Group,
    };

    for child in node.children() {
        children.push(convert_node(&child, buffers)?);
    }

    Ok(NodeTree {
        node: Node::new(name, kind).with_transform(transform),
        children,
    })
}

fn read_primitives(
    mesh: &gltf::Mesh<'_>,
    buffers: &[gltf::buffer::Data],
) -> AssetResult<Vec<(MeshData, Material)>> {
    let mut out = Vec::new();
    for prim in mesh.primitives() {
        if prim.mode() != gltf::mesh::Mode::Triangles {
            log::warn!(
                "Skipping primitive {} of mesh {:?}: mode {:?}",
                prim.index(),
                mesh.name(),
                prim.mode()
            );
            continue;
        }

        let reader = prim.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));
        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .ok_or_else(|| AssetError::Unsupported("primitive without POSITION".into()))?
            .collect();
        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };
        let normals: Vec<[f32; 3]> = match reader.read_normals() {
            Some(normals) => normals.collect(),
            None => face_normals(&positions, &indices),
        };
        let uvs: Vec<[f32; 2]> = reader
            .read_tex_coords(0)
            .map(|uv| uv.into_f32().collect())
            .unwrap_or_default();

        let vertices = positions
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                MeshVertex::new(
                    p,
                    normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                    uvs.get(i).copied().unwrap_or([0.0, 0.0]),
                )
            })
            .collect();

        let pbr = prim.material().pbr_metallic_roughness();
        let [r, g, b, _] = pbr.base_color_factor();
        let material = Material {
            color: [r, g, b],
            roughness: pbr.roughness_factor(),
            metalness: pbr.metallic_factor(),
        };

        let data = MeshData::new(vertices, indices);
        if data.is_valid() {
            out.push((data, material));
        }
    }
    Ok(out)
}

/// Area-weighted vertex normals for primitives that ship without them.
fn face_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut acc = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let (pa, pb, pc) = (
            Vec3::from(positions[a]),
            Vec3::from(positions[b]),
            Vec3::from(positions[c]),
        );
        let n = (pb - pa).cross(pc - pa);
        acc[a] += n;
        acc[b] += n;
        acc[c] += n;
    }
    acc.into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // One triangle (0,0,0) (1,0,0) (0,1,0), no normals, no indices.
    const TRIANGLE_B64: &str = "AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAA";

    fn cottage_gltf(required_extensions: &str) -> String {
        format!(
            r#"{{
  "asset": {{ "version": "2.0" }},
  "extensionsRequired": [{required_extensions}],
  "extensionsUsed": [{required_extensions}],
  "scene": 0,
  "scenes": [{{ "name": "Cottage", "nodes": [0] }}],
  "nodes": [
    {{ "name": "House", "translation": [0.0, 0.5, 0.0], "children": [1, 2] }},
    {{ "name": "Roof", "mesh": 0 }},
    {{ "name": "Door", "mesh": 1 }}
  ],
  "meshes": [
    {{ "primitives": [{{ "attributes": {{ "POSITION": 0 }}, "material": 0 }}] }},
    {{ "primitives": [
        {{ "attributes": {{ "POSITION": 0 }} }},
        {{ "attributes": {{ "POSITION": 0 }} }}
    ] }}
  ],
  "materials": [
    {{ "pbrMetallicRoughness": {{ "baseColorFactor": [0.8, 0.2, 0.1, 1.0] }} }}
  ],
  "accessors": [{{
    "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
    "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
  }}],
  "bufferViews": [{{ "buffer": 0, "byteLength": 36 }}],
  "buffers": [{{
    "byteLength": 36,
    "uri": "data:application/octet-stream;base64,{TRIANGLE_B64}"
  }}]
}}"#
        )
    }

    #[test]
    fn imports_hierarchy_and_meshes() {
        let tree = load_model_from_slice(cottage_gltf("").as_bytes()).expect("import");
        assert_eq!(tree.node.name, "Cottage");
        assert_eq!(tree.children.len(), 1);

        let house = &tree.children[0];
        assert_eq!(house.node.name, "House");
        assert!((house.node.transform.translation.y - 0.5).abs() < 1e-6);
        assert_eq!(house.children.len(), 2);

        let roof = &house.children[0];
        match &roof.node.kind {
            NodeKind::Mesh { mesh, material, .. } => {
                assert_eq!(mesh.vertices.len(), 3);
                assert_eq!(mesh.indices, vec![0, 1, 2]);
                assert!((mesh.vertices[0].normal[2] - 1.0).abs() < 1e-6);
                assert!((material.color[0] - 0.8).abs() < 1e-6);
            }
            other => panic!("roof should be a mesh, got {other:?}"),
        }

        // Two primitives become a group with two mesh children.
        let door = &house.children[1];
        assert!(matches!(door.node.kind, NodeKind::Group));
        assert_eq!(door.children.len(), 2);
        assert!(door.children.iter().all(|c| c.node.kind.is_mesh()));
        assert_eq!(tree.node_count(), 6);
    }

    #[test]
    fn prepare_sets_intensity_and_shadows_everywhere() {
        let mut tree = load_model_from_slice(cottage_gltf("").as_bytes()).expect("import");
        prepare_model(&mut tree, 80.0);
        let mut meshes = 0;
        tree.for_each_mut(&mut |node| {
            assert_eq!(node.intensity, 80.0);
            if let NodeKind::Mesh {
                cast_shadow,
                receive_shadow,
                ..
            } = node.kind
            {
                assert!(cast_shadow && receive_shadow);
                meshes += 1;
            }
        });
        assert_eq!(meshes, 3);
    }

    #[test]
    fn draco_models_are_rejected() {
        let src = cottage_gltf(r#""KHR_draco_mesh_compression""#);
        let err = load_model_from_slice(src.as_bytes()).unwrap_err();
        assert!(matches!(err, AssetError::Unsupported(ref ext) if ext == DRACO_EXTENSION));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_model("/definitely/not/here/cottage.glb").unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }

    #[test]
    fn garbage_is_gltf_error() {
        let err = load_model_from_slice(b"not a model").unwrap_err();
        assert!(matches!(err, AssetError::Gltf(_)));
    }
}
