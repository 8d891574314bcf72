//! CPU-side geometry: indexed triangle meshes and point clouds.

use std::f32::consts::TAU;

use rand::Rng;

/// Vertex with position/normal/uv. Values are in object space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Indexed triangle mesh with tightly-packed vertices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Returns `true` if both vertex and index buffers are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.vertices.is_empty() && !self.indices.is_empty()
    }

    /// Axis-aligned box centred on the origin, one quad per face.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let (hx, hy, hz) = (width * 0.5, height * 0.5, depth * 0.5);
        // (normal, u axis, v axis) per face
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ];
        let half = [hx, hy, hz];
        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (n, u, v) in faces {
            let base = vertices.len() as u32;
            for (su, sv) in [(-1.0f32, -1.0f32), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let mut p = [0.0f32; 3];
                for k in 0..3 {
                    p[k] = (n[k] + u[k] * su + v[k] * sv) * half[k];
                }
                vertices.push(MeshVertex::new(p, n, [(su + 1.0) * 0.5, (sv + 1.0) * 0.5]));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self::new(vertices, indices)
    }

    /// Flat quad in the XZ plane facing +Y.
    pub fn plane(width: f32, depth: f32) -> Self {
        let (hx, hz) = (width * 0.5, depth * 0.5);
        let n = [0.0, 1.0, 0.0];
        let vertices = vec![
            MeshVertex::new([-hx, 0.0, hz], n, [0.0, 0.0]),
            MeshVertex::new([hx, 0.0, hz], n, [1.0, 0.0]),
            MeshVertex::new([hx, 0.0, -hz], n, [1.0, 1.0]),
            MeshVertex::new([-hx, 0.0, -hz], n, [0.0, 1.0]),
        ];
        Self::new(vertices, vec![0, 1, 2, 0, 2, 3])
    }

    /// Torus around the Z axis.
    pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Self {
        let radial = radial_segments.max(3);
        let tubular = tubular_segments.max(3);
        let mut vertices = Vec::with_capacity(((radial + 1) * (tubular + 1)) as usize);
        for j in 0..=radial {
            let v = j as f32 / radial as f32 * TAU;
            for i in 0..=tubular {
                let u = i as f32 / tubular as f32 * TAU;
                let centre = [radius * u.cos(), radius * u.sin(), 0.0];
                let p = [
                    (radius + tube * v.cos()) * u.cos(),
                    (radius + tube * v.cos()) * u.sin(),
                    tube * v.sin(),
                ];
                let d = [p[0] - centre[0], p[1] - centre[1], p[2] - centre[2]];
                let len = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt().max(1e-6);
                vertices.push(MeshVertex::new(
                    p,
                    [d[0] / len, d[1] / len, d[2] / len],
                    [i as f32 / tubular as f32, j as f32 / radial as f32],
                ));
            }
        }
        let mut indices = Vec::with_capacity((radial * tubular * 6) as usize);
        for j in 1..=radial {
            for i in 1..=tubular {
                let a = (tubular + 1) * j + i - 1;
                let b = (tubular + 1) * (j - 1) + i - 1;
                let c = (tubular + 1) * (j - 1) + i;
                let d = (tubular + 1) * j + i;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }
        Self::new(vertices, indices)
    }
}

/// Point cloud rendered as individual points.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointCloud {
    pub positions: Vec<[f32; 3]>,
    pub color: [f32; 3],
    pub size: f32,
}

impl PointCloud {
    /// Sample `count` points uniformly in direction on a spherical shell
    /// with radius in `[inner, outer]`.
    pub fn sphere_shell(rng: &mut impl Rng, count: usize, inner: f32, outer: f32) -> Vec<[f32; 3]> {
        let (lo, hi) = if inner <= outer { (inner, outer) } else { (outer, inner) };
        (0..count)
            .map(|_| {
                let theta = rng.gen_range(0.0..TAU);
                let cos_phi: f32 = rng.gen_range(-1.0..=1.0);
                let sin_phi = (1.0 - cos_phi * cos_phi).max(0.0).sqrt();
                let r = if hi > lo { rng.gen_range(lo..=hi) } else { lo };
                [
                    r * sin_phi * theta.cos(),
                    r * cos_phi,
                    r * sin_phi * theta.sin(),
                ]
            })
            .collect()
    }
}
