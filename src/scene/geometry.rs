//! CPU-side geometry and the builders the demo scene is assembled from.
//!
//! Geometry stays plain data until [`crate::scene::SceneNode::upload`] turns
//! it into vertex/index buffers, which keeps scene assembly testable without
//! a GPU device.

use cgmath::Vector3;

use crate::scene::gpu::Vertex;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex for MeshVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// How the index buffer is interpreted when drawing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Topology {
    TriangleList,
    LineStrip,
}

#[derive(Clone, Debug)]
pub struct Geometry {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    pub topology: Topology,
}

impl Geometry {
    pub fn empty(topology: Topology) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            topology,
        }
    }

    /// An axis-aligned box centred on the origin with per-face normals and
    /// 0..1 texture coordinates per face.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let (hw, hh, hd) = (width / 2.0, height / 2.0, depth / 2.0);
        // (position, normal) per face corner, counter-clockwise seen from
        // outside; uv corners follow the corner order below.
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            // +z
            (
                [0.0, 0.0, 1.0],
                [
                    [-hw, -hh, hd],
                    [hw, -hh, hd],
                    [hw, hh, hd],
                    [-hw, hh, hd],
                ],
            ),
            // -z
            (
                [0.0, 0.0, -1.0],
                [
                    [hw, -hh, -hd],
                    [-hw, -hh, -hd],
                    [-hw, hh, -hd],
                    [hw, hh, -hd],
                ],
            ),
            // +x
            (
                [1.0, 0.0, 0.0],
                [
                    [hw, -hh, hd],
                    [hw, -hh, -hd],
                    [hw, hh, -hd],
                    [hw, hh, hd],
                ],
            ),
            // -x
            (
                [-1.0, 0.0, 0.0],
                [
                    [-hw, -hh, -hd],
                    [-hw, -hh, hd],
                    [-hw, hh, hd],
                    [-hw, hh, -hd],
                ],
            ),
            // +y
            (
                [0.0, 1.0, 0.0],
                [
                    [-hw, hh, hd],
                    [hw, hh, hd],
                    [hw, hh, -hd],
                    [-hw, hh, -hd],
                ],
            ),
            // -y
            (
                [0.0, -1.0, 0.0],
                [
                    [-hw, -hh, -hd],
                    [hw, -hh, -hd],
                    [hw, -hh, hd],
                    [-hw, -hh, hd],
                ],
            ),
        ];
        let uvs = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, corners) in faces {
            let base = vertices.len() as u32;
            for (corner, uv) in corners.into_iter().zip(uvs) {
                vertices.push(MeshVertex {
                    position: corner,
                    normal,
                    tex_coords: uv,
                });
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self {
            vertices,
            indices,
            topology: Topology::TriangleList,
        }
    }

    /// A line strip through the given points, in order.
    pub fn polyline(points: &[Vector3<f32>]) -> Self {
        let vertices = points
            .iter()
            .map(|p| MeshVertex {
                position: [p.x, p.y, p.z],
                normal: [0.0, 0.0, 0.0],
                tex_coords: [0.0, 0.0],
            })
            .collect::<Vec<_>>();
        let indices = (0..points.len() as u32).collect();

        Self {
            vertices,
            indices,
            topology: Topology::LineStrip,
        }
    }

    /// Bakes a translation into the vertex positions.
    pub fn translated<V: Into<Vector3<f32>>>(mut self, offset: V) -> Self {
        let offset = offset.into();
        for vertex in &mut self.vertices {
            vertex.position[0] += offset.x;
            vertex.position[1] += offset.y;
            vertex.position[2] += offset.z;
        }
        self
    }

    /// Appends `other`, rebasing its indices. Both sides must share a
    /// topology.
    pub fn merge(&mut self, other: Geometry) {
        debug_assert_eq!(self.topology, other.topology);
        let base = self.vertices.len() as u32;
        self.vertices.extend(other.vertices);
        self.indices.extend(other.indices.into_iter().map(|i| i + base));
    }
}
