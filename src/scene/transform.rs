//! Node transformation data and its GPU form.
//!
//! Each scene node carries one [`Transform`] that is packed into a
//! one-element instance buffer, so the shaders receive a model matrix and a
//! normal matrix through the instancing slot.

use cgmath::{Euler, Matrix3, Matrix4, Rad, Vector3};

use crate::scene::gpu::Vertex;

/// Position, per-axis Euler rotation (radians) and per-axis scale.
///
/// Rotations are kept as plain Euler angles rather than a quaternion because
/// setup code and the per-frame update mutate individual axes directly (the
/// cube spins by a fixed x/y increment, the loaded model is tilted about x).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Euler<Rad<f32>>,
    pub scale: Vector3<f32>,
}

impl Transform {
    /// Identity transform: no move, rotate or scale.
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Euler::new(Rad(0.0), Rad(0.0), Rad(0.0)),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn at<V: Into<Vector3<f32>>>(position: V) -> Self {
        Self {
            position: position.into(),
            ..Self::new()
        }
    }

    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn to_raw(&self) -> TransformRaw {
        TransformRaw {
            model: self.to_matrix().into(),
            normal: Matrix3::from(self.rotation).into(),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

/**
 * The raw transform is the actual per-instance data stored on the GPU.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 3]; 3],
}

impl Vertex for TransformRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<TransformRaw>() as wgpu::BufferAddress,
            // Advance per instance, not per vertex: every vertex of a node
            // reads the same model/normal matrix.
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                // A mat4 takes up four vertex slots, one vec4 each.
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // The normal matrix rides along as three vec3 rows.
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 19]>() as wgpu::BufferAddress,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 22]>() as wgpu::BufferAddress,
                    shader_location: 11,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}
