//! GPU-side halves of scene nodes: buffers, bind groups and draw calls.

use wgpu::util::DeviceExt;

use crate::scene::{Material, Primitive, Topology, Transform, texture::Texture};

/// Types that can describe their vertex-buffer layout to a pipeline.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct MaterialUniform {
    base_color: [f32; 4],
}

/// One uploaded primitive: vertex/index buffers plus the material bind group
/// (diffuse texture, sampler, colour factor).
#[derive(Debug)]
pub struct PrimitiveGpu {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
    pub topology: Topology,
    pub bind_group: wgpu::BindGroup,
}

/// GPU state of a whole node: its one-element instance buffer and its
/// uploaded primitives.
#[derive(Debug)]
pub struct NodeGpu {
    pub instance_buffer: wgpu::Buffer,
    pub primitives: Vec<PrimitiveGpu>,
}

impl NodeGpu {
    pub(crate) fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &str,
        transform: &Transform,
        primitives: &[Primitive],
        material_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Instance Buffer", name)),
            contents: bytemuck::cast_slice(&[transform.to_raw()]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let primitives = primitives
            .iter()
            .filter(|primitive| {
                if primitive.geometry.indices.is_empty() {
                    log::warn!("you attempted to upload a primitive of {} with no indices", name);
                    return false;
                }
                true
            })
            .map(|primitive| {
                let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{:?} Vertex Buffer", name)),
                    contents: bytemuck::cast_slice(&primitive.geometry.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{:?} Index Buffer", name)),
                    contents: bytemuck::cast_slice(&primitive.geometry.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
                let bind_group =
                    material_bind_group(device, queue, &primitive.material, material_layout);
                PrimitiveGpu {
                    vertex_buffer,
                    index_buffer,
                    num_indices: primitive.geometry.indices.len() as u32,
                    topology: primitive.geometry.topology,
                    bind_group,
                }
            })
            .collect();

        Self {
            instance_buffer,
            primitives,
        }
    }

    /// Push the node's current transform to the GPU. Called once per frame
    /// for every node, so setup code and the update can mutate transforms
    /// freely in between.
    pub(crate) fn write_transform(&self, queue: &wgpu::Queue, transform: &Transform) {
        queue.write_buffer(
            &self.instance_buffer,
            0,
            bytemuck::cast_slice(&[transform.to_raw()]),
        );
    }
}

fn material_bind_group(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    material: &Material,
    layout: &wgpu::BindGroupLayout,
) -> wgpu::BindGroup {
    let diffuse = match &material.diffuse {
        Some(img) => Texture::from_rgba8(device, queue, img, Some(&material.name)),
        None => Texture::create_solid_white(device, queue),
    };
    let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{:?} Material Buffer", material.name)),
        contents: bytemuck::cast_slice(&[MaterialUniform {
            base_color: material.base_color,
        }]),
        usage: wgpu::BufferUsages::UNIFORM,
    });
    let sampler = diffuse
        .sampler
        .unwrap_or_else(|| texture_sampler_fallback(device));

    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&diffuse.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: uniform_buffer.as_entire_binding(),
            },
        ],
        label: Some("material_bind_group"),
    })
}

fn texture_sampler_fallback(device: &wgpu::Device) -> wgpu::Sampler {
    crate::scene::texture::create_default_sampler(device)
}

/// Render-pass extension for drawing uploaded nodes.
pub trait DrawNode<'a> {
    /// Draws every primitive of `node` whose topology matches the currently
    /// bound pipeline.
    fn draw_node_primitives(
        &mut self,
        node: &'a NodeGpu,
        topology: Topology,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    );
}

impl<'a, 'b> DrawNode<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_node_primitives(
        &mut self,
        node: &'b NodeGpu,
        topology: Topology,
        camera_bind_group: &'b wgpu::BindGroup,
        light_bind_group: &'b wgpu::BindGroup,
    ) {
        for primitive in node.primitives.iter().filter(|p| p.topology == topology) {
            self.set_vertex_buffer(0, primitive.vertex_buffer.slice(..));
            self.set_vertex_buffer(1, node.instance_buffer.slice(..));
            self.set_index_buffer(primitive.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            self.set_bind_group(0, &primitive.bind_group, &[]);
            self.set_bind_group(1, camera_bind_group, &[]);
            self.set_bind_group(2, light_bind_group, &[]);
            self.draw_indexed(0..primitive.num_indices, 0, 0..1);
        }
    }
}
