use crate::{
    pipelines::mk_render_pipeline,
    scene::{
        geometry::MeshVertex,
        gpu::Vertex,
        texture::Texture,
        transform::TransformRaw,
    },
};

/// The unlit line pipeline. It shares the mesh pipeline's bind-group layouts
/// so draw code binds material/camera/light identically; the shader only
/// reads the base-colour factor.
pub fn mk_line_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    material_layout: &wgpu::BindGroupLayout,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    light_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Line Pipeline Layout"),
        bind_group_layouts: &[
            material_layout,
            camera_bind_group_layout,
            light_bind_group_layout,
        ],
        push_constant_ranges: &[],
    });

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Line Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("line_shader.wgsl").into()),
    };

    mk_render_pipeline(
        device,
        &layout,
        config.format,
        Some(wgpu::BlendState {
            alpha: wgpu::BlendComponent::REPLACE,
            color: wgpu::BlendComponent::REPLACE,
        }),
        Some(Texture::DEPTH_FORMAT),
        wgpu::PrimitiveTopology::LineStrip,
        &[MeshVertex::desc(), TransformRaw::desc()],
        shader,
    )
}
