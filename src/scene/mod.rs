//! The scene graph: one root container owning an ordered set of nodes.
//!
//! Nodes are plain CPU data until [`SceneNode::upload`] creates their GPU
//! half, so a scene can be assembled, inspected and mutated without a device.
//! The root owns all children for rendering purposes; nothing else holds a
//! competing ownership claim.

pub mod geometry;
pub mod gpu;
pub mod texture;
pub mod transform;

use cgmath::Vector3;
use image::RgbaImage;

pub use geometry::{Geometry, MeshVertex, Topology};
pub use transform::{Transform, TransformRaw};

use crate::scene::gpu::NodeGpu;

/// Stable handle to a node inside a [`SceneRoot`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Converts `0xRRGGBB` into the float quadruple the shaders consume.
pub fn rgb(hex: u32) -> [f32; 4] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
        1.0,
    ]
}

/// Converts `0xRRGGBB` into a clear colour.
pub fn rgb_clear_colour(hex: u32) -> wgpu::Color {
    let [r, g, b, a] = rgb(hex);
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: a as f64,
    }
}

/// Shading description: a base colour factor and an optional diffuse map.
/// The two multiply in the shader, so untextured materials are just a colour
/// over the built-in white texture.
#[derive(Clone, Debug)]
pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
    pub diffuse: Option<RgbaImage>,
}

impl Material {
    pub fn solid(name: &str, base_color: [f32; 4]) -> Self {
        Self {
            name: name.to_string(),
            base_color,
            diffuse: None,
        }
    }
}

/// A shape/shading pair; a node renders one or more of these.
#[derive(Clone, Debug)]
pub struct Primitive {
    pub geometry: Geometry,
    pub material: Material,
}

/// A point light: colour, intensity and the range beyond which its
/// contribution falls to zero. Its position comes from the node transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub color: [f32; 3],
    pub intensity: f32,
    pub range: f32,
}

#[derive(Debug)]
pub enum NodeContent {
    /// Triangle primitives shaded by the lit mesh pipeline.
    Mesh { primitives: Vec<Primitive> },
    /// Like `Mesh`, but derived from a string; the source text is kept.
    Text {
        content: String,
        primitives: Vec<Primitive>,
    },
    /// A single line-strip primitive drawn by the unlit line pipeline.
    Line { primitive: Primitive },
    /// Contributes illumination instead of geometry.
    Light(PointLight),
}

#[derive(Debug)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub content: NodeContent,
    pub(crate) gpu: Option<NodeGpu>,
}

impl SceneNode {
    pub fn mesh(name: &str, primitives: Vec<Primitive>, transform: Transform) -> Self {
        Self {
            name: name.to_string(),
            transform,
            content: NodeContent::Mesh { primitives },
            gpu: None,
        }
    }

    pub fn text(content: &str, geometry: Geometry, material: Material, transform: Transform) -> Self {
        Self {
            name: content.to_string(),
            transform,
            content: NodeContent::Text {
                content: content.to_string(),
                primitives: vec![Primitive { geometry, material }],
            },
            gpu: None,
        }
    }

    pub fn line(name: &str, geometry: Geometry, material: Material, transform: Transform) -> Self {
        Self {
            name: name.to_string(),
            transform,
            content: NodeContent::Line {
                primitive: Primitive { geometry, material },
            },
            gpu: None,
        }
    }

    pub fn light(name: &str, light: PointLight, position: Vector3<f32>) -> Self {
        Self {
            name: name.to_string(),
            transform: Transform::at(position),
            content: NodeContent::Light(light),
            gpu: None,
        }
    }

    /// The text this node was derived from, if it is a text node.
    pub fn text_content(&self) -> Option<&str> {
        match &self.content {
            NodeContent::Text { content, .. } => Some(content),
            _ => None,
        }
    }

    pub fn primitives(&self) -> &[Primitive] {
        match &self.content {
            NodeContent::Mesh { primitives } | NodeContent::Text { primitives, .. } => primitives,
            NodeContent::Line { primitive } => std::slice::from_ref(primitive),
            NodeContent::Light(_) => &[],
        }
    }

    pub fn is_light(&self) -> bool {
        matches!(self.content, NodeContent::Light(_))
    }

    /// Creates the node's GPU half if it does not exist yet. Light nodes
    /// upload nothing; their values travel in the light uniform instead.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        material_layout: &wgpu::BindGroupLayout,
    ) {
        if self.gpu.is_some() || self.is_light() {
            return;
        }
        self.gpu = Some(NodeGpu::new(
            device,
            queue,
            &self.name,
            &self.transform,
            self.primitives(),
            material_layout,
        ));
    }

    pub(crate) fn gpu(&self) -> Option<&NodeGpu> {
        self.gpu.as_ref()
    }
}

/// The top-level container holding all objects to be drawn, in insertion
/// order, plus the background clear colour.
#[derive(Debug)]
pub struct SceneRoot {
    nodes: Vec<SceneNode>,
    pub background: wgpu::Color,
}

impl SceneRoot {
    pub fn new(background: wgpu::Color) -> Self {
        Self {
            nodes: Vec::new(),
            background,
        }
    }

    pub fn add(&mut self, node: SceneNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &SceneNode> {
        self.nodes.iter()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut SceneNode> {
        self.nodes.iter_mut()
    }

    /// The light the shaders see. The demo scene carries exactly one; if
    /// several are present the first wins.
    pub fn first_light(&self) -> Option<(&Transform, &PointLight)> {
        self.nodes.iter().find_map(|node| match &node.content {
            NodeContent::Light(light) => Some((&node.transform, light)),
            _ => None,
        })
    }

    /// Uploads every node that has no GPU half yet.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        material_layout: &wgpu::BindGroupLayout,
    ) {
        for node in &mut self.nodes {
            node.upload(device, queue, material_layout);
        }
    }

    /// Pushes every node's current transform to its instance buffer.
    pub fn write_to_buffers(&self, queue: &wgpu::Queue) {
        for node in &self.nodes {
            if let Some(gpu) = node.gpu() {
                gpu.write_transform(queue, &node.transform);
            }
        }
    }
}
