//! glTF model loading.
//!
//! Decodes one glTF scene — buffers, base-colour materials and mesh
//! primitives — into a single CPU-side [`SceneNode`], baking every glTF
//! node's transform into its vertices so the whole model hangs off one
//! transform in the scene root. Progress is reported as informational
//! percentage log lines while buffers and images are fetched.

use std::io::{BufReader, Cursor};

use cgmath::{InnerSpace, Matrix, Matrix3, Matrix4, SquareMatrix, Vector3, Vector4};
use gltf::Gltf;

use crate::scene::{Geometry, Material, MeshVertex, Primitive, SceneNode, Topology, Transform};

struct Progress {
    total: usize,
    done: usize,
}

impl Progress {
    fn new(total: usize) -> Self {
        Self { total, done: 0 }
    }

    fn step(&mut self, file_name: &str) {
        self.done += 1;
        if self.total > 0 {
            log::info!(
                "model {} loading... {:.2}%",
                file_name,
                self.done as f32 / self.total as f32 * 100.0
            );
        }
    }
}

/// Resolves a URI referenced by a glTF file against that file's directory.
fn sibling_path(file_name: &str, uri: &str) -> String {
    match file_name.rsplit_once('/') {
        Some((dir, _)) => format!("{}/{}", dir, uri),
        None => uri.to_string(),
    }
}

pub async fn load_gltf_node(file_name: &str) -> anyhow::Result<SceneNode> {
    let gltf_bytes = super::load_binary(file_name).await?;
    let gltf_cursor = Cursor::new(gltf_bytes);
    let gltf_reader = BufReader::new(gltf_cursor);
    let gltf = Gltf::from_reader(gltf_reader)?;

    let mut progress = Progress::new(gltf.buffers().count() + gltf.materials().count());

    // Load buffers
    let mut buffer_data: Vec<Vec<u8>> = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                if let Some(blob) = gltf.blob.as_deref() {
                    buffer_data.push(blob.into());
                }
            }
            gltf::buffer::Source::Uri(uri) => {
                let bin = super::load_binary(&sibling_path(file_name, uri)).await?;
                buffer_data.push(bin);
            }
        }
        progress.step(file_name);
    }

    // Load materials; only the base colour (factor and optional texture)
    // matters to the scene shader.
    let mut materials = Vec::new();
    for material in gltf.materials() {
        let pbr = material.pbr_metallic_roughness();
        let name = material.name().unwrap_or("unnamed material").to_string();
        let diffuse = match pbr.base_color_texture() {
            Some(info) => {
                let owned;
                let bytes: &[u8] = match info.texture().source().source() {
                    gltf::image::Source::View { view, .. } => {
                        let data = &buffer_data[view.buffer().index()];
                        &data[view.offset()..view.offset() + view.length()]
                    }
                    gltf::image::Source::Uri { uri, .. } => {
                        owned = super::load_binary(&sibling_path(file_name, uri)).await?;
                        &owned
                    }
                };
                Some(image::load_from_memory(bytes)?.to_rgba8())
            }
            None => None,
        };
        materials.push(Material {
            name,
            base_color: pbr.base_color_factor(),
            diffuse,
        });
        progress.step(file_name);
    }

    // Flatten the node tree into primitives with baked transforms.
    let mut primitives = Vec::new();
    for scene in gltf.scenes() {
        for node in scene.nodes() {
            flatten_node(&node, Matrix4::identity(), &buffer_data, &materials, &mut primitives);
        }
    }
    if primitives.is_empty() {
        log::warn!("model {} contains no mesh primitives", file_name);
    }

    Ok(SceneNode::mesh(file_name, primitives, Transform::new()))
}

fn flatten_node(
    node: &gltf::Node<'_>,
    parent: Matrix4<f32>,
    buffer_data: &[Vec<u8>],
    materials: &[Material],
    out: &mut Vec<Primitive>,
) {
    let matrix = parent * Matrix4::from(node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| Some(&buffer_data[buffer.index()]));

            let mut vertices = Vec::new();
            if let Some(positions) = reader.read_positions() {
                for position in positions {
                    vertices.push(MeshVertex {
                        position,
                        normal: Default::default(),
                        tex_coords: Default::default(),
                    });
                }
            }
            if let Some(normals) = reader.read_normals() {
                for (i, normal) in normals.enumerate() {
                    if let Some(vertex) = vertices.get_mut(i) {
                        vertex.normal = normal;
                    }
                }
            }
            if let Some(tex_coords) = reader.read_tex_coords(0).map(|uvs| uvs.into_f32()) {
                for (i, uv) in tex_coords.enumerate() {
                    if let Some(vertex) = vertices.get_mut(i) {
                        vertex.tex_coords = uv;
                    }
                }
            }

            let mut indices: Vec<u32> = reader
                .read_indices()
                .map(|raw| raw.into_u32().collect())
                .unwrap_or_default();
            if indices.is_empty() {
                indices = (0..vertices.len() as u32).collect();
            }

            bake_transform(&mut vertices, matrix);

            let material = primitive
                .material()
                .index()
                .and_then(|i| materials.get(i))
                .cloned()
                .unwrap_or_else(|| Material::solid("default", [1.0, 1.0, 1.0, 1.0]));

            out.push(Primitive {
                geometry: Geometry {
                    vertices,
                    indices,
                    topology: Topology::TriangleList,
                },
                material,
            });
        }
    }

    for child in node.children() {
        flatten_node(&child, matrix, buffer_data, materials, out);
    }
}

fn bake_transform(vertices: &mut [MeshVertex], matrix: Matrix4<f32>) {
    if matrix == Matrix4::identity() {
        return;
    }
    let normal_matrix =
        Matrix3::from_cols(matrix.x.truncate(), matrix.y.truncate(), matrix.z.truncate())
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(Matrix3::identity);
    for vertex in vertices {
        let [x, y, z] = vertex.position;
        let position = matrix * Vector4::new(x, y, z, 1.0);
        vertex.position = [position.x, position.y, position.z];
        let normal = normal_matrix * Vector3::from(vertex.normal);
        if normal.magnitude2() > 0.0 {
            vertex.normal = normal.normalize().into();
        }
    }
}
