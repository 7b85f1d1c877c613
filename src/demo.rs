//! The fixed demo scene: a spinning green cube, a blue polyline and a white
//! point light from startup, plus 3D text and a glTF model spliced in when
//! their loads resolve. Everything here is configuration; the machinery
//! lives in the other modules.

use cgmath::{Rad, Vector3};
use fontdue::Font;

use crate::{
    app::{AssetLoad, StageSetup},
    resources::font::text_geometry,
    scene::{
        Geometry, Material, NodeId, PointLight, Primitive, SceneNode, SceneRoot, Transform, rgb,
        rgb_clear_colour,
    },
};

/// Background grey behind the scene.
pub const BACKGROUND: u32 = 0xCCCCCC;
/// Radians added to the cube's x and y rotation every frame.
pub const SPIN_STEP: f32 = 0.01;

const CUBE_COLOR: u32 = 0x00ff00;
const CUBE_SIZE: f32 = 5.0;
const CUBE_OFFSET: (f32, f32, f32) = (-10.0, -2.0, 0.0);

const LINE_COLOR: u32 = 0x0000ff;
const LINE_POINTS: [(f32, f32, f32); 4] = [
    (-5.0, -10.0, 10.0),
    (5.0, -5.0, 5.0),
    (10.0, 0.0, 0.0),
    (-5.0, -5.0, -5.0),
];

const LIGHT_POSITION: (f32, f32, f32) = (50.0, 50.0, 50.0);
const LIGHT_INTENSITY: f32 = 5.0;
const LIGHT_RANGE: f32 = 5000.0;

pub const FONT_PATH: &str = "fonts/gentilis_bold.ttf";
const TEXT: &str = "Example";
const TEXT_COLOR: u32 = 0xff0000;
const TEXT_SIZE: f32 = 2.0;
const TEXT_DEPTH: f32 = 2.0;
const TEXT_OFFSET: (f32, f32, f32) = (-5.0, -20.0, 0.0);
const TEXT_Z_ROTATION: f32 = 1.0;

pub const MODEL_PATH: &str = "models/inspector-car/scene.gltf";
pub const MODEL_SCALE: f32 = 0.02;
pub const MODEL_X_ROTATION: f32 = 0.5;

pub fn cube_node() -> SceneNode {
    // The offset is baked into the geometry so the spin still happens about
    // the node origin.
    let geometry = Geometry::cuboid(CUBE_SIZE, CUBE_SIZE, CUBE_SIZE).translated(CUBE_OFFSET);
    let material = Material::solid("cube", rgb(CUBE_COLOR));
    SceneNode::mesh("cube", vec![Primitive { geometry, material }], Transform::new())
}

pub fn line_node() -> SceneNode {
    let points = LINE_POINTS.map(Vector3::from);
    SceneNode::line(
        "line",
        Geometry::polyline(&points),
        Material::solid("line", rgb(LINE_COLOR)),
        Transform::new(),
    )
}

pub fn light_node() -> SceneNode {
    SceneNode::light(
        "light",
        PointLight {
            color: [1.0, 1.0, 1.0],
            intensity: LIGHT_INTENSITY,
            range: LIGHT_RANGE,
        },
        LIGHT_POSITION.into(),
    )
}

/// Derives the text node once the font has loaded.
pub fn text_node(font: &Font) -> SceneNode {
    let geometry = text_geometry(font, TEXT, TEXT_SIZE, TEXT_DEPTH).translated(TEXT_OFFSET);
    let mut transform = Transform::new();
    transform.rotation.z = Rad(TEXT_Z_ROTATION);
    SceneNode::text(
        TEXT,
        geometry,
        Material::solid("text", rgb(TEXT_COLOR)),
        transform,
    )
}

/// Places the loaded model: shrunk to scene scale and tilted about x.
pub fn prepare_model(node: &mut SceneNode) {
    node.transform.scale = Vector3::new(MODEL_SCALE, MODEL_SCALE, MODEL_SCALE);
    node.transform.rotation.x = Rad(MODEL_X_ROTATION);
}

/// The synchronous part of startup: cube, line and light, in that order.
/// Returns the cube's id so the per-frame update can spin it.
pub fn build_scene() -> (SceneRoot, NodeId) {
    let mut scene = SceneRoot::new(rgb_clear_colour(BACKGROUND));
    let cube = scene.add(cube_node());
    scene.add(line_node());
    scene.add(light_node());
    (scene, cube)
}

/// The per-frame mutation: advance the cube's x and y rotation.
pub fn spin_cube(scene: &mut SceneRoot, cube: NodeId) {
    if let Some(node) = scene.get_mut(cube) {
        node.transform.rotation.x += Rad(SPIN_STEP);
        node.transform.rotation.y += Rad(SPIN_STEP);
    }
}

pub fn stage_setup() -> StageSetup {
    let (scene, cube) = build_scene();
    StageSetup {
        scene,
        update: Box::new(move |scene| spin_cube(scene, cube)),
        loads: vec![
            AssetLoad::Font {
                path: FONT_PATH.to_string(),
                build: Box::new(|font| text_node(&font)),
            },
            AssetLoad::Model {
                path: MODEL_PATH.to_string(),
                prepare: Box::new(prepare_model),
            },
        ],
    }
}
