use cgmath::{Rad, Vector3};
use orbit_stage::{
    app::{AssetKind, PendingAssets},
    demo,
    scene::{Geometry, Material, NodeContent, SceneNode, Transform, rgb},
};

fn sample_text_node() -> SceneNode {
    SceneNode::text(
        "Example",
        Geometry::cuboid(1.0, 1.0, 1.0),
        Material::solid("text", rgb(0xff0000)),
        Transform::new(),
    )
}

fn sample_model_node() -> SceneNode {
    SceneNode::mesh("model", Vec::new(), Transform::new())
}

#[test]
fn startup_scene_contains_cube_line_and_light_in_order() {
    let (scene, _) = demo::build_scene();

    assert_eq!(scene.len(), 3);
    let names: Vec<&str> = scene.nodes().map(|node| node.name.as_str()).collect();
    assert_eq!(names, ["cube", "line", "light"]);

    let mut nodes = scene.nodes();
    assert!(matches!(nodes.next().unwrap().content, NodeContent::Mesh { .. }));
    assert!(matches!(nodes.next().unwrap().content, NodeContent::Line { .. }));
    assert!(matches!(nodes.next().unwrap().content, NodeContent::Light(_)));
}

#[test]
fn the_startup_light_is_positioned_and_white() {
    let (scene, _) = demo::build_scene();
    let (transform, light) = scene.first_light().expect("scene carries a light");
    assert_eq!(transform.position, Vector3::new(50.0, 50.0, 50.0));
    assert_eq!(light.color, [1.0, 1.0, 1.0]);
    assert_eq!(light.intensity, 5.0);
    assert_eq!(light.range, 5000.0);
}

#[test]
fn resolving_the_font_adds_exactly_one_text_node() {
    let (mut scene, _) = demo::build_scene();
    let mut pending = PendingAssets::default();

    let id = pending
        .adopt(AssetKind::Font, &mut scene, sample_text_node())
        .expect("first adoption succeeds");

    assert_eq!(scene.len(), 4);
    assert_eq!(scene.get(id).unwrap().text_content(), Some("Example"));
}

#[test]
fn resolving_the_model_applies_scale_and_tilt() {
    let (mut scene, _) = demo::build_scene();
    let mut node = sample_model_node();
    demo::prepare_model(&mut node);

    let mut pending = PendingAssets::default();
    let id = pending
        .adopt(AssetKind::Model, &mut scene, node)
        .expect("first adoption succeeds");

    assert_eq!(scene.len(), 4);
    let node = scene.get(id).unwrap();
    assert_eq!(node.transform.scale, Vector3::new(0.02, 0.02, 0.02));
    assert_eq!(node.transform.rotation.x, Rad(0.5));
    assert_eq!(node.transform.rotation.y, Rad(0.0));
    assert_eq!(node.transform.rotation.z, Rad(0.0));
}

#[test]
fn failed_model_load_leaves_the_scene_untouched() {
    let (mut scene, _) = demo::build_scene();
    let mut pending = PendingAssets::default();

    pending.fail(AssetKind::Model, "asset not found");
    assert_eq!(scene.len(), 3);

    // A late success after the recorded failure is discarded too.
    let adopted = pending.adopt(AssetKind::Model, &mut scene, sample_model_node());
    assert!(adopted.is_none());
    assert_eq!(scene.len(), 3);
}

#[test]
fn an_asset_is_adopted_at_most_once() {
    let (mut scene, _) = demo::build_scene();
    let mut pending = PendingAssets::default();

    assert!(
        pending
            .adopt(AssetKind::Font, &mut scene, sample_text_node())
            .is_some()
    );
    assert!(
        pending
            .adopt(AssetKind::Font, &mut scene, sample_text_node())
            .is_none()
    );
    assert_eq!(scene.len(), 4);

    // The model slot is independent of the font slot.
    assert!(
        pending
            .adopt(AssetKind::Model, &mut scene, sample_model_node())
            .is_some()
    );
    assert_eq!(scene.len(), 5);
}
