use cgmath::Point3;
use orbit_stage::camera::{Camera, TrackballController};
use winit::event::MouseButton;
use winit::keyboard::KeyCode;

fn rig() -> (Camera, TrackballController) {
    (
        Camera::new((0.0, 0.0, 40.0), (0.0, 0.0, 0.0)),
        TrackballController::default(),
    )
}

fn assert_close(actual: Point3<f32>, expected: Point3<f32>) {
    for (a, e) in [
        (actual.x, expected.x),
        (actual.y, expected.y),
        (actual.z, expected.z),
    ] {
        assert!((a - e).abs() < 1e-3, "{:?} != {:?}", actual, expected);
    }
}

#[test]
fn left_drag_orbits_without_changing_the_radius() {
    let (mut camera, mut controller) = rig();

    controller.mouse_pressed(MouseButton::Left, true);
    controller.handle_mouse(120.0, -45.0);
    controller.update(&mut camera);

    assert!((camera.radius() - 40.0).abs() < 1e-3);
    assert!(camera.position != Point3::new(0.0, 0.0, 40.0));
    assert_eq!(camera.target, Point3::new(0.0, 0.0, 0.0));
}

#[test]
fn scrolling_in_and_back_out_restores_the_radius() {
    let (mut camera, mut controller) = rig();

    controller.scroll(2.0);
    controller.update(&mut camera);
    let zoomed_in = camera.radius();
    assert!(zoomed_in < 40.0);

    controller.scroll(-2.0);
    controller.update(&mut camera);
    assert!((camera.radius() - 40.0).abs() < 1e-2);
}

#[test]
fn right_drag_pans_the_target_and_keeps_the_radius() {
    let (mut camera, mut controller) = rig();

    controller.mouse_pressed(MouseButton::Right, true);
    controller.handle_mouse(60.0, -25.0);
    controller.update(&mut camera);

    assert!(camera.target != Point3::new(0.0, 0.0, 0.0));
    assert!((camera.radius() - 40.0).abs() < 1e-3);
}

#[test]
fn update_reconciles_pending_input_exactly_once() {
    let (mut camera, mut controller) = rig();

    controller.mouse_pressed(MouseButton::Left, true);
    controller.handle_mouse(200.0, 80.0);
    controller.update(&mut camera);
    let after_first = camera.position;

    // No new input: a second reconciliation must not move the camera again.
    controller.update(&mut camera);
    assert_close(camera.position, after_first);
}

#[test]
fn the_rotate_key_routes_plain_mouse_motion() {
    let (mut camera, mut controller) = rig();

    // No button held; the A key alone forces rotation.
    controller.key(KeyCode::KeyA, true);
    controller.handle_mouse(90.0, 0.0);
    controller.update(&mut camera);

    assert!(camera.position != Point3::new(0.0, 0.0, 40.0));
    assert!((camera.radius() - 40.0).abs() < 1e-3);
}

#[test]
fn motion_without_a_gesture_is_ignored() {
    let (mut camera, mut controller) = rig();

    controller.mouse_pressed(MouseButton::Left, true);
    controller.mouse_pressed(MouseButton::Left, false);
    controller.handle_mouse(300.0, 300.0);
    controller.update(&mut camera);

    assert_close(camera.position, Point3::new(0.0, 0.0, 40.0));
    assert_eq!(camera.target, Point3::new(0.0, 0.0, 0.0));
}
