use cgmath::Rad;
use orbit_stage::{app::LoopState, demo};

#[test]
fn n_updates_rotate_the_cube_by_n_increments() {
    let (mut scene, cube) = demo::build_scene();
    let n = 100;
    for _ in 0..n {
        demo::spin_cube(&mut scene, cube);
    }

    let rotation = scene.get(cube).unwrap().transform.rotation;
    let expected = n as f32 * demo::SPIN_STEP;
    assert!((rotation.x.0 - expected).abs() < 1e-4);
    assert!((rotation.y.0 - expected).abs() < 1e-4);
    assert_eq!(rotation.z, Rad(0.0));
}

#[test]
fn the_update_leaves_every_other_node_alone() {
    let (mut scene, cube) = demo::build_scene();
    let before: Vec<_> = scene
        .nodes()
        .skip(1)
        .map(|node| node.transform)
        .collect();

    for _ in 0..10 {
        demo::spin_cube(&mut scene, cube);
    }

    let after: Vec<_> = scene
        .nodes()
        .skip(1)
        .map(|node| node.transform)
        .collect();
    assert_eq!(before, after);
}

#[test]
fn the_loop_runs_until_explicitly_stopped() {
    let mut loop_state = LoopState::default();
    assert!(loop_state.is_running());

    // One draw per frame while running, as the redraw handler does it.
    let mut draws = 0;
    for frame in 0..10 {
        if loop_state.is_running() {
            draws += 1;
        }
        if frame == 6 {
            loop_state.stop();
        }
    }

    assert_eq!(draws, 7);
    assert!(!loop_state.is_running());
}
