//! Camera, projection and the trackball controller.
//!
//! The camera orbits a target point. Input events only accumulate pending
//! deltas on the controller; [`TrackballController::update`] reconciles them
//! into the camera once per frame and drains them, so event delivery rate and
//! frame rate stay decoupled.

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector2, Vector3, perspective};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Radians of orbit per pixel of mouse travel, before the rotate multiplier.
const ROTATE_STEP: f32 = 0.005;
/// Fraction of the orbit radius panned per pixel, before the pan multiplier.
const PAN_STEP: f32 = 0.002;
/// Radius scale per scroll line, before the zoom multiplier.
const ZOOM_STEP: f32 = 0.1;
/// Keeps the pitch away from the poles where the up vector degenerates.
const PITCH_LIMIT: f32 = 1.54;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>>(position: P, target: P) -> Self {
        Self {
            position: position.into(),
            target: target.into(),
            up: Vector3::unit_y(),
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, self.up)
    }

    /// Distance between the camera and the point it orbits.
    pub fn radius(&self) -> f32 {
        (self.position - self.target).magnitude()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::from_scale(1.0).into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Which gesture the current mouse drag feeds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum DragMode {
    #[default]
    None,
    Rotate,
    Pan,
}

/// Key-forced modes: while one of the three bound keys is held, plain mouse
/// motion drives that gesture regardless of button state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum KeyMode {
    Rotate,
    Zoom,
    Pan,
}

/// Trackball-style controls: left-drag rotates around the target, the wheel
/// zooms, right-drag pans. The A/S/D keys force rotate/zoom/pan while held.
#[derive(Clone, Debug)]
pub struct TrackballController {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    drag: DragMode,
    key_mode: Option<KeyMode>,
    pending_rotate: Vector2<f32>,
    pending_pan: Vector2<f32>,
    pending_zoom: f32,
}

impl TrackballController {
    pub fn new(rotate_speed: f32, zoom_speed: f32, pan_speed: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            pan_speed,
            drag: DragMode::None,
            key_mode: None,
            pending_rotate: Vector2::new(0.0, 0.0),
            pending_pan: Vector2::new(0.0, 0.0),
            pending_zoom: 0.0,
        }
    }

    pub fn mouse_pressed(&mut self, button: MouseButton, pressed: bool) {
        self.drag = match (button, pressed) {
            (MouseButton::Left, true) => DragMode::Rotate,
            (MouseButton::Right, true) => DragMode::Pan,
            _ => DragMode::None,
        };
    }

    pub fn key(&mut self, code: KeyCode, pressed: bool) {
        let mode = match code {
            KeyCode::KeyA => Some(KeyMode::Rotate),
            KeyCode::KeyS => Some(KeyMode::Zoom),
            KeyCode::KeyD => Some(KeyMode::Pan),
            _ => None,
        };
        if let Some(mode) = mode {
            if pressed {
                self.key_mode = Some(mode);
            } else if self.key_mode == Some(mode) {
                self.key_mode = None;
            }
        }
    }

    pub fn scroll(&mut self, lines: f32) {
        self.pending_zoom += lines;
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                self.mouse_pressed(*button, state.is_pressed());
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 53.0,
                };
                self.scroll(lines);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.key(code, event.state == ElementState::Pressed);
                }
            }
            _ => {}
        }
    }

    /// Raw mouse motion, routed to the gesture selected by keys or buttons.
    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        let delta = Vector2::new(dx as f32, dy as f32);
        let mode = match self.key_mode {
            Some(KeyMode::Rotate) => DragMode::Rotate,
            Some(KeyMode::Pan) => DragMode::Pan,
            Some(KeyMode::Zoom) => {
                // vertical motion zooms, matching the wheel direction
                self.pending_zoom -= delta.y * 0.05;
                return;
            }
            None => self.drag,
        };
        match mode {
            DragMode::Rotate => self.pending_rotate += delta,
            DragMode::Pan => self.pending_pan += delta,
            DragMode::None => {}
        }
    }

    /// Reconciles all pending input into the camera and drains it. Called
    /// exactly once per frame by the render loop.
    pub fn update(&mut self, camera: &mut Camera) {
        let offset = camera.position - camera.target;
        let mut radius = offset.magnitude().max(1e-4);
        let mut yaw = offset.x.atan2(offset.z);
        let mut pitch = (offset.y / radius).clamp(-1.0, 1.0).asin();

        yaw -= self.pending_rotate.x * ROTATE_STEP * self.rotate_speed;
        pitch = (pitch + self.pending_rotate.y * ROTATE_STEP * self.rotate_speed)
            .clamp(-PITCH_LIMIT, PITCH_LIMIT);

        radius = (radius * (-self.pending_zoom * ZOOM_STEP * self.zoom_speed).exp()).max(0.01);

        if self.pending_pan != Vector2::new(0.0, 0.0) {
            let forward = (camera.target - camera.position).normalize();
            let right = forward.cross(camera.up).normalize();
            let cam_up = right.cross(forward);
            let step = radius * PAN_STEP * self.pan_speed;
            camera.target += (-self.pending_pan.x * right + self.pending_pan.y * cam_up) * step;
        }

        camera.position = camera.target
            + Vector3::new(
                radius * pitch.cos() * yaw.sin(),
                radius * pitch.sin(),
                radius * pitch.cos() * yaw.cos(),
            );

        self.pending_rotate = Vector2::new(0.0, 0.0);
        self.pending_pan = Vector2::new(0.0, 0.0);
        self.pending_zoom = 0.0;
    }
}

impl Default for TrackballController {
    /// The demo's control speeds: rotate 1.0, zoom 1.2, pan 0.8.
    fn default() -> Self {
        Self::new(1.0, 1.2, 0.8)
    }
}

/// Camera state with its GPU-side uniform, buffer and bind group.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: TrackballController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}
