//! orbit-stage
//!
//! A small cross-platform demo stage built on wgpu and winit. It renders one
//! fixed scene — a spinning cube, a polyline, 3D text derived from a loaded
//! font and a loaded glTF model, lit by a single point light — into a native
//! window or an HTML canvas, with trackball-style rotate/zoom/pan camera
//! controls and a continuous redraw loop.
//!
//! High-level modules
//! - `camera`: camera, projection, uniform and the trackball controller
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `scene`: scene root, nodes, geometry, transforms and GPU upload
//! - `app`: application shell (event loop, render loop, asset adoption)
//! - `pipelines`: the lit mesh pipeline, the line pipeline and the light uniform
//! - `resources`: asset I/O plus the font and glTF loaders
//! - `demo`: the fixed demo scene and its per-frame update
//!

pub mod app;
pub mod camera;
pub mod context;
pub mod demo;
pub mod pipelines;
pub mod resources;
pub mod scene;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use winit::dpi::PhysicalPosition;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;
pub use wgpu::*;
