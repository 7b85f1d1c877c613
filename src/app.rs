//! Application shell: the event loop, the render loop and asset adoption.
//!
//! Everything the loop touches lives in one explicit [`AppState`] — scene
//! root, GPU context, per-frame update, adoption slots — threaded into the
//! winit callbacks rather than captured by module-level globals.
//!
//! # Frame lifecycle
//!
//! Each `RedrawRequested` runs strictly in this order:
//! 1. the caller-supplied per-frame update mutates the scene
//! 2. the trackball controller reconciles pending input into the camera
//! 3. uniforms and instance buffers are written, one render pass is drawn
//! 4. the next frame is scheduled, unless the loop has been stopped
//!
//! Asset loads run asynchronously and hand their finished nodes back through
//! the event-loop proxy, so every scene mutation happens on this one thread.

use std::{iter, sync::Arc};

use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

use crate::{
    camera::CameraResources,
    context::Context,
    pipelines::light::LightUniform,
    resources,
    scene::{NodeId, SceneNode, SceneRoot, Topology, gpu::DrawNode},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Per-frame scene mutation, run before controls are reconciled.
pub type UpdateFn = Box<dyn FnMut(&mut SceneRoot)>;

/// One asynchronous asset load together with the caller-supplied callback
/// that turns the loaded resource into a scene node.
pub enum AssetLoad {
    /// Loads a font and derives a node from it (the text mesh).
    Font {
        path: String,
        build: Box<dyn FnOnce(fontdue::Font) -> SceneNode + Send>,
    },
    /// Loads a glTF model and adjusts the decoded node before adoption.
    Model {
        path: String,
        prepare: Box<dyn FnOnce(&mut SceneNode) + Send>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetKind {
    Font,
    Model,
}

impl AssetKind {
    fn name(self) -> &'static str {
        match self {
            AssetKind::Font => "font",
            AssetKind::Model => "model",
        }
    }
}

/// Everything the demo binary hands to [`run`]: the assembled scene, the
/// per-frame update and the asset loads to kick off.
pub struct StageSetup {
    pub scene: SceneRoot,
    pub update: UpdateFn,
    pub loads: Vec<AssetLoad>,
}

/// Render-loop state: a single non-terminal "running" state plus an explicit
/// stop. A stopped loop schedules no further frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopState {
    stopped: bool,
}

impl LoopState {
    pub fn is_running(&self) -> bool {
        !self.stopped
    }

    pub fn stop(&mut self) {
        self.stopped = true;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum SlotState {
    #[default]
    Pending,
    Adopted,
    Failed,
}

/// Adoption bookkeeping for the two asynchronous assets. Each slot leaves
/// `Pending` exactly once, so a given asset is adopted at most once and a
/// failure is reported at most once.
#[derive(Clone, Copy, Debug, Default)]
pub struct PendingAssets {
    font: SlotState,
    model: SlotState,
}

impl PendingAssets {
    /// Splices a finished asset node into the scene. Returns `None` without
    /// touching the scene when the slot was already taken.
    pub fn adopt(
        &mut self,
        kind: AssetKind,
        scene: &mut SceneRoot,
        node: SceneNode,
    ) -> Option<NodeId> {
        let slot = self.slot_mut(kind);
        if *slot != SlotState::Pending {
            log::warn!("{} resolved more than once; keeping the first result", kind.name());
            return None;
        }
        *slot = SlotState::Adopted;
        log::info!("{} spliced into the scene", kind.name());
        Some(scene.add(node))
    }

    /// Records a failed load. The scene is left untouched; the error is
    /// logged once.
    pub fn fail(&mut self, kind: AssetKind, error: &str) {
        let slot = self.slot_mut(kind);
        if *slot == SlotState::Pending {
            *slot = SlotState::Failed;
            log::error!("{} load failed: {}", kind.name(), error);
        }
    }

    fn slot_mut(&mut self, kind: AssetKind) -> &mut SlotState {
        match kind {
            AssetKind::Font => &mut self.font,
            AssetKind::Model => &mut self.model,
        }
    }
}

/// Application state bundle: GPU context, scene and loop bookkeeping.
struct AppState {
    ctx: Context,
    scene: SceneRoot,
    update: UpdateFn,
    pending: PendingAssets,
    loop_state: LoopState,
    is_surface_configured: bool,
}

impl AppState {
    fn init(mut ctx: Context, mut scene: SceneRoot, update: UpdateFn) -> Self {
        ctx.clear_colour = scene.background;
        scene.upload(&ctx.device, &ctx.queue, &ctx.material_layout);
        Self {
            ctx,
            scene,
            update,
            pending: PendingAssets::default(),
            loop_state: LoopState::default(),
            is_surface_configured: false,
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if self.ctx.resize(width, height) {
            self.is_surface_configured = true;
        }
    }

    /// One render-loop iteration: mutate, reconcile controls, draw.
    fn frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        (self.update)(&mut self.scene);

        let CameraResources {
            camera, controller, ..
        } = &mut self.ctx.camera;
        controller.update(camera);

        self.render()
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        // Sync the camera.
        self.ctx
            .camera
            .uniform
            .update_view_proj(&self.ctx.camera.camera, &self.ctx.projection);
        self.ctx.queue.write_buffer(
            &self.ctx.camera.buffer,
            0,
            bytemuck::cast_slice(&[self.ctx.camera.uniform]),
        );

        // Sync the light from the scene's light node.
        let light_uniform = match self.scene.first_light() {
            Some((transform, light)) => LightUniform::new(
                transform.position.into(),
                light.color,
                light.intensity,
                light.range,
            ),
            None => LightUniform::off(),
        };
        self.ctx.light.write(&self.ctx.queue, light_uniform);

        // Sync node transforms.
        self.scene.write_to_buffers(&self.ctx.queue);

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder: wgpu::CommandEncoder =
            self.ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Render Encoder"),
                });
        {
            let mut render_pass: wgpu::RenderPass<'_> =
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &self.ctx.depth_texture.view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    occlusion_query_set: None,
                    timestamp_writes: None,
                });

            render_pass.set_pipeline(&self.ctx.pipelines.mesh);
            for node in self.scene.nodes() {
                if let Some(gpu) = node.gpu() {
                    render_pass.draw_node_primitives(
                        gpu,
                        Topology::TriangleList,
                        &self.ctx.camera.bind_group,
                        &self.ctx.light.bind_group,
                    );
                }
            }

            render_pass.set_pipeline(&self.ctx.pipelines.line);
            for node in self.scene.nodes() {
                if let Some(gpu) = node.gpu() {
                    render_pass.draw_node_primitives(
                        gpu,
                        Topology::LineStrip,
                        &self.ctx.camera.bind_group,
                        &self.ctx.light.bind_group,
                    );
                }
            }
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

#[derive(Debug)]
pub(crate) enum AppEvent {
    #[allow(dead_code)]
    Initialized(Context),
    Loaded(AssetKind, SceneNode),
    Failed(AssetKind, String),
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<AppEvent>,
    state: Option<AppState>,
    // Holds the stage description until the window exists; taken once.
    setup: Option<StageSetup>,
}

impl App {
    fn new(event_loop: &EventLoop<AppEvent>, setup: StageSetup) -> Self {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new().unwrap();
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            state: None,
            setup: Some(setup),
        }
    }

    fn spawn_loads(&self, loads: Vec<AssetLoad>) {
        for load in loads {
            let proxy = self.proxy.clone();
            let fut = run_load(load, proxy);
            #[cfg(not(target_arch = "wasm32"))]
            self.async_runtime.spawn(fut);
            #[cfg(target_arch = "wasm32")]
            wasm_bindgen_futures::spawn_local(fut);
        }
    }
}

/// Performs one load and hands the outcome back to the event loop. Fires its
/// callback at most once by construction.
async fn run_load(load: AssetLoad, proxy: EventLoopProxy<AppEvent>) {
    let event = match load {
        AssetLoad::Font { path, build } => match resources::font::load_font(&path).await {
            Ok(font) => AppEvent::Loaded(AssetKind::Font, build(font)),
            Err(e) => AppEvent::Failed(AssetKind::Font, e.to_string()),
        },
        AssetLoad::Model { path, prepare } => match resources::gltf::load_gltf_node(&path).await {
            Ok(mut node) => {
                prepare(&mut node);
                AppEvent::Loaded(AssetKind::Model, node)
            }
            Err(e) => AppEvent::Failed(AssetKind::Model, e.to_string()),
        },
    };
    if proxy.send_event(event).is_err() {
        log::warn!("event loop closed before an asset load completed");
    }
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes();

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = Arc::new(event_loop.create_window(window_attributes).unwrap());

        #[cfg(not(target_arch = "wasm32"))]
        {
            let setup = self.setup.take().unwrap();
            let ctx = match self.async_runtime.block_on(Context::new(window)) {
                Ok(ctx) => ctx,
                Err(e) => panic!(
                    "App initialization failed. Cannot create the main context: {}",
                    e
                ),
            };
            let mut state = AppState::init(ctx, setup.scene, setup.update);
            let size = state.ctx.window.inner_size();
            state.resize(size.width, size.height);
            state.ctx.window.request_redraw();
            self.state = Some(state);
            self.spawn_loads(setup.loads);
        }

        #[cfg(target_arch = "wasm32")]
        {
            // Context creation is async on the web; the finished context
            // comes back through the event loop and the stage description
            // waits in `self.setup` until then.
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match Context::new(window).await {
                    Ok(ctx) => assert!(proxy.send_event(AppEvent::Initialized(ctx)).is_ok()),
                    Err(e) => panic!(
                        "App initialization failed. Cannot create the main context: {}",
                        e
                    ),
                }
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::Initialized(ctx) => {
                // This is the message from our wasm `spawn_local`
                let setup = self.setup.take().unwrap();
                let mut state = AppState::init(ctx, setup.scene, setup.update);
                let size = state.ctx.window.inner_size();
                state.resize(size.width, size.height);
                state.ctx.window.request_redraw();
                self.state = Some(state);
                self.spawn_loads(setup.loads);
            }
            AppEvent::Loaded(kind, mut node) => {
                if let Some(state) = &mut self.state {
                    node.upload(&state.ctx.device, &state.ctx.queue, &state.ctx.material_layout);
                    let _ = state.pending.adopt(kind, &mut state.scene, node);
                }
            }
            AppEvent::Failed(kind, error) => {
                if let Some(state) = &mut self.state {
                    state.pending.fail(kind, &error);
                }
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            state.ctx.camera.controller.handle_mouse(dx, dy);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        state.ctx.camera.controller.handle_window_events(&event);

        match event {
            WindowEvent::CloseRequested => {
                state.loop_state.stop();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                if !state.loop_state.is_running() {
                    return;
                }
                match state.frame() {
                    Ok(()) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    // Nothing is fatal to the loop; the failed frame is
                    // simply skipped.
                    Err(e) => log::error!("unable to render {}", e),
                }
                state.ctx.window.request_redraw();
            }
            _ => {}
        }
    }
}

pub fn run(setup: StageSetup) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<AppEvent> = EventLoop::with_user_event().build()?;

    let mut app = App::new(&event_loop, setup);

    event_loop.run_app(&mut app)?;

    Ok(())
}
