//! Window shell: winit event loop, render engine, ImGui and the demos.
//!
//! All per-run state lives in [`AppContext`], which is built in `resumed`
//! once a window exists and passed explicitly through init, update, draw
//! and exit.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context as _;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{DeviceEvent, DeviceId, ElementState, Event, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::config::HarnessConfig;
use crate::demos::{DemoContext, DemoManager};
use crate::gfx::assets::ShaderLoader;
use crate::gfx::camera::{CameraController, CameraManager, OrbitCamera};
use crate::gfx::rendering::render_engine::{RenderEngine, SurfaceErrorAction};
use crate::ui::{main_menu, status_overlay, MenuActions, UiManager};

/// What the frame loop should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameControl {
    Continue,
    Quit,
}

/// Everything that exists while the window is open.
pub struct AppContext {
    pub window: Arc<Window>,
    pub engine: RenderEngine,
    pub ui: UiManager,
    pub camera: CameraManager,
    pub demos: DemoManager,
    shaders: Box<dyn ShaderLoader>,
    last_frame: Instant,
}

impl AppContext {
    /// Opens the surface, the UI and the camera. Demos are built on the first
    /// [`update`](Self::update).
    pub fn init(window: Arc<Window>, config: &HarnessConfig) -> anyhow::Result<Self> {
        let PhysicalSize { width, height } = window.inner_size();
        let engine = pollster::block_on(RenderEngine::new(Arc::clone(&window), width, height, config.vsync))
            .context("failed to initialize the render engine")?;
        let ui = UiManager::new(engine.device(), engine.queue(), engine.surface_format(), &window);

        let aspect = width.max(1) as f32 / height.max(1) as f32;
        let camera = CameraManager::new(OrbitCamera::harness_default(aspect), CameraController::new(0.005, 0.1));

        log::info!("Window {width}x{height} ready, format {:?}", engine.surface_format());
        Ok(Self {
            window,
            engine,
            ui,
            camera,
            demos: DemoManager::new(&config.demos),
            shaders: config.shader_loader(),
            last_frame: Instant::now(),
        })
    }

    fn delta_ms(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now.duration_since(self.last_frame).as_secs_f32() * 1000.0;
        self.last_frame = now;
        delta
    }

    /// Brings demos in line with their toggles, advances them, and builds
    /// this frame's UI.
    pub fn update(&mut self) -> FrameControl {
        let delta_ms = self.delta_ms();

        let layout = self.engine.output_layout();
        let surface_size = self.engine.get_surface_size();
        let mut ctx = DemoContext {
            backend: self.engine.backend_mut(),
            shaders: self.shaders.as_ref(),
            layout,
            surface_size,
        };
        self.demos.sync(&mut ctx);

        let view = self.camera.render_view();
        self.demos.update(delta_ms, &view);

        let demos = &mut self.demos;
        let mut actions = MenuActions::default();
        let ui_wants_input = self.ui.update_logic(&self.window, |ui| {
            actions = main_menu(ui, demos);
            demos.ui(ui);
            status_overlay(ui, demos);
        });
        self.camera.controller.ui_captures_mouse = ui_wants_input;

        if actions.reset_camera {
            self.camera.camera.reset_to_default();
        }
        if actions.quit {
            FrameControl::Quit
        } else {
            FrameControl::Continue
        }
    }

    /// Records the demos and the UI overlay and presents.
    pub fn draw(&mut self) -> FrameControl {
        let demos = &self.demos;
        let ui = &mut self.ui;
        let result = self.engine.render_frame(
            |encoder| demos.render(encoder),
            Some(|device: &wgpu::Device, queue: &wgpu::Queue, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView| {
                ui.render_display_only(device, queue, encoder, view)
            }),
        );

        match result {
            Ok(()) | Err(SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame) => FrameControl::Continue,
            Err(SurfaceErrorAction::Fatal) => {
                log::error!("Surface is out of memory; shutting down");
                FrameControl::Quit
            }
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.engine.resize(width, height);
        self.camera.camera.resize_projection(width, height);
        self.demos.resize(width, height);
    }

    /// Destroys every demo while the device is still alive.
    pub fn exit(&mut self) {
        log::info!("Exiting");
        self.demos.destroy_all(self.engine.backend_mut());
        let live = self.engine.backend().live_count();
        if live > 0 {
            log::warn!("{live} GPU resource(s) still live at exit");
        }
    }
}

/// The winit application: owns the config until the window opens, then the
/// [`AppContext`].
pub struct HarnessApp {
    config: HarnessConfig,
    context: Option<AppContext>,
    error: Option<anyhow::Error>,
}

impl HarnessApp {
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            context: None,
            error: None,
        }
    }

    /// Runs the event loop until the window closes.
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = EventLoop::new().context("failed to create event loop")?;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self).context("event loop failed")?;

        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut context) = self.context.take() {
            context.exit();
        }
        event_loop.exit();
    }
}

fn is_escape(event: &KeyEvent) -> bool {
    event.state == ElementState::Pressed && event.physical_key == PhysicalKey::Code(KeyCode::Escape)
}

impl ApplicationHandler for HarnessApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.context.is_some() {
            return;
        }

        let attributes = WindowAttributes::default()
            .with_title(self.config.title.clone())
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                self.error = Some(anyhow::Error::new(err).context("failed to create window"));
                event_loop.exit();
                return;
            }
        };

        match AppContext::init(window, &self.config) {
            Ok(context) => self.context = Some(context),
            Err(err) => {
                self.error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(context) = self.context.as_mut() else {
            return;
        };

        let ui_event: Event<()> = Event::WindowEvent {
            window_id,
            event: event.clone(),
        };
        let ui_captured = context.ui.handle_input(&context.window, &ui_event);

        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::KeyboardInput { event: key_event, .. } => {
                if is_escape(&key_event) {
                    self.shutdown(event_loop);
                } else if !ui_captured {
                    context.camera.process_keyboard_event(&key_event);
                }
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => context.resize(width, height),
            WindowEvent::RedrawRequested => {
                if context.update() == FrameControl::Quit || context.draw() == FrameControl::Quit {
                    self.shutdown(event_loop);
                }
            }
            _ => (),
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        let Some(context) = self.context.as_mut() else {
            return;
        };
        context.camera.controller.ui_captures_mouse = context.ui.wants_mouse();
        context.camera.process_event(&event, &context.window);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(context) = self.context.as_ref() {
            context.window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mut context) = self.context.take() {
            context.exit();
        }
    }
}
