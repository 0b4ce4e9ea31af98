//! WGPU-based render engine for the harness window.
//!
//! Owns the surface, the depth buffer and the [`WgpuBackend`] that demos
//! create their resources through. One frame is a single render pass over
//! the swapchain image followed by the UI overlay.

use std::sync::Arc;

use anyhow::Context;
use wgpu::{SurfaceError, TextureFormat};

use crate::gfx::backend::{OutputLayout, WgpuBackend, WgpuEncoder};
use crate::gfx::resources::TextureResource;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.2,
    b: 0.3,
    a: 1.0,
};

/// What the caller should do after a frame could not be acquired.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Out of memory; terminate.
    Fatal,
}

pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    format: TextureFormat,
    backend: WgpuBackend,
}

impl RenderEngine {
    /// Creates a render engine for the given window.
    ///
    /// # Errors
    /// Fails when no adapter or device is available or the surface cannot be
    /// created.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> anyhow::Result<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .context("failed to create window surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no compatible GPU adapter")?;
        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Devon Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to request a device")?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .context("surface reports no formats")?;
        let alpha_mode = surface_capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: present_mode(vsync),
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = TextureResource::create_depth_texture(&device, &config, "depth_texture");
        let backend = WgpuBackend::new(Arc::new(device), Arc::new(queue));

        Ok(RenderEngine {
            surface,
            config,
            depth_texture,
            format,
            backend,
        })
    }

    /// Color and depth formats every demo pipeline is built against.
    pub fn output_layout(&self) -> OutputLayout {
        OutputLayout::with_depth(self.format, TextureResource::DEPTH_FORMAT)
    }

    pub fn backend(&self) -> &WgpuBackend {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut WgpuBackend {
        &mut self.backend
    }

    /// Renders one frame: `draw` records into the main pass, then
    /// `ui_callback` records the overlay into the same command encoder.
    pub fn render_frame<D, F>(&mut self, draw: D, ui_callback: Option<F>) -> Result<(), SurfaceErrorAction>
    where
        D: FnOnce(&mut WgpuEncoder<'_, '_>),
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(err) => return Err(self.handle_surface_error(err)),
        };
        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let device = self.backend.device();
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            let mut demo_encoder = self.backend.encoder(&mut render_pass);
            draw(&mut demo_encoder);
        }

        if let Some(ui_callback) = ui_callback {
            ui_callback(device, self.backend.queue(), &mut encoder, &surface_texture_view);
        }

        self.backend.queue().submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    fn handle_surface_error(&mut self, err: SurfaceError) -> SurfaceErrorAction {
        log::warn!("Surface error: {err}");
        match err {
            SurfaceError::Lost | SurfaceError::Outdated => {
                self.surface.configure(self.backend.device(), &self.config);
                SurfaceErrorAction::Reconfigured
            }
            SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
            SurfaceError::Timeout | SurfaceError::Other => SurfaceErrorAction::SkipFrame,
        }
    }

    /// Resizes the surface and recreates the depth buffer. Zero sizes
    /// (minimized windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(self.backend.device(), &self.config);
        self.depth_texture = TextureResource::create_depth_texture(self.backend.device(), &self.config, "depth_texture");
        log::debug!("Surface resized to {width}x{height}");
    }

    pub fn get_surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn device(&self) -> &wgpu::Device {
        self.backend.device()
    }

    pub fn queue(&self) -> &wgpu::Queue {
        self.backend.queue()
    }

    pub fn surface_format(&self) -> TextureFormat {
        self.format
    }

    pub fn set_vsync(&mut self, enable: bool) {
        self.config.present_mode = present_mode(enable);
        self.surface.configure(self.backend.device(), &self.config);
    }
}

fn present_mode(vsync: bool) -> wgpu::PresentMode {
    if vsync {
        wgpu::PresentMode::AutoVsync
    } else {
        wgpu::PresentMode::AutoNoVsync
    }
}
