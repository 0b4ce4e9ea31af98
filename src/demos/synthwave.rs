//! Full-screen synthwave backdrop.

use super::{Demo, DemoContext};
use crate::error::ConstructionError;
use crate::gfx::backend::{GraphicsEncoder, RenderBackend};
use crate::gfx::camera::RenderView;
use crate::gfx::geometry::FullscreenTriangle;
use crate::gfx::rendering::{CompositeUniforms, RenderableObject};

pub const SHADER: &str = "synthwave/composite";

pub struct SynthwaveDemo {
    composite: RenderableObject<CompositeUniforms>,
    paused: bool,
}

impl SynthwaveDemo {
    pub fn new(ctx: &mut DemoContext<'_>) -> Result<Self, ConstructionError> {
        let mut composite = RenderableObject::<CompositeUniforms>::create(
            &FullscreenTriangle { shader: SHADER },
            ctx.backend,
            ctx.shaders,
            &ctx.layout,
        )?;
        let (width, height) = ctx.surface_size;
        *composite.uniforms_mut() = CompositeUniforms::new(width, height);

        Ok(Self {
            composite,
            paused: false,
        })
    }

    /// Seconds of animation played so far.
    pub fn time(&self) -> f32 {
        self.composite.uniforms().time()
    }

    pub fn resolution(&self) -> [f32; 2] {
        let frame = self.composite.uniforms().frame;
        [frame[0], frame[1]]
    }
}

impl Demo for SynthwaveDemo {
    fn name(&self) -> &'static str {
        "Synthwave"
    }

    fn update(&mut self, delta_ms: f32, view: &RenderView) {
        self.composite.update(view);
        if !self.paused {
            self.composite.uniforms_mut().advance(delta_ms / 1000.0);
        }
    }

    fn render(&self, encoder: &mut dyn GraphicsEncoder) {
        self.composite.render(encoder);
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.composite.uniforms_mut().set_resolution(width, height);
    }

    fn ui(&mut self, ui: &imgui::Ui) {
        ui.window("Synthwave")
            .size([260.0, 0.0], imgui::Condition::FirstUseEver)
            .position([20.0, 40.0], imgui::Condition::FirstUseEver)
            .build(|| {
                ui.text(format!("Time {:.1}s", self.time()));
                ui.checkbox("Paused", &mut self.paused);

                let uniforms = self.composite.uniforms_mut();
                let mut sun = [uniforms.sun[0], uniforms.sun[1], uniforms.sun[2]];
                if ui.color_edit3("Sun", &mut sun) {
                    uniforms.sun[..3].copy_from_slice(&sun);
                }
                let mut grid = [uniforms.grid[0], uniforms.grid[1], uniforms.grid[2]];
                if ui.color_edit3("Grid", &mut grid) {
                    uniforms.grid[..3].copy_from_slice(&grid);
                }
            });
    }

    fn destroy(self: Box<Self>, backend: &mut dyn RenderBackend) {
        self.composite.destroy(backend);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::assets::EmbeddedShaders;
    use crate::gfx::backend::{Command, OutputLayout, RecordingBackend};

    #[test]
    fn time_advances_in_seconds_and_resize_updates_resolution() {
        let mut backend = RecordingBackend::new();
        let mut ctx = DemoContext {
            backend: &mut backend,
            shaders: &EmbeddedShaders,
            layout: OutputLayout::color_only(wgpu::TextureFormat::Rgba8Unorm),
            surface_size: (800, 600),
        };
        let mut demo = SynthwaveDemo::new(&mut ctx).unwrap();
        assert_eq!(demo.resolution(), [800.0, 600.0]);

        demo.update(500.0, &RenderView::default());
        demo.update(250.0, &RenderView::default());
        assert!((demo.time() - 0.75).abs() < 1e-6);

        demo.resize(1024, 768);
        assert_eq!(demo.resolution(), [1024.0, 768.0]);

        let mut encoder = backend.encoder();
        demo.render(&mut encoder);
        assert_eq!(encoder.draw_count(), 1);
        assert!(encoder.commands().contains(&Command::Draw {
            vertex_count: 3,
            first_vertex: 0
        }));

        Box::new(demo).destroy(&mut backend);
        assert_eq!(backend.live_count(), 0);
    }
}
