//! # Demo Modules
//!
//! Each demo owns its renderables and animation state. Demos are created when
//! their toggle turns on and destroyed when it turns off; nothing carries over
//! between activations.
//!
//! ## Lifecycle
//!
//! ```text
//! create(ctx) ──► update(delta_ms, view) ──► render(encoder) ──► ... ──► destroy(backend)
//! ```
//!
//! `update` advances state only and `render` submits only. All updates of a
//! frame run before any render.

pub mod alife;
pub mod manager;
pub mod mesh_shapes;
pub mod synthwave;

pub use alife::ALifeDemo;
pub use manager::{DemoManager, SlotState};
pub use mesh_shapes::MeshShapesDemo;
pub use synthwave::SynthwaveDemo;

use crate::error::ConstructionError;
use crate::gfx::assets::ShaderLoader;
use crate::gfx::backend::{GraphicsEncoder, OutputLayout, RenderBackend};
use crate::gfx::camera::RenderView;

/// What a demo needs while it builds its resources.
pub struct DemoContext<'a> {
    pub backend: &'a mut dyn RenderBackend,
    pub shaders: &'a dyn ShaderLoader,
    pub layout: OutputLayout,
    /// Surface width and height in pixels.
    pub surface_size: (u32, u32),
}

/// A visual feature driven by the harness.
pub trait Demo {
    fn name(&self) -> &'static str;

    /// Advances animation state by `delta_ms` milliseconds.
    fn update(&mut self, delta_ms: f32, view: &RenderView);

    /// Records this frame's draws.
    fn render(&self, encoder: &mut dyn GraphicsEncoder);

    /// The output surface changed size.
    fn resize(&mut self, _width: u32, _height: u32) {}

    /// Draws the demo's own control window.
    fn ui(&mut self, _ui: &imgui::Ui) {}

    /// Releases every GPU resource the demo holds.
    fn destroy(self: Box<Self>, backend: &mut dyn RenderBackend);
}

/// The demos the harness knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum DemoKind {
    Synthwave,
    #[value(name = "alife")]
    ALife,
    MeshShapes,
}

impl DemoKind {
    /// Update and render order: background first.
    pub const ALL: [DemoKind; 3] = [DemoKind::Synthwave, DemoKind::ALife, DemoKind::MeshShapes];

    pub fn label(self) -> &'static str {
        match self {
            DemoKind::Synthwave => "Synthwave",
            DemoKind::ALife => "ALife",
            DemoKind::MeshShapes => "Mesh shapes",
        }
    }

    pub(crate) fn slot(self) -> usize {
        match self {
            DemoKind::Synthwave => 0,
            DemoKind::ALife => 1,
            DemoKind::MeshShapes => 2,
        }
    }

    pub fn create(self, ctx: &mut DemoContext<'_>) -> Result<Box<dyn Demo>, ConstructionError> {
        Ok(match self {
            DemoKind::Synthwave => Box::new(SynthwaveDemo::new(ctx)?),
            DemoKind::ALife => Box::new(ALifeDemo::new(ctx)?),
            DemoKind::MeshShapes => Box::new(MeshShapesDemo::new(ctx)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::ValueEnum;

    #[test]
    fn slots_follow_render_order() {
        for (i, kind) in DemoKind::ALL.iter().enumerate() {
            assert_eq!(kind.slot(), i);
        }
    }

    #[test]
    fn command_line_names() {
        assert_eq!(DemoKind::from_str("alife", false), Ok(DemoKind::ALife));
        assert_eq!(DemoKind::from_str("mesh-shapes", false), Ok(DemoKind::MeshShapes));
        assert_eq!(DemoKind::from_str("synthwave", false), Ok(DemoKind::Synthwave));
    }
}
