//! Core rendering functionality
//!
//! The renderable-object lifecycle, its uniform payloads and the wgpu frame
//! loop that drives them.

pub mod construction;
pub mod render_engine;
pub mod renderable;
pub mod uniforms;

pub use construction::{ConstructionScope, CreatedResource};
pub use render_engine::{RenderEngine, SurfaceErrorAction};
pub use renderable::RenderableObject;
pub use uniforms::{
    CompositeUniforms, GpuView, GridUniforms, MeshStyle, ObjectUniforms, Transform, UniformPayload,
};
