//! Error types shared by the renderer collaborator, the grid world and the
//! renderable-object builder.

use std::fmt;

use thiserror::Error;

/// Failures reported by resource creation.
///
/// Every variant is handled the same way by a renderable under construction:
/// the build unwinds and the caller gets a single [`ConstructionError`].
#[derive(Debug, Error)]
pub enum RenderError {
    /// A CPU or GPU allocation returned nothing.
    #[error("failed to allocate {what}")]
    Allocation { what: &'static str },

    /// Shader source could not be found or read.
    #[error("failed to load shader asset `{name}`")]
    AssetLoad {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// The backend rejected a shader, root signature, pipeline or descriptor set.
    #[error("backend rejected {what}: {reason}")]
    Compile { what: &'static str, reason: String },

    /// A handle that the backend does not own was passed in.
    #[error("invalid {kind} handle")]
    InvalidHandle { kind: &'static str },

    /// Grid dimensions that cannot back a cell buffer.
    #[error("invalid grid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

impl RenderError {
    pub fn allocation(what: &'static str) -> Self {
        Self::Allocation { what }
    }

    pub fn compile(what: &'static str, reason: impl Into<String>) -> Self {
        Self::Compile {
            what,
            reason: reason.into(),
        }
    }
}

/// The step of renderable construction that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstructionStep {
    Geometry,
    VertexBuffer,
    IndexBuffer,
    UniformBuffer,
    Shader,
    RootSignature,
    Pipeline,
    DescriptorSet,
}

impl fmt::Display for ConstructionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstructionStep::Geometry => "geometry",
            ConstructionStep::VertexBuffer => "vertex buffer",
            ConstructionStep::IndexBuffer => "index buffer",
            ConstructionStep::UniformBuffer => "uniform buffer",
            ConstructionStep::Shader => "shader",
            ConstructionStep::RootSignature => "root signature",
            ConstructionStep::Pipeline => "graphics pipeline",
            ConstructionStep::DescriptorSet => "descriptor set",
        };
        f.write_str(name)
    }
}

/// Renderable construction failed; everything created before `step` has
/// already been released.
#[derive(Debug, Error)]
#[error("failed to construct renderable `{label}` at the {step} step")]
pub struct ConstructionError {
    pub label: String,
    pub step: ConstructionStep,
    #[source]
    pub source: RenderError,
}
