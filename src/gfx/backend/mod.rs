//! Renderer collaborator
//!
//! The core never talks to wgpu directly. Renderables create and release GPU
//! objects through [`RenderBackend`] and record per-frame work through
//! [`GraphicsEncoder`]. Handles are small `Copy` ids owned by the backend; an
//! absent resource is an `Option::None`, never a sentinel id.
//!
//! Two implementations ship with the crate:
//! - [`WgpuBackend`] / [`WgpuEncoder`] drive a real device.
//! - [`RecordingBackend`] / [`RecordingEncoder`] keep a log instead of GPU
//!   state; used for headless runs and tests.

pub mod recording;
pub mod wgpu_backend;

pub use recording::{Command, Lifecycle, RecordingBackend, RecordingEncoder, ResourceKind};
pub use wgpu_backend::{WgpuBackend, WgpuEncoder};

use std::sync::Arc;

use crate::error::RenderError;
use crate::gfx::vertex::VertexLayout;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            pub(crate) fn new(id: u32) -> Self {
                Self(id)
            }

            pub fn id(self) -> u32 {
                self.0
            }
        }
    };
}

handle!(
    /// A vertex, index or uniform buffer.
    BufferHandle
);
handle!(
    /// A compiled vertex + fragment shader pair.
    ShaderHandle
);
handle!(
    /// A resource binding layout.
    RootSignatureHandle
);
handle!(
    /// A graphics pipeline.
    PipelineHandle
);
handle!(
    /// Concrete resources bound to a root signature's slots.
    DescriptorSetHandle
);

/// Width of one index element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    U16,
    U32,
}

impl IndexFormat {
    /// 16-bit indices address at most 65535 vertices.
    pub const MAX_U16_VERTICES: u32 = 0xFFFF;

    pub fn for_vertex_count(vertex_count: u32) -> Self {
        if vertex_count > Self::MAX_U16_VERTICES {
            IndexFormat::U32
        } else {
            IndexFormat::U16
        }
    }

    pub fn size_bytes(self) -> u32 {
        match self {
            IndexFormat::U16 => 2,
            IndexFormat::U32 => 4,
        }
    }

    pub fn to_wgpu(self) -> wgpu::IndexFormat {
        match self {
            IndexFormat::U16 => wgpu::IndexFormat::Uint16,
            IndexFormat::U32 => wgpu::IndexFormat::Uint32,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VertexBufferDesc<'a> {
    pub label: &'a str,
    pub vertex_count: u32,
    pub stride: u32,
}

impl VertexBufferDesc<'_> {
    pub fn size_bytes(&self) -> u64 {
        u64::from(self.vertex_count) * u64::from(self.stride)
    }
}

#[derive(Debug, Clone)]
pub struct IndexBufferDesc<'a> {
    pub label: &'a str,
    pub index_count: u32,
    pub format: IndexFormat,
}

impl IndexBufferDesc<'_> {
    pub fn size_bytes(&self) -> u64 {
        u64::from(self.index_count) * u64::from(self.format.size_bytes())
    }
}

#[derive(Debug, Clone)]
pub struct UniformBufferDesc<'a> {
    pub label: &'a str,
    pub size: u64,
}

/// One stage of a shader pair.
#[derive(Debug, Clone)]
pub struct ShaderStageSource {
    pub code: Arc<str>,
    pub entry_point: &'static str,
}

/// Source of a vertex + fragment shader pair, as resolved by a
/// [`ShaderLoader`](crate::gfx::assets::ShaderLoader).
#[derive(Debug, Clone)]
pub struct ShaderSource {
    pub name: String,
    pub vertex: ShaderStageSource,
    pub fragment: ShaderStageSource,
}

/// A uniform-buffer slot exposed by a root signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformSlot {
    pub name: &'static str,
    pub binding: u32,
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct RootSignatureDesc<'a> {
    pub label: &'a str,
    pub shaders: &'a [ShaderHandle],
    pub uniform_slots: &'a [UniformSlot],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    Opaque,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthMode {
    /// No depth test and no depth writes.
    Ignore,
    /// Test `Less`, write on pass.
    ReadWriteLess,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    None,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    TriangleList,
}

/// Colour and depth attachment formats a pipeline is built against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputLayout {
    pub color_format: wgpu::TextureFormat,
    pub depth_format: Option<wgpu::TextureFormat>,
    pub sample_count: u32,
}

impl OutputLayout {
    pub fn color_only(color_format: wgpu::TextureFormat) -> Self {
        Self {
            color_format,
            depth_format: None,
            sample_count: 1,
        }
    }

    pub fn with_depth(color_format: wgpu::TextureFormat, depth_format: wgpu::TextureFormat) -> Self {
        Self {
            color_format,
            depth_format: Some(depth_format),
            sample_count: 1,
        }
    }

    pub fn has_depth(&self) -> bool {
        self.depth_format.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct GraphicsPipelineDesc<'a> {
    pub label: &'a str,
    pub shader: ShaderHandle,
    pub root_signature: RootSignatureHandle,
    pub vertex_layout: VertexLayout,
    pub blend: BlendMode,
    pub depth: DepthMode,
    pub cull: CullMode,
    pub topology: Topology,
    pub output: OutputLayout,
}

/// How often the contents bound by a descriptor set change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorFrequency {
    Never,
    PerFrame,
    PerDraw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferDescriptor {
    pub name: &'static str,
    pub binding: u32,
    pub buffer: BufferHandle,
    pub offset: u64,
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct DescriptorSetDesc<'a> {
    pub label: &'a str,
    pub root_signature: RootSignatureHandle,
    pub frequency: DescriptorFrequency,
    /// Bind-group index the set is bound at.
    pub set_index: u32,
    pub buffers: &'a [BufferDescriptor],
}

/// Resource creation and release.
///
/// Creation returns `Err` instead of an invalid handle. Destroy calls accept
/// only handles this backend created.
pub trait RenderBackend {
    fn create_vertex_buffer(&mut self, desc: &VertexBufferDesc<'_>) -> Result<BufferHandle, RenderError>;
    fn create_index_buffer(&mut self, desc: &IndexBufferDesc<'_>) -> Result<BufferHandle, RenderError>;
    fn create_uniform_buffer(&mut self, desc: &UniformBufferDesc<'_>) -> Result<BufferHandle, RenderError>;
    fn upload_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]);
    fn destroy_buffer(&mut self, buffer: BufferHandle);

    fn create_shader(&mut self, source: &ShaderSource) -> Result<ShaderHandle, RenderError>;
    fn destroy_shader(&mut self, shader: ShaderHandle);

    fn create_root_signature(&mut self, desc: &RootSignatureDesc<'_>) -> Result<RootSignatureHandle, RenderError>;
    fn destroy_root_signature(&mut self, root_signature: RootSignatureHandle);

    fn create_graphics_pipeline(&mut self, desc: &GraphicsPipelineDesc<'_>) -> Result<PipelineHandle, RenderError>;
    fn destroy_pipeline(&mut self, pipeline: PipelineHandle);

    fn create_descriptor_set(&mut self, desc: &DescriptorSetDesc<'_>) -> Result<DescriptorSetHandle, RenderError>;
    fn destroy_descriptor_set(&mut self, descriptor_set: DescriptorSetHandle);
}

/// Per-frame submission.
///
/// Calls are infallible from the caller's side; a backend that cannot honour
/// one logs it and skips.
pub trait GraphicsEncoder {
    fn upload_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]);
    fn bind_descriptor_set(&mut self, descriptor_set: DescriptorSetHandle, index: u32);
    fn bind_index_buffer(&mut self, buffer: BufferHandle, offset: u64);
    fn bind_vertex_buffer(&mut self, buffer: BufferHandle, offset: u64);
    fn bind_pipeline(&mut self, pipeline: PipelineHandle);
    fn draw(&mut self, vertex_count: u32, first_vertex: u32);
    fn draw_indexed(&mut self, index_count: u32, first_index: u32, base_vertex: i32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_format_switches_above_u16_range() {
        assert_eq!(IndexFormat::for_vertex_count(4), IndexFormat::U16);
        assert_eq!(IndexFormat::for_vertex_count(65535), IndexFormat::U16);
        assert_eq!(IndexFormat::for_vertex_count(65536), IndexFormat::U32);
        assert_eq!(IndexFormat::U16.size_bytes(), 2);
        assert_eq!(IndexFormat::U32.size_bytes(), 4);
    }

    #[test]
    fn buffer_desc_sizes() {
        let vb = VertexBufferDesc {
            label: "vb",
            vertex_count: 10,
            stride: 20,
        };
        assert_eq!(vb.size_bytes(), 200);

        let ib = IndexBufferDesc {
            label: "ib",
            index_count: 6,
            format: IndexFormat::U32,
        };
        assert_eq!(ib.size_bytes(), 24);
    }
}
