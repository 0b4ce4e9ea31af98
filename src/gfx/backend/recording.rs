//! Headless renderer collaborator.
//!
//! Hands out handles without touching a GPU, keeps a lifecycle log and a
//! live-resource table, and can be told to fail specific creation calls.

use std::collections::{BTreeMap, HashSet};

use super::{
    BufferHandle, DescriptorSetDesc, DescriptorSetHandle, GraphicsEncoder, GraphicsPipelineDesc,
    IndexBufferDesc, PipelineHandle, RenderBackend, RootSignatureDesc, RootSignatureHandle,
    ShaderHandle, ShaderSource, UniformBufferDesc, VertexBufferDesc,
};
use crate::error::RenderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    VertexBuffer,
    IndexBuffer,
    UniformBuffer,
    Shader,
    RootSignature,
    Pipeline,
    DescriptorSet,
}

impl ResourceKind {
    fn is_buffer(self) -> bool {
        matches!(
            self,
            ResourceKind::VertexBuffer | ResourceKind::IndexBuffer | ResourceKind::UniformBuffer
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lifecycle {
    Created { kind: ResourceKind, id: u32 },
    Uploaded { id: u32, offset: u64, len: usize },
    Destroyed { kind: ResourceKind, id: u32 },
}

/// Backend-side record of an object's creation parameters.
#[derive(Debug, Clone, PartialEq)]
struct LiveResource {
    kind: ResourceKind,
    label: String,
    size: u64,
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_id: u32,
    live: BTreeMap<u32, LiveResource>,
    log: Vec<Lifecycle>,
    fail_on: HashSet<ResourceKind>,
    creation_budget: Option<usize>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later creation of `kind` fail until [`clear_failures`](Self::clear_failures).
    pub fn fail_on(&mut self, kind: ResourceKind) {
        self.fail_on.insert(kind);
    }

    /// Let `count` more creations succeed, then fail every one after.
    pub fn fail_after(&mut self, count: usize) {
        self.creation_budget = Some(count);
    }

    pub fn clear_failures(&mut self) {
        self.fail_on.clear();
        self.creation_budget = None;
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn live_of(&self, kind: ResourceKind) -> usize {
        self.live.values().filter(|r| r.kind == kind).count()
    }

    /// Size requested when a live buffer was created.
    pub fn buffer_size(&self, buffer: BufferHandle) -> Option<u64> {
        self.live
            .get(&buffer.id())
            .filter(|r| r.kind.is_buffer())
            .map(|r| r.size)
    }

    pub fn label_of(&self, id: u32) -> Option<&str> {
        self.live.get(&id).map(|r| r.label.as_str())
    }

    pub fn lifecycle(&self) -> &[Lifecycle] {
        &self.log
    }

    /// Kinds released so far, in release order.
    pub fn destroyed_kinds(&self) -> Vec<ResourceKind> {
        self.log
            .iter()
            .filter_map(|event| match event {
                Lifecycle::Destroyed { kind, .. } => Some(*kind),
                _ => None,
            })
            .collect()
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    pub fn encoder(&self) -> RecordingEncoder {
        RecordingEncoder::default()
    }

    fn create(&mut self, kind: ResourceKind, label: &str, size: u64) -> Result<u32, RenderError> {
        let over_budget = self.creation_budget == Some(0);
        if let Some(budget) = self.creation_budget.as_mut() {
            *budget = budget.saturating_sub(1);
        }
        if over_budget || self.fail_on.contains(&kind) {
            log::debug!("RecordingBackend: injected failure creating {kind:?} `{label}`");
            return Err(match kind {
                ResourceKind::VertexBuffer | ResourceKind::IndexBuffer | ResourceKind::UniformBuffer => {
                    RenderError::allocation("buffer")
                }
                ResourceKind::Shader => RenderError::compile("shader", "injected failure"),
                ResourceKind::RootSignature => RenderError::compile("root signature", "injected failure"),
                ResourceKind::Pipeline => RenderError::compile("graphics pipeline", "injected failure"),
                ResourceKind::DescriptorSet => RenderError::compile("descriptor set", "injected failure"),
            });
        }

        self.next_id += 1;
        let id = self.next_id;
        self.live.insert(
            id,
            LiveResource {
                kind,
                label: label.to_owned(),
                size,
            },
        );
        self.log.push(Lifecycle::Created { kind, id });
        log::trace!("RecordingBackend: created {kind:?} #{id} `{label}`");
        Ok(id)
    }

    fn require(&self, id: u32, accepts: impl Fn(ResourceKind) -> bool, kind: &'static str) -> Result<(), RenderError> {
        match self.live.get(&id) {
            Some(resource) if accepts(resource.kind) => Ok(()),
            _ => Err(RenderError::InvalidHandle { kind }),
        }
    }

    fn destroy(&mut self, id: u32, accepts: impl Fn(ResourceKind) -> bool) {
        match self.live.get(&id) {
            Some(resource) if accepts(resource.kind) => {
                let kind = resource.kind;
                self.live.remove(&id);
                self.log.push(Lifecycle::Destroyed { kind, id });
                log::trace!("RecordingBackend: destroyed {kind:?} #{id}");
            }
            _ => log::warn!("RecordingBackend: destroy of unknown resource #{id}"),
        }
    }
}

impl RenderBackend for RecordingBackend {
    fn create_vertex_buffer(&mut self, desc: &VertexBufferDesc<'_>) -> Result<BufferHandle, RenderError> {
        self.create(ResourceKind::VertexBuffer, desc.label, desc.size_bytes())
            .map(BufferHandle::new)
    }

    fn create_index_buffer(&mut self, desc: &IndexBufferDesc<'_>) -> Result<BufferHandle, RenderError> {
        self.create(ResourceKind::IndexBuffer, desc.label, desc.size_bytes())
            .map(BufferHandle::new)
    }

    fn create_uniform_buffer(&mut self, desc: &UniformBufferDesc<'_>) -> Result<BufferHandle, RenderError> {
        self.create(ResourceKind::UniformBuffer, desc.label, desc.size)
            .map(BufferHandle::new)
    }

    fn upload_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) {
        if self.buffer_size(buffer).is_none() {
            log::warn!("RecordingBackend: upload to unknown buffer #{}", buffer.id());
            return;
        }
        self.log.push(Lifecycle::Uploaded {
            id: buffer.id(),
            offset,
            len: data.len(),
        });
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        self.destroy(buffer.id(), ResourceKind::is_buffer);
    }

    fn create_shader(&mut self, source: &ShaderSource) -> Result<ShaderHandle, RenderError> {
        self.create(ResourceKind::Shader, &source.name, 0)
            .map(ShaderHandle::new)
    }

    fn destroy_shader(&mut self, shader: ShaderHandle) {
        self.destroy(shader.id(), |k| k == ResourceKind::Shader);
    }

    fn create_root_signature(&mut self, desc: &RootSignatureDesc<'_>) -> Result<RootSignatureHandle, RenderError> {
        for shader in desc.shaders {
            self.require(shader.id(), |k| k == ResourceKind::Shader, "shader")?;
        }
        self.create(ResourceKind::RootSignature, desc.label, 0)
            .map(RootSignatureHandle::new)
    }

    fn destroy_root_signature(&mut self, root_signature: RootSignatureHandle) {
        self.destroy(root_signature.id(), |k| k == ResourceKind::RootSignature);
    }

    fn create_graphics_pipeline(&mut self, desc: &GraphicsPipelineDesc<'_>) -> Result<PipelineHandle, RenderError> {
        self.require(desc.shader.id(), |k| k == ResourceKind::Shader, "shader")?;
        self.require(
            desc.root_signature.id(),
            |k| k == ResourceKind::RootSignature,
            "root signature",
        )?;
        self.create(ResourceKind::Pipeline, desc.label, 0)
            .map(PipelineHandle::new)
    }

    fn destroy_pipeline(&mut self, pipeline: PipelineHandle) {
        self.destroy(pipeline.id(), |k| k == ResourceKind::Pipeline);
    }

    fn create_descriptor_set(&mut self, desc: &DescriptorSetDesc<'_>) -> Result<DescriptorSetHandle, RenderError> {
        self.require(
            desc.root_signature.id(),
            |k| k == ResourceKind::RootSignature,
            "root signature",
        )?;
        for descriptor in desc.buffers {
            self.require(descriptor.buffer.id(), |k| k == ResourceKind::UniformBuffer, "uniform buffer")?;
        }
        self.create(ResourceKind::DescriptorSet, desc.label, 0)
            .map(DescriptorSetHandle::new)
    }

    fn destroy_descriptor_set(&mut self, descriptor_set: DescriptorSetHandle) {
        self.destroy(descriptor_set.id(), |k| k == ResourceKind::DescriptorSet);
    }
}

/// A command recorded by [`RecordingEncoder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    UploadBuffer { buffer: BufferHandle, offset: u64, len: usize },
    BindDescriptorSet { descriptor_set: DescriptorSetHandle, index: u32 },
    BindIndexBuffer { buffer: BufferHandle, offset: u64 },
    BindVertexBuffer { buffer: BufferHandle, offset: u64 },
    BindPipeline { pipeline: PipelineHandle },
    Draw { vertex_count: u32, first_vertex: u32 },
    DrawIndexed { index_count: u32, first_index: u32, base_vertex: i32 },
}

#[derive(Debug, Default)]
pub struct RecordingEncoder {
    commands: Vec<Command>,
}

impl RecordingEncoder {
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn upload_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::UploadBuffer { .. }))
            .count()
    }

    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::Draw { .. } | Command::DrawIndexed { .. }))
            .count()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl GraphicsEncoder for RecordingEncoder {
    fn upload_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) {
        self.commands.push(Command::UploadBuffer {
            buffer,
            offset,
            len: data.len(),
        });
    }

    fn bind_descriptor_set(&mut self, descriptor_set: DescriptorSetHandle, index: u32) {
        self.commands
            .push(Command::BindDescriptorSet { descriptor_set, index });
    }

    fn bind_index_buffer(&mut self, buffer: BufferHandle, offset: u64) {
        self.commands.push(Command::BindIndexBuffer { buffer, offset });
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferHandle, offset: u64) {
        self.commands.push(Command::BindVertexBuffer { buffer, offset });
    }

    fn bind_pipeline(&mut self, pipeline: PipelineHandle) {
        self.commands.push(Command::BindPipeline { pipeline });
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) {
        self.commands.push(Command::Draw {
            vertex_count,
            first_vertex,
        });
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, base_vertex: i32) {
        self.commands.push(Command::DrawIndexed {
            index_count,
            first_index,
            base_vertex,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_destroy_tracks_live_resources() {
        let mut backend = RecordingBackend::new();
        let vb = backend
            .create_vertex_buffer(&VertexBufferDesc {
                label: "vb",
                vertex_count: 3,
                stride: 20,
            })
            .unwrap();
        assert_eq!(backend.live_count(), 1);
        assert_eq!(backend.buffer_size(vb), Some(60));

        backend.destroy_buffer(vb);
        assert_eq!(backend.live_count(), 0);
        assert_eq!(backend.destroyed_kinds(), vec![ResourceKind::VertexBuffer]);
    }

    #[test]
    fn injected_failure_creates_nothing() {
        let mut backend = RecordingBackend::new();
        backend.fail_on(ResourceKind::UniformBuffer);
        let result = backend.create_uniform_buffer(&UniformBufferDesc { label: "ub", size: 64 });
        assert!(matches!(result, Err(RenderError::Allocation { .. })));
        assert_eq!(backend.live_count(), 0);
        assert!(backend.lifecycle().is_empty());
    }

    #[test]
    fn destroy_with_wrong_kind_is_ignored() {
        let mut backend = RecordingBackend::new();
        let vb = backend
            .create_vertex_buffer(&VertexBufferDesc {
                label: "vb",
                vertex_count: 1,
                stride: 4,
            })
            .unwrap();
        backend.destroy_shader(ShaderHandle::new(vb.id()));
        assert_eq!(backend.live_count(), 1);
    }

    #[test]
    fn encoder_counts_uploads_and_draws() {
        let mut encoder = RecordingEncoder::default();
        encoder.upload_buffer(BufferHandle::new(1), 0, &[0; 16]);
        encoder.draw(3, 0);
        encoder.draw_indexed(6, 0, 0);
        assert_eq!(encoder.upload_count(), 1);
        assert_eq!(encoder.draw_count(), 2);
    }
}
