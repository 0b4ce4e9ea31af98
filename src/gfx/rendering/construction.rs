//! Scoped acquisition for renderable construction.
//!
//! A [`ConstructionScope`] remembers every resource created through it. If
//! the scope is dropped before [`commit`](ConstructionScope::commit), it
//! releases them in teardown order, so an early `?` return can never leak.

use crate::error::{ConstructionError, ConstructionStep, RenderError};
use crate::gfx::backend::{
    BufferHandle, DescriptorSetHandle, PipelineHandle, RenderBackend, RootSignatureHandle, ShaderHandle,
};

/// A resource owned by a renderable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatedResource {
    DescriptorSet(DescriptorSetHandle),
    Pipeline(PipelineHandle),
    Shader(ShaderHandle),
    RootSignature(RootSignatureHandle),
    UniformBuffer(BufferHandle),
    IndexBuffer(BufferHandle),
    VertexBuffer(BufferHandle),
}

impl CreatedResource {
    /// Position in the teardown order; lower is released first.
    fn teardown_rank(&self) -> u8 {
        match self {
            CreatedResource::DescriptorSet(_) => 0,
            CreatedResource::Pipeline(_) => 1,
            CreatedResource::Shader(_) => 2,
            CreatedResource::RootSignature(_) => 3,
            CreatedResource::UniformBuffer(_) => 4,
            CreatedResource::IndexBuffer(_) => 5,
            CreatedResource::VertexBuffer(_) => 6,
        }
    }

    pub fn release<B: RenderBackend + ?Sized>(self, backend: &mut B) {
        match self {
            CreatedResource::DescriptorSet(handle) => backend.destroy_descriptor_set(handle),
            CreatedResource::Pipeline(handle) => backend.destroy_pipeline(handle),
            CreatedResource::Shader(handle) => backend.destroy_shader(handle),
            CreatedResource::RootSignature(handle) => backend.destroy_root_signature(handle),
            CreatedResource::UniformBuffer(handle)
            | CreatedResource::IndexBuffer(handle)
            | CreatedResource::VertexBuffer(handle) => backend.destroy_buffer(handle),
        }
    }
}

/// Releases `resources` as descriptor set, pipeline, shader, root signature,
/// uniform buffer, index buffer, vertex buffer.
pub fn release_in_teardown_order<B: RenderBackend + ?Sized>(mut resources: Vec<CreatedResource>, backend: &mut B) {
    resources.sort_by_key(CreatedResource::teardown_rank);
    for resource in resources {
        resource.release(backend);
    }
}

pub struct ConstructionScope<'b, B: RenderBackend + ?Sized> {
    backend: &'b mut B,
    label: String,
    created: Vec<CreatedResource>,
}

impl<'b, B: RenderBackend + ?Sized> ConstructionScope<'b, B> {
    pub fn new(backend: &'b mut B, label: impl Into<String>) -> Self {
        Self {
            backend,
            label: label.into(),
            created: Vec::with_capacity(7),
        }
    }

    pub fn backend(&mut self) -> &mut B {
        self.backend
    }

    /// Wraps a failure at `step` with this scope's label.
    pub fn fail(&self, step: ConstructionStep, source: RenderError) -> ConstructionError {
        log::error!("Renderable `{}`: {step} step failed: {source}", self.label);
        ConstructionError {
            label: self.label.clone(),
            step,
            source,
        }
    }

    /// Runs one creation step and tracks its result for unwinding.
    pub fn create<H: Copy>(
        &mut self,
        step: ConstructionStep,
        make: impl FnOnce(&mut B) -> Result<H, RenderError>,
        track: fn(H) -> CreatedResource,
    ) -> Result<H, ConstructionError> {
        match make(self.backend) {
            Ok(handle) => {
                self.created.push(track(handle));
                Ok(handle)
            }
            Err(source) => Err(self.fail(step, source)),
        }
    }

    /// Ends the scope successfully; the caller now owns the resources.
    pub fn commit(mut self) -> Vec<CreatedResource> {
        std::mem::take(&mut self.created)
    }
}

impl<B: RenderBackend + ?Sized> Drop for ConstructionScope<'_, B> {
    fn drop(&mut self) {
        if self.created.is_empty() {
            return;
        }
        log::debug!(
            "Renderable `{}`: unwinding {} created resource(s)",
            self.label,
            self.created.len()
        );
        release_in_teardown_order(std::mem::take(&mut self.created), self.backend);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::backend::{RecordingBackend, ResourceKind, UniformBufferDesc, VertexBufferDesc};

    fn vertex_buffer(backend: &mut RecordingBackend) -> Result<BufferHandle, RenderError> {
        backend.create_vertex_buffer(&VertexBufferDesc {
            label: "vb",
            vertex_count: 3,
            stride: 20,
        })
    }

    fn uniform_buffer(backend: &mut RecordingBackend) -> Result<BufferHandle, RenderError> {
        backend.create_uniform_buffer(&UniformBufferDesc { label: "ub", size: 64 })
    }

    #[test]
    fn dropping_an_uncommitted_scope_releases_in_teardown_order() {
        let mut backend = RecordingBackend::new();
        {
            let mut scope = ConstructionScope::new(&mut backend, "partial");
            scope
                .create(ConstructionStep::VertexBuffer, vertex_buffer, CreatedResource::VertexBuffer)
                .unwrap();
            scope
                .create(ConstructionStep::UniformBuffer, uniform_buffer, CreatedResource::UniformBuffer)
                .unwrap();
        }
        assert_eq!(backend.live_count(), 0);
        assert_eq!(
            backend.destroyed_kinds(),
            vec![ResourceKind::UniformBuffer, ResourceKind::VertexBuffer]
        );
    }

    #[test]
    fn committed_resources_survive_the_scope() {
        let mut backend = RecordingBackend::new();
        let owned = {
            let mut scope = ConstructionScope::new(&mut backend, "ready");
            scope
                .create(ConstructionStep::VertexBuffer, vertex_buffer, CreatedResource::VertexBuffer)
                .unwrap();
            scope.commit()
        };
        assert_eq!(backend.live_count(), 1);

        release_in_teardown_order(owned, &mut backend);
        assert_eq!(backend.live_count(), 0);
    }

    #[test]
    fn failed_step_reports_label_and_step() {
        let mut backend = RecordingBackend::new();
        backend.fail_on(ResourceKind::UniformBuffer);
        let mut scope = ConstructionScope::new(&mut backend, "grid");
        scope
            .create(ConstructionStep::VertexBuffer, vertex_buffer, CreatedResource::VertexBuffer)
            .unwrap();
        let err = scope
            .create(ConstructionStep::UniformBuffer, uniform_buffer, CreatedResource::UniformBuffer)
            .unwrap_err();
        assert_eq!(err.label, "grid");
        assert_eq!(err.step, ConstructionStep::UniformBuffer);
        assert!(matches!(err.source, RenderError::Allocation { .. }));
        drop(scope);
        assert_eq!(backend.live_count(), 0);
    }
}
