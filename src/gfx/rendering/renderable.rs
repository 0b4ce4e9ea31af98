//! The renderable object: every GPU resource needed to draw one thing.
//!
//! ```text
//! create ──► Ready ──update/render──► Ready ──destroy──► (gone)
//!    └─ any step fails ──► everything created so far released, Err
//! ```
//!
//! Geometry is uploaded once at construction and never again; only the
//! uniform payload `U` is re-uploaded, once per [`render`](RenderableObject::render).

use crate::error::{ConstructionError, ConstructionStep};
use crate::gfx::assets::ShaderLoader;
use crate::gfx::backend::{
    BlendMode, BufferDescriptor, BufferHandle, CullMode, DepthMode, DescriptorFrequency, DescriptorSetDesc,
    DescriptorSetHandle, GraphicsEncoder, GraphicsPipelineDesc, IndexBufferDesc, OutputLayout, PipelineHandle,
    RenderBackend, RootSignatureDesc, RootSignatureHandle, ShaderHandle, Topology, UniformBufferDesc, UniformSlot,
    VertexBufferDesc,
};
use crate::gfx::camera::RenderView;
use crate::gfx::geometry::GeometrySource;

use super::construction::{release_in_teardown_order, ConstructionScope, CreatedResource};
use super::uniforms::{GpuView, Transform, UniformPayload};

/// Name of the single uniform slot every renderable exposes.
pub const VIEW_SLOT: &str = "View";

/// Depth state for a pipeline: test and write only when there is a depth
/// target and the geometry wants it.
pub fn depth_mode_for(layout: &OutputLayout, wants_depth_test: bool) -> DepthMode {
    if layout.has_depth() && wants_depth_test {
        DepthMode::ReadWriteLess
    } else {
        DepthMode::Ignore
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IndexedDraw {
    buffer: BufferHandle,
    count: u32,
}

pub struct RenderableObject<U: UniformPayload> {
    label: String,
    vertex_buffer: BufferHandle,
    vertex_count: u32,
    index: Option<IndexedDraw>,
    uniform_buffer: BufferHandle,
    shader: ShaderHandle,
    root_signature: RootSignatureHandle,
    pipeline: PipelineHandle,
    descriptor_set: DescriptorSetHandle,
    uniforms: U,
    released: bool,
}

impl<U: UniformPayload> RenderableObject<U> {
    /// Builds every resource for `source`, or none of them.
    pub fn create<S, B, L>(source: &S, backend: &mut B, shaders: &L, layout: &OutputLayout) -> Result<Self, ConstructionError>
    where
        S: GeometrySource + ?Sized,
        B: RenderBackend + ?Sized,
        L: ShaderLoader + ?Sized,
    {
        let label = source.label().to_owned();
        let mut scope = ConstructionScope::new(backend, label.as_str());

        let geometry = source
            .build_geometry()
            .map_err(|err| scope.fail(ConstructionStep::Geometry, err))?;

        let vertex_buffer = scope.create(
            ConstructionStep::VertexBuffer,
            |b| {
                b.create_vertex_buffer(&VertexBufferDesc {
                    label: &label,
                    vertex_count: geometry.vertex_count,
                    stride: geometry.vertex_stride,
                })
            },
            CreatedResource::VertexBuffer,
        )?;
        scope.backend().upload_buffer(vertex_buffer, 0, &geometry.vertex_data);

        let index = match &geometry.indices {
            Some(indices) => {
                let count = indices.len() as u32;
                let buffer = scope.create(
                    ConstructionStep::IndexBuffer,
                    |b| {
                        b.create_index_buffer(&IndexBufferDesc {
                            label: &label,
                            index_count: count,
                            format: indices.format(),
                        })
                    },
                    CreatedResource::IndexBuffer,
                )?;
                scope.backend().upload_buffer(buffer, 0, indices.as_bytes());
                Some(IndexedDraw { buffer, count })
            }
            None => None,
        };
        let vertex_count = geometry.vertex_count;
        // Staging data is no longer needed once it is on the GPU
        drop(geometry);

        let uniform_size = std::mem::size_of::<U>() as u64;
        let uniform_buffer = scope.create(
            ConstructionStep::UniformBuffer,
            |b| {
                b.create_uniform_buffer(&UniformBufferDesc {
                    label: &label,
                    size: uniform_size,
                })
            },
            CreatedResource::UniformBuffer,
        )?;

        let shader_source = shaders
            .load_pair(source.shader_name())
            .map_err(|err| scope.fail(ConstructionStep::Shader, err))?;
        let shader = scope.create(
            ConstructionStep::Shader,
            |b| b.create_shader(&shader_source),
            CreatedResource::Shader,
        )?;

        let uniform_slots = [UniformSlot {
            name: VIEW_SLOT,
            binding: 0,
            size: uniform_size,
        }];
        let root_signature = scope.create(
            ConstructionStep::RootSignature,
            |b| {
                b.create_root_signature(&RootSignatureDesc {
                    label: &label,
                    shaders: &[shader],
                    uniform_slots: &uniform_slots,
                })
            },
            CreatedResource::RootSignature,
        )?;

        let pipeline = scope.create(
            ConstructionStep::Pipeline,
            |b| {
                b.create_graphics_pipeline(&GraphicsPipelineDesc {
                    label: &label,
                    shader,
                    root_signature,
                    vertex_layout: source.vertex_layout(),
                    blend: BlendMode::Opaque,
                    depth: depth_mode_for(layout, source.depth_test()),
                    cull: CullMode::Back,
                    topology: Topology::TriangleList,
                    output: *layout,
                })
            },
            CreatedResource::Pipeline,
        )?;

        let descriptor_set = scope.create(
            ConstructionStep::DescriptorSet,
            |b| {
                b.create_descriptor_set(&DescriptorSetDesc {
                    label: &label,
                    root_signature,
                    frequency: DescriptorFrequency::PerFrame,
                    set_index: 0,
                    buffers: &[BufferDescriptor {
                        name: VIEW_SLOT,
                        binding: 0,
                        buffer: uniform_buffer,
                        offset: 0,
                        size: uniform_size,
                    }],
                })
            },
            CreatedResource::DescriptorSet,
        )?;

        scope.commit();
        log::debug!("Renderable `{label}` ready");

        Ok(Self {
            label,
            vertex_buffer,
            vertex_count,
            index,
            uniform_buffer,
            shader,
            root_signature,
            pipeline,
            descriptor_set,
            uniforms: U::zeroed(),
            released: false,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// `None` for non-indexed renderables.
    pub fn index_count(&self) -> Option<u32> {
        self.index.map(|index| index.count)
    }

    pub fn uniforms(&self) -> &U {
        &self.uniforms
    }

    pub fn uniforms_mut(&mut self) -> &mut U {
        &mut self.uniforms
    }

    /// Recomputes the camera matrices for the next draw.
    pub fn update(&mut self, view: &RenderView) {
        self.uniforms.set_view(&GpuView::from_render_view(view));
    }

    pub fn set_transform(&mut self, transform: &Transform) {
        self.uniforms.set_transform(transform);
    }

    /// One uniform upload, the binds, one draw.
    pub fn render<E: GraphicsEncoder + ?Sized>(&self, encoder: &mut E) {
        encoder.upload_buffer(self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms));
        encoder.bind_descriptor_set(self.descriptor_set, 0);
        if let Some(index) = self.index {
            encoder.bind_index_buffer(index.buffer, 0);
        }
        encoder.bind_vertex_buffer(self.vertex_buffer, 0);
        encoder.bind_pipeline(self.pipeline);

        match self.index {
            Some(index) => encoder.draw_indexed(index.count, 0, 0),
            None => encoder.draw(self.vertex_count, 0),
        }
    }

    fn resources(&self) -> Vec<CreatedResource> {
        let mut resources = vec![
            CreatedResource::DescriptorSet(self.descriptor_set),
            CreatedResource::Pipeline(self.pipeline),
            CreatedResource::Shader(self.shader),
            CreatedResource::RootSignature(self.root_signature),
            CreatedResource::UniformBuffer(self.uniform_buffer),
            CreatedResource::VertexBuffer(self.vertex_buffer),
        ];
        if let Some(index) = self.index {
            resources.push(CreatedResource::IndexBuffer(index.buffer));
        }
        resources
    }

    /// Releases everything in teardown order.
    pub fn destroy<B: RenderBackend + ?Sized>(mut self, backend: &mut B) {
        release_in_teardown_order(self.resources(), backend);
        self.released = true;
        log::debug!("Renderable `{}` destroyed", self.label);
    }
}

impl<U: UniformPayload> Drop for RenderableObject<U> {
    fn drop(&mut self) {
        if !self.released {
            log::warn!("Renderable `{}` dropped without destroy; its GPU resources leak", self.label);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::assets::EmbeddedShaders;
    use crate::gfx::backend::{Command, RecordingBackend, ResourceKind};
    use crate::gfx::geometry::{FullscreenTriangle, Solid, SolidMesh};
    use crate::gfx::rendering::uniforms::{CompositeUniforms, ObjectUniforms};

    fn layout() -> OutputLayout {
        OutputLayout::with_depth(wgpu::TextureFormat::Bgra8UnormSrgb, wgpu::TextureFormat::Depth32Float)
    }

    #[test]
    fn depth_follows_layout_and_source() {
        let color = OutputLayout::color_only(wgpu::TextureFormat::Rgba8Unorm);
        assert_eq!(depth_mode_for(&color, true), DepthMode::Ignore);
        assert_eq!(depth_mode_for(&layout(), true), DepthMode::ReadWriteLess);
        assert_eq!(depth_mode_for(&layout(), false), DepthMode::Ignore);
    }

    #[test]
    fn create_builds_seven_resources_and_uploads_geometry() {
        let mut backend = RecordingBackend::new();
        let cube = SolidMesh { solid: Solid::Cube };
        let renderable =
            RenderableObject::<ObjectUniforms>::create(&cube, &mut backend, &EmbeddedShaders, &layout()).unwrap();

        assert_eq!(backend.live_count(), 7);
        for kind in [
            ResourceKind::VertexBuffer,
            ResourceKind::IndexBuffer,
            ResourceKind::UniformBuffer,
            ResourceKind::Shader,
            ResourceKind::RootSignature,
            ResourceKind::Pipeline,
            ResourceKind::DescriptorSet,
        ] {
            assert_eq!(backend.live_of(kind), 1, "{kind:?}");
        }
        assert_eq!(renderable.index_count(), Some(36));

        renderable.destroy(&mut backend);
        assert_eq!(backend.live_count(), 0);
    }

    #[test]
    fn non_indexed_source_skips_the_index_buffer() {
        let mut backend = RecordingBackend::new();
        let triangle = FullscreenTriangle {
            shader: "synthwave/composite",
        };
        let renderable =
            RenderableObject::<CompositeUniforms>::create(&triangle, &mut backend, &EmbeddedShaders, &layout())
                .unwrap();
        assert_eq!(backend.live_count(), 6);
        assert_eq!(backend.live_of(ResourceKind::IndexBuffer), 0);

        let mut encoder = backend.encoder();
        renderable.render(&mut encoder);
        assert_eq!(
            encoder.commands().last(),
            Some(&Command::Draw {
                vertex_count: 3,
                first_vertex: 0
            })
        );
        assert!(!encoder
            .commands()
            .iter()
            .any(|c| matches!(c, Command::BindIndexBuffer { .. })));

        renderable.destroy(&mut backend);
        assert_eq!(
            backend.destroyed_kinds(),
            vec![
                ResourceKind::DescriptorSet,
                ResourceKind::Pipeline,
                ResourceKind::Shader,
                ResourceKind::RootSignature,
                ResourceKind::UniformBuffer,
                ResourceKind::VertexBuffer,
            ]
        );
    }

    #[test]
    fn render_binds_in_order_then_draws_once() {
        let mut backend = RecordingBackend::new();
        let mut renderable = RenderableObject::<ObjectUniforms>::create(
            &SolidMesh {
                solid: Solid::Tetrahedron,
            },
            &mut backend,
            &EmbeddedShaders,
            &layout(),
        )
        .unwrap();
        renderable.update(&RenderView::default());

        let mut encoder = backend.encoder();
        renderable.render(&mut encoder);
        let commands = encoder.commands();
        assert_eq!(commands.len(), 6);
        assert!(matches!(commands[0], Command::UploadBuffer { len, .. } if len == std::mem::size_of::<ObjectUniforms>()));
        assert!(matches!(commands[1], Command::BindDescriptorSet { index: 0, .. }));
        assert!(matches!(commands[2], Command::BindIndexBuffer { .. }));
        assert!(matches!(commands[3], Command::BindVertexBuffer { .. }));
        assert!(matches!(commands[4], Command::BindPipeline { .. }));
        assert_eq!(
            commands[5],
            Command::DrawIndexed {
                index_count: 12,
                first_index: 0,
                base_vertex: 0
            }
        );

        renderable.destroy(&mut backend);
    }
}
