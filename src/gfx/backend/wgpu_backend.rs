//! wgpu implementation of the renderer collaborator.
//!
//! Resources live in per-kind tables keyed by handle id. Creation runs inside
//! a wgpu error scope so that validation and out-of-memory errors come back
//! as `Err` instead of surfacing later through the uncaptured-error handler.

use std::collections::HashMap;
use std::num::NonZeroU64;
use std::sync::Arc;

use wgpu::{Device, Queue};

use super::{
    BlendMode, BufferHandle, CullMode, DepthMode, DescriptorSetDesc, DescriptorSetHandle,
    GraphicsEncoder, GraphicsPipelineDesc, IndexBufferDesc, IndexFormat, PipelineHandle,
    RenderBackend, RootSignatureDesc, RootSignatureHandle, ShaderHandle, ShaderSource, Topology,
    UniformBufferDesc, VertexBufferDesc,
};
use crate::error::RenderError;
use crate::wgpu_utils::binding_types;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BufferRole {
    Vertex,
    Index(IndexFormat),
    Uniform,
}

struct GpuBuffer {
    buffer: wgpu::Buffer,
    role: BufferRole,
}

struct GpuShader {
    vertex: wgpu::ShaderModule,
    vertex_entry: &'static str,
    fragment: wgpu::ShaderModule,
    fragment_entry: &'static str,
}

struct GpuRootSignature {
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
}

struct GpuDescriptorSet {
    bind_group: wgpu::BindGroup,
}

/// Owns every GPU object created on behalf of renderables.
pub struct WgpuBackend {
    device: Arc<Device>,
    queue: Arc<Queue>,
    next_id: u32,
    buffers: HashMap<u32, GpuBuffer>,
    shaders: HashMap<u32, GpuShader>,
    root_signatures: HashMap<u32, GpuRootSignature>,
    pipelines: HashMap<u32, wgpu::RenderPipeline>,
    descriptor_sets: HashMap<u32, GpuDescriptorSet>,
}

impl WgpuBackend {
    pub fn new(device: Arc<Device>, queue: Arc<Queue>) -> Self {
        Self {
            device,
            queue,
            next_id: 0,
            buffers: HashMap::new(),
            shaders: HashMap::new(),
            root_signatures: HashMap::new(),
            pipelines: HashMap::new(),
            descriptor_sets: HashMap::new(),
        }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Number of live GPU objects across all tables.
    pub fn live_count(&self) -> usize {
        self.buffers.len()
            + self.shaders.len()
            + self.root_signatures.len()
            + self.pipelines.len()
            + self.descriptor_sets.len()
    }

    /// Starts recording into `pass`.
    pub fn encoder<'a, 'p>(&'a self, pass: &'a mut wgpu::RenderPass<'p>) -> WgpuEncoder<'a, 'p> {
        WgpuEncoder { backend: self, pass }
    }

    fn allocate_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    /// Runs `create` inside an error scope and reports whatever wgpu captured.
    fn scoped<T>(&self, filter: wgpu::ErrorFilter, create: impl FnOnce(&Device) -> T) -> Result<T, wgpu::Error> {
        self.device.push_error_scope(filter);
        let value = create(&self.device);
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(error) => Err(error),
            None => Ok(value),
        }
    }

    fn create_buffer(
        &mut self,
        label: &str,
        size: u64,
        usage: wgpu::BufferUsages,
        role: BufferRole,
    ) -> Result<BufferHandle, RenderError> {
        if size == 0 {
            return Err(RenderError::allocation("zero-sized buffer"));
        }
        let size = size.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);
        let buffer = self
            .scoped(wgpu::ErrorFilter::OutOfMemory, |device| {
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(label),
                    size,
                    usage: usage | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                })
            })
            .map_err(|error| {
                log::error!("WgpuBackend: buffer `{label}` ({size} bytes): {error}");
                RenderError::allocation("gpu buffer")
            })?;

        let id = self.allocate_id();
        self.buffers.insert(id, GpuBuffer { buffer, role });
        log::debug!("WgpuBackend: created {role:?} buffer #{id} `{label}` ({size} bytes)");
        Ok(BufferHandle::new(id))
    }

    fn root_signature(&self, handle: RootSignatureHandle) -> Result<&GpuRootSignature, RenderError> {
        self.root_signatures
            .get(&handle.id())
            .ok_or(RenderError::InvalidHandle { kind: "root signature" })
    }
}

fn depth_stencil_state(format: Option<wgpu::TextureFormat>, mode: DepthMode) -> Option<wgpu::DepthStencilState> {
    let format = format?;
    let (depth_write_enabled, depth_compare) = match mode {
        DepthMode::Ignore => (false, wgpu::CompareFunction::Always),
        DepthMode::ReadWriteLess => (true, wgpu::CompareFunction::Less),
    };
    Some(wgpu::DepthStencilState {
        format,
        depth_write_enabled,
        depth_compare,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    })
}

impl RenderBackend for WgpuBackend {
    fn create_vertex_buffer(&mut self, desc: &VertexBufferDesc<'_>) -> Result<BufferHandle, RenderError> {
        self.create_buffer(desc.label, desc.size_bytes(), wgpu::BufferUsages::VERTEX, BufferRole::Vertex)
    }

    fn create_index_buffer(&mut self, desc: &IndexBufferDesc<'_>) -> Result<BufferHandle, RenderError> {
        self.create_buffer(
            desc.label,
            desc.size_bytes(),
            wgpu::BufferUsages::INDEX,
            BufferRole::Index(desc.format),
        )
    }

    fn create_uniform_buffer(&mut self, desc: &UniformBufferDesc<'_>) -> Result<BufferHandle, RenderError> {
        self.create_buffer(desc.label, desc.size, wgpu::BufferUsages::UNIFORM, BufferRole::Uniform)
    }

    fn upload_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) {
        write_buffer(self, buffer, offset, data);
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        match self.buffers.remove(&buffer.id()) {
            Some(gpu) => gpu.buffer.destroy(),
            None => log::warn!("WgpuBackend: destroy of unknown buffer #{}", buffer.id()),
        }
    }

    fn create_shader(&mut self, source: &ShaderSource) -> Result<ShaderHandle, RenderError> {
        let name = source.name.as_str();
        let shared = Arc::ptr_eq(&source.vertex.code, &source.fragment.code);
        let (vertex, fragment) = self
            .scoped(wgpu::ErrorFilter::Validation, |device| {
                let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(name),
                    source: wgpu::ShaderSource::Wgsl(source.vertex.code.as_ref().into()),
                });
                let fragment = if shared {
                    vertex.clone()
                } else {
                    device.create_shader_module(wgpu::ShaderModuleDescriptor {
                        label: Some(name),
                        source: wgpu::ShaderSource::Wgsl(source.fragment.code.as_ref().into()),
                    })
                };
                (vertex, fragment)
            })
            .map_err(|error| RenderError::compile("shader", error.to_string()))?;

        let id = self.allocate_id();
        self.shaders.insert(
            id,
            GpuShader {
                vertex,
                vertex_entry: source.vertex.entry_point,
                fragment,
                fragment_entry: source.fragment.entry_point,
            },
        );
        log::debug!("WgpuBackend: compiled shader #{id} `{name}`");
        Ok(ShaderHandle::new(id))
    }

    fn destroy_shader(&mut self, shader: ShaderHandle) {
        if self.shaders.remove(&shader.id()).is_none() {
            log::warn!("WgpuBackend: destroy of unknown shader #{}", shader.id());
        }
    }

    fn create_root_signature(&mut self, desc: &RootSignatureDesc<'_>) -> Result<RootSignatureHandle, RenderError> {
        for shader in desc.shaders {
            if !self.shaders.contains_key(&shader.id()) {
                return Err(RenderError::InvalidHandle { kind: "shader" });
            }
        }

        let entries: Vec<wgpu::BindGroupLayoutEntry> = desc
            .uniform_slots
            .iter()
            .map(|slot| wgpu::BindGroupLayoutEntry {
                binding: slot.binding,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: binding_types::uniform_sized(slot.size),
                count: None,
            })
            .collect();

        let label = desc.label;
        let (bind_group_layout, pipeline_layout) = self
            .scoped(wgpu::ErrorFilter::Validation, |device| {
                let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some(label),
                    entries: &entries,
                });
                let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some(label),
                    bind_group_layouts: &[&bind_group_layout],
                    push_constant_ranges: &[],
                });
                (bind_group_layout, pipeline_layout)
            })
            .map_err(|error| RenderError::compile("root signature", error.to_string()))?;

        let id = self.allocate_id();
        self.root_signatures.insert(
            id,
            GpuRootSignature {
                bind_group_layout,
                pipeline_layout,
            },
        );
        Ok(RootSignatureHandle::new(id))
    }

    fn destroy_root_signature(&mut self, root_signature: RootSignatureHandle) {
        if self.root_signatures.remove(&root_signature.id()).is_none() {
            log::warn!("WgpuBackend: destroy of unknown root signature #{}", root_signature.id());
        }
    }

    fn create_graphics_pipeline(&mut self, desc: &GraphicsPipelineDesc<'_>) -> Result<PipelineHandle, RenderError> {
        let shader = self
            .shaders
            .get(&desc.shader.id())
            .ok_or(RenderError::InvalidHandle { kind: "shader" })?;
        let layout = &self.root_signature(desc.root_signature)?.pipeline_layout;

        let blend = match desc.blend {
            BlendMode::Opaque => wgpu::BlendState::REPLACE,
        };
        let cull_mode = match desc.cull {
            CullMode::None => None,
            CullMode::Back => Some(wgpu::Face::Back),
        };
        let topology = match desc.topology {
            Topology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
        };
        let vertex_buffers = [desc.vertex_layout.desc()];
        let color_targets = [Some(wgpu::ColorTargetState {
            format: desc.output.color_format,
            blend: Some(blend),
            write_mask: wgpu::ColorWrites::ALL,
        })];

        let pipeline = self
            .scoped(wgpu::ErrorFilter::Validation, |device| {
                device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some(desc.label),
                    layout: Some(layout),
                    vertex: wgpu::VertexState {
                        module: &shader.vertex,
                        entry_point: Some(shader.vertex_entry),
                        buffers: &vertex_buffers,
                        compilation_options: Default::default(),
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &shader.fragment,
                        entry_point: Some(shader.fragment_entry),
                        targets: &color_targets,
                        compilation_options: Default::default(),
                    }),
                    primitive: wgpu::PrimitiveState {
                        topology,
                        strip_index_format: None,
                        front_face: wgpu::FrontFace::Ccw,
                        cull_mode,
                        unclipped_depth: false,
                        polygon_mode: wgpu::PolygonMode::Fill,
                        conservative: false,
                    },
                    depth_stencil: depth_stencil_state(desc.output.depth_format, desc.depth),
                    multisample: wgpu::MultisampleState {
                        count: desc.output.sample_count,
                        ..Default::default()
                    },
                    multiview: None,
                    cache: None,
                })
            })
            .map_err(|error| RenderError::compile("graphics pipeline", error.to_string()))?;

        let id = self.allocate_id();
        self.pipelines.insert(id, pipeline);
        log::debug!("WgpuBackend: created pipeline #{id} `{}`", desc.label);
        Ok(PipelineHandle::new(id))
    }

    fn destroy_pipeline(&mut self, pipeline: PipelineHandle) {
        if self.pipelines.remove(&pipeline.id()).is_none() {
            log::warn!("WgpuBackend: destroy of unknown pipeline #{}", pipeline.id());
        }
    }

    fn create_descriptor_set(&mut self, desc: &DescriptorSetDesc<'_>) -> Result<DescriptorSetHandle, RenderError> {
        let layout = &self.root_signature(desc.root_signature)?.bind_group_layout;

        let mut entries = Vec::with_capacity(desc.buffers.len());
        for descriptor in desc.buffers {
            let gpu = self
                .buffers
                .get(&descriptor.buffer.id())
                .filter(|gpu| gpu.role == BufferRole::Uniform)
                .ok_or(RenderError::InvalidHandle { kind: "uniform buffer" })?;
            entries.push(wgpu::BindGroupEntry {
                binding: descriptor.binding,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &gpu.buffer,
                    offset: descriptor.offset,
                    size: NonZeroU64::new(descriptor.size),
                }),
            });
        }

        let bind_group = self
            .scoped(wgpu::ErrorFilter::Validation, |device| {
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(desc.label),
                    layout,
                    entries: &entries,
                })
            })
            .map_err(|error| RenderError::compile("descriptor set", error.to_string()))?;

        let id = self.allocate_id();
        self.descriptor_sets.insert(id, GpuDescriptorSet { bind_group });
        log::trace!(
            "WgpuBackend: descriptor set #{id} `{}` ({:?}, group {})",
            desc.label,
            desc.frequency,
            desc.set_index
        );
        Ok(DescriptorSetHandle::new(id))
    }

    fn destroy_descriptor_set(&mut self, descriptor_set: DescriptorSetHandle) {
        if self.descriptor_sets.remove(&descriptor_set.id()).is_none() {
            log::warn!("WgpuBackend: destroy of unknown descriptor set #{}", descriptor_set.id());
        }
    }
}

fn write_buffer(backend: &WgpuBackend, buffer: BufferHandle, offset: u64, data: &[u8]) {
    let Some(gpu) = backend.buffers.get(&buffer.id()) else {
        log::warn!("WgpuBackend: upload to unknown buffer #{}", buffer.id());
        return;
    };
    let align = wgpu::COPY_BUFFER_ALIGNMENT as usize;
    if data.len() % align == 0 {
        backend.queue.write_buffer(&gpu.buffer, offset, data);
    } else {
        let mut padded = data.to_vec();
        padded.resize(data.len().next_multiple_of(align), 0);
        backend.queue.write_buffer(&gpu.buffer, offset, &padded);
    }
}

/// Records binds and draws into an open render pass.
pub struct WgpuEncoder<'a, 'p> {
    backend: &'a WgpuBackend,
    pass: &'a mut wgpu::RenderPass<'p>,
}

impl GraphicsEncoder for WgpuEncoder<'_, '_> {
    fn upload_buffer(&mut self, buffer: BufferHandle, offset: u64, data: &[u8]) {
        write_buffer(self.backend, buffer, offset, data);
    }

    fn bind_descriptor_set(&mut self, descriptor_set: DescriptorSetHandle, index: u32) {
        match self.backend.descriptor_sets.get(&descriptor_set.id()) {
            Some(set) => self.pass.set_bind_group(index, &set.bind_group, &[]),
            None => log::warn!("WgpuEncoder: unknown descriptor set #{}", descriptor_set.id()),
        }
    }

    fn bind_index_buffer(&mut self, buffer: BufferHandle, offset: u64) {
        match self.backend.buffers.get(&buffer.id()) {
            Some(GpuBuffer {
                buffer,
                role: BufferRole::Index(format),
            }) => self.pass.set_index_buffer(buffer.slice(offset..), format.to_wgpu()),
            _ => log::warn!("WgpuEncoder: #{} is not an index buffer", buffer.id()),
        }
    }

    fn bind_vertex_buffer(&mut self, buffer: BufferHandle, offset: u64) {
        match self.backend.buffers.get(&buffer.id()) {
            Some(GpuBuffer {
                buffer,
                role: BufferRole::Vertex,
            }) => self.pass.set_vertex_buffer(0, buffer.slice(offset..)),
            _ => log::warn!("WgpuEncoder: #{} is not a vertex buffer", buffer.id()),
        }
    }

    fn bind_pipeline(&mut self, pipeline: PipelineHandle) {
        match self.backend.pipelines.get(&pipeline.id()) {
            Some(pipeline) => self.pass.set_pipeline(pipeline),
            None => log::warn!("WgpuEncoder: unknown pipeline #{}", pipeline.id()),
        }
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) {
        self.pass.draw(first_vertex..first_vertex + vertex_count, 0..1);
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, base_vertex: i32) {
        self.pass
            .draw_indexed(first_index..first_index + index_count, base_vertex, 0..1);
    }
}
