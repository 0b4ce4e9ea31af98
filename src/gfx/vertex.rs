//! # Vertex Data Structures
//!
//! GPU-compatible vertex formats and the stock layouts pipelines are built
//! against.

/// A grid vertex: position plus texture coordinate, 5 floats interleaved.
///
/// The `#[repr(C)]` attribute ensures the struct has a C-compatible memory
/// layout, which is required for GPU buffer operations.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GridVertex {
    /// 3D position coordinates [x, y, z]
    pub position: [f32; 3],
    /// Texture coordinates [u, v] in 0..=1 across the grid
    pub uv: [f32; 2],
}

/// A mesh vertex with position and normal data.
///
/// Solids are flat shaded, so every triangle carries its own copy of the
/// face normal.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    /// 3D position coordinates [x, y, z]
    pub position: [f32; 3],
    /// 3D normal vector [nx, ny, nz] for lighting calculations
    pub normal: [f32; 3],
}

/// Stock vertex layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexLayout {
    /// [`GridVertex`]: Float32x3 at location 0, Float32x2 at location 1.
    PositionUv,
    /// [`MeshVertex`]: Float32x3 at location 0, Float32x3 at location 1.
    PositionNormal,
}

static POSITION_UV_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];
static POSITION_NORMAL_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

impl VertexLayout {
    pub fn stride(self) -> u32 {
        match self {
            VertexLayout::PositionUv => std::mem::size_of::<GridVertex>() as u32,
            VertexLayout::PositionNormal => std::mem::size_of::<MeshVertex>() as u32,
        }
    }

    /// Returns the vertex buffer layout for wgpu rendering.
    pub fn desc(self) -> wgpu::VertexBufferLayout<'static> {
        let attributes: &'static [wgpu::VertexAttribute] = match self {
            VertexLayout::PositionUv => &POSITION_UV_ATTRIBUTES,
            VertexLayout::PositionNormal => &POSITION_NORMAL_ATTRIBUTES,
        };
        wgpu::VertexBufferLayout {
            array_stride: u64::from(self.stride()),
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_vertex_is_five_floats() {
        assert_eq!(VertexLayout::PositionUv.stride(), 20);
        assert_eq!(VertexLayout::PositionNormal.stride(), 24);
    }

    #[test]
    fn layouts_describe_two_attributes() {
        let desc = VertexLayout::PositionUv.desc();
        assert_eq!(desc.attributes.len(), 2);
        assert_eq!(desc.attributes[1].offset, 12);
        assert_eq!(desc.array_stride, 20);
    }
}
