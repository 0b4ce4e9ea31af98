//! # Procedural Geometry Generation
//!
//! CPU-side staging data for renderables. A [`GeometrySource`] describes what
//! to draw and which shader draws it; [`Geometry`] is the byte-level result
//! that gets uploaded once and then dropped.
//!
//! ## Sources
//!
//! - [`GridMesh`]: a triangulated `width x height` plane backing a grid world
//! - [`Solid`]: flat-shaded platonic solids plus a diamond
//! - [`FullscreenTriangle`]: a single clip-space triangle for composite passes

pub mod fullscreen;
pub mod grid;
pub mod solids;

pub use fullscreen::FullscreenTriangle;
pub use grid::{grid_vertices, triangulate_grid, GridMesh};
pub use solids::{Solid, SolidMesh};

use crate::error::RenderError;
use crate::gfx::backend::IndexFormat;
use crate::gfx::vertex::VertexLayout;

/// Index list in the narrowest element type the vertex count allows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexData {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl IndexData {
    /// Packs `indices` as 16-bit when `vertex_count` fits, 32-bit otherwise.
    pub fn pack(indices: impl ExactSizeIterator<Item = u32>, vertex_count: u32) -> Result<Self, RenderError> {
        let len = indices.len();
        Ok(match IndexFormat::for_vertex_count(vertex_count) {
            IndexFormat::U16 => {
                let mut packed = Vec::new();
                packed
                    .try_reserve_exact(len)
                    .map_err(|_| RenderError::allocation("index staging buffer"))?;
                packed.extend(indices.map(|i| i as u16));
                IndexData::U16(packed)
            }
            IndexFormat::U32 => {
                let mut packed = Vec::new();
                packed
                    .try_reserve_exact(len)
                    .map_err(|_| RenderError::allocation("index staging buffer"))?;
                packed.extend(indices);
                IndexData::U32(packed)
            }
        })
    }

    pub fn format(&self) -> IndexFormat {
        match self {
            IndexData::U16(_) => IndexFormat::U16,
            IndexData::U32(_) => IndexFormat::U32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            IndexData::U16(indices) => indices.len(),
            IndexData::U32(indices) => indices.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            IndexData::U16(indices) => bytemuck::cast_slice(indices),
            IndexData::U32(indices) => bytemuck::cast_slice(indices),
        }
    }

    /// Widened copy, mostly for inspection in tests.
    pub fn to_u32(&self) -> Vec<u32> {
        match self {
            IndexData::U16(indices) => indices.iter().map(|&i| u32::from(i)).collect(),
            IndexData::U32(indices) => indices.clone(),
        }
    }
}

/// Staging data ready for upload.
#[derive(Debug, Clone)]
pub struct Geometry {
    pub vertex_data: Vec<u8>,
    pub vertex_stride: u32,
    pub vertex_count: u32,
    /// `None` for non-indexed draws.
    pub indices: Option<IndexData>,
}

impl Geometry {
    pub fn from_vertices<V: bytemuck::Pod>(vertices: &[V], indices: Option<IndexData>) -> Result<Self, RenderError> {
        let vertex_count =
            u32::try_from(vertices.len()).map_err(|_| RenderError::allocation("vertex staging buffer"))?;
        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        let mut vertex_data = Vec::new();
        vertex_data
            .try_reserve_exact(bytes.len())
            .map_err(|_| RenderError::allocation("vertex staging buffer"))?;
        vertex_data.extend_from_slice(bytes);

        Ok(Self {
            vertex_data,
            vertex_stride: std::mem::size_of::<V>() as u32,
            vertex_count,
            indices,
        })
    }

    pub fn index_count(&self) -> Option<u32> {
        self.indices.as_ref().map(|indices| indices.len() as u32)
    }
}

/// Something a renderable can be built from.
pub trait GeometrySource {
    /// Debug label used for every GPU object of the renderable.
    fn label(&self) -> &str;

    /// Logical name of the shader pair, resolved by a
    /// [`ShaderLoader`](crate::gfx::assets::ShaderLoader).
    fn shader_name(&self) -> &str;

    fn vertex_layout(&self) -> VertexLayout;

    /// Whether the pipeline should depth test when the output has a depth
    /// target. Composite passes opt out.
    fn depth_test(&self) -> bool {
        true
    }

    fn build_geometry(&self) -> Result<Geometry, RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::vertex::GridVertex;

    #[test]
    fn pack_narrows_to_u16_when_vertices_fit() {
        let indices = IndexData::pack([0u32, 1, 2].into_iter(), 3).unwrap();
        assert_eq!(indices, IndexData::U16(vec![0, 1, 2]));
        assert_eq!(indices.as_bytes().len(), 6);
    }

    #[test]
    fn pack_keeps_u32_above_u16_range() {
        let indices = IndexData::pack([0u32, 65535, 65536].into_iter(), 65537).unwrap();
        assert_eq!(indices.format(), IndexFormat::U32);
        assert_eq!(indices.to_u32(), vec![0, 65535, 65536]);
    }

    #[test]
    fn geometry_from_vertices_records_stride() {
        let vertices = [GridVertex {
            position: [0.0; 3],
            uv: [0.0; 2],
        }; 4];
        let geometry = Geometry::from_vertices(&vertices, None).unwrap();
        assert_eq!(geometry.vertex_stride, 20);
        assert_eq!(geometry.vertex_count, 4);
        assert_eq!(geometry.vertex_data.len(), 80);
        assert_eq!(geometry.index_count(), None);
    }
}
