//! Triangulated plane for grid worlds.
//!
//! Vertex `(x, y)` sits at index `y * width + x`, position
//! `(x - width/2, 0, y - height/2)` and UV `(x / (width-1), y / (height-1))`.
//! Every quad is split into two triangles wound counter-clockwise when seen
//! from +Y:
//!
//! ```text
//! (x,y) (x,y+1) (x+1,y)   and   (x+1,y) (x,y+1) (x+1,y+1)
//! ```

use super::{Geometry, GeometrySource, IndexData};
use crate::error::RenderError;
use crate::gfx::vertex::{GridVertex, VertexLayout};
use crate::world::{GridWorld, WorldType};

/// Corner offsets of the six indices emitted per quad.
const QUAD_CORNERS: [(u32, u32); 6] = [(0, 0), (0, 1), (1, 0), (1, 0), (0, 1), (1, 1)];

fn checked_dimensions(width: u32, height: u32) -> Result<(u32, usize), RenderError> {
    let invalid = RenderError::InvalidDimensions { width, height };
    if width < 2 || height < 2 {
        return Err(invalid);
    }
    let vertex_count = width.checked_mul(height).ok_or(invalid)?;
    let index_count = (width - 1)
        .checked_mul(height - 1)
        .and_then(|quads| quads.checked_mul(QUAD_CORNERS.len() as u32))
        .ok_or(RenderError::InvalidDimensions { width, height })?;
    Ok((vertex_count, index_count as usize))
}

/// Walks the quads row by row without materializing them.
struct QuadIndices {
    width: u32,
    next: usize,
    len: usize,
}

impl Iterator for QuadIndices {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.next >= self.len {
            return None;
        }
        let quad = (self.next / QUAD_CORNERS.len()) as u32;
        let (dx, dy) = QUAD_CORNERS[self.next % QUAD_CORNERS.len()];
        self.next += 1;

        let quads_per_row = self.width - 1;
        let x = quad % quads_per_row + dx;
        let y = quad / quads_per_row + dy;
        Some(y * self.width + x)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for QuadIndices {}

/// Index list covering every quad of a `width x height` vertex grid.
pub fn triangulate_grid(width: u32, height: u32) -> Result<IndexData, RenderError> {
    let (vertex_count, index_count) = checked_dimensions(width, height)?;
    IndexData::pack(
        QuadIndices {
            width,
            next: 0,
            len: index_count,
        },
        vertex_count,
    )
}

pub fn grid_vertices(width: u32, height: u32) -> Result<Vec<GridVertex>, RenderError> {
    let (vertex_count, _) = checked_dimensions(width, height)?;
    let mut vertices = Vec::new();
    vertices
        .try_reserve_exact(vertex_count as usize)
        .map_err(|_| RenderError::allocation("grid vertices"))?;

    let half_width = (width / 2) as f32;
    let half_height = (height / 2) as f32;
    let u_step = 1.0 / (width - 1) as f32;
    let v_step = 1.0 / (height - 1) as f32;
    for y in 0..height {
        for x in 0..width {
            vertices.push(GridVertex {
                position: [x as f32 - half_width, 0.0, y as f32 - half_height],
                uv: [x as f32 * u_step, y as f32 * v_step],
            });
        }
    }
    Ok(vertices)
}

/// Geometry source for a grid world's plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridMesh {
    pub width: u32,
    pub height: u32,
    pub world_type: WorldType,
}

impl GridMesh {
    pub fn for_world(world: &GridWorld) -> Self {
        Self {
            width: world.width(),
            height: world.height(),
            world_type: world.world_type(),
        }
    }
}

impl GeometrySource for GridMesh {
    fn label(&self) -> &str {
        "world2d"
    }

    fn shader_name(&self) -> &str {
        self.world_type.shader_name()
    }

    fn vertex_layout(&self) -> VertexLayout {
        VertexLayout::PositionUv
    }

    fn build_geometry(&self) -> Result<Geometry, RenderError> {
        let vertices = grid_vertices(self.width, self.height)?;
        let indices = triangulate_grid(self.width, self.height)?;
        Geometry::from_vertices(&vertices, Some(indices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::backend::IndexFormat;

    #[test]
    fn single_quad_is_two_ccw_triangles() {
        let indices = triangulate_grid(2, 2).unwrap();
        assert_eq!(indices.to_u32(), vec![0, 2, 1, 1, 2, 3]);
    }

    #[test]
    fn second_row_uses_width_stride() {
        // 3 wide, 2 tall: quad (1, 0) spans vertices 1, 2, 4, 5.
        let indices = triangulate_grid(3, 2).unwrap().to_u32();
        assert_eq!(indices.len(), 12);
        assert_eq!(&indices[6..], &[1, 4, 2, 2, 4, 5]);
    }

    #[test]
    fn triangles_face_up() {
        let vertices = grid_vertices(4, 3).unwrap();
        let indices = triangulate_grid(4, 3).unwrap().to_u32();
        for tri in indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| vertices[i as usize].position);
            let ab = [b[0] - a[0], b[2] - a[2]];
            let ac = [c[0] - a[0], c[2] - a[2]];
            // y component of (b - a) x (c - a)
            let normal_y = ab[1] * ac[0] - ab[0] * ac[1];
            assert!(normal_y > 0.0, "triangle {tri:?} faces down");
        }
    }

    #[test]
    fn vertices_are_centred_with_unit_uvs() {
        let vertices = grid_vertices(64, 64).unwrap();
        assert_eq!(vertices.len(), 64 * 64);
        assert_eq!(vertices[0].position, [-32.0, 0.0, -32.0]);
        assert_eq!(vertices[0].uv, [0.0, 0.0]);
        let last = vertices[64 * 64 - 1];
        assert_eq!(last.position, [31.0, 0.0, 31.0]);
        assert!((last.uv[0] - 1.0).abs() < 1e-6 && (last.uv[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn index_width_follows_vertex_count() {
        // 255 * 257 = 65535 vertices
        assert_eq!(triangulate_grid(255, 257).unwrap().format(), IndexFormat::U16);
        // 256 * 256 = 65536 vertices
        assert_eq!(triangulate_grid(256, 256).unwrap().format(), IndexFormat::U32);
    }

    #[test]
    fn degenerate_and_overflowing_grids_are_rejected() {
        assert!(matches!(
            triangulate_grid(1, 8),
            Err(RenderError::InvalidDimensions { width: 1, height: 8 })
        ));
        assert!(matches!(
            grid_vertices(u32::MAX, 2),
            Err(RenderError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn grid_mesh_builds_indexed_geometry() {
        let mesh = GridMesh {
            width: 8,
            height: 4,
            world_type: WorldType::Moe,
        };
        let geometry = mesh.build_geometry().unwrap();
        assert_eq!(geometry.vertex_count, 32);
        assert_eq!(geometry.index_count(), Some(7 * 3 * 6));
        assert_eq!(geometry.vertex_data.len(), 32 * 20);
    }
}
