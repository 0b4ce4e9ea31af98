//! One oversized clip-space triangle covering the whole viewport.

use super::{Geometry, GeometrySource};
use crate::error::RenderError;
use crate::gfx::vertex::{GridVertex, VertexLayout};

const VERTICES: [GridVertex; 3] = [
    GridVertex {
        position: [-1.0, -1.0, 0.0],
        uv: [0.0, 1.0],
    },
    GridVertex {
        position: [3.0, -1.0, 0.0],
        uv: [2.0, 1.0],
    },
    GridVertex {
        position: [-1.0, 3.0, 0.0],
        uv: [0.0, -1.0],
    },
];

/// Non-indexed composite pass geometry. Positions are already in clip space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FullscreenTriangle {
    pub shader: &'static str,
}

impl GeometrySource for FullscreenTriangle {
    fn label(&self) -> &str {
        "fullscreen"
    }

    fn shader_name(&self) -> &str {
        self.shader
    }

    fn vertex_layout(&self) -> VertexLayout {
        VertexLayout::PositionUv
    }

    fn depth_test(&self) -> bool {
        false
    }

    fn build_geometry(&self) -> Result<Geometry, RenderError> {
        Geometry::from_vertices(&VERTICES, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covers_the_unit_square_counter_clockwise() {
        let [a, b, c] = VERTICES.map(|v| v.position);
        let signed_area = (b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1]);
        assert!(signed_area > 0.0);

        let geometry = FullscreenTriangle { shader: "synthwave/composite" }
            .build_geometry()
            .unwrap();
        assert_eq!(geometry.vertex_count, 3);
        assert!(geometry.indices.is_none());
    }
}
