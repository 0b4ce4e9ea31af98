//! # Solid Shape Generation
//!
//! Flat-shaded solids for the mesh gallery. Every face gets its own vertices
//! carrying the face normal, so corners are never shared between faces.
//! Shapes are centred on the origin and scaled to [`SOLID_RADIUS`], which
//! keeps neighbours two units apart from touching while they spin.

use cgmath::{InnerSpace, Vector3};

use super::{Geometry, GeometrySource, IndexData};
use crate::error::RenderError;
use crate::gfx::vertex::{MeshVertex, VertexLayout};

/// Circumradius every solid is normalized to.
pub const SOLID_RADIUS: f32 = 0.8;

/// Shapes the mesh gallery knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Solid {
    Tetrahedron,
    Cube,
    Octahedron,
    Icosahedron,
    Dodecahedron,
    Diamond,
}

impl Solid {
    pub const ALL: [Solid; 6] = [
        Solid::Tetrahedron,
        Solid::Cube,
        Solid::Octahedron,
        Solid::Icosahedron,
        Solid::Dodecahedron,
        Solid::Diamond,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Solid::Tetrahedron => "tetrahedron",
            Solid::Cube => "cube",
            Solid::Octahedron => "octahedron",
            Solid::Icosahedron => "icosahedron",
            Solid::Dodecahedron => "dodecahedron",
            Solid::Diamond => "diamond",
        }
    }

    /// Convex polygons bounding the shape, in no particular winding.
    fn faces(self) -> Vec<Vec<Vector3<f32>>> {
        match self {
            Solid::Tetrahedron => {
                let corners = [
                    Vector3::new(1.0, 1.0, 1.0),
                    Vector3::new(1.0, -1.0, -1.0),
                    Vector3::new(-1.0, 1.0, -1.0),
                    Vector3::new(-1.0, -1.0, 1.0),
                ];
                (0..4)
                    .map(|skip| (0..4).filter(|&i| i != skip).map(|i| corners[i]).collect())
                    .collect()
            }
            Solid::Cube => {
                let mut faces: Vec<Vec<Vector3<f32>>> = Vec::with_capacity(6);
                for axis in 0..3 {
                    for sign in [-1.0f32, 1.0] {
                        // Walk the square in the plane perpendicular to `axis`
                        let face: Vec<Vector3<f32>> = [(-1.0f32, -1.0f32), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]
                            .iter()
                            .map(|&(a, b)| {
                                let mut p = [0.0f32; 3];
                                p[axis] = sign;
                                p[(axis + 1) % 3] = a;
                                p[(axis + 2) % 3] = b;
                                Vector3::from(p)
                            })
                            .collect();
                        faces.push(face);
                    }
                }
                faces
            }
            Solid::Octahedron => {
                let mut faces: Vec<Vec<Vector3<f32>>> = Vec::with_capacity(8);
                for sx in [-1.0f32, 1.0] {
                    for sy in [-1.0f32, 1.0] {
                        for sz in [-1.0f32, 1.0] {
                            faces.push(vec![
                                Vector3::new(sx, 0.0, 0.0),
                                Vector3::new(0.0, sy, 0.0),
                                Vector3::new(0.0, 0.0, sz),
                            ]);
                        }
                    }
                }
                faces
            }
            Solid::Icosahedron => icosahedron_faces()
                .into_iter()
                .map(|face| face.to_vec())
                .collect(),
            Solid::Dodecahedron => dodecahedron_faces(),
            Solid::Diamond => diamond_faces(),
        }
    }

    /// Flat-shaded triangle soup for this shape.
    pub fn vertices(self) -> Vec<MeshVertex> {
        facet(&self.faces())
    }
}

fn icosahedron_corners() -> Vec<Vector3<f32>> {
    let phi = (1.0 + 5.0f32.sqrt()) / 2.0;
    let mut corners = Vec::with_capacity(12);
    for a in [-1.0f32, 1.0] {
        for b in [-phi, phi] {
            corners.push(Vector3::new(0.0, a, b));
            corners.push(Vector3::new(a, b, 0.0));
            corners.push(Vector3::new(b, 0.0, a));
        }
    }
    corners
}

/// The twenty faces are exactly the corner triples that are pairwise one
/// edge (length 2) apart.
fn icosahedron_faces() -> Vec<[Vector3<f32>; 3]> {
    let corners = icosahedron_corners();
    let is_edge = |a: Vector3<f32>, b: Vector3<f32>| ((a - b).magnitude2() - 4.0).abs() < 1e-3;

    let mut faces = Vec::with_capacity(20);
    for i in 0..corners.len() {
        for j in i + 1..corners.len() {
            if !is_edge(corners[i], corners[j]) {
                continue;
            }
            for k in j + 1..corners.len() {
                if is_edge(corners[i], corners[k]) && is_edge(corners[j], corners[k]) {
                    faces.push([corners[i], corners[j], corners[k]]);
                }
            }
        }
    }
    faces
}

/// Dual of the icosahedron: one pentagon per icosahedron corner, made of the
/// centroids of the five triangles meeting there.
fn dodecahedron_faces() -> Vec<Vec<Vector3<f32>>> {
    let triangles = icosahedron_faces();
    icosahedron_corners()
        .into_iter()
        .map(|corner| {
            let axis = corner.normalize();
            let reference = if axis.x.abs() < 0.9 {
                Vector3::unit_x()
            } else {
                Vector3::unit_y()
            };
            let u = axis.cross(reference).normalize();
            let w = axis.cross(u);

            let mut pentagon: Vec<(f32, Vector3<f32>)> = triangles
                .iter()
                .filter(|tri| tri.contains(&corner))
                .map(|tri| {
                    let centroid = (tri[0] + tri[1] + tri[2]) / 3.0;
                    let d = centroid - corner;
                    (d.dot(w).atan2(d.dot(u)), centroid)
                })
                .collect();
            pentagon.sort_by(|a, b| a.0.total_cmp(&b.0));
            pentagon.into_iter().map(|(_, p)| p).collect()
        })
        .collect()
}

/// Octagonal cut: a flat table, a crown of trapezoids down to the girdle and
/// a pavilion of triangles down to a point.
fn diamond_faces() -> Vec<Vec<Vector3<f32>>> {
    const FACETS: usize = 8;
    let ring = |radius: f32, y: f32| -> Vec<Vector3<f32>> {
        (0..FACETS)
            .map(|i| {
                let angle = i as f32 / FACETS as f32 * std::f32::consts::TAU;
                Vector3::new(radius * angle.cos(), y, radius * angle.sin())
            })
            .collect()
    };
    let table = ring(0.5, 0.45);
    let girdle = ring(1.0, 0.0);
    let culet = Vector3::new(0.0, -1.3, 0.0);

    let mut faces = vec![table.clone()];
    for i in 0..FACETS {
        let next = (i + 1) % FACETS;
        faces.push(vec![table[i], table[next], girdle[next], girdle[i]]);
        faces.push(vec![girdle[i], girdle[next], culet]);
    }
    faces
}

/// Fans each face into triangles wound counter-clockwise from outside and
/// scales the result to [`SOLID_RADIUS`].
fn facet(faces: &[Vec<Vector3<f32>>]) -> Vec<MeshVertex> {
    let radius = faces
        .iter()
        .flatten()
        .map(|p| p.magnitude())
        .fold(0.0f32, f32::max);
    let scale = if radius > 0.0 { SOLID_RADIUS / radius } else { 1.0 };

    let mut vertices = Vec::new();
    for face in faces.iter().filter(|face| face.len() >= 3) {
        let centroid = face.iter().fold(Vector3::new(0.0, 0.0, 0.0), |acc, p| acc + *p) / face.len() as f32;
        let mut normal = (face[1] - face[0]).cross(face[2] - face[0]).normalize();
        let outward = normal.dot(centroid) >= 0.0;
        if !outward {
            normal = -normal;
        }

        for i in 1..face.len() - 1 {
            let (b, c) = if outward {
                (face[i], face[i + 1])
            } else {
                (face[i + 1], face[i])
            };
            for p in [face[0], b, c] {
                vertices.push(MeshVertex {
                    position: (p * scale).into(),
                    normal: normal.into(),
                });
            }
        }
    }
    vertices
}

/// Geometry source for one gallery solid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolidMesh {
    pub solid: Solid,
}

impl GeometrySource for SolidMesh {
    fn label(&self) -> &str {
        self.solid.name()
    }

    fn shader_name(&self) -> &str {
        "mesh/solid"
    }

    fn vertex_layout(&self) -> VertexLayout {
        VertexLayout::PositionNormal
    }

    fn build_geometry(&self) -> Result<Geometry, RenderError> {
        let vertices = self.solid.vertices();
        let vertex_count = vertices.len() as u32;
        let indices = IndexData::pack(0..vertex_count, vertex_count)?;
        Geometry::from_vertices(&vertices, Some(indices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_count(solid: Solid) -> usize {
        solid.vertices().len() / 3
    }

    #[test]
    fn face_counts_match_the_platonic_solids() {
        assert_eq!(triangle_count(Solid::Tetrahedron), 4);
        assert_eq!(triangle_count(Solid::Cube), 12);
        assert_eq!(triangle_count(Solid::Octahedron), 8);
        assert_eq!(triangle_count(Solid::Icosahedron), 20);
        // twelve pentagons, three triangles each
        assert_eq!(triangle_count(Solid::Dodecahedron), 36);
        // table fan, eight crown quads, eight pavilion triangles
        assert_eq!(triangle_count(Solid::Diamond), 6 + 16 + 8);
    }

    #[test]
    fn every_triangle_winds_counter_clockwise_from_outside() {
        for solid in Solid::ALL {
            for tri in solid.vertices().chunks(3) {
                let [a, b, c] = [tri[0], tri[1], tri[2]].map(|v| Vector3::from(v.position));
                let winding = (b - a).cross(c - a);
                let normal = Vector3::from(tri[0].normal);
                assert!(winding.dot(normal) > 0.0, "{} has a reversed triangle", solid.name());
                assert!(normal.dot(a + b + c) > 0.0, "{} has an inward normal", solid.name());
            }
        }
    }

    #[test]
    fn solids_fit_the_gallery_radius() {
        for solid in Solid::ALL {
            let max = solid
                .vertices()
                .iter()
                .map(|v| Vector3::from(v.position).magnitude())
                .fold(0.0f32, f32::max);
            assert!((max - SOLID_RADIUS).abs() < 1e-4, "{} radius {max}", solid.name());
        }
    }

    #[test]
    fn dodecahedron_faces_are_planar_pentagons() {
        for face in dodecahedron_faces() {
            assert_eq!(face.len(), 5);
            let normal = (face[1] - face[0]).cross(face[2] - face[0]).normalize();
            for p in &face[3..] {
                assert!((p - face[0]).dot(normal).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn solid_mesh_is_sequentially_indexed() {
        let geometry = SolidMesh { solid: Solid::Cube }.build_geometry().unwrap();
        assert_eq!(geometry.vertex_count, 36);
        assert_eq!(geometry.index_count(), Some(36));
        assert_eq!(geometry.vertex_stride, 24);
    }
}
