//! Uniform payloads uploaded once per draw.
//!
//! Every payload is `#[repr(C)]` and `Pod`, laid out to match the WGSL
//! structs in `gfx/shaders` (16-byte aligned members only).

use cgmath::{Matrix4, Rad, SquareMatrix, Vector3};

use crate::gfx::camera::camera_utils::{convert_matrix4_to_array, RenderView};
use crate::world::{GridWorld, WorldMoe};

/// What a renderable needs from its uniform payload.
pub trait UniformPayload: bytemuck::Pod {
    /// Stores the camera matrices for the next draw.
    fn set_view(&mut self, view: &GpuView);

    /// Stores the object transform. Payloads without one ignore it.
    fn set_transform(&mut self, _transform: &Transform) {}
}

/// Camera matrices in wgpu clip space.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuView {
    pub world_to_view: [[f32; 4]; 4],
    pub view_to_ndc: [[f32; 4]; 4],
    pub world_to_ndc: [[f32; 4]; 4],
}

impl GpuView {
    pub fn from_render_view(view: &RenderView) -> Self {
        let world_to_view = view.world_to_view();
        let view_to_ndc = view.view_to_ndc();
        Self {
            world_to_view: convert_matrix4_to_array(world_to_view),
            view_to_ndc: convert_matrix4_to_array(view_to_ndc),
            world_to_ndc: convert_matrix4_to_array(view_to_ndc * world_to_view),
        }
    }
}

impl Default for GpuView {
    fn default() -> Self {
        let identity = convert_matrix4_to_array(Matrix4::identity());
        Self {
            world_to_view: identity,
            view_to_ndc: identity,
            world_to_ndc: identity,
        }
    }
}

impl UniformPayload for GpuView {
    fn set_view(&mut self, view: &GpuView) {
        *self = *view;
    }
}

/// Position, Euler rotation (radians, applied X then Y then Z) and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub euler: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Transform {
    pub fn at(position: Vector3<f32>) -> Self {
        Self {
            position,
            euler: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    fn rotation(euler: Vector3<f32>) -> Matrix4<f32> {
        Matrix4::from_angle_x(Rad(euler.x)) * Matrix4::from_angle_y(Rad(euler.y)) * Matrix4::from_angle_z(Rad(euler.z))
    }

    /// `T * R * S`.
    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Self::rotation(self.euler)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// `T(-position) * R(-euler)`.
    ///
    /// Scale is not inverted, so this only undoes [`matrix`](Self::matrix)
    /// for unit-scale objects with a pure translation or a pure rotation.
    pub fn inverse_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(-self.position) * Self::rotation(-self.euler)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::at(Vector3::new(0.0, 0.0, 0.0))
    }
}

/// Shading applied by the solid mesh shader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MeshStyle {
    #[default]
    Lit,
    Normals,
    Flat,
}

impl MeshStyle {
    pub const ALL: [MeshStyle; 3] = [MeshStyle::Lit, MeshStyle::Normals, MeshStyle::Flat];

    pub fn label(self) -> &'static str {
        match self {
            MeshStyle::Lit => "Lit",
            MeshStyle::Normals => "Normals",
            MeshStyle::Flat => "Flat colour",
        }
    }

    fn code(self) -> u32 {
        match self {
            MeshStyle::Lit => 0,
            MeshStyle::Normals => 1,
            MeshStyle::Flat => 2,
        }
    }
}

/// Camera plus per-object transform for instanced demos.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniforms {
    pub view: GpuView,
    pub object: [[f32; 4]; 4],
    pub inverse: [[f32; 4]; 4],
    /// `x` holds the [`MeshStyle`] code.
    pub style: [u32; 4],
    pub color: [f32; 4],
}

impl ObjectUniforms {
    pub fn set_style(&mut self, style: MeshStyle) {
        self.style[0] = style.code();
    }

    pub fn set_color(&mut self, color: [f32; 4]) {
        self.color = color;
    }
}

impl UniformPayload for ObjectUniforms {
    fn set_view(&mut self, view: &GpuView) {
        self.view = *view;
    }

    fn set_transform(&mut self, transform: &Transform) {
        self.object = convert_matrix4_to_array(transform.matrix());
        self.inverse = convert_matrix4_to_array(transform.inverse_matrix());
    }
}

/// Cells mirrored into [`GridUniforms`]; larger worlds are truncated.
pub const GRID_UNIFORM_CELLS: usize = 4096;

/// Camera plus a packed copy of a grid world's food values.
///
/// Food is stored as two `i16` per `u32`, eight per `vec4<u32>`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GridUniforms {
    pub view: GpuView,
    /// Width, height, mirrored cell count, unused.
    pub dims: [u32; 4],
    pub food: [[u32; 4]; GRID_UNIFORM_CELLS / 8],
}

impl GridUniforms {
    /// Render-sync: repacks the world's cells if it changed since the last
    /// sync. Returns whether anything was copied.
    pub fn sync_from(&mut self, world: &mut GridWorld) -> bool {
        if !world.take_dirty() && self.dims[0] == world.width() && self.dims[1] == world.height() {
            return false;
        }

        let cells = world.elements_as::<WorldMoe>();
        let mirrored = cells.len().min(GRID_UNIFORM_CELLS);
        if mirrored < cells.len() {
            log::warn!(
                "GridUniforms: {}x{} world has {} cells, mirroring the first {mirrored}",
                world.width(),
                world.height(),
                cells.len()
            );
        }

        self.dims = [world.width(), world.height(), mirrored as u32, 0];
        self.food = [[0; 4]; GRID_UNIFORM_CELLS / 8];
        let words: &mut [u32] = bytemuck::cast_slice_mut(&mut self.food);
        for (i, cell) in cells[..mirrored].iter().enumerate() {
            words[i / 2] |= u32::from(cell.food as u16) << ((i % 2) * 16);
        }
        true
    }

    pub fn food_at(&self, index: usize) -> i16 {
        let words: &[u32] = bytemuck::cast_slice(&self.food);
        (words[index / 2] >> ((index % 2) * 16)) as u16 as i16
    }
}

impl UniformPayload for GridUniforms {
    fn set_view(&mut self, view: &GpuView) {
        self.view = *view;
    }
}

/// Inputs of the synthwave composite pass.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CompositeUniforms {
    /// Surface size in pixels, seconds since start, width over height.
    pub frame: [f32; 4],
    pub sky_top: [f32; 4],
    pub sky_horizon: [f32; 4],
    pub sun: [f32; 4],
    pub grid: [f32; 4],
}

impl CompositeUniforms {
    pub fn new(width: u32, height: u32) -> Self {
        let mut uniforms = Self {
            frame: [0.0; 4],
            sky_top: [0.05, 0.0, 0.15, 1.0],
            sky_horizon: [0.9, 0.2, 0.55, 1.0],
            sun: [1.0, 0.75, 0.2, 1.0],
            grid: [0.0, 0.9, 1.0, 1.0],
        };
        uniforms.set_resolution(width, height);
        uniforms
    }

    pub fn set_resolution(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1) as f32, height.max(1) as f32);
        self.frame[0] = width;
        self.frame[1] = height;
        self.frame[3] = width / height;
    }

    pub fn time(&self) -> f32 {
        self.frame[2]
    }

    pub fn advance(&mut self, seconds: f32) {
        self.frame[2] += seconds;
    }
}

impl UniformPayload for CompositeUniforms {
    // The composite pass draws in clip space and has no camera.
    fn set_view(&mut self, _view: &GpuView) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::WorldType;
    use bytemuck::Zeroable;
    use cgmath::{Deg, Point3};

    fn assert_identity(m: Matrix4<f32>) {
        let identity = Matrix4::<f32>::identity();
        for c in 0..4 {
            for r in 0..4 {
                assert!((m[c][r] - identity[c][r]).abs() < 1e-5, "{m:?} is not the identity");
            }
        }
    }

    #[test]
    fn payload_sizes_match_wgsl_layouts() {
        assert_eq!(std::mem::size_of::<GpuView>(), 192);
        assert_eq!(std::mem::size_of::<ObjectUniforms>(), 192 + 128 + 32);
        assert_eq!(std::mem::size_of::<GridUniforms>(), 192 + 16 + 8192);
        assert_eq!(std::mem::size_of::<CompositeUniforms>(), 80);
    }

    #[test]
    fn gpu_view_composes_world_to_ndc() {
        let view = RenderView::new(Point3::new(0.0, 0.0, -9.0), Point3::new(0.0, 0.0, 0.0), Deg(70.0), 1.5);
        let gpu = GpuView::from_render_view(&view);
        assert_eq!(gpu.world_to_ndc, convert_matrix4_to_array(view.world_to_ndc()));
    }

    #[test]
    fn inverse_undoes_translation_only() {
        let transform = Transform::at(Vector3::new(-4.0, 2.0, 0.5));
        assert_identity(transform.inverse_matrix() * transform.matrix());
    }

    #[test]
    fn inverse_undoes_single_axis_rotation() {
        for euler in [
            Vector3::new(0.7, 0.0, 0.0),
            Vector3::new(0.0, 1.3, 0.0),
            Vector3::new(0.0, 0.0, -2.1),
        ] {
            let transform = Transform {
                euler,
                ..Transform::default()
            };
            assert_identity(transform.inverse_matrix() * transform.matrix());
        }
    }

    #[test]
    fn inverse_ignores_scale() {
        let transform = Transform {
            scale: Vector3::new(2.0, 2.0, 2.0),
            ..Transform::default()
        };
        assert_eq!(transform.inverse_matrix(), Matrix4::identity());
    }

    #[test]
    fn object_uniforms_take_transform_and_style() {
        let mut uniforms = ObjectUniforms::zeroed();
        uniforms.set_transform(&Transform::at(Vector3::new(2.0, 1.0, 0.0)));
        uniforms.set_style(MeshStyle::Normals);
        assert_eq!(uniforms.object[3], [2.0, 1.0, 0.0, 1.0]);
        assert_eq!(uniforms.inverse[3], [-2.0, -1.0, 0.0, 1.0]);
        assert_eq!(uniforms.style[0], 1);
    }

    #[test]
    fn grid_sync_packs_signed_food_and_consumes_dirty() {
        let mut world = GridWorld::new(WorldType::Moe, 4, 4).unwrap();
        {
            let cells = world.mutable_elements_as::<WorldMoe>();
            cells[0].food = 5;
            cells[1].food = -3;
            cells[15].food = i16::MAX;
        }

        let mut uniforms = GridUniforms::zeroed();
        assert!(uniforms.sync_from(&mut world));
        assert!(!world.is_dirty());
        assert_eq!(uniforms.dims, [4, 4, 16, 0]);
        assert_eq!(uniforms.food_at(0), 5);
        assert_eq!(uniforms.food_at(1), -3);
        assert_eq!(uniforms.food_at(2), 0);
        assert_eq!(uniforms.food_at(15), i16::MAX);

        // Clean world, same dimensions: nothing to do.
        assert!(!uniforms.sync_from(&mut world));
    }

    #[test]
    fn grid_sync_truncates_large_worlds() {
        let mut world = GridWorld::new(WorldType::Moe, 100, 100).unwrap();
        let mut uniforms = GridUniforms::zeroed();
        assert!(uniforms.sync_from(&mut world));
        assert_eq!(uniforms.dims[2] as usize, GRID_UNIFORM_CELLS);
    }

    #[test]
    fn composite_tracks_resolution_and_time() {
        let mut uniforms = CompositeUniforms::new(1200, 800);
        assert_eq!(uniforms.frame[3], 1.5);
        uniforms.advance(0.25);
        uniforms.advance(0.25);
        assert_eq!(uniforms.time(), 0.5);
        uniforms.set_resolution(0, 0);
        assert_eq!(uniforms.frame[0], 1.0);
    }
}
