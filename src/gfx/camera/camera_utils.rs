use cgmath::{perspective, Deg, Matrix4, Point3, Rad, Vector3};
use winit::{
    event::{DeviceEvent, KeyEvent},
    window::Window,
};

use super::{camera_controller::CameraController, orbit_camera::OrbitCamera};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Camera parameters handed to every demo once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    pub position: Point3<f32>,
    pub look_at: Point3<f32>,
    pub up: Vector3<f32>,
    /// Vertical field of view.
    pub fov: Rad<f32>,
    /// Width over height of the output.
    pub aspect: f32,
    pub near_offset: f32,
    pub far_offset: f32,
}

impl RenderView {
    pub fn new(position: Point3<f32>, look_at: Point3<f32>, fov: impl Into<Rad<f32>>, aspect: f32) -> Self {
        Self {
            position,
            look_at,
            up: Vector3::unit_y(),
            fov: fov.into(),
            aspect,
            near_offset: 0.1,
            far_offset: 1000.0,
        }
    }

    pub fn world_to_view(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.look_at, self.up)
    }

    pub fn view_to_ndc(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fov, self.aspect, self.near_offset, self.far_offset)
    }

    pub fn world_to_ndc(&self) -> Matrix4<f32> {
        self.view_to_ndc() * self.world_to_view()
    }
}

impl Default for RenderView {
    fn default() -> Self {
        Self::new(Point3::new(0.0, 0.0, -9.0), Point3::new(0.0, 0.0, 0.0), Deg(70.0), 1.5)
    }
}

pub struct CameraManager {
    pub camera: OrbitCamera,
    pub controller: CameraController,
}

impl CameraManager {
    pub fn new(camera: OrbitCamera, controller: CameraController) -> Self {
        Self { camera, controller }
    }

    pub fn process_event(&mut self, event: &DeviceEvent, window: &Window) {
        self.controller.process_events(event, window, &mut self.camera);
    }

    pub fn process_keyboard_event(&mut self, event: &KeyEvent) {
        self.controller.process_keyed_events(event, &mut self.camera);
    }

    pub fn render_view(&self) -> RenderView {
        self.camera.render_view()
    }
}

pub fn convert_matrix4_to_array(matrix4: Matrix4<f32>) -> [[f32; 4]; 4] {
    matrix4.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector4};

    #[test]
    fn look_at_origin_puts_origin_in_front_of_camera() {
        let view = RenderView::default();
        let clip = view.world_to_ndc() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5);
        assert!(ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0, "depth {} outside wgpu range", ndc.z);
    }

    #[test]
    fn view_space_looks_down_negative_z() {
        let view = RenderView::default();
        let eye_space = view.world_to_view() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!((eye_space.truncate() - Vector3::new(0.0, 0.0, -9.0)).magnitude() < 1e-5);
    }

    #[test]
    fn matrix_conversion_is_column_major() {
        let m = Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0));
        let array = convert_matrix4_to_array(m);
        assert_eq!(array[3], [1.0, 2.0, 3.0, 1.0]);
    }
}
