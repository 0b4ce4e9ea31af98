pub mod camera_controller;
pub mod camera_utils;
pub mod orbit_camera;

pub use camera_controller::CameraController;
pub use camera_utils::{CameraManager, RenderView, OPENGL_TO_WGPU_MATRIX};
pub use orbit_camera::OrbitCamera;
