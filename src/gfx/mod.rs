//! # Graphics Module
//!
//! Everything between a demo and the GPU.
//!
//! - **Backend** ([`backend`]) - the renderer collaborator traits and their
//!   wgpu and recording implementations
//! - **Assets** ([`assets`]) - shader pair lookup by logical name
//! - **Geometry** ([`geometry`]) - CPU staging data: grid, solids, full-screen triangle
//! - **Rendering** ([`rendering`]) - the renderable object, uniform payloads and the frame engine
//! - **Camera** ([`camera`]) - orbit camera and the per-frame [`RenderView`](camera::RenderView)
//!
//! Demos only see [`backend::RenderBackend`] and [`backend::GraphicsEncoder`];
//! the wgpu device stays inside [`RenderEngine`].

pub mod assets;
pub mod backend;
pub mod camera;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod vertex;

pub use camera::orbit_camera::OrbitCamera;
pub use rendering::render_engine::RenderEngine;
