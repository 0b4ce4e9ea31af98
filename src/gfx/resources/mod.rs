//! GPU resources owned by the render engine itself.

pub mod texture_resource;

pub use texture_resource::TextureResource;
