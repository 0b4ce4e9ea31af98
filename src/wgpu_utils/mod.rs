//! WGPU utility functions and helpers

pub mod binding_types;
