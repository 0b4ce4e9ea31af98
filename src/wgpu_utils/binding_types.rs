//! WGPU binding type utilities

use std::num::NonZeroU64;

pub fn uniform() -> wgpu::BindingType {
    wgpu::BindingType::Buffer {
        ty: wgpu::BufferBindingType::Uniform,
        has_dynamic_offset: false,
        min_binding_size: None,
    }
}

/// Uniform binding that lets wgpu validate the bound range up front.
pub fn uniform_sized(size: u64) -> wgpu::BindingType {
    wgpu::BindingType::Buffer {
        ty: wgpu::BufferBindingType::Uniform,
        has_dynamic_offset: false,
        min_binding_size: NonZeroU64::new(size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_size_leaves_binding_unchecked() {
        assert_eq!(uniform_sized(0), uniform());
        match uniform_sized(192) {
            wgpu::BindingType::Buffer { min_binding_size, .. } => {
                assert_eq!(min_binding_size.map(NonZeroU64::get), Some(192))
            }
            other => panic!("unexpected binding type {other:?}"),
        }
    }
}
