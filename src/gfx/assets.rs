//! Shader source lookup.
//!
//! Shader pairs are addressed by a logical name such as `"mesh/solid"`. Both
//! stages live in one WGSL file with `vs_main` and `fs_main` entry points.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::RenderError;
use crate::gfx::backend::{ShaderSource, ShaderStageSource};

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Resolves a logical shader-pair name to source.
pub trait ShaderLoader {
    fn load_pair(&self, name: &str) -> Result<ShaderSource, RenderError>;
}

fn pair_from_wgsl(name: &str, code: Arc<str>) -> ShaderSource {
    ShaderSource {
        name: name.to_owned(),
        vertex: ShaderStageSource {
            code: Arc::clone(&code),
            entry_point: VERTEX_ENTRY,
        },
        fragment: ShaderStageSource {
            code,
            entry_point: FRAGMENT_ENTRY,
        },
    }
}

/// Shaders compiled into the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedShaders;

impl EmbeddedShaders {
    pub const NAMES: [&'static str; 3] = ["alife/world2d_moe", "mesh/solid", "synthwave/composite"];

    fn source(name: &str) -> Option<&'static str> {
        match name {
            "alife/world2d_moe" => Some(include_str!("shaders/alife/world2d_moe.wgsl")),
            "mesh/solid" => Some(include_str!("shaders/mesh/solid.wgsl")),
            "synthwave/composite" => Some(include_str!("shaders/synthwave/composite.wgsl")),
            _ => None,
        }
    }
}

impl ShaderLoader for EmbeddedShaders {
    fn load_pair(&self, name: &str) -> Result<ShaderSource, RenderError> {
        let code = Self::source(name).ok_or_else(|| RenderError::AssetLoad {
            name: name.to_owned(),
            source: io::Error::new(io::ErrorKind::NotFound, "no embedded shader with this name"),
        })?;
        Ok(pair_from_wgsl(name, Arc::from(code)))
    }
}

/// Reads `<root>/<name>.wgsl` on every load, so edits show up the next time
/// a demo is re-enabled.
#[derive(Debug, Clone)]
pub struct DirectoryShaderLoader {
    root: PathBuf,
}

impl DirectoryShaderLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.wgsl"))
    }
}

impl ShaderLoader for DirectoryShaderLoader {
    fn load_pair(&self, name: &str) -> Result<ShaderSource, RenderError> {
        let path = self.path_for(name);
        let code = std::fs::read_to_string(&path).map_err(|source| {
            log::error!("Failed to read shader {}: {source}", path.display());
            RenderError::AssetLoad {
                name: name.to_owned(),
                source,
            }
        })?;
        log::debug!("Loaded shader `{name}` from {}", path.display());
        Ok(pair_from_wgsl(name, Arc::from(code)))
    }
}

impl<L: ShaderLoader + ?Sized> ShaderLoader for &L {
    fn load_pair(&self, name: &str) -> Result<ShaderSource, RenderError> {
        (**self).load_pair(name)
    }
}

impl<L: ShaderLoader + ?Sized> ShaderLoader for Box<L> {
    fn load_pair(&self, name: &str) -> Result<ShaderSource, RenderError> {
        (**self).load_pair(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_shaders_share_one_module_for_both_stages() {
        for name in EmbeddedShaders::NAMES {
            let pair = EmbeddedShaders.load_pair(name).unwrap();
            assert_eq!(pair.name, name);
            assert!(Arc::ptr_eq(&pair.vertex.code, &pair.fragment.code));
            assert!(pair.vertex.code.contains("fn vs_main"));
            assert!(pair.fragment.code.contains("fn fs_main"));
        }
    }

    #[test]
    fn unknown_embedded_shader_is_an_asset_error() {
        let err = EmbeddedShaders.load_pair("nope").unwrap_err();
        assert!(matches!(err, RenderError::AssetLoad { ref name, .. } if name == "nope"));
    }

    #[test]
    fn directory_loader_reads_name_dot_wgsl() {
        let root = std::env::temp_dir().join(format!("devon-shaders-{}", std::process::id()));
        std::fs::create_dir_all(root.join("demo")).unwrap();
        std::fs::write(root.join("demo/flat.wgsl"), "fn vs_main() {}\nfn fs_main() {}\n").unwrap();

        let loader = DirectoryShaderLoader::new(&root);
        let pair = loader.load_pair("demo/flat").unwrap();
        assert!(pair.vertex.code.contains("vs_main"));

        let missing = loader.load_pair("demo/missing").unwrap_err();
        match missing {
            RenderError::AssetLoad { source, .. } => assert_eq!(source.kind(), io::ErrorKind::NotFound),
            other => panic!("unexpected error {other:?}"),
        }

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn shipped_directory_matches_embedded_sources() {
        let loader = DirectoryShaderLoader::new(concat!(env!("CARGO_MANIFEST_DIR"), "/src/gfx/shaders"));
        for name in EmbeddedShaders::NAMES {
            let from_disk = loader.load_pair(name).unwrap();
            let embedded = EmbeddedShaders.load_pair(name).unwrap();
            assert_eq!(from_disk.vertex.code, embedded.vertex.code);
        }
    }
}
