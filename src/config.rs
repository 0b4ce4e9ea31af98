//! Harness configuration and its command line.

use std::path::PathBuf;

use clap::Parser;

use crate::demos::DemoKind;
use crate::gfx::assets::{DirectoryShaderLoader, EmbeddedShaders, ShaderLoader};

pub const DEFAULT_TITLE: &str = "Devon";
pub const DEFAULT_WIDTH: u32 = 1200;
pub const DEFAULT_HEIGHT: u32 = 800;

#[derive(Parser, Debug, Clone)]
#[command(name = "devon", version, about = "Windowed graphics test harness")]
pub struct Cli {
    /// Initial window width in logical pixels.
    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    pub width: u32,

    /// Initial window height in logical pixels.
    #[arg(long, default_value_t = DEFAULT_HEIGHT)]
    pub height: u32,

    /// Window title.
    #[arg(long, default_value = DEFAULT_TITLE)]
    pub title: String,

    /// Demo to enable at startup. Repeat for several; defaults to mesh-shapes.
    #[arg(long = "demo", value_enum)]
    pub demos: Vec<DemoKind>,

    /// Load `<dir>/<name>.wgsl` instead of the shaders built into the binary.
    #[arg(long)]
    pub shader_dir: Option<PathBuf>,

    /// Sync presentation to the display refresh.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub vsync: bool,

    /// Run this many frames on the recording backend without opening a window.
    #[arg(long, value_name = "FRAMES")]
    pub headless: Option<u32>,

    /// Log filter in `env_logger` syntax; overrides RUST_LOG.
    #[arg(long, value_name = "FILTER")]
    pub log: Option<String>,
}

/// Everything the harness needs to start.
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub demos: Vec<DemoKind>,
    pub shader_dir: Option<PathBuf>,
    pub vsync: bool,
    pub headless_frames: Option<u32>,
    pub log_filter: Option<String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            title: DEFAULT_TITLE.to_owned(),
            demos: vec![DemoKind::MeshShapes],
            shader_dir: None,
            vsync: true,
            headless_frames: None,
            log_filter: None,
        }
    }
}

impl From<Cli> for HarnessConfig {
    fn from(cli: Cli) -> Self {
        let mut demos = cli.demos;
        if demos.is_empty() {
            demos.push(DemoKind::MeshShapes);
        }
        demos.dedup();

        Self {
            width: cli.width.max(1),
            height: cli.height.max(1),
            title: cli.title,
            demos,
            shader_dir: cli.shader_dir,
            vsync: cli.vsync,
            headless_frames: cli.headless,
            log_filter: cli.log,
        }
    }
}

impl HarnessConfig {
    pub fn from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Cli::try_parse_from(args).map(Self::from)
    }

    /// Shaders from `shader_dir` when given, otherwise the built-in ones.
    pub fn shader_loader(&self) -> Box<dyn ShaderLoader> {
        match &self.shader_dir {
            Some(dir) => {
                log::info!("Loading shaders from {}", dir.display());
                Box::new(DirectoryShaderLoader::new(dir))
            }
            None => Box::new(EmbeddedShaders),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_shipped_window() {
        let config = HarnessConfig::from_args(["devon"]).unwrap();
        assert_eq!(config, HarnessConfig::default());
        assert!((config.aspect() - 1.5).abs() < 1e-6);
    }

    #[test]
    fn demos_repeat_and_headless_takes_a_count() {
        let config = HarnessConfig::from_args([
            "devon",
            "--demo",
            "synthwave",
            "--demo",
            "alife",
            "--headless",
            "12",
            "--vsync",
            "false",
            "--log",
            "devon=debug",
        ])
        .unwrap();
        assert_eq!(config.demos, vec![DemoKind::Synthwave, DemoKind::ALife]);
        assert_eq!(config.headless_frames, Some(12));
        assert!(!config.vsync);
        assert_eq!(config.log_filter.as_deref(), Some("devon=debug"));
    }

    #[test]
    fn unknown_demo_is_rejected() {
        assert!(HarnessConfig::from_args(["devon", "--demo", "teapot"]).is_err());
    }
}
