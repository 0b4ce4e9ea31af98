// src/lib.rs
//! Devon graphics test harness
//!
//! A wgpu + winit window that drives a set of visual demos through a small
//! renderable-object core. The core talks to the GPU only through the
//! [`RenderBackend`](gfx::backend::RenderBackend) and
//! [`GraphicsEncoder`](gfx::backend::GraphicsEncoder) traits, so everything
//! below the window also runs on the recording backend in tests and
//! `--headless` mode.

pub mod app;
pub mod config;
pub mod demos;
pub mod error;
pub mod gfx;
pub mod headless;
pub mod logging;
pub mod ui;
pub mod wgpu_utils;
pub mod world;

pub use app::HarnessApp;
pub use config::HarnessConfig;
pub use error::{ConstructionError, ConstructionStep, RenderError};

/// Runs the harness: headless when `config.headless_frames` is set,
/// otherwise in a window until it closes.
pub fn run(config: HarnessConfig) -> anyhow::Result<()> {
    match config.headless_frames {
        Some(frames) => {
            let report = headless::run_headless(&config, frames);
            if !report.is_clean() {
                anyhow::bail!("headless run was not clean: {report:?}");
            }
            Ok(())
        }
        None => HarnessApp::new(config).run(),
    }
}
