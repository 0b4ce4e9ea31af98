//! Windowless runs on the recording backend.
//!
//! Drives the same frame loop as the window (sync, update, render) for a fixed
//! number of frames, then tears everything down and reports what the backend
//! saw. Used by `--headless` and the integration tests.

use crate::config::HarnessConfig;
use crate::demos::{DemoContext, DemoKind, DemoManager, SlotState};
use crate::gfx::backend::{OutputLayout, RecordingBackend};
use crate::gfx::camera::OrbitCamera;
use crate::gfx::resources::TextureResource;

/// Simulated frame time in milliseconds.
pub const FRAME_MS: f32 = 1000.0 / 60.0;

/// Outcome of a headless run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadlessReport {
    pub frames: u32,
    pub draw_calls: usize,
    pub uploads: usize,
    /// Live backend resources while the demos were running.
    pub peak_live_resources: usize,
    /// Live backend resources after teardown; zero unless something leaked.
    pub live_after_teardown: usize,
    /// Demos that could not be created.
    pub failed: Vec<DemoKind>,
}

impl HeadlessReport {
    pub fn is_clean(&self) -> bool {
        self.live_after_teardown == 0 && self.failed.is_empty()
    }
}

/// Runs `frames` frames of `config.demos` on a fresh [`RecordingBackend`].
pub fn run_headless(config: &HarnessConfig, frames: u32) -> HeadlessReport {
    run_on(&mut RecordingBackend::new(), config, frames)
}

/// Like [`run_headless`], on a caller-supplied backend (for failure injection).
pub fn run_on(backend: &mut RecordingBackend, config: &HarnessConfig, frames: u32) -> HeadlessReport {
    let shaders = config.shader_loader();
    let layout = OutputLayout::with_depth(wgpu::TextureFormat::Bgra8Unorm, TextureResource::DEPTH_FORMAT);
    let camera = OrbitCamera::harness_default(config.aspect());
    let view = camera.render_view();

    let mut demos = DemoManager::new(&config.demos);
    let mut report = HeadlessReport {
        frames,
        ..Default::default()
    };

    log::info!("Headless run: {frames} frame(s) of {:?}", config.demos);
    {
        let mut ctx = DemoContext {
            backend: &mut *backend,
            shaders: shaders.as_ref(),
            layout,
            surface_size: (config.width, config.height),
        };
        demos.sync(&mut ctx);
    }
    report.failed = config
        .demos
        .iter()
        .copied()
        .filter(|kind| demos.state(*kind) == SlotState::Failed)
        .collect();
    report.peak_live_resources = backend.live_count();

    for frame in 0..frames {
        demos.update(FRAME_MS, &view);

        let mut encoder = backend.encoder();
        demos.render(&mut encoder);
        report.draw_calls += encoder.draw_count();
        report.uploads += encoder.upload_count();
        log::trace!("Headless frame {frame}: {} command(s)", encoder.commands().len());
    }

    demos.destroy_all(backend);
    report.live_after_teardown = backend.live_count();
    if report.live_after_teardown > 0 {
        log::error!("{} resource(s) still live after teardown", report.live_after_teardown);
    } else {
        log::info!(
            "Headless run finished: {} draw(s), {} upload(s)",
            report.draw_calls,
            report.uploads
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_demo_runs_and_cleans_up() {
        let config = HarnessConfig {
            demos: DemoKind::ALL.to_vec(),
            ..Default::default()
        };
        let report = run_headless(&config, 3);
        assert!(report.is_clean(), "{report:?}");
        // 1 composite + 1 grid + 16 solids per frame.
        assert_eq!(report.draw_calls, 3 * 18);
        assert_eq!(report.uploads, 3 * 18);
        assert_eq!(report.peak_live_resources, 6 + 7 + 16 * 7);
    }
}
