//! Demo manager for the harness
//!
//! One slot per [`DemoKind`]. A slot follows its toggle lazily: [`sync`]
//! creates demos that were switched on and destroys demos that were switched
//! off.
//!
//! [`sync`]: DemoManager::sync

use super::{Demo, DemoContext, DemoKind};
use crate::gfx::backend::{GraphicsEncoder, RenderBackend};
use crate::gfx::camera::RenderView;

/// Observable state of a demo slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Inactive,
    Active,
    /// Creation failed; the toggle was switched off.
    Failed,
}

enum Slot {
    Inactive,
    Active(Box<dyn Demo>),
    Failed,
}

impl Slot {
    fn state(&self) -> SlotState {
        match self {
            Slot::Inactive => SlotState::Inactive,
            Slot::Active(_) => SlotState::Active,
            Slot::Failed => SlotState::Failed,
        }
    }
}

/// Owns the active demos and their toggles.
pub struct DemoManager {
    enabled: [bool; DemoKind::ALL.len()],
    slots: [Slot; DemoKind::ALL.len()],
}

impl DemoManager {
    /// Creates a manager with `initial` switched on. Nothing is built until
    /// the first [`sync`](Self::sync).
    pub fn new(initial: &[DemoKind]) -> Self {
        let mut enabled = [false; DemoKind::ALL.len()];
        for kind in initial {
            enabled[kind.slot()] = true;
        }
        Self {
            enabled,
            slots: [Slot::Inactive, Slot::Inactive, Slot::Inactive],
        }
    }

    pub fn is_enabled(&self, kind: DemoKind) -> bool {
        self.enabled[kind.slot()]
    }

    pub fn set_enabled(&mut self, kind: DemoKind, enabled: bool) {
        self.enabled[kind.slot()] = enabled;
    }

    /// Toggle storage for UI widgets.
    pub fn enabled_mut(&mut self, kind: DemoKind) -> &mut bool {
        &mut self.enabled[kind.slot()]
    }

    pub fn state(&self, kind: DemoKind) -> SlotState {
        self.slots[kind.slot()].state()
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|slot| matches!(slot, Slot::Active(_))).count()
    }

    /// Brings every slot in line with its toggle.
    ///
    /// A demo whose creation fails is logged, marked [`SlotState::Failed`]
    /// and switched off. It is tried again only when switched back on.
    pub fn sync(&mut self, ctx: &mut DemoContext<'_>) {
        for kind in DemoKind::ALL {
            let index = kind.slot();
            let enabled = self.enabled[index];
            let slot = &mut self.slots[index];

            match (enabled, slot.state()) {
                (true, SlotState::Inactive | SlotState::Failed) => match kind.create(ctx) {
                    Ok(demo) => {
                        log::info!("Demo `{}` enabled", kind.label());
                        *slot = Slot::Active(demo);
                    }
                    Err(err) => {
                        log::error!("Demo `{}` failed to start: {err}", kind.label());
                        *slot = Slot::Failed;
                        self.enabled[index] = false;
                    }
                },
                (false, SlotState::Active) => {
                    if let Slot::Active(demo) = std::mem::replace(slot, Slot::Inactive) {
                        demo.destroy(ctx.backend);
                        log::info!("Demo `{}` disabled", kind.label());
                    }
                }
                _ => {}
            }
        }
    }

    pub fn update(&mut self, delta_ms: f32, view: &RenderView) {
        for demo in self.active_mut() {
            demo.update(delta_ms, view);
        }
    }

    pub fn render(&self, encoder: &mut dyn GraphicsEncoder) {
        for slot in &self.slots {
            if let Slot::Active(demo) = slot {
                demo.render(encoder);
            }
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        for demo in self.active_mut() {
            demo.resize(width, height);
        }
    }

    pub fn ui(&mut self, ui: &imgui::Ui) {
        for demo in self.active_mut() {
            demo.ui(ui);
        }
    }

    /// Destroys every active demo. Toggles are left as they are.
    pub fn destroy_all(&mut self, backend: &mut dyn RenderBackend) {
        for slot in &mut self.slots {
            if let Slot::Active(demo) = std::mem::replace(slot, Slot::Inactive) {
                log::debug!("Destroying demo `{}`", demo.name());
                demo.destroy(backend);
            }
        }
    }

    fn active_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Demo>> {
        self.slots.iter_mut().filter_map(|slot| match slot {
            Slot::Active(demo) => Some(demo),
            _ => None,
        })
    }
}

impl Drop for DemoManager {
    fn drop(&mut self) {
        let active = self.active_count();
        if active > 0 {
            log::warn!("DemoManager dropped with {active} active demo(s); call destroy_all first");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::assets::EmbeddedShaders;
    use crate::gfx::backend::{OutputLayout, RecordingBackend, ResourceKind};

    fn context<'a>(backend: &'a mut RecordingBackend) -> DemoContext<'a> {
        DemoContext {
            backend,
            shaders: &EmbeddedShaders,
            layout: OutputLayout::color_only(wgpu::TextureFormat::Rgba8Unorm),
            surface_size: (320, 200),
        }
    }

    #[test]
    fn nothing_is_built_before_sync() {
        let manager = DemoManager::new(&[DemoKind::Synthwave]);
        assert!(manager.is_enabled(DemoKind::Synthwave));
        assert_eq!(manager.state(DemoKind::Synthwave), SlotState::Inactive);
        assert_eq!(manager.active_count(), 0);
    }

    #[test]
    fn failed_creation_disables_the_slot() {
        let mut backend = RecordingBackend::new();
        backend.fail_on(ResourceKind::Pipeline);
        let mut manager = DemoManager::new(&[DemoKind::Synthwave]);

        manager.sync(&mut context(&mut backend));
        assert_eq!(manager.state(DemoKind::Synthwave), SlotState::Failed);
        assert!(!manager.is_enabled(DemoKind::Synthwave));
        assert_eq!(backend.live_count(), 0);

        // Still off, so a second sync does not retry.
        backend.clear_failures();
        manager.sync(&mut context(&mut backend));
        assert_eq!(manager.state(DemoKind::Synthwave), SlotState::Failed);

        manager.set_enabled(DemoKind::Synthwave, true);
        manager.sync(&mut context(&mut backend));
        assert_eq!(manager.state(DemoKind::Synthwave), SlotState::Active);

        manager.destroy_all(&mut backend);
        assert_eq!(backend.live_count(), 0);
    }
}
