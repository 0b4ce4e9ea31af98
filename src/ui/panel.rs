// src/ui/panel.rs
//! Harness panels: the main menu bar with demo toggles, and a small status
//! overlay.

use crate::demos::{DemoKind, DemoManager, SlotState};

/// What the user asked for through the menu this frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MenuActions {
    pub quit: bool,
    pub reset_camera: bool,
}

/// Main menu bar: File → Quit, View → Reset camera, Demos → one toggle per
/// demo. Toggles only flip the flag; the demo is built or destroyed on the
/// next [`DemoManager::sync`].
pub fn main_menu(ui: &imgui::Ui, demos: &mut DemoManager) -> MenuActions {
    let mut actions = MenuActions::default();

    if let Some(_bar) = ui.begin_main_menu_bar() {
        if let Some(_menu) = ui.begin_menu("File") {
            if ui.menu_item_config("Quit").shortcut("Esc").build() {
                actions.quit = true;
            }
        }

        if let Some(_menu) = ui.begin_menu("View") {
            if ui.menu_item_config("Reset camera").shortcut("Shift+C").build() {
                actions.reset_camera = true;
            }
        }

        if let Some(_menu) = ui.begin_menu("Demos") {
            for kind in DemoKind::ALL {
                let label = match demos.state(kind) {
                    SlotState::Failed => format!("{} (failed)", kind.label()),
                    _ => kind.label().to_owned(),
                };
                ui.menu_item_config(label).build_with_ref(demos.enabled_mut(kind));
            }
        }
    }

    actions
}

/// Frame rate and active demo count, pinned to the bottom-left corner.
pub fn status_overlay(ui: &imgui::Ui, demos: &DemoManager) {
    let display_size = ui.io().display_size;
    if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
        return;
    }

    ui.window("##status")
        .position([10.0, display_size[1] - 60.0], imgui::Condition::Always)
        .title_bar(false)
        .resizable(false)
        .movable(false)
        .always_auto_resize(true)
        .bg_alpha(0.35)
        .build(|| {
            ui.text(format!("{:.0} fps", ui.io().framerate));
            ui.text(format!("{} demo(s) active", demos.active_count()));
        });
}
