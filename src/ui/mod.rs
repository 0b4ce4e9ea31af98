//! # User Interface Module
//!
//! Dear ImGui integration for the harness window.
//!
//! - [`UiManager`] - ImGui context, winit input glue and the wgpu overlay pass
//! - [`panel`] - the main menu bar and status overlay
//!
//! Each demo draws its own control window through
//! [`Demo::ui`](crate::demos::Demo::ui). When ImGui wants the mouse, camera
//! input is suppressed.

pub mod manager;
pub mod panel;

pub use manager::UiManager;
pub use panel::{main_menu, status_overlay, MenuActions};
