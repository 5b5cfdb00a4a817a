//! Viewer lifecycle for a single glTF model.
//!
//! A [`Viewer`] owns the scene, the orbit camera, the overlay state and a
//! [`Renderer`](modelview_render::Renderer). The host (desktop window or
//! headless CLI) mounts it, feeds it the import result, GUI actions and
//! resizes, and unmounts it on shutdown.

mod config;
mod listeners;
mod viewer;

pub use config::{CameraSetup, ConfigError, ViewerConfig, WindowSetup};
pub use listeners::{ListenerId, ResizeListeners};
pub use viewer::Viewer;

pub fn crate_info() -> &'static str {
    "modelview-viewer v0.1.0"
}
