//! Rendering interface: renderer-agnostic trait, camera, debug renderer.
//!
//! # Invariants
//! - Renderers never mutate the scene.
//! - Camera motion lives outside the scene; only the viewer moves it.

mod camera;
mod renderer;

pub use camera::{ArcRotateCamera, CameraLimits};
pub use renderer::{DebugTextRenderer, Renderer};

pub fn crate_info() -> &'static str {
    "modelview-render v0.1.0"
}
