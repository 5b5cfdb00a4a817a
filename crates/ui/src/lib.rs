//! GUI overlay for the viewer: reset button, frame slider, help modal.
//!
//! # Invariants
//! - Widgets only emit [`Action`]s; the viewer applies them.
//! - Exactly one help page is selected at a time.

pub mod action;
mod help;
mod overlay;

pub use action::Action;
pub use help::{HelpModal, HelpTab};
pub use overlay::{ACCENT, FrameSlider, MUTED, OverlayState, draw_overlay};

pub fn crate_info() -> &'static str {
    "modelview-ui v0.1.0"
}
