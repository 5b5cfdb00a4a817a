//! Scene state: the placed model, its node transforms and animation groups.
//!
//! # Invariants
//! - All state mutations flow through explicit operations on [`Scene`].
//! - Node transforms only change through animation groups.
//! - A disposed scene holds no model data and accepts no new model.

pub mod animation;
mod scene;

pub use animation::{AnimationGroup, FRAME_RATE};
pub use scene::{AnimationHandle, DrawItem, HemisphericLight, ModelPlacement, Scene, SceneError};

pub fn crate_info() -> &'static str {
    "modelview-scene v0.1.0"
}
