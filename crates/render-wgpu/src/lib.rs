//! wgpu render engine for the model viewer.
//!
//! Draws a sky gradient, an optional ground grid and the scene's meshes lit
//! by its hemispheric light. The GUI overlay is drawn by the caller into the
//! returned [`GpuFrame`] before it is presented.
//!
//! # Invariants
//! - The engine never mutates the scene.
//! - GPU meshes are re-uploaded only when the scene revision changes.

mod engine;
mod gpu;
mod shaders;

pub use engine::{EngineError, GpuEngine, GpuFrame};
pub use gpu::{Environment, WgpuRenderer};
