//! Shared types used across the model viewer crates.

mod types;

pub use types::{AssetLocation, Transform};

pub fn crate_info() -> &'static str {
    "modelview-common v0.1.0"
}
