use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Build a transform from a position, XYZ Euler angles in radians and a scale.
    pub fn from_euler(position: Vec3, euler: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z),
            scale,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Where a model asset lives: a base location plus a file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetLocation {
    pub base: String,
    pub file_name: String,
}

impl AssetLocation {
    pub fn new(base: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            file_name: file_name.into(),
        }
    }

    /// Split a full path into base directory and file name.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let base = path
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { base, file_name }
    }

    /// Parse a command-line argument: a URL is split at its last `/`,
    /// anything else is treated as a filesystem path.
    pub fn parse(input: &str) -> Self {
        if input.contains("://") {
            match input.rsplit_once('/') {
                Some((base, file_name)) => Self::new(format!("{base}/"), file_name),
                None => Self::new("", input),
            }
        } else {
            Self::from_path(input)
        }
    }

    /// Lower-cased URL scheme of the base, if it has one.
    pub fn scheme(&self) -> Option<String> {
        self.base
            .split_once("://")
            .map(|(scheme, _)| scheme.to_ascii_lowercase())
    }

    /// True when the base points at a network location.
    pub fn is_remote(&self) -> bool {
        matches!(self.scheme().as_deref(), Some("http" | "https"))
    }

    /// Local path of the asset. A `file://` prefix on the base is stripped.
    pub fn resolve(&self) -> PathBuf {
        let base = self.base.strip_prefix("file://").unwrap_or(&self.base);
        if base.is_empty() {
            PathBuf::from(&self.file_name)
        } else {
            PathBuf::from(base).join(&self.file_name)
        }
    }
}

impl fmt::Display for AssetLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.base.is_empty() {
            write!(f, "{}", self.file_name)
        } else if self.base.ends_with('/') {
            write!(f, "{}{}", self.base, self.file_name)
        } else {
            write!(f, "{}/{}", self.base, self.file_name)
        }
    }
}
