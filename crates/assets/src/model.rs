use glam::{Quat, Vec3};
use modelview_common::Transform;
use std::fmt;

/// Imported model: node hierarchy, meshes and animation clips.
///
/// Indices in `NodeData::parent`, `NodeData::mesh` and `Channel::node` refer
/// into the vectors of the same `ModelData`.
#[derive(Debug, Clone, Default)]
pub struct ModelData {
    pub nodes: Vec<NodeData>,
    pub meshes: Vec<MeshData>,
    pub animations: Vec<AnimationClip>,
}

#[derive(Debug, Clone)]
pub struct NodeData {
    pub name: String,
    pub parent: Option<usize>,
    pub transform: Transform,
    pub mesh: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct MeshData {
    pub name: String,
    pub primitives: Vec<Primitive>,
}

/// Triangle-list geometry with a flat base colour.
#[derive(Debug, Clone)]
pub struct Primitive {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub base_color: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Step,
    Linear,
    /// Hermite spline; each key stores in-tangent, value, out-tangent.
    CubicSpline,
}

/// Key values for one animated node property.
#[derive(Debug, Clone)]
pub enum Keyframes {
    Translation(Vec<Vec3>),
    Rotation(Vec<Quat>),
    Scale(Vec<Vec3>),
}

impl Keyframes {
    pub fn len(&self) -> usize {
        match self {
            Self::Translation(v) | Self::Scale(v) => v.len(),
            Self::Rotation(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
pub struct Channel {
    pub node: usize,
    pub interpolation: Interpolation,
    pub times: Vec<f32>,
    pub values: Keyframes,
}

#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub name: String,
    pub channels: Vec<Channel>,
}

impl AnimationClip {
    /// Length of the clip in seconds: the last key time over all channels.
    pub fn duration(&self) -> f32 {
        self.channels
            .iter()
            .filter_map(|c| c.times.last().copied())
            .fold(0.0, f32::max)
    }
}

impl ModelData {
    pub fn vertex_count(&self) -> usize {
        self.meshes
            .iter()
            .flat_map(|m| &m.primitives)
            .map(|p| p.positions.len())
            .sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes
            .iter()
            .flat_map(|m| &m.primitives)
            .map(|p| p.indices.len() / 3)
            .sum()
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            nodes: self.nodes.len(),
            meshes: self.meshes.len(),
            vertices: self.vertex_count(),
            triangles: self.triangle_count(),
            animations: self
                .animations
                .iter()
                .map(|a| (a.name.clone(), a.duration()))
                .collect(),
        }
    }
}

/// Counts describing an imported model, for logging and the CLI.
#[derive(Debug, Clone)]
pub struct ModelSummary {
    pub nodes: usize,
    pub meshes: usize,
    pub vertices: usize,
    pub triangles: usize,
    /// Clip name and duration in seconds.
    pub animations: Vec<(String, f32)>,
}

impl fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Model: nodes={} meshes={} vertices={} triangles={} animations={}",
            self.nodes,
            self.meshes,
            self.vertices,
            self.triangles,
            self.animations.len()
        )?;
        for (name, duration) in &self.animations {
            write!(f, "\n  [{name}] {duration:.2}s")?;
        }
        Ok(())
    }
}

/// Smooth per-vertex normals from triangle faces, for primitives without them.
pub(crate) fn generate_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut acc = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let pa = Vec3::from(positions[a]);
        let pb = Vec3::from(positions[b]);
        let pc = Vec3::from(positions[c]);
        let n = (pb - pa).cross(pc - pa);
        acc[a] += n;
        acc[b] += n;
        acc[c] += n;
    }
    acc.into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
        .collect()
}
