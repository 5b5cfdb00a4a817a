use crate::animation::AnimationGroup;
use glam::{Mat4, Vec3};
use modelview_assets::{MeshData, ModelData};
use modelview_common::Transform;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Where the imported model is placed in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelPlacement {
    pub position: Vec3,
    /// XYZ Euler angles in radians.
    pub rotation: Vec3,
    pub scaling: Vec3,
}

impl Default for ModelPlacement {
    fn default() -> Self {
        Self {
            position: Vec3::new(-0.25, -0.1, 0.0),
            rotation: Vec3::new(0.0, PI, 0.0),
            scaling: Vec3::splat(0.1),
        }
    }
}

impl ModelPlacement {
    pub fn transform(&self) -> Transform {
        Transform::from_euler(self.position, self.rotation, self.scaling)
    }
}

/// Sky-and-ground light. `direction` points toward the sky colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HemisphericLight {
    pub direction: Vec3,
    pub intensity: f32,
}

impl Default for HemisphericLight {
    fn default() -> Self {
        Self {
            direction: Vec3::Y,
            intensity: 1.0,
        }
    }
}

/// Index of an animation group in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationHandle(pub usize);

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("scene has been disposed")]
    Disposed,
    #[error("node {node} has parent {parent} out of range")]
    BadParent { node: usize, parent: usize },
}

/// One mesh to draw with its world matrix.
#[derive(Debug, Clone, Copy)]
pub struct DrawItem {
    pub node: usize,
    pub mesh: usize,
    pub world: Mat4,
}

#[derive(Debug, Clone)]
struct ModelInstance {
    data: ModelData,
    root: Transform,
    /// Current local transform per node, written by animations.
    locals: Vec<Transform>,
    /// Node indices with every parent before its children.
    order: Vec<usize>,
}

/// The scene graph owned by one mounted viewer.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    model: Option<ModelInstance>,
    animations: Vec<AnimationGroup>,
    light: HemisphericLight,
    revision: u64,
    disposed: bool,
}

impl Scene {
    /// Empty scene with the default light.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn light(&self) -> &HemisphericLight {
        &self.light
    }

    /// Bumped whenever the set of meshes changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub fn model(&self) -> Option<&ModelData> {
        self.model.as_ref().map(|m| &m.data)
    }

    pub fn mesh(&self, index: usize) -> Option<&MeshData> {
        self.model().and_then(|m| m.meshes.get(index))
    }

    /// Place `data` in the scene, replacing any previous model. One animation
    /// group is created per clip.
    pub fn install_model(
        &mut self,
        data: ModelData,
        placement: &ModelPlacement,
    ) -> Result<(), SceneError> {
        if self.disposed {
            return Err(SceneError::Disposed);
        }
        let count = data.nodes.len();
        for (node, n) in data.nodes.iter().enumerate() {
            if let Some(parent) = n.parent {
                if parent >= count {
                    return Err(SceneError::BadParent { node, parent });
                }
            }
        }

        let order = traversal_order(&data);
        if order.len() < count {
            tracing::warn!(
                "{} nodes unreachable from a root, they will not be drawn",
                count - order.len()
            );
        }
        let locals = data.nodes.iter().map(|n| n.transform).collect();
        self.animations = data
            .animations
            .iter()
            .cloned()
            .map(AnimationGroup::new)
            .collect();
        self.model = Some(ModelInstance {
            data,
            root: placement.transform(),
            locals,
            order,
        });
        self.revision += 1;
        tracing::debug!(
            "installed model with {count} nodes and {} animation groups",
            self.animations.len()
        );
        Ok(())
    }

    pub fn animation_count(&self) -> usize {
        self.animations.len()
    }

    pub fn first_animation(&self) -> Option<AnimationHandle> {
        (!self.animations.is_empty()).then_some(AnimationHandle(0))
    }

    pub fn animation(&self, handle: AnimationHandle) -> Option<&AnimationGroup> {
        self.animations.get(handle.0)
    }

    pub fn animation_mut(&mut self, handle: AnimationHandle) -> Option<&mut AnimationGroup> {
        self.animations.get_mut(handle.0)
    }

    pub fn play(&mut self, handle: AnimationHandle, looping: bool) -> bool {
        match self.animations.get_mut(handle.0) {
            Some(group) => {
                group.play(looping);
                true
            }
            None => false,
        }
    }

    pub fn pause(&mut self, handle: AnimationHandle) -> bool {
        match self.animations.get_mut(handle.0) {
            Some(group) => {
                group.pause();
                true
            }
            None => false,
        }
    }

    /// Seek the group to `frame` and pose the model. Returns false for an
    /// unknown handle.
    pub fn go_to_frame(&mut self, handle: AnimationHandle, frame: f32) -> bool {
        let (Some(group), Some(model)) = (self.animations.get_mut(handle.0), self.model.as_mut())
        else {
            return false;
        };
        group.go_to_frame(frame, &mut model.locals);
        true
    }

    /// Advance every playing group by `dt` seconds.
    pub fn advance_animations(&mut self, dt: f32) {
        let Some(model) = self.model.as_mut() else {
            return;
        };
        for group in &mut self.animations {
            group.advance(dt, &mut model.locals);
        }
    }

    /// Current local transform of `node`.
    pub fn node_transform(&self, node: usize) -> Option<Transform> {
        self.model.as_ref().and_then(|m| m.locals.get(node).copied())
    }

    /// World matrix of every node, indexed by node. Unreachable nodes get the
    /// identity.
    pub fn world_matrices(&self) -> Vec<Mat4> {
        let Some(model) = &self.model else {
            return Vec::new();
        };
        let root = model.root.matrix();
        let mut world = vec![Mat4::IDENTITY; model.locals.len()];
        for &node in &model.order {
            let local = model.locals[node].matrix();
            world[node] = match model.data.nodes[node].parent {
                Some(parent) => world[parent] * local,
                None => root * local,
            };
        }
        world
    }

    /// Meshes to draw this frame, in traversal order.
    pub fn draw_list(&self) -> Vec<DrawItem> {
        let Some(model) = &self.model else {
            return Vec::new();
        };
        let world = self.world_matrices();
        model
            .order
            .iter()
            .filter_map(|&node| {
                model.data.nodes[node].mesh.map(|mesh| DrawItem {
                    node,
                    mesh,
                    world: world[node],
                })
            })
            .collect()
    }

    /// World-space bounds of all drawn geometry.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for item in self.draw_list() {
            let Some(mesh) = self.mesh(item.mesh) else {
                continue;
            };
            for p in mesh.primitives.iter().flat_map(|p| &p.positions) {
                let w = item.world.transform_point3(Vec3::from(*p));
                min = min.min(w);
                max = max.max(w);
            }
        }
        (min.x <= max.x).then_some((min, max))
    }

    /// Release the model and animations. Later calls are ignored.
    pub fn dispose(&mut self) {
        if self.disposed {
            tracing::warn!("scene already disposed");
            return;
        }
        self.model = None;
        self.animations.clear();
        self.disposed = true;
        self.revision += 1;
        tracing::debug!("scene disposed");
    }
}

fn traversal_order(data: &ModelData) -> Vec<usize> {
    let mut children = vec![Vec::new(); data.nodes.len()];
    let mut stack = Vec::new();
    for (i, node) in data.nodes.iter().enumerate() {
        match node.parent {
            Some(p) => children[p].push(i),
            None => stack.push(i),
        }
    }
    stack.reverse();
    let mut visited = vec![false; data.nodes.len()];
    let mut order = Vec::with_capacity(data.nodes.len());
    while let Some(node) = stack.pop() {
        if std::mem::replace(&mut visited[node], true) {
            continue;
        }
        order.push(node);
        stack.extend(children[node].iter().rev());
    }
    order
}
