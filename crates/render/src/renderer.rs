use crate::camera::ArcRotateCamera;
use modelview_scene::Scene;
use std::fmt::Write;

/// Renderer-agnostic interface. All rendering engines implement this trait.
///
/// The renderer reads the scene and camera and produces output. It never
/// mutates the scene.
pub trait Renderer {
    /// The output type produced by one frame.
    type Output;

    /// Render one frame.
    fn render(&mut self, scene: &Scene, camera: &ArcRotateCamera) -> Self::Output;

    /// The output surface changed size.
    fn resize(&mut self, width: u32, height: u32);

    /// Free every resource created for `scene`.
    fn release_scene(&mut self, scene: &Scene);

    /// Free the engine itself. Called once, after which the renderer is not used.
    fn dispose(&mut self);
}

/// Debug text renderer.
///
/// Produces a human-readable description of the scene as seen by the camera.
/// Used by the CLI and in tests; it also counts lifecycle calls.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    size: (u32, u32),
    frames: u64,
    released_scenes: u32,
    disposals: u32,
}

impl DebugTextRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            ..Self::default()
        }
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn released_scenes(&self) -> u32 {
        self.released_scenes
    }

    pub fn disposals(&self) -> u32 {
        self.disposals
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, scene: &Scene, camera: &ArcRotateCamera) -> String {
        self.frames += 1;
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Frame {} ({}x{}, revision={}) ===",
            self.frames, self.size.0, self.size.1, scene.revision()
        );
        let p = camera.position();
        let _ = writeln!(
            out,
            "Camera: alpha={:.3} beta={:.3} radius={:.3} eye=({:.2}, {:.2}, {:.2})",
            camera.alpha, camera.beta, camera.radius, p.x, p.y, p.z
        );

        let Some(model) = scene.model() else {
            out.push_str("Model: not loaded\n");
            return out;
        };
        for item in scene.draw_list() {
            let name = &model.nodes[item.node].name;
            let w = item.world.w_axis;
            let _ = writeln!(
                out,
                "  [{name}] mesh={} pos=({:.2}, {:.2}, {:.2})",
                item.mesh, w.x, w.y, w.z
            );
        }
        if let Some(handle) = scene.first_animation() {
            if let Some(group) = scene.animation(handle) {
                let _ = writeln!(
                    out,
                    "Animation: {} frame={:.0}/{:.0} playing={}",
                    group.name(),
                    group.current_frame(),
                    group.to_frame(),
                    group.is_playing()
                );
            }
        }
        out
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn release_scene(&mut self, _scene: &Scene) {
        self.released_scenes += 1;
    }

    fn dispose(&mut self) {
        self.disposals += 1;
        tracing::debug!("debug renderer disposed after {} frames", self.frames);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use modelview_assets::{MeshData, ModelData, NodeData, Primitive};
    use modelview_common::Transform;
    use modelview_scene::ModelPlacement;

    fn one_node_model() -> ModelData {
        ModelData {
            nodes: vec![NodeData {
                name: "Stock".into(),
                parent: None,
                transform: Transform {
                    position: Vec3::new(1.0, 2.0, 3.0),
                    ..Transform::default()
                },
                mesh: Some(0),
            }],
            meshes: vec![MeshData {
                name: "m".into(),
                primitives: vec![Primitive {
                    positions: vec![[0.0; 3]; 3],
                    normals: vec![[0.0, 1.0, 0.0]; 3],
                    indices: vec![0, 1, 2],
                    base_color: [1.0; 4],
                }],
            }],
            animations: vec![],
        }
    }

    #[test]
    fn empty_scene_reports_missing_model() {
        let mut renderer = DebugTextRenderer::new(640, 480);
        let output = renderer.render(&Scene::new(), &ArcRotateCamera::default());
        assert!(output.contains("640x480"));
        assert!(output.contains("radius=1.500"));
        assert!(output.contains("not loaded"));
        assert_eq!(renderer.frames(), 1);
    }

    #[test]
    fn lists_drawn_nodes() {
        let mut scene = Scene::new();
        let placement = ModelPlacement {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scaling: Vec3::ONE,
        };
        scene.install_model(one_node_model(), &placement).unwrap();
        let mut renderer = DebugTextRenderer::new(1, 1);
        let output = renderer.render(&scene, &ArcRotateCamera::default());
        assert!(output.contains("[Stock] mesh=0 pos=(1.00, 2.00, 3.00)"));
    }

    #[test]
    fn resize_and_lifecycle_counters() {
        let mut renderer = DebugTextRenderer::new(1, 1);
        renderer.resize(800, 600);
        assert_eq!(renderer.size(), (800, 600));
        renderer.release_scene(&Scene::new());
        renderer.dispose();
        assert_eq!(renderer.released_scenes(), 1);
        assert_eq!(renderer.disposals(), 1);
    }
}
