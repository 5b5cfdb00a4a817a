use crate::config::ViewerConfig;
use crate::listeners::{ListenerId, ResizeListeners};
use modelview_assets::{AssetError, ModelData};
use modelview_common::AssetLocation;
use modelview_render::{ArcRotateCamera, Renderer};
use modelview_scene::{AnimationHandle, Scene};
use modelview_ui::{Action, OverlayState};

/// One mounted model view: engine, scene, camera and overlay state.
///
/// Created by [`Viewer::mount`] and torn down by [`Viewer::unmount`]. The
/// host drives it from its event loop: import completion, GUI actions,
/// resizes and one [`frame`](Viewer::frame) per redraw.
pub struct Viewer<R: Renderer> {
    config: ViewerConfig,
    renderer: R,
    scene: Scene,
    camera: ArcRotateCamera,
    overlay: OverlayState,
    /// Set once a model with at least one animation has been imported.
    animation: Option<AnimationHandle>,
    resize_listener: ListenerId,
}

/// Width over height, treating a zero-sized (minimised) surface as 1x1.
fn aspect_ratio(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

impl<R: Renderer> Viewer<R> {
    /// Build the scene and camera on `renderer` and register for resizes.
    /// The host starts the model import for [`asset_location`](Self::asset_location).
    pub fn mount(
        config: ViewerConfig,
        renderer: R,
        width: u32,
        height: u32,
        listeners: &mut ResizeListeners,
    ) -> Self {
        let setup = config.camera;
        let camera = ArcRotateCamera {
            alpha: setup.alpha,
            beta: setup.beta,
            radius: setup.radius,
            limits: setup.limits,
            aspect: aspect_ratio(width, height),
            ..ArcRotateCamera::default()
        };
        let resize_listener = listeners.add();
        tracing::info!("viewer mounted ({width}x{height}), model {}", config.asset);

        Self {
            config,
            renderer,
            scene: Scene::new(),
            camera,
            overlay: OverlayState::new(),
            animation: None,
            resize_listener,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn asset_location(&self) -> &AssetLocation {
        &self.config.asset
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &ArcRotateCamera {
        &self.camera
    }

    /// Pointer controls attached to the surface move the camera directly.
    pub fn camera_mut(&mut self) -> &mut ArcRotateCamera {
        &mut self.camera
    }

    pub fn overlay(&self) -> &OverlayState {
        &self.overlay
    }

    pub fn animation(&self) -> Option<AnimationHandle> {
        self.animation
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn resize_listener(&self) -> ListenerId {
        self.resize_listener
    }

    /// Completion of the model import. A failed import is logged and
    /// otherwise ignored. Returns true if a model was installed.
    pub fn on_model_imported(&mut self, result: Result<ModelData, AssetError>) -> bool {
        let model = match result {
            Ok(model) => model,
            Err(e) => {
                tracing::error!("model loading failed: {e}");
                return false;
            }
        };
        let summary = model.summary();
        if let Err(e) = self.scene.install_model(model, &self.config.placement) {
            tracing::error!("model loading failed: {e}");
            return false;
        }
        tracing::info!("{summary}");

        self.animation = self.scene.first_animation();
        if let Some(handle) = self.animation {
            if let Some(group) = self.scene.animation(handle) {
                self.overlay
                    .slider
                    .set_range(group.from_frame(), group.to_frame());
            }
            if self.config.autoplay {
                self.scene.play(handle, self.config.looping);
            }
        }
        true
    }

    /// Apply one GUI action.
    pub fn dispatch(&mut self, action: Action) {
        match action {
            Action::ResetCamera => {
                self.camera.reset();
                tracing::debug!("camera reset");
            }
            Action::SeekFrame(value) => match self.animation {
                Some(handle) => {
                    let frame = value.round();
                    self.scene.go_to_frame(handle, frame);
                    self.overlay.apply(&Action::SeekFrame(frame));
                }
                None => tracing::debug!("no animation loaded, ignoring seek to {value}"),
            },
            Action::OpenHelp | Action::CloseHelp | Action::SelectHelp(_) => {
                self.overlay.apply(&action);
            }
        }
    }

    /// One tick of the render loop.
    pub fn frame(&mut self, dt: f32) -> R::Output {
        self.camera.check_limits();
        self.scene.advance_animations(dt);
        if let Some(group) = self.animation.and_then(|h| self.scene.animation(h)) {
            self.overlay.slider.value = group.current_frame();
        }
        self.renderer.render(&self.scene, &self.camera)
    }

    /// Forwarded window resize. Ignored unless `id` is this viewer's listener.
    pub fn handle_resize(&mut self, id: ListenerId, width: u32, height: u32) -> bool {
        if id != self.resize_listener {
            return false;
        }
        self.camera.aspect = aspect_ratio(width, height);
        self.renderer.resize(width, height);
        true
    }

    /// Deregister the resize listener, then dispose the scene and the engine.
    /// Returns the disposed engine.
    pub fn unmount(self, listeners: &mut ResizeListeners) -> R {
        let Self {
            mut renderer,
            mut scene,
            resize_listener,
            ..
        } = self;
        if !listeners.remove(resize_listener) {
            tracing::warn!("resize listener was already removed");
        }
        renderer.release_scene(&scene);
        scene.dispose();
        renderer.dispose();
        tracing::info!("viewer unmounted");
        renderer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use modelview_assets::{
        AnimationClip, Channel, Interpolation, Keyframes, MeshData, NodeData, Primitive,
    };
    use modelview_common::Transform;
    use modelview_render::DebugTextRenderer;
    use modelview_ui::HelpTab;
    use std::f32::consts::FRAC_PI_2;

    fn animated_model() -> ModelData {
        ModelData {
            nodes: vec![NodeData {
                name: "Bolt".into(),
                parent: None,
                transform: Transform::default(),
                mesh: Some(0),
            }],
            meshes: vec![MeshData {
                name: "bolt".into(),
                primitives: vec![Primitive {
                    positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                    normals: vec![[0.0, 0.0, 1.0]; 3],
                    indices: vec![0, 1, 2],
                    base_color: [0.3, 0.3, 0.3, 1.0],
                }],
            }],
            animations: vec![AnimationClip {
                name: "Cycle".into(),
                channels: vec![Channel {
                    node: 0,
                    interpolation: Interpolation::Linear,
                    times: vec![0.0, 2.0],
                    values: Keyframes::Translation(vec![Vec3::ZERO, Vec3::new(0.0, 0.0, 120.0)]),
                }],
            }],
        }
    }

    fn config() -> ViewerConfig {
        ViewerConfig {
            autoplay: false,
            ..ViewerConfig::default()
        }
    }

    fn mount(listeners: &mut ResizeListeners) -> Viewer<DebugTextRenderer> {
        Viewer::mount(config(), DebugTextRenderer::new(800, 550), 800, 550, listeners)
    }

    #[test]
    fn mount_applies_camera_setup_and_registers_listener() {
        let mut listeners = ResizeListeners::new();
        let viewer = mount(&mut listeners);
        assert!(listeners.contains(viewer.resize_listener()));
        assert_eq!(viewer.camera().alpha, -FRAC_PI_2);
        assert_eq!(viewer.camera().beta, FRAC_PI_2);
        assert_eq!(viewer.camera().radius, 1.5);
        assert_eq!(viewer.camera().limits.upper_radius, 10.0);
        assert!(viewer.animation().is_none());
        assert!(!viewer.scene().has_model());
    }

    #[test]
    fn import_stores_handle_and_seek_uses_rounded_value() {
        let mut listeners = ResizeListeners::new();
        let mut viewer = mount(&mut listeners);
        assert!(viewer.on_model_imported(Ok(animated_model())));
        let handle = viewer.animation().expect("handle set after import");
        assert_eq!(viewer.overlay().slider.max, 120.0);

        viewer.dispatch(Action::SeekFrame(41.6));
        let group = viewer.scene().animation(handle).unwrap();
        assert_eq!(group.current_frame(), 42.0);
        assert_eq!(viewer.overlay().slider.value, 42.0);
        // 42 frames into a 120-frame, 120-unit move.
        let z = viewer.scene().node_transform(0).unwrap().position.z;
        assert!((z - 42.0).abs() < 1e-3);
    }

    #[test]
    fn seek_before_import_is_a_no_op() {
        let mut listeners = ResizeListeners::new();
        let mut viewer = mount(&mut listeners);
        let before = viewer.overlay().clone();
        viewer.dispatch(Action::SeekFrame(30.0));
        assert!(viewer.animation().is_none());
        assert_eq!(viewer.overlay(), &before);
        assert!(!viewer.scene().has_model());
    }

    #[test]
    fn failed_import_leaves_viewer_usable() {
        let mut listeners = ResizeListeners::new();
        let mut viewer = mount(&mut listeners);
        let err = AssetError::UnsupportedScheme("https://example.org/a.glb".into());
        assert!(!viewer.on_model_imported(Err(err)));
        assert!(viewer.animation().is_none());
        viewer.dispatch(Action::SeekFrame(5.0));
        let frame = viewer.frame(0.016);
        assert!(frame.contains("not loaded"));
    }

    #[test]
    fn model_without_animation_keeps_handle_empty() {
        let mut listeners = ResizeListeners::new();
        let mut viewer = mount(&mut listeners);
        let mut model = animated_model();
        model.animations.clear();
        assert!(viewer.on_model_imported(Ok(model)));
        assert!(viewer.animation().is_none());
    }

    #[test]
    fn help_selectors_are_exclusive() {
        let mut listeners = ResizeListeners::new();
        let mut viewer = mount(&mut listeners);
        viewer.dispatch(Action::OpenHelp);
        for tab in HelpTab::ALL {
            viewer.dispatch(Action::SelectHelp(tab));
            let help = &viewer.overlay().help;
            let shown: Vec<_> = HelpTab::ALL
                .into_iter()
                .filter(|&t| help.is_text_visible(t))
                .collect();
            assert_eq!(shown, vec![tab]);
            let highlighted: Vec<_> = HelpTab::ALL
                .into_iter()
                .filter(|&t| help.is_highlighted(t))
                .collect();
            assert_eq!(highlighted, vec![tab]);
        }
        viewer.dispatch(Action::CloseHelp);
        assert!(!viewer.overlay().help.is_open());
    }

    #[test]
    fn unmount_removes_listener_and_disposes_once() {
        let mut listeners = ResizeListeners::new();
        let mut viewer = mount(&mut listeners);
        viewer.on_model_imported(Ok(animated_model()));
        let renderer = viewer.unmount(&mut listeners);
        assert!(listeners.is_empty());
        assert_eq!(renderer.released_scenes(), 1);
        assert_eq!(renderer.disposals(), 1);
    }

    #[test]
    fn reset_restores_angles_and_far_radius() {
        let mut listeners = ResizeListeners::new();
        let mut viewer = mount(&mut listeners);
        viewer.camera_mut().rotate(250.0, 120.0);
        viewer.camera_mut().zoom(2.0);
        viewer.dispatch(Action::ResetCamera);
        assert_eq!(viewer.camera().alpha, -FRAC_PI_2);
        assert_eq!(viewer.camera().beta, FRAC_PI_2);
        assert_eq!(viewer.camera().radius, 1000.0);

        // The next frame pulls the radius back inside its limits.
        viewer.frame(0.016);
        assert_eq!(viewer.camera().radius, 10.0);
    }

    #[test]
    fn resize_only_for_own_listener() {
        let mut listeners = ResizeListeners::new();
        let mut viewer = mount(&mut listeners);
        let other = listeners.add();
        assert!(!viewer.handle_resize(other, 10, 10));
        assert!(viewer.handle_resize(viewer.resize_listener(), 1000, 500));
        assert_eq!(viewer.renderer().size(), (1000, 500));
        assert_eq!(viewer.camera().aspect, 2.0);
    }

    #[test]
    fn minimised_window_keeps_a_usable_projection() {
        let mut listeners = ResizeListeners::new();
        let mut viewer = mount(&mut listeners);
        assert!(viewer.handle_resize(viewer.resize_listener(), 0, 0));
        assert_eq!(viewer.camera().aspect, 1.0);
        let projection = viewer.camera().view_projection();
        assert!(projection.is_finite());
        assert!(projection.inverse().is_finite());
    }

    #[test]
    fn inverted_limits_do_not_break_the_frame() {
        let mut listeners = ResizeListeners::new();
        let mut config = config();
        config.camera.limits.lower_radius = 5.0;
        config.camera.limits.upper_radius = 1.0;
        let mut viewer =
            Viewer::mount(config, DebugTextRenderer::new(8, 8), 8, 8, &mut listeners);
        viewer.frame(0.016);
        let radius = viewer.camera().radius;
        assert!((1.0..=5.0).contains(&radius));
    }

    #[test]
    fn autoplay_advances_and_tracks_slider() {
        let mut listeners = ResizeListeners::new();
        let mut viewer = Viewer::mount(
            ViewerConfig::default(),
            DebugTextRenderer::new(1, 1),
            1,
            1,
            &mut listeners,
        );
        viewer.on_model_imported(Ok(animated_model()));
        viewer.frame(0.5);
        assert!((viewer.overlay().slider.value - 30.0).abs() < 1e-3);
        let text = viewer.frame(0.0);
        assert!(text.contains("Animation: Cycle"));
    }
}
