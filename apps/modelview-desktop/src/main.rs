mod controls;

use anyhow::{Context as _, Result};
use clap::Parser;
use controls::PointerControls;
use egui::Context as EguiContext;
use modelview_assets::{AssetError, ModelData, spawn_import};
use modelview_common::AssetLocation;
use modelview_render_wgpu::{Environment, GpuEngine, GpuFrame};
use modelview_ui::draw_overlay;
use modelview_viewer::{ResizeListeners, Viewer, ViewerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "modelview-desktop", about = "View an animated glTF model")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Viewer configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model file or http(s) URL to load instead of the configured one
    #[arg(short, long)]
    model: Option<String>,
}

/// Events posted to the event loop from other threads.
enum UserEvent {
    ModelImported(Result<ModelData, AssetError>),
}

struct DesktopApp {
    config: ViewerConfig,
    proxy: EventLoopProxy<UserEvent>,
    window: Option<Arc<Window>>,
    viewer: Option<Viewer<GpuEngine>>,
    listeners: ResizeListeners,
    controls: PointerControls,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
    last_frame: Instant,
}

impl DesktopApp {
    fn new(config: ViewerConfig, proxy: EventLoopProxy<UserEvent>) -> Self {
        Self {
            config,
            proxy,
            window: None,
            viewer: None,
            listeners: ResizeListeners::new(),
            controls: PointerControls::default(),
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            egui_renderer: None,
            last_frame: Instant::now(),
        }
    }

    /// Create the window and engine, mount the viewer and start the import.
    fn mount(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let setup = &self.config.window;
        let attrs = Window::default_attributes()
            .with_title(setup.title.clone())
            .with_inner_size(PhysicalSize::new(setup.width, setup.height));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let size = window.inner_size();
        let environment = Environment {
            show_ground: self.config.show_ground,
            ..Environment::default()
        };
        let engine = GpuEngine::new(window.clone(), size.width, size.height, environment)?;

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer =
            egui_wgpu::Renderer::new(engine.device(), engine.surface_format(), None, 1, false);

        let viewer = Viewer::mount(
            self.config.clone(),
            engine,
            size.width,
            size.height,
            &mut self.listeners,
        );

        let proxy = self.proxy.clone();
        spawn_import(viewer.asset_location().clone(), move |result| {
            if proxy.send_event(UserEvent::ModelImported(result)).is_err() {
                tracing::debug!("event loop closed before the model finished loading");
            }
        })
        .context("failed to start model import")?;

        self.window = Some(window);
        self.viewer = Some(viewer);
        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);
        self.last_frame = Instant::now();
        Ok(())
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32().min(0.1);
        self.last_frame = now;

        let (Some(window), Some(viewer), Some(egui_winit)) =
            (&self.window, &mut self.viewer, &mut self.egui_winit)
        else {
            return;
        };
        let Some(frame) = viewer.frame(dt) else {
            return;
        };

        let raw_input = egui_winit.take_egui_input(window);
        let mut actions = Vec::new();
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            actions = draw_overlay(ctx, viewer.overlay());
        });
        egui_winit.handle_platform_output(window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        if let Some(egui_renderer) = &mut self.egui_renderer {
            paint_overlay(
                egui_renderer,
                viewer.renderer(),
                &frame,
                &paint_jobs,
                &full_output.textures_delta,
                full_output.pixels_per_point,
            );
        }
        frame.present();

        for action in actions {
            viewer.dispatch(action);
        }
    }

    fn unmount(&mut self) {
        self.egui_renderer = None;
        self.egui_winit = None;
        if let Some(viewer) = self.viewer.take() {
            let engine = viewer.unmount(&mut self.listeners);
            debug_assert!(engine.is_disposed());
        }
        self.window = None;
    }
}

/// Draw the egui overlay on top of the rendered scene.
fn paint_overlay(
    egui_renderer: &mut egui_wgpu::Renderer,
    engine: &GpuEngine,
    frame: &GpuFrame,
    paint_jobs: &[egui::ClippedPrimitive],
    textures_delta: &egui::TexturesDelta,
    pixels_per_point: f32,
) {
    let (device, queue) = (engine.device(), engine.queue());
    let (width, height) = engine.size();
    let screen_descriptor = egui_wgpu::ScreenDescriptor {
        size_in_pixels: [width, height],
        pixels_per_point,
    };

    for (id, image_delta) in &textures_delta.set {
        egui_renderer.update_texture(device, queue, *id, image_delta);
    }
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("overlay_encoder"),
    });
    egui_renderer.update_buffers(device, queue, &mut encoder, paint_jobs, &screen_descriptor);
    {
        let mut pass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("overlay_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            })
            .forget_lifetime();
        egui_renderer.render(&mut pass, paint_jobs, &screen_descriptor);
    }
    queue.submit(std::iter::once(encoder.finish()));
    for id in &textures_delta.free {
        egui_renderer.free_texture(id);
    }
}

impl ApplicationHandler<UserEvent> for DesktopApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.mount(event_loop) {
            tracing::error!("failed to start viewer: {e:#}");
            event_loop.exit();
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::ModelImported(result) => {
                if let Some(viewer) = &mut self.viewer {
                    viewer.on_model_imported(result);
                }
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(egui_winit), Some(window)) = (&mut self.egui_winit, &self.window) {
            let response = egui_winit.on_window_event(window, &event);
            if response.consumed {
                if let WindowEvent::MouseInput {
                    state: ElementState::Released,
                    button,
                    ..
                } = event
                {
                    self.controls.button(button, false);
                }
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(viewer) = &mut self.viewer {
                    for id in self.listeners.ids() {
                        viewer.handle_resize(id, new_size.width, new_size.height);
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let pressed = state == ElementState::Pressed;
                if pressed && self.egui_ctx.is_pointer_over_area() {
                    return;
                }
                self.controls.button(button, pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(viewer) = &mut self.viewer {
                    self.controls
                        .moved(position.x as f32, position.y as f32, viewer.camera_mut());
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if let Some(viewer) = &mut self.viewer {
                    self.controls.wheel(delta, viewer.camera_mut());
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.unmount();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("modelview-desktop starting");

    let mut config = match &cli.config {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    if let Some(model) = cli.model {
        config.asset = AssetLocation::parse(&model);
    }

    let event_loop = EventLoop::<UserEvent>::with_user_event().build()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = DesktopApp::new(config, event_loop.create_proxy());
    event_loop.run_app(&mut app)?;

    Ok(())
}
