use crate::gpu::{Environment, WgpuRenderer};
use modelview_render::{ArcRotateCamera, Renderer};
use modelview_scene::Scene;

/// Errors while bringing up the GPU.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}

/// A frame acquired from the surface with the scene already drawn into it.
/// Overlays draw into `view` before [`present`](Self::present).
pub struct GpuFrame {
    texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
}

impl GpuFrame {
    pub fn present(self) {
        self.texture.present();
    }
}

/// Rendering engine bound to one window surface.
pub struct GpuEngine {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: Option<WgpuRenderer>,
    backend: wgpu::Backend,
}

impl GpuEngine {
    /// Create a surface on `target` and a device able to present to it.
    pub fn new<W>(
        target: W,
        width: u32,
        height: u32,
        environment: Environment,
    ) -> Result<Self, EngineError>
    where
        W: wgpu::WindowHandle + 'static,
    {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(target)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(EngineError::NoAdapter)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("modelview_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or(EngineError::NoSurfaceFormat)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(
            &device,
            surface_format,
            config.width,
            config.height,
            environment,
        );
        let backend = adapter.get_info().backend;
        tracing::info!("GPU initialized with {} backend", backend.to_str());

        Ok(Self {
            surface,
            device,
            queue,
            config,
            renderer: Some(renderer),
            backend,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn backend(&self) -> wgpu::Backend {
        self.backend
    }

    pub fn is_disposed(&self) -> bool {
        self.renderer.is_none()
    }

    fn begin_frame(&mut self) -> Option<GpuFrame> {
        let texture = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return None;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return None;
            }
        };
        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        Some(GpuFrame { texture, view })
    }
}

impl Renderer for GpuEngine {
    type Output = Option<GpuFrame>;

    fn render(&mut self, scene: &Scene, camera: &ArcRotateCamera) -> Option<GpuFrame> {
        self.renderer.as_ref()?;
        let frame = self.begin_frame()?;
        if let Some(renderer) = &mut self.renderer {
            renderer.render(&self.device, &self.queue, &frame.view, scene, camera);
        }
        Some(frame)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(&self.device, self.config.width, self.config.height);
        }
    }

    fn release_scene(&mut self, _scene: &Scene) {
        if let Some(renderer) = &mut self.renderer {
            renderer.release_meshes();
        }
    }

    fn dispose(&mut self) {
        if self.renderer.take().is_some() {
            tracing::info!("GPU engine disposed");
        }
    }
}
