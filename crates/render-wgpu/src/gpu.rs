use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};
use modelview_render::ArcRotateCamera;
use modelview_scene::Scene;
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    inv_view_proj: [[f32; 4]; 4],
    light: [f32; 4],
    sky_color: [f32; 4],
    ground_color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct PrimitiveInstance {
    /// Column-major world matrix of the owning node.
    world: [[f32; 4]; 4],
    base_color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct LineVertex {
    position: [f32; 3],
    color: [f32; 4],
}

/// Ground grid line vertices on the plane `y = height`, two per line.
fn grid_mesh(half_extent: i32, spacing: f32, height: f32) -> Vec<LineVertex> {
    const LINE_COLOR: [f32; 4] = [0.45, 0.5, 0.55, 1.0];
    let edge = half_extent as f32 * spacing;
    (-half_extent..=half_extent)
        .flat_map(|step| {
            let at = step as f32 * spacing;
            [
                [-edge, height, at],
                [edge, height, at],
                [at, height, -edge],
                [at, height, edge],
            ]
        })
        .map(|position| LineVertex {
            position,
            color: LINE_COLOR,
        })
        .collect()
}

/// Interleave positions and normals.
fn interleave(positions: &[[f32; 3]], normals: &[[f32; 3]]) -> Vec<Vertex> {
    positions
        .iter()
        .enumerate()
        .map(|(i, &position)| Vertex {
            position,
            normal: normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
        })
        .collect()
}

struct GpuPrimitive {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    base_color: [f32; 4],
}

/// Environment settings for the sky and ground.
#[derive(Debug, Clone, Copy)]
pub struct Environment {
    pub sky_color: [f32; 4],
    pub ground_color: [f32; 4],
    pub show_ground: bool,
    pub ground_height: f32,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            sky_color: [0.55, 0.7, 0.9, 1.0],
            ground_color: [0.18, 0.18, 0.2, 1.0],
            show_ground: true,
            ground_height: -0.5,
        }
    }
}

/// wgpu scene renderer: sky gradient, ground grid and the model's meshes.
pub struct WgpuRenderer {
    mesh_pipeline: wgpu::RenderPipeline,
    grid_pipeline: wgpu::RenderPipeline,
    sky_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    ground_buffer: wgpu::Buffer,
    ground_vertex_count: u32,
    instance_buffer: wgpu::Buffer,
    instance_capacity: u32,
    depth_texture: wgpu::TextureView,
    environment: Environment,
    /// GPU copies of the scene meshes, indexed by mesh.
    meshes: Vec<Vec<GpuPrimitive>>,
    uploaded_revision: Option<u64>,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        environment: Environment,
    ) -> Self {
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("camera_uniforms"),
            size: std::mem::size_of::<Uniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("scene_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("scene_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let color_target = [Some(wgpu::ColorTargetState {
            format: surface_format,
            blend: Some(wgpu::BlendState::REPLACE),
            write_mask: wgpu::ColorWrites::ALL,
        })];
        let depth_test = wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        };

        let mesh_source = shaders::mesh_shader();
        let mesh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh_shader"),
            source: wgpu::ShaderSource::Wgsl(mesh_source.as_str().into()),
        });

        let mesh_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mesh_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &mesh_shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                            1 => Float32x3,
                        ],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<PrimitiveInstance>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![
                            2 => Float32x4,
                            3 => Float32x4,
                            4 => Float32x4,
                            5 => Float32x4,
                            6 => Float32x4,
                        ],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &mesh_shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &color_target,
            }),
            // glTF winding is counter-clockwise, but the model root may be
            // mirrored, so both faces are drawn.
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_test.clone()),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let grid_source = shaders::grid_shader();
        let grid_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("grid_shader"),
            source: wgpu::ShaderSource::Wgsl(grid_source.as_str().into()),
        });

        let grid_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("grid_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &grid_shader,
                entry_point: Some("vs_grid"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<LineVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x4,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &grid_shader,
                entry_point: Some("fs_grid"),
                compilation_options: Default::default(),
                targets: &color_target,
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil: Some(depth_test),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let sky_source = shaders::sky_shader();
        let sky_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sky_shader"),
            source: wgpu::ShaderSource::Wgsl(sky_source.as_str().into()),
        });

        let sky_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sky_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &sky_shader,
                entry_point: Some("vs_sky"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &sky_shader,
                entry_point: Some("fs_sky"),
                compilation_options: Default::default(),
                targets: &color_target,
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let ground_lines = grid_mesh(20, 0.25, environment.ground_height);
        let ground_vertex_count = ground_lines.len() as u32;
        let ground_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("ground_lines"),
            contents: bytemuck::cast_slice(&ground_lines),
            usage: wgpu::BufferUsages::VERTEX,
        });

        // Instance buffer (pre-allocated): one entry per drawn primitive.
        let instance_capacity = 4_096u32;
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("primitive_instances"),
            size: (instance_capacity as u64) * std::mem::size_of::<PrimitiveInstance>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let depth_texture = Self::create_depth_texture(device, width, height);

        Self {
            mesh_pipeline,
            grid_pipeline,
            sky_pipeline,
            uniform_buffer,
            uniform_bind_group,
            ground_buffer,
            ground_vertex_count,
            instance_buffer,
            instance_capacity,
            depth_texture,
            environment,
            meshes: Vec::new(),
            uploaded_revision: None,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    /// Drop the GPU copies of the scene meshes.
    pub fn release_meshes(&mut self) {
        self.meshes.clear();
        self.uploaded_revision = None;
    }

    fn upload_meshes(&mut self, device: &wgpu::Device, scene: &Scene) {
        self.meshes.clear();
        if let Some(model) = scene.model() {
            for mesh in &model.meshes {
                let primitives = mesh
                    .primitives
                    .iter()
                    .filter(|p| !p.indices.is_empty())
                    .map(|p| GpuPrimitive {
                        vertex_buffer: device.create_buffer_init(
                            &wgpu::util::BufferInitDescriptor {
                                label: Some("mesh_vertex_buffer"),
                                contents: bytemuck::cast_slice(&interleave(
                                    &p.positions,
                                    &p.normals,
                                )),
                                usage: wgpu::BufferUsages::VERTEX,
                            },
                        ),
                        index_buffer: device.create_buffer_init(
                            &wgpu::util::BufferInitDescriptor {
                                label: Some("mesh_index_buffer"),
                                contents: bytemuck::cast_slice(&p.indices),
                                usage: wgpu::BufferUsages::INDEX,
                            },
                        ),
                        index_count: p.indices.len() as u32,
                        base_color: p.base_color,
                    })
                    .collect();
                self.meshes.push(primitives);
            }
            tracing::debug!("uploaded {} meshes", self.meshes.len());
        }
        self.uploaded_revision = Some(scene.revision());
    }

    /// Render one frame of `scene` into `view`.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        scene: &Scene,
        camera: &ArcRotateCamera,
    ) {
        if self.uploaded_revision != Some(scene.revision()) {
            self.upload_meshes(device, scene);
        }

        let vp = camera.view_projection();
        let light = scene.light();
        let light_dir: Vec3 = light.direction.normalize_or_zero();
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms {
                view_proj: vp.to_cols_array_2d(),
                inv_view_proj: vp.inverse().to_cols_array_2d(),
                light: Vec4::from((light_dir, light.intensity)).to_array(),
                sky_color: self.environment.sky_color,
                ground_color: self.environment.ground_color,
            }),
        );

        // One instance per primitive, in draw order.
        let mut instances: Vec<PrimitiveInstance> = Vec::new();
        let mut draws: Vec<(usize, usize)> = Vec::new();
        'items: for item in scene.draw_list() {
            let Some(primitives) = self.meshes.get(item.mesh) else {
                continue;
            };
            let world = item.world.to_cols_array_2d();
            for (p, prim) in primitives.iter().enumerate() {
                if instances.len() >= self.instance_capacity as usize {
                    tracing::warn!("instance limit {} reached", self.instance_capacity);
                    break 'items;
                }
                instances.push(PrimitiveInstance {
                    world,
                    base_color: prim.base_color,
                });
                draws.push((item.mesh, p));
            }
        }

        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("scene_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.1,
                            g: 0.1,
                            b: 0.15,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.uniform_bind_group, &[]);

            // Sky
            pass.set_pipeline(&self.sky_pipeline);
            pass.draw(0..3, 0..1);

            // Ground
            if self.environment.show_ground {
                pass.set_pipeline(&self.grid_pipeline);
                pass.set_vertex_buffer(0, self.ground_buffer.slice(..));
                pass.draw(0..self.ground_vertex_count, 0..1);
            }

            // Model
            if !draws.is_empty() {
                pass.set_pipeline(&self.mesh_pipeline);
                pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
                for (instance, &(mesh, p)) in draws.iter().enumerate() {
                    let prim = &self.meshes[mesh][p];
                    let instance = instance as u32;
                    pass.set_vertex_buffer(0, prim.vertex_buffer.slice(..));
                    pass.set_index_buffer(prim.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..prim.index_count, 0, instance..instance + 1);
                }
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_buffer"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}
