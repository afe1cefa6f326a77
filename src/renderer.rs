use crate::camera::SceneCamera;
use crate::config::{AppConfig, EnvironmentPreset, ShadowConfig};
use crate::geometry::{self, MeshData, Vertex};
use crate::instance::ShapeInstance;
use crate::scene::{MaterialDef, Scene, ShapeKind};
use glam::{EulerRot, Mat4, Vec3};
use std::sync::Arc;
use wgpu::util::DeviceExt;
use winit::window::Window;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Scene pass clear color, a light studio backdrop (linear)
const BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.78,
    g: 0.80,
    b: 0.84,
    a: 1.0,
};

/// Slot in the per-draw data array reserved for the ground plane
const GROUND_SLOT: usize = 5;

// === GPU Data Structures ===

/// Per-frame uniforms shared by every pipeline
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Globals {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    /// rgb ambient term, w = 1.0 for the studio light rig, 0.0 for flat
    ambient: [f32; 4],
    /// xz center, effective radius, strength of each contact shadow blob
    blobs: [[f32; 4]; 5],
}

/// Per-draw transform and material
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
struct InstanceData {
    model: [[f32; 4]; 4],
    /// rgb albedo, w = 0.0 for normal-shaded, 1.0 for lit
    color: [f32; 4],
    /// x roughness, y metalness
    params: [f32; 4],
}

impl InstanceData {
    fn inactive() -> Self {
        Self {
            model: Mat4::IDENTITY.to_cols_array_2d(),
            color: [0.0; 4],
            params: [0.0; 4],
        }
    }
}

/// Uploaded mesh ready to draw
struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, mesh: &MeshData, label: &str) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertices")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Indices")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        }
    }
}

// === Frame Assembly ===

/// Resolution of the offscreen scene target: logical pixels scaled by the
/// display factor clamped to `max_scale`. Dense displays render at most
/// 1.5x; the display pass resamples to the surface either way.
fn scaled_extent(width: u32, height: u32, scale_factor: f64, max_scale: f32) -> (u32, u32) {
    let scale_factor = if scale_factor > 0.0 { scale_factor } else { 1.0 };
    let clamped = scale_factor.clamp(1.0, max_scale.max(1.0) as f64);
    let factor = clamped / scale_factor;
    let w = ((width as f64) * factor).round().max(1.0) as u32;
    let h = ((height as f64) * factor).round().max(1.0) as u32;
    (w, h)
}

fn material_color_params(def: &MaterialDef) -> ([f32; 4], [f32; 4]) {
    match def {
        MaterialDef::Normal => ([0.0, 0.0, 0.0, 0.0], [0.0; 4]),
        MaterialDef::Standard {
            color,
            roughness,
            metalness,
        } => (
            [color[0], color[1], color[2], 1.0],
            [*roughness, *metalness, 0.0, 0.0],
        ),
    }
}

/// Build the per-draw data array and the contact shadow blobs for one frame.
/// Hidden instances keep an inactive slot and cast nothing.
fn assemble_frame(
    instances: &[ShapeInstance],
    palette: &[MaterialDef],
    shadow: &ShadowConfig,
    time: f32,
) -> ([InstanceData; 6], [[f32; 4]; 5]) {
    let mut data = [InstanceData::inactive(); 6];
    let mut blobs = [[0.0f32; 4]; 5];

    for (slot, inst) in instances.iter().enumerate().take(5) {
        if !inst.pickable() {
            continue;
        }

        let position = inst.position_at(time);
        let rotation = inst.rotation_at(time);
        let model = Mat4::from_translation(position)
            * Mat4::from_euler(EulerRot::XYZ, rotation.x, rotation.y, rotation.z)
            * Mat4::from_scale(Vec3::splat(inst.scale));

        let def = palette
            .get(inst.material_index)
            .unwrap_or(&MaterialDef::Normal);
        let (color, params) = material_color_params(def);
        data[slot] = InstanceData {
            model: model.to_cols_array_2d(),
            color,
            params,
        };

        let radius = inst.world_radius();
        let height = (position.y - shadow.height).max(0.0);
        let strength = shadow.opacity * (1.0 - height / shadow.reach).clamp(0.0, 1.0);
        let spread = radius * (1.0 + shadow.blur * (height / shadow.reach));
        blobs[slot] = [position.x, position.z, spread, strength];
    }

    data[GROUND_SLOT] = InstanceData {
        model: Mat4::from_translation(Vec3::new(0.0, shadow.height, 0.0)).to_cols_array_2d(),
        color: [0.0; 4],
        params: [0.0; 4],
    };

    (data, blobs)
}

fn build_globals(
    camera: &SceneCamera,
    aspect: f32,
    environment: EnvironmentPreset,
    blobs: [[f32; 4]; 5],
) -> Globals {
    let (ambient, rig) = match environment {
        EnvironmentPreset::Studio => ([0.30, 0.31, 0.34], 1.0),
        EnvironmentPreset::Flat => ([0.85, 0.85, 0.88], 0.0),
    };
    Globals {
        view_proj: camera.view_projection(aspect).to_cols_array_2d(),
        camera_pos: [camera.position.x, camera.position.y, camera.position.z, 1.0],
        ambient: [ambient[0], ambient[1], ambient[2], rig],
        blobs,
    }
}

// === Renderer ===

/// GPU renderer for the shape scene.
///
/// The scene pass draws into an offscreen color target sized by the clamped
/// display scale, then a display pass resamples that onto the surface and
/// egui draws on top. Resizes rebuild the offscreen targets.
pub struct SceneRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    size: winit::dpi::PhysicalSize<u32>,
    scale_factor: f64,
    max_scale: f32,
    environment: EnvironmentPreset,
    shadow: ShadowConfig,

    scene_size: (u32, u32),
    scene_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,

    shape_pipeline: wgpu::RenderPipeline,
    ground_pipeline: wgpu::RenderPipeline,
    scene_bind_group: wgpu::BindGroup,
    globals_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    meshes: Vec<GpuMesh>,
    ground_mesh: GpuMesh,

    display_pipeline: wgpu::RenderPipeline,
    display_bind_group: wgpu::BindGroup,
    display_sampler: wgpu::Sampler,

    egui_renderer: egui_wgpu::Renderer,
    egui_state: egui_winit::State,
    egui_ctx: egui::Context,
}

impl SceneRenderer {
    pub async fn new(window: Arc<Window>, config: &AppConfig) -> Result<Self> {
        let size = window.inner_size();
        let scale_factor = window.scale_factor();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;
        let adapter = Self::request_adapter(&instance, &surface).await?;
        let (device, queue) = Self::request_device(&adapter).await?;

        let surface_config = Self::create_surface_config(&surface, &adapter, size);
        surface.configure(&device, &surface_config);

        let max_scale = config.window.max_scale_factor;
        let scene_size = scaled_extent(size.width, size.height, scale_factor, max_scale);
        let scene_view =
            Self::create_scene_texture(&device, scene_size, surface_config.format);
        let depth_view = Self::create_depth_texture(&device, scene_size);

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Globals Buffer"),
            contents: bytemuck::cast_slice(&[Globals {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
                camera_pos: [0.0; 4],
                ambient: [0.0; 4],
                blobs: [[0.0; 4]; 5],
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Instance Buffer"),
            contents: bytemuck::cast_slice(&[InstanceData::inactive(); 6]),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        });

        let meshes = ShapeKind::ALL
            .iter()
            .map(|kind| GpuMesh::upload(&device, &kind.mesh(), &kind.to_string()))
            .collect();
        let ground_mesh = GpuMesh::upload(
            &device,
            &geometry::plane(config.shadow.span),
            "ground",
        );

        let (shape_pipeline, ground_pipeline, scene_bind_group) = Self::create_scene_pipelines(
            &device,
            surface_config.format,
            &globals_buffer,
            &instance_buffer,
        );

        let display_sampler = Self::create_display_sampler(&device);
        let (display_pipeline, display_bind_group) = Self::create_display_pipeline(
            &device,
            &scene_view,
            &display_sampler,
            surface_config.format,
        );

        // Initialize egui
        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(scale_factor as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(
            &device,
            surface_config.format,
            egui_wgpu::RendererOptions::default(),
        );

        log::info!(
            "renderer ready: surface {}x{}, scene target {}x{}",
            size.width,
            size.height,
            scene_size.0,
            scene_size.1
        );

        Ok(Self {
            device,
            queue,
            surface,
            surface_config,
            size,
            scale_factor,
            max_scale,
            environment: config.environment,
            shadow: config.shadow.clone(),
            scene_size,
            scene_view,
            depth_view,
            shape_pipeline,
            ground_pipeline,
            scene_bind_group,
            globals_buffer,
            instance_buffer,
            meshes,
            ground_mesh,
            display_pipeline,
            display_bind_group,
            display_sampler,
            egui_renderer,
            egui_state,
            egui_ctx,
        })
    }

    async fn request_adapter(
        instance: &wgpu::Instance,
        surface: &wgpu::Surface<'_>,
    ) -> Result<wgpu::Adapter> {
        instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|_| "Failed to find appropriate adapter".into())
    }

    async fn request_device(adapter: &wgpu::Adapter) -> Result<(wgpu::Device, wgpu::Queue)> {
        adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                experimental_features: Default::default(),
                trace: Default::default(),
            })
            .await
            .map_err(|e| e.into())
    }

    fn create_surface_config(
        surface: &wgpu::Surface,
        adapter: &wgpu::Adapter,
        size: winit::dpi::PhysicalSize<u32>,
    ) -> wgpu::SurfaceConfiguration {
        let surface_caps = surface.get_capabilities(adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        }
    }

    fn create_scene_texture(
        device: &wgpu::Device,
        (width, height): (u32, u32),
        format: wgpu::TextureFormat,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Scene Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    fn create_depth_texture(device: &wgpu::Device, (width, height): (u32, u32)) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Scene Depth Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: 12,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: 24,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }

    fn create_scene_pipelines(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        globals_buffer: &wgpu::Buffer,
        instance_buffer: &wgpu::Buffer,
    ) -> (wgpu::RenderPipeline, wgpu::RenderPipeline, wgpu::BindGroup) {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                // Binding 0: Globals
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Binding 1: Per-draw data
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
            label: Some("scene_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: instance_buffer.as_entire_binding(),
                },
            ],
            label: Some("scene_bind_group"),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let primitive = wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        };

        let shape_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shape Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Self::vertex_layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_shape"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive,
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let ground_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Ground Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Self::vertex_layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_ground"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive,
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        (shape_pipeline, ground_pipeline, bind_group)
    }

    fn create_display_sampler(device: &wgpu::Device) -> wgpu::Sampler {
        device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Display Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        })
    }

    fn create_display_pipeline(
        device: &wgpu::Device,
        scene_view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
        surface_format: wgpu::TextureFormat,
    ) -> (wgpu::RenderPipeline, wgpu::BindGroup) {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Display Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/display.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
            label: Some("display_bind_group_layout"),
        });

        let bind_group =
            Self::create_display_bind_group(device, &bind_group_layout, scene_view, sampler);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Display Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Display Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        (pipeline, bind_group)
    }

    fn create_display_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        scene_view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(scene_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
            label: Some("display_bind_group"),
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>, scale_factor: f64) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.size = new_size;
        self.scale_factor = scale_factor;
        self.surface_config.width = new_size.width;
        self.surface_config.height = new_size.height;
        self.surface.configure(&self.device, &self.surface_config);

        self.scene_size = scaled_extent(
            new_size.width,
            new_size.height,
            scale_factor,
            self.max_scale,
        );
        self.scene_view = Self::create_scene_texture(
            &self.device,
            self.scene_size,
            self.surface_config.format,
        );
        self.depth_view = Self::create_depth_texture(&self.device, self.scene_size);

        let layout = self.display_pipeline.get_bind_group_layout(0);
        self.display_bind_group = Self::create_display_bind_group(
            &self.device,
            &layout,
            &self.scene_view,
            &self.display_sampler,
        );
    }

    pub fn surface_size(&self) -> winit::dpi::PhysicalSize<u32> {
        self.size
    }

    /// Let egui see the event first; true means it was consumed
    pub fn handle_event(&mut self, window: &Window, event: &winit::event::WindowEvent) -> bool {
        self.egui_state.on_window_event(window, event).consumed
    }

    pub fn render(
        &mut self,
        window: &Window,
        scene: Option<&Scene>,
        camera: &SceneCamera,
        fps: f32,
        show_ui: bool,
    ) -> std::result::Result<(), wgpu::SurfaceError> {
        let aspect = self.size.width.max(1) as f32 / self.size.height.max(1) as f32;

        let (draw_list, blobs) = match scene {
            Some(scene) => {
                let (data, blobs) =
                    assemble_frame(&scene.instances, &scene.palette, &self.shadow, scene.elapsed);
                let order: Vec<(usize, ShapeKind)> = scene
                    .instances
                    .iter()
                    .enumerate()
                    .filter(|(_, inst)| inst.pickable())
                    .map(|(slot, inst)| (slot, inst.kind))
                    .collect();
                self.queue
                    .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&data));
                (order, blobs)
            }
            None => {
                let (data, blobs) = assemble_frame(&[], &[], &self.shadow, 0.0);
                self.queue
                    .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&data));
                (Vec::new(), blobs)
            }
        };

        let globals = build_globals(camera, aspect, self.environment, blobs);
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::cast_slice(&[globals]));

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Encoder"),
            });

        // Scene pass - shapes then ground shadows into the offscreen target
        {
            let mut scene_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.scene_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(BACKGROUND),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            scene_pass.set_pipeline(&self.shape_pipeline);
            scene_pass.set_bind_group(0, &self.scene_bind_group, &[]);
            for (slot, kind) in &draw_list {
                let mesh = &self.meshes[kind.index()];
                scene_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                scene_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                let slot = *slot as u32;
                scene_pass.draw_indexed(0..mesh.index_count, 0, slot..slot + 1);
            }

            scene_pass.set_pipeline(&self.ground_pipeline);
            scene_pass.set_bind_group(0, &self.scene_bind_group, &[]);
            scene_pass.set_vertex_buffer(0, self.ground_mesh.vertex_buffer.slice(..));
            scene_pass.set_index_buffer(
                self.ground_mesh.index_buffer.slice(..),
                wgpu::IndexFormat::Uint32,
            );
            let ground = GROUND_SLOT as u32;
            scene_pass.draw_indexed(0..self.ground_mesh.index_count, 0, ground..ground + 1);
        }

        // Display pass - resample the scene target onto the surface
        {
            let mut display_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Display Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            display_pass.set_pipeline(&self.display_pipeline);
            display_pass.set_bind_group(0, &self.display_bind_group, &[]);
            display_pass.draw(0..6, 0..1);
        }

        if show_ui {
            self.render_ui(window, &view, &mut encoder, fps);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn render_ui(
        &mut self,
        window: &Window,
        view: &wgpu::TextureView,
        encoder: &mut wgpu::CommandEncoder,
        fps: f32,
    ) {
        let raw_input = self.egui_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            egui::Window::new("FPS")
                .title_bar(false)
                .resizable(false)
                .fixed_pos(egui::pos2(10.0, 10.0))
                .frame(egui::Frame::NONE)
                .show(ctx, |ui| {
                    ui.label(
                        egui::RichText::new(format!("{:.0}", fps))
                            .size(48.0)
                            .color(egui::Color32::from_rgb(74, 158, 255)),
                    );
                    ui.label(
                        egui::RichText::new("FPS")
                            .size(12.0)
                            .color(egui::Color32::GRAY),
                    );
                });
        });

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let tris = self
            .egui_ctx
            .tessellate(full_output.shapes, self.egui_ctx.pixels_per_point());
        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.size.width, self.size.height],
            pixels_per_point: window.scale_factor() as f32,
        };

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            encoder,
            &tris,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            // SAFETY: The render pass lifetime is actually tied to the encoder,
            // but egui-wgpu requires 'static. This is safe because we drop the
            // render pass before using the encoder again.
            let render_pass_static = unsafe {
                std::mem::transmute::<&mut wgpu::RenderPass<'_>, &mut wgpu::RenderPass<'static>>(
                    &mut render_pass,
                )
            };

            self.egui_renderer
                .render(render_pass_static, &tris, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::Animator;
    use crate::motion::FloatMotion;
    use crate::scene::material_palette;

    fn test_instance(home: Vec3, bounding_radius: f32) -> ShapeInstance {
        let scope = Animator::new().create_scope();
        let mut inst = ShapeInstance::new(
            ShapeKind::Icosahedron,
            home,
            0.3,
            bounding_radius,
            1,
            FloatMotion::from_radius_factor(0.3, 0.0),
            scope,
        );
        inst.visible = true;
        inst.scale = 1.0;
        inst
    }

    #[test]
    fn scaled_extent_clamps_dense_displays() {
        // 2x display renders at 1.5x logical, which is 3/4 of physical
        assert_eq!(scaled_extent(2000, 1000, 2.0, 1.5), (1500, 750));
    }

    #[test]
    fn scaled_extent_passes_through_standard_displays() {
        assert_eq!(scaled_extent(1280, 720, 1.0, 1.5), (1280, 720));
        assert_eq!(scaled_extent(1280, 720, 1.25, 1.5), (1280, 720));
    }

    #[test]
    fn scaled_extent_raises_low_density_to_logical() {
        // 0.5x display still renders one texel per logical pixel
        assert_eq!(scaled_extent(640, 360, 0.5, 1.5), (1280, 720));
    }

    #[test]
    fn scaled_extent_never_collapses_to_zero() {
        let (w, h) = scaled_extent(0, 0, 2.0, 1.5);
        assert!(w >= 1 && h >= 1);
    }

    #[test]
    fn hidden_instances_leave_inactive_slots() {
        let mut inst = test_instance(Vec3::ZERO, 1.0);
        inst.visible = false;
        let palette = material_palette();

        let (data, blobs) = assemble_frame(&[inst], &palette, &ShadowConfig::default(), 0.0);
        assert_eq!(data[0], InstanceData::inactive());
        assert_eq!(blobs[0], [0.0; 4]);
    }

    #[test]
    fn visible_instance_model_carries_its_position() {
        let inst = test_instance(Vec3::new(2.0, -1.5, 8.0), 1.0);
        let palette = material_palette();

        let (data, _) = assemble_frame(&[inst], &palette, &ShadowConfig::default(), 0.0);
        let model = Mat4::from_cols_array_2d(&data[0].model);
        let translation = model.w_axis.truncate();
        assert!((translation - Vec3::new(2.0, -1.5, 8.0)).length() < 1e-5);
    }

    #[test]
    fn blob_strength_fades_with_height() {
        let shadow = ShadowConfig::default();
        let palette = material_palette();

        let low = test_instance(Vec3::new(0.0, -1.5, 0.0), 1.0);
        let high = test_instance(Vec3::new(0.0, 4.0, 0.0), 1.0);
        let (_, blobs) = assemble_frame(&[low, high], &palette, &shadow, 0.0);

        assert!(blobs[0][3] > blobs[1][3], "lower shape casts harder");
        assert!(blobs[0][3] <= shadow.opacity + 1e-6);
    }

    #[test]
    fn shapes_above_the_reach_cast_nothing() {
        let shadow = ShadowConfig::default();
        let palette = material_palette();

        // 9.0 reach, plane at -3.5: y = 6.0 is beyond it
        let inst = test_instance(Vec3::new(0.0, 6.0, 0.0), 1.0);
        let (_, blobs) = assemble_frame(&[inst], &palette, &shadow, 0.0);
        assert_eq!(blobs[0][3], 0.0);
    }

    #[test]
    fn ground_slot_sits_on_the_shadow_plane() {
        let shadow = ShadowConfig::default();
        let (data, _) = assemble_frame(&[], &material_palette(), &shadow, 0.0);
        let model = Mat4::from_cols_array_2d(&data[GROUND_SLOT].model);
        assert_eq!(model.w_axis.y, shadow.height);
    }

    #[test]
    fn normal_material_sets_shading_mode_zero() {
        let mut inst = test_instance(Vec3::ZERO, 1.0);
        inst.material_index = 0;
        let (data, _) = assemble_frame(&[inst], &material_palette(), &ShadowConfig::default(), 0.0);
        assert_eq!(data[0].color[3], 0.0);

        let mut lit = test_instance(Vec3::ZERO, 1.0);
        lit.material_index = 3;
        let (data, _) = assemble_frame(&[lit], &material_palette(), &ShadowConfig::default(), 0.0);
        assert_eq!(data[0].color[3], 1.0);
        assert_eq!(data[0].params[1], 0.5);
    }

    #[test]
    fn studio_rig_flag_follows_the_preset() {
        let camera = SceneCamera::default();
        let studio = build_globals(&camera, 16.0 / 9.0, EnvironmentPreset::Studio, [[0.0; 4]; 5]);
        assert_eq!(studio.ambient[3], 1.0);

        let flat = build_globals(&camera, 16.0 / 9.0, EnvironmentPreset::Flat, [[0.0; 4]; 5]);
        assert_eq!(flat.ambient[3], 0.0);
    }
}
