//! Renderer: wgpu surface + depth, lit mesh and point pipelines, egui overlay.
//! wgpu = 27.x, winit = 0.30.x

use std::collections::HashMap;
use std::num::NonZeroU64;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use corelib::camera::CameraView;
use corelib::mesh::{MeshData, PointCloud};
use corelib::scene::Scene;
use glam::Mat4;
use wgpu::{
    BindGroup, BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType,
    BlendState, Buffer, BufferBindingType, BufferUsages, ColorTargetState, ColorWrites,
    CommandEncoderDescriptor, DepthBiasState, DepthStencilState, Device, DeviceDescriptor,
    Extent3d, Features, FragmentState, Instance, InstanceDescriptor, Limits, LoadOp, Operations,
    PipelineLayout, PipelineLayoutDescriptor, PowerPreference, PresentMode, PrimitiveTopology,
    Queue, RenderPassColorAttachment, RenderPassDescriptor, RenderPipeline,
    RenderPipelineDescriptor, ShaderModule, ShaderModuleDescriptor, ShaderSource, ShaderStages,
    StoreOp, Surface, SurfaceConfiguration, SurfaceError, TextureDescriptor, TextureDimension,
    TextureFormat, TextureUsages, TextureView, TextureViewDescriptor, VertexBufferLayout,
    VertexState, VertexStepMode, util::DeviceExt,
};
use winit::{dpi::PhysicalSize, window::Window};

pub mod draw_list;
pub mod error;
pub mod overlay;

pub use draw_list::{DrawItem, DrawList, FrameLights};
pub use error::RenderError;
pub use overlay::OverlayFrame;

/// Mesh vertex: position + normal.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
}
impl Vertex {
    pub const LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3],
    };
}

const POINT_LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
    array_stride: std::mem::size_of::<[f32; 3]>() as u64,
    step_mode: VertexStepMode::Vertex,
    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
};

/// Frame-wide uniforms (16-byte aligned).
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct GlobalsUniform {
    view_proj: [[f32; 4]; 4],
    ambient: [f32; 4],
    light_dir: [f32; 4],
    light_color: [f32; 4],
}

/// Per-draw uniforms, one slot per draw at a dynamic offset.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct DrawUniform {
    model: [[f32; 4]; 4],
    normal: [[f32; 4]; 4],
    color: [f32; 4],
    params: [f32; 4],
}

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;
const INITIAL_DRAW_SLOTS: u64 = 64;

struct GpuMesh {
    vertex_buf: Buffer,
    index_buf: Buffer,
    index_count: u32,
}

struct GpuPoints {
    vertex_buf: Buffer,
    count: u32,
}

pub struct GpuState {
    // Surface
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,

    // Device/queue
    device: Device,
    queue: Queue,

    // Pipelines
    mesh_pipeline: RenderPipeline,
    points_pipeline: RenderPipeline,

    // Uniforms
    globals_buf: Buffer,
    globals_bg: BindGroup,
    draw_bgl: BindGroupLayout,
    draw_buf: Buffer,
    draw_bg: BindGroup,
    draw_stride: u64,
    draw_slots: u64,

    // Geometry uploaded on first sight, keyed by Arc address.
    meshes: HashMap<usize, GpuMesh>,
    points: HashMap<usize, GpuPoints>,

    // Depth
    depth_view: TextureView,

    egui_renderer: egui_wgpu::Renderer,

    // Size cache
    width: u32,
    height: u32,
}

impl GpuState {
    /// Create GPU state bound to an Arc<Window>.
    pub async fn new(
        window: Arc<Window>,
        backends: wgpu::Backends,
        size: PhysicalSize<u32>,
    ) -> Result<Self, RenderError> {
        let width = size.width.max(1);
        let height = size.height.max(1);

        // Instance & surface
        let instance = Instance::new(&InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface: Surface<'static> = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("Adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(&DeviceDescriptor {
                label: Some("Cottage3D Device"),
                required_features: Features::empty(),
                required_limits: Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        // Surface format (prefer sRGB)
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or(RenderError::NoSurfaceFormat)?;

        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes.first().copied().unwrap_or_default(),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let depth_view = create_depth_view(&device, &surface_config);

        // ==== Shaders ====
        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("Scene WGSL"),
            source: ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
        });

        // ==== Globals BGL/BG ====
        let globals_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Globals BGL"),
            entries: &[uniform_entry::<GlobalsUniform>(
                ShaderStages::VERTEX_FRAGMENT,
                false,
            )],
        });
        let globals_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Globals UBO"),
            contents: bytemuck::bytes_of(&GlobalsUniform::zeroed()),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let globals_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Globals BG"),
            layout: &globals_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buf.as_entire_binding(),
            }],
        });

        // ==== Per-draw BGL/BG (dynamic offsets) ====
        let draw_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Draw BGL"),
            entries: &[uniform_entry::<DrawUniform>(ShaderStages::VERTEX_FRAGMENT, true)],
        });
        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let draw_stride = (std::mem::size_of::<DrawUniform>() as u64).next_multiple_of(alignment);
        let (draw_buf, draw_bg) = create_draw_slots(&device, &draw_bgl, draw_stride, INITIAL_DRAW_SLOTS);

        // ==== Pipelines ====
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Scene PipelineLayout"),
            bind_group_layouts: &[&globals_bgl, &draw_bgl],
            push_constant_ranges: &[],
        });
        let mesh_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            surface_format,
            PipelineKind::Mesh,
        );
        let points_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            &shader,
            surface_format,
            PipelineKind::Points,
        );

        let egui_renderer =
            egui_wgpu::Renderer::new(&device, surface_format, egui_wgpu::RendererOptions::default());

        log::info!(
            "GPU ready: {}x{}, format {:?}, draw stride {}",
            width,
            height,
            surface_format,
            draw_stride
        );

        Ok(Self {
            surface,
            surface_config,
            device,
            queue,
            mesh_pipeline,
            points_pipeline,
            globals_buf,
            globals_bg,
            draw_bgl,
            draw_buf,
            draw_bg,
            draw_stride,
            draw_slots: INITIAL_DRAW_SLOTS,
            meshes: HashMap::new(),
            points: HashMap::new(),
            depth_view,
            egui_renderer,
            width,
            height,
        })
    }

    /// Resize: reconfigure surface & recreate depth view.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.surface_config.width = self.width;
        self.surface_config.height = self.height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_view = create_depth_view(&self.device, &self.surface_config);
    }

    /// Render one frame: upload uniforms, clear, draw scene, paint overlay.
    pub fn render(
        &mut self,
        scene: &Scene,
        camera: &CameraView,
        overlay: Option<&OverlayFrame>,
    ) -> Result<(), SurfaceError> {
        let list = DrawList::collect(scene);
        self.upload_geometry(&list);
        self.write_uniforms(camera, &list);
        if let Some(overlay) = overlay {
            // egui sends each texture once; upload even if this frame is lost.
            for (id, delta) in &overlay.textures_delta.set {
                self.egui_renderer
                    .update_texture(&self.device, &self.queue, *id, delta);
            }
        }

        // --- frame & pass
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(e) => {
                self.free_overlay_textures(overlay);
                return Err(e);
            }
        };
        let view = frame.texture.create_view(&Default::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("MainEncoder"),
            });

        let [r, g, b] = scene.background;
        {
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("MainPass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            rpass.set_bind_group(0, &self.globals_bg, &[]);
            for (slot, item) in list.items.iter().enumerate() {
                let offset = (slot as u64 * self.draw_stride) as u32;
                match item {
                    DrawItem::Mesh { mesh, .. } => {
                        let Some(gpu) = self.meshes.get(&arc_key(mesh)) else {
                            continue;
                        };
                        rpass.set_pipeline(&self.mesh_pipeline);
                        rpass.set_bind_group(1, &self.draw_bg, &[offset]);
                        rpass.set_vertex_buffer(0, gpu.vertex_buf.slice(..));
                        rpass.set_index_buffer(gpu.index_buf.slice(..), wgpu::IndexFormat::Uint32);
                        rpass.draw_indexed(0..gpu.index_count, 0, 0..1);
                    }
                    DrawItem::Points { cloud, .. } => {
                        let Some(gpu) = self.points.get(&arc_key(cloud)) else {
                            continue;
                        };
                        rpass.set_pipeline(&self.points_pipeline);
                        rpass.set_bind_group(1, &self.draw_bg, &[offset]);
                        rpass.set_vertex_buffer(0, gpu.vertex_buf.slice(..));
                        rpass.draw(0..gpu.count, 0..1);
                    }
                }
            }
        }

        let mut overlay_cmds = Vec::new();
        if let Some(overlay) = overlay {
            overlay_cmds = self.paint_overlay(&mut encoder, &view, overlay);
        }

        self.queue
            .submit(overlay_cmds.into_iter().chain(Some(encoder.finish())));
        frame.present();

        self.free_overlay_textures(overlay);
        Ok(())
    }

    pub fn is_surface_lost(err: &SurfaceError) -> bool {
        matches!(err, SurfaceError::Lost | SurfaceError::Outdated)
    }

    pub fn recreate_surface(&mut self) {
        self.resize(self.width, self.height);
    }

    fn upload_geometry(&mut self, list: &DrawList) {
        for item in &list.items {
            match item {
                DrawItem::Mesh { mesh, .. } => {
                    let key = arc_key(mesh);
                    if !self.meshes.contains_key(&key) {
                        let gpu = upload_mesh(&self.device, mesh);
                        self.meshes.insert(key, gpu);
                    }
                }
                DrawItem::Points { cloud, .. } => {
                    let key = arc_key(cloud);
                    if !self.points.contains_key(&key) {
                        let gpu = upload_points(&self.device, cloud);
                        self.points.insert(key, gpu);
                    }
                }
            }
        }
    }

    fn write_uniforms(&mut self, camera: &CameraView, list: &DrawList) {
        let lights = &list.lights;
        let globals = GlobalsUniform {
            view_proj: camera.proj_view().to_cols_array_2d(),
            ambient: extend(lights.ambient, 0.0),
            light_dir: lights.direction.extend(0.0).to_array(),
            light_color: extend(lights.directional, 0.0),
        };
        self.queue
            .write_buffer(&self.globals_buf, 0, bytemuck::bytes_of(&globals));

        let needed = (list.items.len() as u64).max(1);
        if needed > self.draw_slots {
            let slots = needed.next_power_of_two();
            let (buf, bg) = create_draw_slots(&self.device, &self.draw_bgl, self.draw_stride, slots);
            self.draw_buf = buf;
            self.draw_bg = bg;
            self.draw_slots = slots;
            log::debug!("Grew draw uniform buffer to {} slots", slots);
        }

        let stride = self.draw_stride as usize;
        let mut bytes = vec![0u8; stride * list.items.len()];
        for (slot, item) in list.items.iter().enumerate() {
            let uniform = match item {
                DrawItem::Mesh {
                    model,
                    color,
                    intensity,
                    ..
                } => DrawUniform {
                    model: model.to_cols_array_2d(),
                    normal: model.inverse().transpose().to_cols_array_2d(),
                    color: extend(*color, 1.0),
                    params: [*intensity, 0.0, 0.0, 0.0],
                },
                DrawItem::Points { cloud, model } => DrawUniform {
                    model: model.to_cols_array_2d(),
                    normal: Mat4::IDENTITY.to_cols_array_2d(),
                    color: extend(cloud.color, 1.0),
                    params: [1.0, cloud.size, 0.0, 0.0],
                },
            };
            let start = slot * stride;
            bytes[start..start + std::mem::size_of::<DrawUniform>()]
                .copy_from_slice(bytemuck::bytes_of(&uniform));
        }
        if !bytes.is_empty() {
            self.queue.write_buffer(&self.draw_buf, 0, &bytes);
        }
    }

    fn free_overlay_textures(&mut self, overlay: Option<&OverlayFrame>) {
        if let Some(overlay) = overlay {
            for id in &overlay.textures_delta.free {
                self.egui_renderer.free_texture(id);
            }
        }
    }

    fn paint_overlay(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        view: &TextureView,
        overlay: &OverlayFrame,
    ) -> Vec<wgpu::CommandBuffer> {
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.width, self.height],
            pixels_per_point: overlay.pixels_per_point,
        };
        let cmds = self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            encoder,
            &overlay.paint_jobs,
            &screen,
        );
        let mut pass = encoder
            .begin_render_pass(&RenderPassDescriptor {
                label: Some("OverlayPass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Load,
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            })
            .forget_lifetime();
        self.egui_renderer
            .render(&mut pass, &overlay.paint_jobs, &screen);
        cmds
    }
}

enum PipelineKind {
    Mesh,
    Points,
}

fn create_pipeline(
    device: &Device,
    layout: &PipelineLayout,
    shader: &ShaderModule,
    format: TextureFormat,
    kind: PipelineKind,
) -> RenderPipeline {
    let (label, vs, fs, buffers, topology, cull_mode) = match kind {
        PipelineKind::Mesh => (
            "Mesh Pipeline",
            "vs_main",
            "fs_main",
            [Vertex::LAYOUT],
            PrimitiveTopology::TriangleList,
            Some(wgpu::Face::Back),
        ),
        PipelineKind::Points => (
            "Points Pipeline",
            "vs_points",
            "fs_points",
            [POINT_LAYOUT],
            PrimitiveTopology::PointList,
            None,
        ),
    };
    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: VertexState {
            module: shader,
            entry_point: Some(vs),
            buffers: &buffers,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(FragmentState {
            module: shader,
            entry_point: Some(fs),
            targets: &[Some(ColorTargetState {
                format,
                blend: Some(BlendState::REPLACE),
                write_mask: ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            cull_mode,
            ..Default::default()
        },
        depth_stencil: Some(DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn uniform_entry<T>(visibility: ShaderStages, dynamic: bool) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding: 0,
        visibility,
        ty: BindingType::Buffer {
            ty: BufferBindingType::Uniform,
            has_dynamic_offset: dynamic,
            min_binding_size: NonZeroU64::new(std::mem::size_of::<T>() as u64),
        },
        count: None,
    }
}

fn create_draw_slots(
    device: &Device,
    layout: &BindGroupLayout,
    stride: u64,
    slots: u64,
) -> (Buffer, BindGroup) {
    let buf = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Draw UBO"),
        size: stride * slots,
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Draw BG"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buf,
                offset: 0,
                size: NonZeroU64::new(std::mem::size_of::<DrawUniform>() as u64),
            }),
        }],
    });
    (buf, bg)
}

fn upload_mesh(device: &Device, mesh: &MeshData) -> GpuMesh {
    let vertices: Vec<Vertex> = mesh
        .vertices
        .iter()
        .map(|v| Vertex {
            pos: v.position,
            normal: v.normal,
        })
        .collect();
    let vertex_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Mesh VB"),
        contents: bytemuck::cast_slice(&vertices),
        usage: BufferUsages::VERTEX,
    });
    let index_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Mesh IB"),
        contents: bytemuck::cast_slice(&mesh.indices),
        usage: BufferUsages::INDEX,
    });
    GpuMesh {
        vertex_buf,
        index_buf,
        index_count: mesh.indices.len() as u32,
    }
}

fn upload_points(device: &Device, cloud: &PointCloud) -> GpuPoints {
    // wgpu rejects zero-sized vertex buffers.
    let data: &[[f32; 3]] = if cloud.positions.is_empty() {
        &[[0.0; 3]]
    } else {
        &cloud.positions
    };
    let vertex_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Points VB"),
        contents: bytemuck::cast_slice(data),
        usage: BufferUsages::VERTEX,
    });
    GpuPoints {
        vertex_buf,
        count: cloud.positions.len() as u32,
    }
}

/// Create a depth texture view matching the surface config.
fn create_depth_view(device: &Device, sc: &SurfaceConfiguration) -> TextureView {
    let tex = device.create_texture(&TextureDescriptor {
        label: Some("DepthTex"),
        size: Extent3d {
            width: sc.width.max(1),
            height: sc.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    tex.create_view(&TextureViewDescriptor::default())
}

#[inline]
fn arc_key<T>(arc: &Arc<T>) -> usize {
    Arc::as_ptr(arc) as usize
}

#[inline]
fn extend(rgb: [f32; 3], w: f32) -> [f32; 4] {
    [rgb[0], rgb[1], rgb[2], w]
}
