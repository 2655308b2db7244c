//! Renderer: wgpu init + depth + one textured, turning model.
//! wgpu = 26.x, winit = 0.30.x

pub mod texture;

use std::num::NonZeroU64;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use asset::mesh::{ModelData, VERTEX_STRIDE_BYTES};
use asset::texture::TextureData;
use bytemuck::{Pod, Zeroable};
use corelib::{CoreResult, Mat4, camera::Camera, error::aspect_ratio, transform::Turntable};
use wgpu::{
    util::DeviceExt,
    Backends, BindGroup, BindGroupLayoutDescriptor, BindGroupLayoutEntry,
    BindingType, BlendState, Buffer, BufferAddress, BufferBindingType, BufferUsages,
    ColorTargetState, ColorWrites, CommandEncoderDescriptor, DepthBiasState, DepthStencilState,
    Device, DeviceDescriptor, Extent3d, Features, FragmentState, Instance, InstanceDescriptor,
    Limits, LoadOp, Operations, PipelineLayoutDescriptor, PowerPreference, PresentMode, Queue,
    RenderPassColorAttachment, RenderPassDescriptor, RenderPipeline, RenderPipelineDescriptor,
    ShaderModuleDescriptor, ShaderSource, ShaderStages, StoreOp, Surface, SurfaceConfiguration,
    SurfaceError, TextureDescriptor, TextureDimension, TextureFormat, TextureUsages, TextureView,
    TextureViewDescriptor, VertexBufferLayout, VertexState, VertexStepMode,
};

use winit::{dpi::PhysicalSize, window::Window};

use crate::texture::GpuTexture;

/// Interleaved vertex layout of [`ModelData::buffer`]: position, texcoord, normal.
pub const MODEL_VERTEX_LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
    array_stride: VERTEX_STRIDE_BYTES as BufferAddress,
    step_mode: VertexStepMode::Vertex,
    attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2, 2 => Float32x3],
};

/// Model/view/projection uniform block (16-byte aligned).
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct Matrices {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

impl Matrices {
    pub const MODEL_OFFSET: BufferAddress = 0;
    pub const VIEW_OFFSET: BufferAddress = 64;
    pub const PROJECTION_OFFSET: BufferAddress = 128;

    pub fn new(model: Mat4, view: Mat4, projection: Mat4) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
        }
    }
}

/// Everything the renderer needs from disk, already decoded.
pub struct SceneAssets {
    pub model: ModelData,
    pub texture: TextureData,
}

/// Current surface size, plus whether the window is minimised (zero area).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub minimised: bool,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            minimised: false,
        }
    }

    /// Record a window resize and return the new aspect ratio.
    /// A zero-area size marks the viewport minimised and keeps the last real size.
    pub fn apply(&mut self, width: u32, height: u32) -> CoreResult<f32> {
        match aspect_ratio(width, height) {
            Ok(aspect) => {
                *self = Self::new(width, height);
                Ok(aspect)
            }
            Err(err) => {
                self.minimised = true;
                Err(err)
            }
        }
    }
}

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.1,
    b: 0.1,
    a: 1.0,
};

pub struct GpuState {
    // Surface
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,

    // Device/queue
    device: Device,
    queue: Queue,

    // Pipeline & geometry
    pipeline: RenderPipeline,
    vertex_buf: Buffer,
    vertex_count: u32,

    // Uniforms
    matrices_bg: BindGroup,
    matrices_buf: Buffer,
    camera: Camera,
    turntable: Turntable,
    start: Instant,

    // Texture
    #[allow(dead_code)]
    texture: GpuTexture,
    texture_bg: BindGroup,

    // Depth
    depth_view: TextureView,

    viewport: Viewport,
}

impl GpuState {
    /// Create GPU state bound to an Arc<Window> and upload the scene.
    pub async fn new(window: Arc<Window>, backends: Backends, assets: &SceneAssets) -> Result<Self> {
        let PhysicalSize { width, height } = window.inner_size();
        let width = width.max(1);
        let height = height.max(1);

        // Instance & surface
        let instance = Instance::new(&InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface: Surface<'static> = instance
            .create_surface(window.clone())
            .context("create_surface failed")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable GPU adapter")?;
        let info = adapter.get_info();
        log::info!("Using adapter '{}' via {:?}", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&DeviceDescriptor {
                label: Some("Viewer Device"),
                required_features: Features::empty(),
                required_limits: Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await
            .context("request_device failed")?;

        // Surface format (prefer sRGB)
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .context("Surface reports no supported formats")?;

        // Configure surface
        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        // Depth texture
        let depth_view = create_depth_view(&device, &surface_config);

        // ==== Shaders ====
        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("Textured WGSL"),
            source: ShaderSource::Wgsl(include_str!("shaders/textured.wgsl").into()),
        });

        // ==== Matrices BGL/BG ====
        let matrices_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Matrices BGL"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(std::mem::size_of::<Matrices>() as u64),
                },
                count: None,
            }],
        });

        let camera = Camera::viewer_default(width, height)?;
        let turntable = Turntable::default();
        let matrices_init = Matrices::new(turntable.matrix_at(0.0), camera.view(), camera.proj());
        let matrices_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Matrices UBO"),
            contents: bytemuck::bytes_of(&matrices_init),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let matrices_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Matrices BG"),
            layout: &matrices_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: matrices_buf.as_entire_binding(),
            }],
        });

        // ==== Texture ====
        let texture_bgl = GpuTexture::bind_group_layout(&device);
        let texture = GpuTexture::upload(&device, &queue, &assets.texture, "Model Texture")?;
        let texture_bg = texture.bind_group(&device, &texture_bgl);

        // ==== Pipeline ====
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Textured PipelineLayout"),
            bind_group_layouts: &[&matrices_bgl, &texture_bgl],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Model Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[MODEL_VERTEX_LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(ColorTargetState {
                    format: surface_format,
                    blend: Some(BlendState::ALPHA_BLENDING),
                    write_mask: ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // ==== Geometry: flat triangle list ====
        // Buffers of size zero are invalid, keep one vertex of padding for an empty model.
        let padding = [0u8; VERTEX_STRIDE_BYTES];
        let contents: &[u8] = if assets.model.is_empty() {
            &padding
        } else {
            bytemuck::cast_slice(&assets.model.buffer)
        };
        let vertex_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Model VB"),
            contents,
            usage: BufferUsages::VERTEX,
        });
        let vertex_count = assets.model.vertex_count();
        log::info!(
            "Model VB: {} vertices, {} bytes",
            vertex_count,
            assets.model.byte_len()
        );

        Ok(Self {
            surface,
            surface_config,
            device,
            queue,
            pipeline,
            vertex_buf,
            vertex_count,
            matrices_bg,
            matrices_buf,
            camera,
            turntable,
            start: Instant::now(),
            texture,
            texture_bg,
            depth_view,
            viewport: Viewport::new(width, height),
        })
    }

    /// Resize: reconfigure surface, recreate depth view and re-upload the projection.
    pub fn resize(&mut self, width: u32, height: u32) {
        let was_minimised = self.viewport.minimised;
        let aspect = match self.viewport.apply(width, height) {
            Ok(aspect) => aspect,
            Err(err) => {
                if !was_minimised {
                    log::warn!("Skipping resize, rendering paused: {err}");
                }
                return;
            }
        };
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_view = create_depth_view(&self.device, &self.surface_config);

        self.camera = self.camera.with_aspect(aspect);
        let projection = self.camera.proj().to_cols_array_2d();
        self.queue.write_buffer(
            &self.matrices_buf,
            Matrices::PROJECTION_OFFSET,
            bytemuck::bytes_of(&projection),
        );
        log::debug!(
            "Projection updated for {}x{} (aspect {:.3})",
            width,
            height,
            self.camera.aspect
        );
    }

    /// Render one frame: update model matrix + clear + draw.
    /// Skips the frame while minimised.
    pub fn render(&mut self) -> Result<(), SurfaceError> {
        if self.viewport.minimised {
            return Ok(());
        }

        // --- update model matrix
        let t = self.start.elapsed().as_secs_f32();
        let model = self.turntable.matrix_at(t).to_cols_array_2d();
        self.queue.write_buffer(
            &self.matrices_buf,
            Matrices::MODEL_OFFSET,
            bytemuck::bytes_of(&model),
        );

        // --- frame & pass
        let frame = self.surface.get_current_texture()?;
        let view = frame.texture.create_view(&Default::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("MainEncoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("MainPass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None, // required in 0.26
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(CLEAR_COLOR),
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

            rpass.set_pipeline(&self.pipeline);
            rpass.set_bind_group(0, &self.matrices_bg, &[]);
            rpass.set_bind_group(1, &self.texture_bg, &[]);
            rpass.set_vertex_buffer(0, self.vertex_buf.slice(..));
            rpass.draw(0..self.vertex_count, 0..1);
        }

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    pub fn is_surface_lost(err: &SurfaceError) -> bool {
        matches!(err, SurfaceError::Lost | SurfaceError::Outdated)
    }

    pub fn is_minimised(&self) -> bool {
        self.viewport.minimised
    }

    pub fn recreate_surface(&mut self) {
        self.resize(self.viewport.width, self.viewport.height);
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

#[cfg(test)]
mod tests {
    use super::*;
    use asset::mesh::{NORMAL_OFFSET, TEXCOORD_OFFSET};

    #[test]
    fn vertex_layout_matches_model_buffer() {
        assert_eq!(MODEL_VERTEX_LAYOUT.array_stride, 32);
        let offsets: Vec<u64> = MODEL_VERTEX_LAYOUT
            .attributes
            .iter()
            .map(|a| a.offset)
            .collect();
        assert_eq!(
            offsets,
            vec![0, (TEXCOORD_OFFSET * 4) as u64, (NORMAL_OFFSET * 4) as u64]
        );
        let locations: Vec<u32> = MODEL_VERTEX_LAYOUT
            .attributes
            .iter()
            .map(|a| a.shader_location)
            .collect();
        assert_eq!(locations, vec![0, 1, 2]);
    }

    #[test]
    fn matrices_block_offsets() {
        assert_eq!(std::mem::size_of::<Matrices>(), 192);
        let m = Matrices::new(
            Mat4::IDENTITY,
            Mat4::ZERO,
            Mat4::from_scale(corelib::vec3(2.0, 2.0, 2.0)),
        );
        let bytes = bytemuck::bytes_of(&m);
        let float_at = |offset: u64| {
            let i = offset as usize;
            f32::from_ne_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]])
        };
        assert_eq!(float_at(Matrices::MODEL_OFFSET), 1.0);
        assert_eq!(float_at(Matrices::VIEW_OFFSET), 0.0);
        assert_eq!(float_at(Matrices::PROJECTION_OFFSET), 2.0);
    }

    #[test]
    fn zero_area_resize_pauses_until_restored() {
        let mut vp = Viewport::new(1280, 720);
        assert!(vp.apply(0, 0).is_err());
        assert!(vp.minimised);
        assert_eq!((vp.width, vp.height), (1280, 720));

        // Still minimised after repeated zero-size events.
        assert!(vp.apply(0, 720).is_err());
        assert!(vp.minimised);

        let aspect = vp.apply(800, 400).expect("restored");
        assert!((aspect - 2.0).abs() < 1e-6);
        assert_eq!(vp, Viewport::new(800, 400));
        assert!(!vp.minimised);
    }

    #[test]
    fn lost_and_outdated_surfaces_are_recoverable() {
        assert!(GpuState::is_surface_lost(&SurfaceError::Lost));
        assert!(GpuState::is_surface_lost(&SurfaceError::Outdated));
        assert!(!GpuState::is_surface_lost(&SurfaceError::Timeout));
    }
}
