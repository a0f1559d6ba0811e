//! GPU rasterizer (wgpu)
//!
//! Draws every segment of a record with one instanced call. Each instance
//! is a quad over the same pixel rectangle the CPU loop visits, and the
//! fragment stage evaluates the same distance function, so the two
//! backends agree up to 8-bit blending precision.
//!
//! The device, pipeline and target texture live in a single owned
//! [`GpuContext`] behind a mutex. It is created lazily and rebuilt after
//! the device is lost.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex, PoisonError};

use bytemuck::{Pod, Zeroable};
use tracing::{debug, info, warn};
use wgpu::util::DeviceExt;

use super::RasterImage;
use crate::bounds::{segment_pixel_rect, Bounds};
use crate::types::{Segment, StrokeRecord};

const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Errors from the GPU backend
///
/// None of these leave partially rendered pixels behind; callers fall back
/// to the CPU rasterizer.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("No compatible GPU adapter found: {0}")]
    NoAdapter(String),

    #[error("Failed to create GPU device: {0}")]
    RequestDevice(String),

    #[error("GPU validation error: {0}")]
    Validation(String),

    #[error("GPU device lost")]
    DeviceLost,

    #[error("Target {width}x{height} exceeds the device limit of {max}")]
    TargetTooLarge { width: u32, height: u32, max: u32 },

    #[error("Failed to map readback buffer: {0}")]
    Map(String),

    #[error("Failed to poll device: {0}")]
    Poll(String),
}

/// Per-segment instance data
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuSegment {
    pub a: [f32; 2],
    pub b: [f32; 2],
    pub radii: [f32; 2],
    pub softness: f32,
    /// Straight-alpha color
    pub color: [f32; 4],
    /// Pixel rectangle covered by the quad: x_min, y_min, x_max, y_max
    pub rect: [f32; 4],
}

impl GpuSegment {
    /// Instance for `segment` clipped to `bounds`; `None` when nothing is visible
    pub fn clipped(segment: &Segment, bounds: &Bounds) -> Option<Self> {
        let rect = segment_pixel_rect(segment).intersect(bounds);
        if rect.is_empty() || segment.color.a <= 0.0 {
            return None;
        }

        Some(Self {
            a: segment.a.to_array(),
            b: segment.b.to_array(),
            radii: [segment.radius_a, segment.radius_b],
            softness: segment.softness,
            color: segment.color.to_array(),
            rect: [
                rect.x_min as f32,
                rect.y_min as f32,
                rect.x_max as f32,
                rect.y_max as f32,
            ],
        })
    }

    const ATTRIBUTES: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
        0 => Float32x2,
        1 => Float32x2,
        2 => Float32x2,
        3 => Float32,
        4 => Float32x4,
        5 => Float32x4,
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuSegment>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct Uniforms {
    resolution: [f32; 2],
    origin: [f32; 2],
}

/// A rendered stroke that stays on the GPU
///
/// The texture is owned by the rasterizer and is overwritten by its next
/// render call. `texture` is `None` for empty bounds.
#[derive(Debug, Clone)]
pub struct GpuTarget {
    pub bounds: Bounds,
    pub texture: Option<wgpu::Texture>,
}

impl GpuTarget {
    pub fn width(&self) -> u32 {
        self.bounds.width
    }

    pub fn height(&self) -> u32 {
        self.bounds.height
    }
}

struct TargetTexture {
    texture: wgpu::Texture,
    width: u32,
    height: u32,
}

/// Everything tied to one device
struct GpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    target: Option<TargetTexture>,
    lost: Arc<AtomicBool>,
}

impl GpuContext {
    fn create() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::default();
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            force_fallback_adapter: false,
            compatible_surface: None,
        }))
        .map_err(|e| GpuError::NoAdapter(e.to_string()))?;

        let adapter_info = adapter.get_info();
        info!(
            "Stroke GPU backend: {} ({:?})",
            adapter_info.name, adapter_info.backend
        );

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("stroke_device"),
            required_features: wgpu::Features::empty(),
            ..Default::default()
        }))
        .map_err(|e| GpuError::RequestDevice(e.to_string()))?;

        let lost = Arc::new(AtomicBool::new(false));
        let lost_flag = Arc::clone(&lost);
        device.set_device_lost_callback(move |reason, message| {
            warn!("Stroke GPU device lost ({:?}): {}", reason, message);
            lost_flag.store(true, Ordering::SeqCst);
        });

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("stroke_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/stroke.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("stroke_uniforms_layout"),
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

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("stroke_uniforms"),
            size: std::mem::size_of::<Uniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("stroke_uniforms_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("stroke_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("stroke_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[GpuSegment::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: TARGET_FORMAT,
                    blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(GpuError::Validation(error.to_string()));
        }

        Ok(Self {
            device,
            queue,
            pipeline,
            uniform_buffer,
            bind_group,
            target: None,
            lost,
        })
    }

    fn is_lost(&self) -> bool {
        self.lost.load(Ordering::SeqCst)
    }

    /// Target texture of exactly `width` x `height`, recreated on size change
    fn ensure_target(&mut self, width: u32, height: u32) -> &TargetTexture {
        if self
            .target
            .as_ref()
            .is_some_and(|t| t.width != width || t.height != height)
        {
            self.target = None;
        }

        let device = &self.device;
        self.target.get_or_insert_with(|| {
            debug!("Creating stroke target {}x{}", width, height);
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some("stroke_target"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: TARGET_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::COPY_SRC
                    | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            });
            TargetTexture {
                texture,
                width,
                height,
            }
        })
    }

    /// Encode and submit the draw for `record` into the target texture
    fn draw(&mut self, record: &StrokeRecord) -> Result<wgpu::Texture, GpuError> {
        let bounds = record.bounds;
        let max = self.device.limits().max_texture_dimension_2d;
        if bounds.width > max || bounds.height > max {
            return Err(GpuError::TargetTooLarge {
                width: bounds.width,
                height: bounds.height,
                max,
            });
        }

        let instances: Vec<GpuSegment> = record
            .segments
            .iter()
            .filter_map(|s| GpuSegment::clipped(s, &bounds))
            .collect();

        let uniforms = Uniforms {
            resolution: [bounds.width as f32, bounds.height as f32],
            origin: [bounds.x_min as f32, bounds.y_min as f32],
        };

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let instance_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("stroke_instances"),
                contents: bytemuck::cast_slice(&instances),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let target = self.ensure_target(bounds.width, bounds.height);
        let texture = target.texture.clone();
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("stroke_encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("stroke_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if !instances.is_empty() {
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &self.bind_group, &[]);
                pass.set_vertex_buffer(0, instance_buffer.slice(..));
                pass.draw(0..4, 0..instances.len() as u32);
            }
        }

        self.queue.submit([encoder.finish()]);

        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(GpuError::Validation(error.to_string()));
        }
        if self.is_lost() {
            return Err(GpuError::DeviceLost);
        }

        debug!(
            "GPU stroke draw: {} of {} segments into {}x{}",
            instances.len(),
            record.segments.len(),
            bounds.width,
            bounds.height
        );

        Ok(texture)
    }

    /// Copy a target texture back into tightly packed RGBA8 rows
    fn read_back(&self, texture: &wgpu::Texture, bounds: Bounds) -> Result<Vec<u8>, GpuError> {
        let width = bounds.width;
        let height = bounds.height;
        let row_bytes = width * 4;
        let padded_row_bytes = row_bytes.next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);

        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("stroke_readback"),
            size: u64::from(padded_row_bytes) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("stroke_readback_encoder"),
            });
        encoder.copy_texture_to_buffer(
            texture.as_image_copy(),
            wgpu::TexelCopyBufferInfo {
                buffer: &readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row_bytes),
                    rows_per_image: None,
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit([encoder.finish()]);

        let (tx, rx) = mpsc::channel();
        readback
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |result| {
                let _ = tx.send(result);
            });
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| GpuError::Poll(e.to_string()))?;

        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(GpuError::Map(e.to_string())),
            Err(_) => return Err(GpuError::Map("map callback dropped".to_string())),
        }
        if self.is_lost() {
            return Err(GpuError::DeviceLost);
        }

        let mut data = Vec::with_capacity(row_bytes as usize * height as usize);
        {
            let mapped = readback.slice(..).get_mapped_range();
            for row in mapped.chunks_exact(padded_row_bytes as usize) {
                data.extend_from_slice(&row[..row_bytes as usize]);
            }
        }
        readback.unmap();

        Ok(data)
    }
}

/// Shared GPU stroke rasterizer
///
/// Cheap to construct; the device is requested on first use. Safe to share
/// behind an `Arc`, calls are serialized by the internal lock.
#[derive(Default)]
pub struct GpuRasterizer {
    state: Mutex<Option<GpuContext>>,
}

impl std::fmt::Debug for GpuRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuRasterizer").finish_non_exhaustive()
    }
}

impl GpuRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to bring up a device; false when no usable adapter exists
    pub fn is_available(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match Self::acquire(&mut state) {
            Ok(_) => true,
            Err(e) => {
                debug!("GPU rasterizer unavailable: {}", e);
                false
            }
        }
    }

    /// Live context, created on first use and recreated after device loss
    fn acquire(state: &mut Option<GpuContext>) -> Result<&mut GpuContext, GpuError> {
        let ctx = match state.take() {
            Some(ctx) if !ctx.is_lost() => ctx,
            Some(_) => {
                warn!("Recreating stroke GPU context after device loss");
                GpuContext::create()?
            }
            None => GpuContext::create()?,
        };
        Ok(state.insert(ctx))
    }

    /// Render into a GPU texture sized exactly to the record's bounds
    pub fn render(&self, record: &StrokeRecord) -> Result<GpuTarget, GpuError> {
        let bounds = record.bounds;
        if bounds.is_empty() {
            return Ok(GpuTarget {
                bounds,
                texture: None,
            });
        }

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let ctx = Self::acquire(&mut state)?;
        let texture = ctx.draw(record)?;

        Ok(GpuTarget {
            bounds,
            texture: Some(texture),
        })
    }

    /// Render and read the pixels back as premultiplied RGBA8
    pub fn render_to_image(&self, record: &StrokeRecord) -> Result<RasterImage, GpuError> {
        let bounds = record.bounds;
        if bounds.is_empty() {
            return Ok(RasterImage::transparent(bounds));
        }

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let ctx = Self::acquire(&mut state)?;
        let texture = ctx.draw(record)?;
        let data = ctx.read_back(&texture, bounds)?;

        Ok(RasterImage {
            bounds,
            width: bounds.width,
            height: bounds.height,
            data,
        })
    }
}
