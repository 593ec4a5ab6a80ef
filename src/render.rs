// GPU particle pass. Draws the whole field into an offscreen RGBA texture and
// reads it back so the window can layer it over the camera backdrop.
// Visual: transparent everywhere except the dots; dots are soft round sprites.

use crate::config::POINT_SCALE;
use crate::error::Error;
use crate::particles::ParticleSet;
use crate::types::GpuParticle;
use crate::view::ViewCamera;
use bytemuck::{Pod, Zeroable};
use glam::Vec3;

const SHADER: &str = include_str!("shaders/particles.wgsl");
const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const VERTICES_PER_SPRITE: u32 = 6;

const PARTICLE_ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
    0 => Float32x3, // position
    1 => Float32x3, // color
    2 => Float32,   // is_extra
    3 => Float32    // size
];

/// Per-frame values the shader needs besides the camera.
#[derive(Clone, Copy, Debug)]
pub struct FrameUniforms {
    pub time: f32,
    pub mix_factor: f32,
    pub hand_position: Vec3,
    pub hand_active: bool,
}

/// Mirror of `Uniforms` in particles.wgsl (std140-compatible, 176 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct Uniforms {
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
    hand_position: [f32; 3],
    time: f32,
    viewport: [f32; 2],
    mix_factor: f32,
    hand_active: f32,
    point_scale: f32,
    _pad: [f32; 3],
}

impl Uniforms {
    fn new(camera: &ViewCamera, frame: &FrameUniforms, width: u32, height: u32) -> Self {
        Self {
            view: camera.view().to_cols_array_2d(),
            proj: camera.projection().to_cols_array_2d(),
            hand_position: frame.hand_position.to_array(),
            time: frame.time,
            viewport: [width as f32, height as f32],
            mix_factor: frame.mix_factor,
            hand_active: if frame.hand_active { 1.0 } else { 0.0 },
            point_scale: POINT_SCALE,
            _pad: [0.0; 3],
        }
    }
}

fn particle_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: GpuParticle::SIZE as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &PARTICLE_ATTRIBUTES,
    }
}

/// Bytes per readback row, padded to wgpu's copy alignment.
fn padded_row_bytes(width: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (width * 4).div_ceil(align) * align
}

/// Render target + staging buffer; recreated on resize.
struct Target {
    width: u32,
    height: u32,
    padded_row: u32,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    staging: wgpu::Buffer,
}

impl Target {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Particle Target"),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&Default::default());
        let padded_row = padded_row_bytes(width);
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Readback"),
            size: (padded_row * height) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        Self { width, height, padded_row, texture, view, staging }
    }
}

pub struct ParticleRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    particle_buffer: wgpu::Buffer,
    capacity: usize,
    instances: u32,
    target: Target,
    pixels: Vec<u8>, // tightly packed RGBA of the last frame
}

impl ParticleRenderer {
    /// Open a GPU device (no window surface) and build the particle pipeline.
    pub fn new(width: u32, height: u32, capacity: usize) -> Result<Self, Error> {
        pollster::block_on(Self::new_async(width, height, capacity))
    }

    async fn new_async(width: u32, height: u32, capacity: usize) -> Result<Self, Error> {
        // 1) Adapter + device, headless.
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| Error::RenderContext("No GPU adapter".into()))?;
        log::info!("GPU adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Particles"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| Error::RenderContext(format!("Request device: {e}")))?;

        // 2) Pipeline: instanced quads, normal alpha blending, no depth writes.
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Particle Uniforms Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Particle Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Particle Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[particle_layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: TARGET_FORMAT,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // 3) Buffers: uniforms + one fixed-size particle buffer.
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Uniforms"),
            size: std::mem::size_of::<Uniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Particle Uniforms"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        let particle_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particles"),
            size: (capacity.max(1) * GpuParticle::SIZE) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let target = Target::new(&device, width, height);

        Ok(Self {
            device,
            queue,
            pipeline,
            uniform_buffer,
            bind_group,
            particle_buffer,
            capacity,
            instances: 0,
            target,
            pixels: Vec::new(),
        })
    }

    /// Match the render target to the window. Cheap when the size is unchanged.
    pub fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if self.target.width == width && self.target.height == height {
            return;
        }
        log::debug!("Particle target resized to {width}x{height}");
        self.target = Target::new(&self.device, width, height);
    }

    /// Replace every particle attribute in one write.
    pub fn upload(&mut self, particles: &ParticleSet) {
        self.write_particles(particles.as_slice());
    }

    fn write_particles(&mut self, particles: &[GpuParticle]) {
        let count = particles.len().min(self.capacity);
        let bytes: &[u8] = bytemuck::cast_slice(&particles[..count]);
        self.queue.write_buffer(&self.particle_buffer, 0, bytes);
        self.instances = count as u32;
    }

    /// Draw one frame and return its RGBA pixels (premultiplied by the blend,
    /// row-major, `width * height * 4` bytes).
    pub fn render(&mut self, camera: &ViewCamera, frame: &FrameUniforms) -> Result<&[u8], Error> {
        let (width, height) = (self.target.width, self.target.height);
        let uniforms = Uniforms::new(camera, frame, width, height);
        self.queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Particle Frame"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Particles"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target.view,
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
            if self.instances > 0 {
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &self.bind_group, &[]);
                pass.set_vertex_buffer(0, self.particle_buffer.slice(..));
                pass.draw(0..VERTICES_PER_SPRITE, 0..self.instances);
            }
        }

        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &self.target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &self.target.staging,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(self.target.padded_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        self.read_back()?;
        Ok(&self.pixels)
    }

    /// Map the staging buffer and strip the row padding into `self.pixels`.
    fn read_back(&mut self) -> Result<(), Error> {
        let slice = self.target.staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| Error::Render(format!("Readback channel: {e}")))?
            .map_err(|e| Error::Render(format!("Map readback buffer: {e}")))?;

        let row = (self.target.width * 4) as usize;
        let padded = self.target.padded_row as usize;
        {
            let data = slice.get_mapped_range();
            self.pixels.clear();
            for chunk in data.chunks(padded).take(self.target.height as usize) {
                self.pixels.extend_from_slice(&chunk[..row]);
            }
        }
        self.target.staging.unmap();
        Ok(())
    }
}
