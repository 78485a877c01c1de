//! wgpu renderer for fabric frames.
//!
//! Draws a [`FrameData`] snapshot in three passes over the same render
//! target: cell fills, spring lines, then particles on top. All geometry is
//! in window pixels; the vertex shaders map it to clip space using the
//! surface size from the uniform buffer.

mod buffer;

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;
use winit::window::Window;

use buffer::DynamicBuffer;

use crate::error::GpuError;
use crate::frame::{FrameData, LineVertex, ParticleVertex};
use crate::visuals::{self, BACKGROUND_COLOR, FREE_COLOR, LINE_COLOR};

/// WGSL source for all three pipelines.
pub const SHADER_SOURCE: &str = include_str!("fabric.wgsl");

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
struct Uniforms {
    screen: [f32; 2],
    line_width: f32,
    fill_opacity: f32,
    line_color: [f32; 4],
    fill_color: [f32; 4],
}

impl Uniforms {
    /// `screen` is the surface size in logical pixels, the unit the mesh
    /// and the visual settings are measured in.
    fn new(width: u32, height: u32, scale_factor: f32, frame: &FrameData) -> Self {
        let scale = if scale_factor > 0.0 { scale_factor } else { 1.0 };
        Self {
            screen: [width.max(1) as f32 / scale, height.max(1) as f32 / scale],
            line_width: frame.line_width,
            fill_opacity: frame.fill_opacity,
            line_color: visuals::rgba(LINE_COLOR, 1.0),
            fill_color: visuals::rgba(FREE_COLOR, 1.0),
        }
    }
}

pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    fill_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    particle_pipeline: wgpu::RenderPipeline,
    fill_buffer: DynamicBuffer,
    line_buffer: DynamicBuffer,
    particle_buffer: DynamicBuffer,
    counts: DrawCounts,
    scale_factor: f32,
    background: [u8; 3],
}

#[derive(Debug, Default, Clone, Copy)]
struct DrawCounts {
    fill_vertices: u32,
    lines: u32,
    particles: u32,
}

impl GpuState {
    pub async fn new(window: Arc<Window>) -> Result<Self, GpuError> {
        let size = window.inner_size();
        let scale_factor = window.scale_factor() as f32;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Fabric Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Colours are specified as display values, so prefer a non-sRGB
        // target and skip the implicit linear-to-sRGB conversion.
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or(surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::IncompatibleSurface)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
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

        let uniforms = Uniforms::new(config.width, config.height, scale_factor, &FrameData::default());
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Uniform Bind Group Layout"),
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
            label: Some("Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Fabric Shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Fabric Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });

        let targets = PipelineTargets {
            device: &device,
            layout: &layout,
            shader: &shader,
            format: config.format,
        };

        let fill_pipeline = targets.create(
            "Fill Pipeline",
            ("vs_fill", "fs_fill"),
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![0 => Float32x2],
            },
        );

        // Spring endpoints are stored in pairs; each pair is one instance.
        let line_pipeline = targets.create(
            "Line Pipeline",
            ("vs_line", "fs_line"),
            wgpu::VertexBufferLayout {
                array_stride: 2 * std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2],
            },
        );

        let particle_pipeline = targets.create(
            "Particle Pipeline",
            ("vs_particle", "fs_particle"),
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<ParticleVertex>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &[
                    wgpu::VertexAttribute {
                        offset: 0,
                        shader_location: 0,
                        format: wgpu::VertexFormat::Float32x2, // position
                    },
                    wgpu::VertexAttribute {
                        offset: 8,
                        shader_location: 1,
                        format: wgpu::VertexFormat::Float32, // radius
                    },
                    wgpu::VertexAttribute {
                        offset: 16,
                        shader_location: 2,
                        format: wgpu::VertexFormat::Float32x4, // color
                    },
                ],
            },
        );

        let fill_buffer = DynamicBuffer::new(&device, "Fill Buffer", wgpu::BufferUsages::VERTEX);
        let line_buffer = DynamicBuffer::new(&device, "Line Buffer", wgpu::BufferUsages::VERTEX);
        let particle_buffer =
            DynamicBuffer::new(&device, "Particle Buffer", wgpu::BufferUsages::VERTEX);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            uniform_buffer,
            uniform_bind_group,
            fill_pipeline,
            line_pipeline,
            particle_pipeline,
            fill_buffer,
            line_buffer,
            particle_buffer,
            counts: DrawCounts::default(),
            scale_factor,
            background: BACKGROUND_COLOR,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        self.scale_factor = scale_factor as f32;
    }

    /// Clear colour for the next frames.
    pub fn set_background(&mut self, rgb: [u8; 3]) {
        self.background = rgb;
    }

    /// Reconfigure the surface at its current size, after it was lost.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Upload `frame` into the vertex buffers.
    fn upload(&mut self, frame: &FrameData) {
        let uniforms = Uniforms::new(self.config.width, self.config.height, self.scale_factor, frame);
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        self.fill_buffer
            .write(&self.device, &self.queue, bytemuck::cast_slice(&frame.fills));
        self.line_buffer
            .write(&self.device, &self.queue, bytemuck::cast_slice(&frame.lines));
        self.particle_buffer
            .write(&self.device, &self.queue, bytemuck::cast_slice(&frame.particles));

        self.counts = DrawCounts {
            fill_vertices: frame.fills.len() as u32,
            lines: frame.line_count() as u32,
            particles: frame.particles.len() as u32,
        };
    }

    pub fn render(&mut self, frame: &FrameData) -> Result<(), wgpu::SurfaceError> {
        self.upload(frame);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let [r, g, b, _] = visuals::rgba(self.background, 1.0);
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Fabric Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);

            if !self.fill_buffer.is_empty() {
                render_pass.set_pipeline(&self.fill_pipeline);
                render_pass.set_vertex_buffer(0, self.fill_buffer.slice());
                render_pass.draw(0..self.counts.fill_vertices, 0..1);
            }

            if !self.line_buffer.is_empty() {
                render_pass.set_pipeline(&self.line_pipeline);
                render_pass.set_vertex_buffer(0, self.line_buffer.slice());
                render_pass.draw(0..6, 0..self.counts.lines);
            }

            if !self.particle_buffer.is_empty() {
                render_pass.set_pipeline(&self.particle_pipeline);
                render_pass.set_vertex_buffer(0, self.particle_buffer.slice());
                render_pass.draw(0..6, 0..self.counts.particles);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

/// Shared state for building the three render pipelines.
struct PipelineTargets<'a> {
    device: &'a wgpu::Device,
    layout: &'a wgpu::PipelineLayout,
    shader: &'a wgpu::ShaderModule,
    format: wgpu::TextureFormat,
}

impl PipelineTargets<'_> {
    fn create(
        &self,
        label: &str,
        (vs, fs): (&str, &str),
        buffer: wgpu::VertexBufferLayout<'_>,
    ) -> wgpu::RenderPipeline {
        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(self.layout),
                vertex: wgpu::VertexState {
                    module: self.shader,
                    entry_point: Some(vs),
                    buffers: &[buffer],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: self.shader,
                    entry_point: Some(fs),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
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
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate_wgsl(code: &str) -> Result<naga::Module, String> {
        let module = naga::front::wgsl::parse_str(code)
            .map_err(|e| format!("WGSL parse error: {:?}", e))?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| format!("WGSL validation error: {:?}", e))?;

        Ok(module)
    }

    #[test]
    fn test_shader_is_valid() {
        let module = validate_wgsl(SHADER_SOURCE).unwrap();
        let entry_points: Vec<_> = module.entry_points.iter().map(|e| e.name.as_str()).collect();
        for name in ["vs_fill", "fs_fill", "vs_line", "fs_line", "vs_particle", "fs_particle"] {
            assert!(entry_points.contains(&name), "missing entry point {}", name);
        }
    }

    #[test]
    fn test_uniform_layout() {
        // Must match `Uniforms` in fabric.wgsl (vec4 members are 16-aligned).
        assert_eq!(std::mem::size_of::<Uniforms>(), 48);
    }

    #[test]
    fn test_uniforms_guard_zero_size() {
        let u = Uniforms::new(0, 0, 0.0, &FrameData::default());
        assert_eq!(u.screen, [1.0, 1.0]);
        assert_eq!(u.line_color, visuals::rgba(LINE_COLOR, 1.0));
    }

    #[test]
    fn test_uniforms_use_logical_pixels() {
        let u = Uniforms::new(2560, 1440, 2.0, &FrameData::default());
        assert_eq!(u.screen, [1280.0, 720.0]);
    }
}
