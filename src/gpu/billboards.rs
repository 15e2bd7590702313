//! Camera-facing textured quads, one instance per particle.
//!
//! The render feed's three arrays go into three instance buffers, so no
//! interleaving happens on the CPU. Instances are drawn in feed order, which
//! is already back to front for free-mode systems.

use std::collections::HashMap;

use super::DEPTH_FORMAT;
use crate::render_feed::{BillboardUniforms, RenderFeed};
use crate::textures::{FilterMode, TextureData, TextureId, TextureRegistry};

const MIN_INSTANCES: usize = 1024;

const POSITION_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
const COLOR_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x4];
const SIZE_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32x2];

const SHADER: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
    right: vec4<f32>,
    up: vec4<f32>,
};

@group(0) @binding(0) var<uniform> camera: Camera;
@group(1) @binding(0) var sprite: texture_2d<f32>;
@group(1) @binding(1) var sprite_sampler: sampler;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec4<f32>,
};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) center: vec3<f32>,
    @location(1) color: vec4<f32>,
    @location(2) size: vec2<f32>,
) -> VertexOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
    );
    let corner = corners[vertex_index];
    let world = center
        + camera.right.xyz * corner.x * size.x
        + camera.up.xyz * corner.y * size.y;

    var out: VertexOutput;
    out.clip_position = camera.view_proj * vec4<f32>(world, 1.0);
    out.uv = vec2<f32>(corner.x * 0.5 + 0.5, 0.5 - corner.y * 0.5);
    out.color = color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(sprite, sprite_sampler, in.uv) * in.color;
}
"#;

/// GPU side of the particle billboards.
pub struct BillboardPass {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_layout: wgpu::BindGroupLayout,
    linear_sampler: wgpu::Sampler,
    nearest_sampler: wgpu::Sampler,
    /// Uploaded textures, keyed by registry id.
    textures: HashMap<TextureId, wgpu::BindGroup>,
    bound_texture: Option<TextureId>,
    positions: wgpu::Buffer,
    colors: wgpu::Buffer,
    sizes: wgpu::Buffer,
    capacity: usize,
    count: u32,
}

impl BillboardPass {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Billboard Shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER.into()),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Billboard Uniform Buffer"),
            size: std::mem::size_of::<BillboardUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Billboard Uniform Layout"),
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

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Billboard Uniform Bind Group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Billboard Texture Layout"),
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
        });

        let sampler = |filter: wgpu::FilterMode, label: &str| {
            device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some(label),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                mag_filter: filter,
                min_filter: filter,
                ..Default::default()
            })
        };
        let linear_sampler = sampler(wgpu::FilterMode::Linear, "Billboard Linear Sampler");
        let nearest_sampler = sampler(wgpu::FilterMode::Nearest, "Billboard Nearest Sampler");

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Billboard Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Billboard Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[
                    instance_layout(&POSITION_ATTRS),
                    instance_layout(&COLOR_ATTRS),
                    instance_layout(&SIZE_ATTRS),
                ],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
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
            // Sorted back to front, so test against meshes but never write
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let [positions, colors, sizes] = create_instance_buffers(device, MIN_INSTANCES);

        Self {
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            texture_layout,
            linear_sampler,
            nearest_sampler,
            textures: HashMap::new(),
            bound_texture: None,
            positions,
            colors,
            sizes,
            capacity: MIN_INSTANCES,
            count: 0,
        }
    }

    /// Upload this frame's camera, feed and texture.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        uniforms: &BillboardUniforms,
        feed: &RenderFeed,
        registry: &TextureRegistry,
        texture: TextureId,
    ) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));

        if feed.len() > self.capacity {
            self.capacity = feed.len().next_power_of_two();
            [self.positions, self.colors, self.sizes] = create_instance_buffers(device, self.capacity);
            log::debug!("Grew billboard buffers to {} instances", self.capacity);
        }
        if !feed.is_empty() {
            queue.write_buffer(&self.positions, 0, bytemuck::cast_slice(&feed.positions));
            queue.write_buffer(&self.colors, 0, bytemuck::cast_slice(&feed.colors));
            queue.write_buffer(&self.sizes, 0, bytemuck::cast_slice(&feed.sizes));
        }
        self.count = feed.len() as u32;

        if !self.textures.contains_key(&texture) {
            let bind_group = self.upload_texture(device, queue, registry.get(texture));
            self.textures.insert(texture, bind_group);
        }
        self.bound_texture = Some(texture);
    }

    fn upload_texture(&self, device: &wgpu::Device, queue: &wgpu::Queue, data: &TextureData) -> wgpu::BindGroup {
        let size = wgpu::Extent3d {
            width: data.width,
            height: data.height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Billboard Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &data.rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * data.width),
                rows_per_image: Some(data.height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = match data.filter {
            FilterMode::Linear => &self.linear_sampler,
            FilterMode::Nearest => &self.nearest_sampler,
        };

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Billboard Texture Bind Group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        let Some(texture) = self.bound_texture.and_then(|id| self.textures.get(&id)) else {
            return;
        };
        if self.count == 0 {
            return;
        }

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        pass.set_bind_group(1, texture, &[]);
        pass.set_vertex_buffer(0, self.positions.slice(..));
        pass.set_vertex_buffer(1, self.colors.slice(..));
        pass.set_vertex_buffer(2, self.sizes.slice(..));
        pass.draw(0..6, 0..self.count);
    }
}

/// One tightly packed attribute per buffer, advancing once per particle.
fn instance_layout(attributes: &[wgpu::VertexAttribute; 1]) -> wgpu::VertexBufferLayout<'_> {
    wgpu::VertexBufferLayout {
        array_stride: attributes[0].format.size(),
        step_mode: wgpu::VertexStepMode::Instance,
        attributes,
    }
}

fn create_instance_buffers(device: &wgpu::Device, capacity: usize) -> [wgpu::Buffer; 3] {
    let buffer = |label: &str, stride: usize| {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: (capacity * stride) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    };
    [
        buffer("Billboard Positions", std::mem::size_of::<[f32; 3]>()),
        buffer("Billboard Colors", std::mem::size_of::<[f32; 4]>()),
        buffer("Billboard Sizes", std::mem::size_of::<[f32; 2]>()),
    ]
}
