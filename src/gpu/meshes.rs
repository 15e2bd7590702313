//! Flat-lit triangle meshes for colliders and the emission surface.

use std::collections::HashMap;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use super::DEPTH_FORMAT;
use crate::mesh::Mesh;
use crate::particles::MAX_SPHERE_COLLIDERS;
use crate::presets::VisualMesh;

/// Spheres plus the emission mesh.
const MAX_MESH_DRAWS: usize = MAX_SPHERE_COLLIDERS + 1;
/// Per-draw uniform stride, the minimum dynamic offset alignment.
const DRAW_STRIDE: u64 = 256;

const VERTEX_ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

const SHADER: &str = r#"
struct Draw {
    mvp: mat4x4<f32>,
    model: mat4x4<f32>,
    color: vec4<f32>,
};

@group(0) @binding(0) var<uniform> draw: Draw;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) normal: vec3<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) normal: vec3<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = draw.mvp * vec4<f32>(position, 1.0);
    out.normal = (draw.model * vec4<f32>(normal, 0.0)).xyz;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let light = normalize(vec3<f32>(0.4, 1.0, 0.3));
    let n = normalize(in.normal);
    let diffuse = max(dot(n, light), 0.0);
    return vec4<f32>(draw.color.rgb * (0.3 + 0.7 * diffuse), draw.color.a);
}
"#;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct MeshVertex {
    position: [f32; 3],
    normal: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct DrawUniforms {
    mvp: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    color: [f32; 4],
}

struct GpuMesh {
    /// Held so the cache key stays unique while the buffer lives.
    _mesh: Arc<Mesh>,
    vertices: wgpu::Buffer,
    vertex_count: u32,
}

pub struct MeshPass {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    /// Keyed by the mesh's address; meshes are shared through `Arc`.
    cache: HashMap<usize, GpuMesh>,
    /// Dynamic uniform offset and cache key per draw.
    draws: Vec<(u32, usize)>,
}

impl MeshPass {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER.into()),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Mesh Draw Uniforms"),
            size: DRAW_STRIDE * MAX_MESH_DRAWS as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Mesh Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<DrawUniforms>() as u64),
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Mesh Bind Group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &uniform_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<DrawUniforms>() as u64),
                }),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Mesh Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<MeshVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &VERTEX_ATTRS,
                }],
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
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            uniform_buffer,
            bind_group,
            cache: HashMap::new(),
            draws: Vec::new(),
        }
    }

    /// Upload any new meshes and this frame's per-draw transforms.
    pub fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, view_proj: Mat4, meshes: &[VisualMesh]) {
        if meshes.len() > MAX_MESH_DRAWS {
            log::warn!("Drawing only {} of {} meshes", MAX_MESH_DRAWS, meshes.len());
        }

        self.draws.clear();
        for (slot, visual) in meshes.iter().take(MAX_MESH_DRAWS).enumerate() {
            if visual.mesh.is_empty() {
                continue;
            }
            let key = Arc::as_ptr(&visual.mesh) as usize;
            self.cache
                .entry(key)
                .or_insert_with(|| upload_mesh(device, &visual.mesh));

            let uniforms = DrawUniforms {
                mvp: (view_proj * visual.transform).to_cols_array_2d(),
                model: visual.transform.to_cols_array_2d(),
                color: visual.color.to_array(),
            };
            let offset = slot as u64 * DRAW_STRIDE;
            queue.write_buffer(&self.uniform_buffer, offset, bytemuck::bytes_of(&uniforms));
            self.draws.push((offset as u32, key));
        }

        // Drop meshes no longer referenced, e.g. after a reload
        let draws = &self.draws;
        self.cache.retain(|key, _| draws.iter().any(|(_, k)| k == key));
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.draws.is_empty() {
            return;
        }
        pass.set_pipeline(&self.pipeline);

        for &(offset, key) in &self.draws {
            let Some(mesh) = self.cache.get(&key) else {
                continue;
            };
            pass.set_bind_group(0, &self.bind_group, &[offset]);
            pass.set_vertex_buffer(0, mesh.vertices.slice(..));
            pass.draw(0..mesh.vertex_count, 0..1);
        }
    }
}

fn upload_mesh(device: &wgpu::Device, mesh: &Arc<Mesh>) -> GpuMesh {
    let vertices: Vec<MeshVertex> = mesh
        .triangles
        .iter()
        .flat_map(|tri| {
            (0..3).map(move |i| MeshVertex {
                position: tri.v[i].to_array(),
                normal: tri.n[i].to_array(),
            })
        })
        .collect();

    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Mesh Vertex Buffer"),
        contents: bytemuck::cast_slice(&vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });

    GpuMesh {
        _mesh: Arc::clone(mesh),
        vertices: buffer,
        vertex_count: vertices.len() as u32,
    }
}
