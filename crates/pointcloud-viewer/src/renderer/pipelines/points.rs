//! Point sprites: one camera-facing square per vertex, sized in world units.

use crate::scene::PointCloudObject;
use glam::Mat4;
use plycloud::Color;
use rayon::prelude::*;
use wgpu::util::DeviceExt;

/// Per-instance vertex data. Must match the instance inputs in `points.wgsl`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointInstance {
    /// Object-space position.
    pub position: [f32; 3],
    /// sRGB color in 0..1.
    pub color: [f32; 3],
}

/// Byte offset of `color` inside a `PointInstance`.
pub const COLOR_OFFSET: u64 = 12;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointUniforms {
    pub model_view: Mat4,  // 64 B
    pub proj: Mat4,        // +64
    /// Sprite edge length in world units.
    pub point_size: f32,   // +4
    pub _pad: [f32; 3],    // +12 -> 144
}

const _: [(); 144] = [(); core::mem::size_of::<PointUniforms>()];
const _: [(); 24] = [(); core::mem::size_of::<PointInstance>()];

/// Interleaves positions and colors for upload.
pub fn build_instances(positions: &[[f32; 3]], colors: &[Color]) -> Vec<PointInstance> {
    positions
        .par_iter()
        .zip(colors.par_iter())
        .map(|(p, c)| PointInstance {
            position: *p,
            color: *c,
        })
        .collect()
}

struct InstanceBuffer {
    buffer: wgpu::Buffer,
    len: u32,
}

pub struct PointsPipeline {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    quad_vb: wgpu::Buffer,
    instances: Option<InstanceBuffer>,
}

impl PointsPipeline {
    pub fn new(
        device: &wgpu::Device,
        color_fmt: wgpu::TextureFormat,
        depth_fmt: wgpu::TextureFormat,
    ) -> Self {
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Points Uniform Buffer"),
            size: std::mem::size_of::<PointUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Points BGL"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<PointUniforms>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Points Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shaders/points.wgsl"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../../shaders/points.wgsl").into()),
        });

        // Unit quad, two triangles.
        let quad_corners: [[f32; 2]; 6] = [
            [-0.5, -0.5],
            [0.5, -0.5],
            [0.5, 0.5],
            [-0.5, -0.5],
            [0.5, 0.5],
            [-0.5, 0.5],
        ];
        let quad_vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Points Quad VB"),
            contents: bytemuck::cast_slice(&quad_corners),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let vbuf_layouts = [
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[wgpu::VertexAttribute {
                    shader_location: 0,
                    offset: 0,
                    format: wgpu::VertexFormat::Float32x2,
                }],
            },
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<PointInstance>() as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &[
                    wgpu::VertexAttribute {
                        shader_location: 1,
                        offset: 0,
                        format: wgpu::VertexFormat::Float32x3,
                    },
                    wgpu::VertexAttribute {
                        shader_location: 2,
                        offset: COLOR_OFFSET,
                        format: wgpu::VertexFormat::Float32x3,
                    },
                ],
            },
        ];

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Points Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Points Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &vbuf_layouts,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: depth_fmt,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_fmt,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        Self {
            pipeline,
            bind_group,
            uniform_buffer,
            quad_vb,
            instances: None,
        }
    }

    /// Replaces the instance buffer with the object's vertices.
    pub fn upload(&mut self, device: &wgpu::Device, object: &PointCloudObject) {
        let instances = build_instances(&object.positions, &object.colors);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Point Instances"),
            contents: bytemuck::cast_slice(&instances),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        self.instances = Some(InstanceBuffer {
            buffer,
            len: instances.len() as u32,
        });
    }

    /// Re-uploads the colors of the given vertices only.
    pub fn write_colors(&self, queue: &wgpu::Queue, colors: &[Color], indices: &[usize]) {
        let Some(inst) = &self.instances else {
            return;
        };
        let stride = std::mem::size_of::<PointInstance>() as u64;
        for &i in indices {
            if let Some(c) = colors.get(i) {
                queue.write_buffer(&inst.buffer, i as u64 * stride + COLOR_OFFSET, bytemuck::cast_slice(c));
            }
        }
    }

    pub fn update_uniforms(&self, queue: &wgpu::Queue, model_view: Mat4, proj: Mat4, point_size: f32) {
        let u = PointUniforms {
            model_view,
            proj,
            point_size,
            _pad: [0.0; 3],
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&u));
    }

    pub fn draw<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>) {
        let Some(inst) = &self.instances else {
            return;
        };
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.set_vertex_buffer(0, self.quad_vb.slice(..));
        rpass.set_vertex_buffer(1, inst.buffer.slice(..));
        rpass.draw(0..6, 0..inst.len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instances_interleave_position_and_color() {
        let inst = build_instances(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]], &[[0.1, 0.2, 0.3], [1.0, 0.0, 0.0]]);
        assert_eq!(inst.len(), 2);
        assert_eq!(inst[1].position, [4.0, 5.0, 6.0]);
        assert_eq!(inst[1].color, [1.0, 0.0, 0.0]);

        let bytes: &[u8] = bytemuck::cast_slice(&inst);
        let color: &[f32] = bytemuck::cast_slice(&bytes[24 + COLOR_OFFSET as usize..48]);
        assert_eq!(color, &[1.0, 0.0, 0.0]);
    }
}
