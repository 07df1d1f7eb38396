//! A batched renderer for marker draw items.
//!
//! A composed frame is many small meshes (discs, rings, particles) that all
//! share one pipeline and one camera. Issuing a draw and a uniform write per
//! item would drown in overhead, so this renderer:
//! - transforms every item's positions by its `world_from_local` on the CPU
//!   while appending into one interleaved position+color vertex stream,
//! - bakes the item's fill (opacity included) into the vertex color,
//! - uploads the batch once and draws it with a single camera uniform.
//!
//! Indices widen to u32 during batching: a single mesh is bounded by u16
//! (`scene::Mesh2D`), a frame's batch is not.
//!
//! The caller is responsible for creating the render pass, clearing, and
//! sorting items by `z` (painter's order; there is no depth buffer).

use std::{borrow::Cow, mem};

use crate::render::gpu::Gpu;
use crate::scene::{Camera2D, DrawItem2D};

/// GPU vertex: world-space position with a premixed RGBA color.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MarkerVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl MarkerVertex {
    pub const ATTRS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];

    #[inline]
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<MarkerVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// One uniform for the whole batch: the camera's clip-from-world matrix.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
struct FrameUniforms {
    clip_from_world: [[f32; 4]; 4],
}

fn round_up_to(v: u64, align: u64) -> u64 {
    debug_assert!(align.is_power_of_two());
    (v + (align - 1)) & !(align - 1)
}

pub struct MarkerRenderer {
    pipeline: wgpu::RenderPipeline,

    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,

    // GPU buffers, grown on demand.
    vertex_buffer: wgpu::Buffer,
    vertex_capacity_bytes: u64,

    index_buffer: wgpu::Buffer,
    index_capacity_bytes: u64,

    // CPU staging reused across frames to avoid per-frame allocation.
    vertices: Vec<MarkerVertex>,
    indices: Vec<u32>,
}

impl MarkerRenderer {
    pub fn new(gpu: &Gpu) -> anyhow::Result<Self> {
        let shader = gpu
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("MarkerRenderer Shader"),
                source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!(
                    "shaders/marker.wgsl"
                ))),
            });

        let uniform_bind_group_layout =
            gpu.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("MarkerRenderer Uniform BGL"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: Some(
                                wgpu::BufferSize::new(mem::size_of::<FrameUniforms>() as u64)
                                    .unwrap(),
                            ),
                        },
                        count: None,
                    }],
                });

        let uniform_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("MarkerRenderer Uniform Buffer"),
            size: mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("MarkerRenderer Uniform BG"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = gpu
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("MarkerRenderer Pipeline Layout"),
                bind_group_layouts: &[&uniform_bind_group_layout],
                push_constant_ranges: &[],
            });

        let pipeline = gpu
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("MarkerRenderer Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[MarkerVertex::layout()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: gpu.surface_format.add_srgb_suffix(),
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        let initial_vb = 4096u64;
        let initial_ib = 4096u64;

        let vertex_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("MarkerRenderer Vertex Buffer"),
            size: initial_vb,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let index_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("MarkerRenderer Index Buffer"),
            size: initial_ib,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            vertex_buffer,
            vertex_capacity_bytes: initial_vb,
            index_buffer,
            index_capacity_bytes: initial_ib,
            vertices: Vec::new(),
            indices: Vec::new(),
        })
    }

    /// Ensure the GPU buffers can hold at least `vb_bytes` / `ib_bytes`.
    fn ensure_capacity(&mut self, gpu: &Gpu, vb_bytes: u64, ib_bytes: u64) {
        if vb_bytes > self.vertex_capacity_bytes {
            let new_size = vb_bytes.next_power_of_two().max(4096);
            self.vertex_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("MarkerRenderer Vertex Buffer (resized)"),
                size: new_size,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            self.vertex_capacity_bytes = new_size;
        }

        if ib_bytes > self.index_capacity_bytes {
            let new_size = ib_bytes.next_power_of_two().max(4096);
            self.index_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("MarkerRenderer Index Buffer (resized)"),
                size: new_size,
                usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            self.index_capacity_bytes = new_size;
        }
    }

    /// Draw all items into the provided render pass.
    ///
    /// Items are drawn in slice order; sort by `z` first for painter's
    /// layering.
    pub fn draw_items<'pass>(
        &'pass mut self,
        gpu: &Gpu,
        pass: &mut wgpu::RenderPass<'pass>,
        camera: &Camera2D,
        items: &[DrawItem2D],
    ) -> anyhow::Result<()> {
        batch_items(items, &mut self.vertices, &mut self.indices);
        if self.indices.is_empty() {
            return Ok(());
        }

        let vb_bytes = (self.vertices.len() * mem::size_of::<MarkerVertex>()) as u64;
        let ib_bytes = (self.indices.len() * mem::size_of::<u32>()) as u64;

        // `Queue::write_buffer` requires COPY_BUFFER_ALIGNMENT; pad uploads
        // and slice only the real ranges when drawing.
        let align = wgpu::COPY_BUFFER_ALIGNMENT;
        let vb_upload = round_up_to(vb_bytes, align);
        let ib_upload = round_up_to(ib_bytes, align);

        self.ensure_capacity(gpu, vb_upload, ib_upload);

        let v_raw = bytemuck::cast_slice(&self.vertices);
        if vb_upload == vb_bytes {
            gpu.queue.write_buffer(&self.vertex_buffer, 0, v_raw);
        } else {
            let mut padded = Vec::<u8>::with_capacity(vb_upload as usize);
            padded.extend_from_slice(v_raw);
            padded.resize(vb_upload as usize, 0);
            gpu.queue.write_buffer(&self.vertex_buffer, 0, &padded);
        }

        let i_raw = bytemuck::cast_slice(&self.indices);
        if ib_upload == ib_bytes {
            gpu.queue.write_buffer(&self.index_buffer, 0, i_raw);
        } else {
            let mut padded = Vec::<u8>::with_capacity(ib_upload as usize);
            padded.extend_from_slice(i_raw);
            padded.resize(ib_upload as usize, 0);
            gpu.queue.write_buffer(&self.index_buffer, 0, &padded);
        }

        // One uniform for the batch: vertices are already in world space.
        let clip_from_world = glam::Mat4::from_cols_array_2d(&camera.clip_from_world().to_mat4());
        let uniforms = FrameUniforms {
            clip_from_world: clip_from_world.to_cols_array_2d(),
        };
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..vb_bytes));
        pass.set_index_buffer(self.index_buffer.slice(..ib_bytes), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..(self.indices.len() as u32), 0, 0..1);

        Ok(())
    }
}

/// Append items into the staging buffers (cleared first), transforming
/// positions to world space and baking fills into vertex colors.
///
/// Degenerate meshes and fully faded items are skipped; indices are offset
/// past whatever the batch already holds.
fn batch_items(items: &[DrawItem2D], vertices: &mut Vec<MarkerVertex>, indices: &mut Vec<u32>) {
    vertices.clear();
    indices.clear();

    for item in items {
        if item.mesh.positions.is_empty() || item.mesh.indices.is_empty() {
            continue;
        }
        // Fully faded items contribute nothing; skip the transform work.
        if item.fill.a <= 0.0 {
            continue;
        }

        let base = vertices.len() as u32;
        let color = [item.fill.r, item.fill.g, item.fill.b, item.fill.a];

        for &[x, y] in &item.mesh.positions {
            let (wx, wy) = item.world_from_local.transform_point(x, y);
            vertices.push(MarkerVertex {
                position: [wx, wy],
                color,
            });
        }

        indices.extend(item.mesh.indices.iter().map(|&i| base + i as u32));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Affine2, Mesh2D, Rgba};

    fn item(x: f32, alpha: f32) -> DrawItem2D {
        DrawItem2D {
            mesh: Mesh2D {
                positions: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
                indices: vec![0, 1, 2],
            },
            fill: Rgba::WHITE.with_alpha(alpha),
            world_from_local: Affine2::translate(x, 0.0),
            z: 0,
        }
    }

    #[test]
    fn batch_offsets_indices_and_applies_transforms() {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        batch_items(&[item(0.0, 1.0), item(10.0, 1.0)], &mut vertices, &mut indices);

        assert_eq!(vertices.len(), 6);
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(vertices[3].position, [10.0, 0.0]);
    }

    #[test]
    fn fully_faded_items_are_skipped() {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        batch_items(&[item(0.0, 0.0), item(5.0, 0.5)], &mut vertices, &mut indices);

        assert_eq!(vertices.len(), 3);
        assert_eq!(indices.len(), 3);
        assert_eq!(vertices[0].color[3], 0.5);
    }
}
