//! `GraphicsContext` on top of wgpu.
//!
//! Calls mutate CPU-side state immediately and append clear/draw operations to
//! a per-frame list. [`WgpuContext::flush`] turns that list into render passes
//! on the frame's encoder. Each draw snapshots the current program's uniform
//! block into an arena bound with a dynamic offset, so uniform writes between
//! draws behave like they do on a GL driver.

mod pipeline;

use std::collections::HashMap;
use std::num::NonZeroU64;

use glam::{Mat4, Vec3};
use slotmap::SlotMap;
use wgpu::util::DeviceExt;

use crate::device::{Gpu, GpuFrame};
use crate::paint::Color;

use super::context::GraphicsContext;
use super::state::ContextState;
use super::types::{
    AttribPointer, BufferId, BufferTarget, Capability, ClearMask, Primitive, ProgramId, ShaderId,
    ShaderStage, Status, UniformLocation,
};
use pipeline::{DEPTH_FORMAT, PipelineKey, ProgramGpu, SlotLayout};

struct GpuBuffer {
    target: BufferTarget,
    len: usize,
    raw: Option<wgpu::Buffer>,
}

struct VertexSlot {
    buffer: wgpu::Buffer,
    offset: u64,
}

enum DrawCall {
    Arrays { first: u32, count: u32 },
    Indexed { indices: wgpu::Buffer, first: u32, count: u32 },
    Fan { indices: wgpu::Buffer, count: u32, base_vertex: i32 },
}

struct DrawOp {
    key: PipelineKey,
    slots: Vec<VertexSlot>,
    uniform_offset: Option<u32>,
    call: DrawCall,
}

enum Op {
    Clear { color: Option<Color>, depth: bool },
    Draw(DrawOp),
}

struct DepthTarget {
    width: u32,
    height: u32,
    view: wgpu::TextureView,
}

/// wgpu implementation of [`GraphicsContext`].
pub struct WgpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    color_format: wgpu::TextureFormat,
    uniform_alignment: usize,

    state: ContextState,
    buffers: SlotMap<BufferId, GpuBuffer>,

    ops: Vec<Op>,
    arena: Vec<u8>,

    programs: HashMap<ProgramId, ProgramGpu>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    fan_indices: HashMap<u32, wgpu::Buffer>,
    depth: Option<DepthTarget>,

    arena_buffer: Option<wgpu::Buffer>,
    arena_capacity: u64,
}

impl WgpuContext {
    pub fn new(gpu: &Gpu<'_>) -> Self {
        let device = gpu.device().clone();
        let uniform_alignment = device.limits().min_uniform_buffer_offset_alignment.max(1) as usize;

        Self {
            queue: gpu.queue().clone(),
            color_format: gpu.surface_format(),
            uniform_alignment,
            device,
            state: ContextState::default(),
            buffers: SlotMap::with_key(),
            ops: Vec::new(),
            arena: Vec::new(),
            programs: HashMap::new(),
            pipelines: HashMap::new(),
            fan_indices: HashMap::new(),
            depth: None,
            arena_buffer: None,
            arena_capacity: 0,
        }
    }

    /// Number of operations waiting for the next [`flush`](Self::flush).
    pub fn pending_ops(&self) -> usize {
        self.ops.len()
    }

    /// Drops recorded draws and clears, e.g. when the surface skipped a frame.
    ///
    /// Resource creation and uniform state are unaffected.
    pub fn discard_pending(&mut self) {
        if !self.ops.is_empty() {
            log::debug!("discarding {} recorded op(s)", self.ops.len());
        }
        self.ops.clear();
        self.arena.clear();
    }

    /// Encodes everything recorded since the last flush into `frame`.
    ///
    /// Call at most once per submitted frame: the uniform arena is rewritten on
    /// every flush.
    pub fn flush(&mut self, frame: &mut GpuFrame) {
        let ops = std::mem::take(&mut self.ops);
        let mut arena = std::mem::take(&mut self.arena);
        if ops.is_empty() {
            return;
        }

        let extent = frame.surface_texture.texture.size();
        let depth_view = self.depth_view(extent.width, extent.height);

        for op in &ops {
            if let Op::Draw(draw) = op {
                self.ensure_pipeline(&draw.key);
            }
        }

        if !arena.is_empty() {
            arena.resize(arena.len().next_multiple_of(4), 0);
            self.ensure_arena_capacity(arena.len() as u64);
            if let Some(buffer) = self.arena_buffer.as_ref() {
                self.queue.write_buffer(buffer, 0, &arena);
            }
        }
        let bind_groups = self.bind_groups(&ops);

        let mut rest = ops.as_slice();
        while !rest.is_empty() {
            let (color_load, depth_load, consumed) = pass_loads(rest);
            rest = &rest[consumed..];
            let draws = rest.iter().take_while(|op| matches!(op, Op::Draw(_))).count();
            let (pass_ops, tail) = rest.split_at(draws);
            rest = tail;

            let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("spindle pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            for op in pass_ops {
                let Op::Draw(draw) = op else { continue };
                let Some(pipeline) = self.pipelines.get(&draw.key) else { continue };
                rpass.set_pipeline(pipeline);

                if let Some(offset) = draw.uniform_offset {
                    let Some(group) = bind_groups.get(&draw.key.program) else { continue };
                    rpass.set_bind_group(0, group, &[offset]);
                }
                for (slot, vb) in draw.slots.iter().enumerate() {
                    rpass.set_vertex_buffer(slot as u32, vb.buffer.slice(vb.offset..));
                }

                match &draw.call {
                    DrawCall::Arrays { first, count } => {
                        rpass.draw(*first..first + count, 0..1);
                    }
                    DrawCall::Indexed { indices, first, count } => {
                        rpass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint16);
                        rpass.draw_indexed(*first..first + count, 0, 0..1);
                    }
                    DrawCall::Fan { indices, count, base_vertex } => {
                        rpass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                        rpass.draw_indexed(0..*count, *base_vertex, 0..1);
                    }
                }
            }
        }
    }

    fn depth_view(&mut self, width: u32, height: u32) -> wgpu::TextureView {
        let width = width.max(1);
        let height = height.max(1);
        if let Some(depth) = &self.depth {
            if depth.width == width && depth.height == height {
                return depth.view.clone();
            }
        }

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("spindle depth"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.depth = Some(DepthTarget { width, height, view: view.clone() });
        view
    }

    fn ensure_pipeline(&mut self, key: &PipelineKey) {
        if self.pipelines.contains_key(key) {
            return;
        }
        if !self.programs.contains_key(&key.program) {
            let Some(linked) = self.state.linked(key.program) else {
                log::warn!("draw recorded for a program deleted before flush; skipped");
                return;
            };
            let gpu = ProgramGpu::new(&self.device, linked);
            self.programs.insert(key.program, gpu);
        }
        let Some(program) = self.programs.get(&key.program) else { return };

        log::debug!(
            "creating pipeline: {:?}, {} attribute(s), depth={}, cull={}",
            key.topology,
            key.slots.len(),
            key.depth_test,
            key.cull_face
        );
        let pipeline = program.create_pipeline(&self.device, key, self.color_format);
        self.pipelines.insert(key.clone(), pipeline);
    }

    fn ensure_arena_capacity(&mut self, required: u64) {
        if required <= self.arena_capacity && self.arena_buffer.is_some() {
            return;
        }

        let capacity = required.next_power_of_two().max(4096);
        self.arena_buffer = Some(self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("spindle uniform arena"),
            size: capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.arena_capacity = capacity;
    }

    fn bind_groups(&self, ops: &[Op]) -> HashMap<ProgramId, wgpu::BindGroup> {
        let mut groups = HashMap::new();
        let Some(arena) = self.arena_buffer.as_ref() else { return groups };

        for op in ops {
            let Op::Draw(draw) = op else { continue };
            if draw.uniform_offset.is_none() || groups.contains_key(&draw.key.program) {
                continue;
            }
            let Some(program) = self.programs.get(&draw.key.program) else { continue };
            let Some(layout) = program.bind_group_layout.as_ref() else { continue };

            let group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("spindle uniforms"),
                layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: arena,
                        offset: 0,
                        size: NonZeroU64::new(program.uniform_size),
                    }),
                }],
            });
            groups.insert(draw.key.program, group);
        }
        groups
    }

    fn fan_index_buffer(&mut self, count: u32) -> wgpu::Buffer {
        if let Some(buffer) = self.fan_indices.get(&count) {
            return buffer.clone();
        }
        let indices = pipeline::fan_indices(count);
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("spindle fan indices"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        self.fan_indices.insert(count, buffer.clone());
        buffer
    }

    /// Validates current state for a draw and snapshots what it reads.
    fn prepare_draw(&mut self, mode: Primitive) -> Option<(PipelineKey, Vec<VertexSlot>, Option<u32>)> {
        let Some((program, object, linked)) = self.state.current_program() else {
            log::error!("draw call with no linked program in use; ignored");
            return None;
        };

        let bound = match self.state.bound_attributes(linked) {
            Ok(bound) => bound,
            Err(name) => {
                log::error!("draw call with attribute `{name}` unbound; ignored");
                return None;
            }
        };

        let mut layouts = Vec::with_capacity(bound.len());
        let mut slots = Vec::with_capacity(bound.len());
        for (location, pointer) in &bound {
            let Some(buffer) = self.buffers.get(pointer.buffer).and_then(|b| b.raw.clone()) else {
                log::error!("attribute {location} reads an empty buffer; draw ignored");
                return None;
            };
            layouts.push(SlotLayout::from_pointer(*location, pointer));
            slots.push(VertexSlot { buffer, offset: u64::from(pointer.offset) });
        }

        let uniform_offset = if object.uniform_data.is_empty() {
            None
        } else {
            let start = self.arena.len().next_multiple_of(self.uniform_alignment);
            self.arena.resize(start, 0);
            self.arena.extend_from_slice(&object.uniform_data);
            Some(start as u32)
        };

        let key = PipelineKey {
            program,
            topology: pipeline::topology(mode),
            slots: layouts,
            depth_test: self.state.depth_test,
            cull_face: self.state.cull_face,
        };
        Some((key, slots, uniform_offset))
    }

    fn forget_program(&mut self, program: ProgramId) {
        self.programs.remove(&program);
        self.pipelines.retain(|key, _| key.program != program);
    }
}

/// Load ops for the pass starting at `ops[0]`, merging a run of clears.
///
/// Returns how many leading clear ops were consumed.
fn pass_loads(ops: &[Op]) -> (wgpu::LoadOp<wgpu::Color>, wgpu::LoadOp<f32>, usize) {
    let mut color_load = wgpu::LoadOp::Load;
    let mut depth_load = wgpu::LoadOp::Load;
    let mut consumed = 0;

    for op in ops {
        let Op::Clear { color, depth } = op else { break };
        if let Some(c) = color {
            color_load = wgpu::LoadOp::Clear(wgpu::Color {
                r: f64::from(c.r),
                g: f64::from(c.g),
                b: f64::from(c.b),
                a: f64::from(c.a),
            });
        }
        if *depth {
            depth_load = wgpu::LoadOp::Clear(1.0);
        }
        consumed += 1;
    }
    (color_load, depth_load, consumed)
}

impl GraphicsContext for WgpuContext {
    fn create_shader(&mut self, stage: ShaderStage) -> ShaderId {
        self.state.create_shader(stage)
    }

    fn compile_shader(&mut self, shader: ShaderId, source: &str) -> Status {
        self.state.compile_shader(shader, source)
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        self.state.delete_shader(shader);
    }

    fn create_program(&mut self) -> ProgramId {
        self.state.create_program()
    }

    fn link_program(&mut self, program: ProgramId, vertex: ShaderId, fragment: ShaderId) -> Status {
        self.forget_program(program);
        self.state.link_program(program, vertex, fragment)
    }

    fn use_program(&mut self, program: ProgramId) {
        if !self.state.use_program(program) {
            log::error!("use_program on an unlinked program; ignored");
        }
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.forget_program(program);
        self.state.delete_program(program);
    }

    fn active_uniforms(&self, program: ProgramId) -> Vec<String> {
        self.state.active_uniforms(program)
    }

    fn active_attributes(&self, program: ProgramId) -> Vec<(String, u32)> {
        self.state.active_attributes(program)
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.state.uniform_location(program, name)
    }

    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        self.state.attrib_location(program, name)
    }

    fn create_buffer(&mut self, target: BufferTarget) -> BufferId {
        self.buffers.insert(GpuBuffer { target, len: 0, raw: None })
    }

    fn buffer_data(&mut self, buffer: BufferId, data: &[u8]) {
        let Some(buf) = self.buffers.get_mut(buffer) else {
            log::error!("buffer_data on an unknown buffer; ignored");
            return;
        };
        let usage = match buf.target {
            BufferTarget::Vertex => wgpu::BufferUsages::VERTEX,
            BufferTarget::Index => wgpu::BufferUsages::INDEX,
        };
        buf.len = data.len();
        buf.raw = (!data.is_empty()).then(|| {
            self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("spindle buffer"),
                contents: data,
                usage,
            })
        });
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        // Draws already recorded keep their own handle to the wgpu buffer.
        if self.buffers.remove(buffer).is_some() {
            self.state.attribs.retain(|_, p| p.buffer != buffer);
        }
    }

    fn vertex_attrib_pointer(&mut self, location: u32, pointer: AttribPointer) {
        let valid = self
            .buffers
            .get(pointer.buffer)
            .is_some_and(|b| b.target == BufferTarget::Vertex);
        if !valid || !(1..=4).contains(&pointer.components) || pointer.offset % 4 != 0 {
            log::error!("invalid attribute pointer for location {location}; ignored");
            return;
        }
        self.state.attribs.insert(location, pointer);
    }

    fn uniform_matrix4(&mut self, location: UniformLocation, value: &Mat4) {
        let cols = value.to_cols_array();
        self.state.write_uniform(location, bytemuck::cast_slice(&cols));
    }

    fn uniform3f(&mut self, location: UniformLocation, value: Vec3) {
        let v = value.to_array();
        self.state.write_uniform(location, bytemuck::cast_slice(&v));
    }

    fn enable(&mut self, capability: Capability) {
        self.state.set_capability(capability, true);
    }

    fn disable(&mut self, capability: Capability) {
        self.state.set_capability(capability, false);
    }

    fn clear_color(&mut self, color: Color) {
        self.state.clear_color = color;
    }

    fn clear(&mut self, mask: ClearMask) {
        self.ops.push(Op::Clear {
            color: mask.contains(ClearMask::COLOR).then_some(self.state.clear_color),
            depth: mask.contains(ClearMask::DEPTH),
        });
    }

    fn draw_elements(&mut self, mode: Primitive, indices: BufferId, count: u32, first: u32) {
        if mode == Primitive::TriangleFan {
            log::error!("indexed triangle fans are not supported; draw ignored");
            return;
        }
        let index_buffer = self.buffers.get(indices).and_then(|b| {
            let fits = b.target == BufferTarget::Index
                && (first as usize + count as usize) * 2 <= b.len;
            if fits { b.raw.clone() } else { None }
        });
        let Some(index_buffer) = index_buffer else {
            log::error!("draw_elements range {first}+{count} outside the index buffer; ignored");
            return;
        };
        if count == 0 {
            return;
        }

        let Some((key, slots, uniform_offset)) = self.prepare_draw(mode) else { return };
        self.ops.push(Op::Draw(DrawOp {
            key,
            slots,
            uniform_offset,
            call: DrawCall::Indexed { indices: index_buffer, first, count },
        }));
    }

    fn draw_arrays(&mut self, mode: Primitive, first: u32, count: u32) {
        if count == 0 || (mode == Primitive::TriangleFan && count < 3) {
            return;
        }
        let Some((key, slots, uniform_offset)) = self.prepare_draw(mode) else { return };

        let call = if mode == Primitive::TriangleFan {
            let indices = self.fan_index_buffer(count);
            DrawCall::Fan {
                indices,
                count: mode.triangle_count(count) * 3,
                base_vertex: first as i32,
            }
        } else {
            DrawCall::Arrays { first, count }
        };

        self.ops.push(Op::Draw(DrawOp { key, slots, uniform_offset, call }));
    }
}
