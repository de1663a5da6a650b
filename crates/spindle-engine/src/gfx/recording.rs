use glam::{Mat4, Vec3};
use slotmap::SlotMap;

use crate::paint::Color;

use super::context::GraphicsContext;
use super::state::ContextState;
use super::types::{
    AttribPointer, BufferId, BufferTarget, Capability, ClearMask, Primitive, ProgramId, ShaderId,
    ShaderStage, Status, UniformLocation,
};

/// One call made against a [`RecordingContext`].
#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    CreateShader(ShaderId, ShaderStage),
    CompileShader { shader: ShaderId, ok: bool },
    DeleteShader(ShaderId),
    CreateProgram(ProgramId),
    LinkProgram { program: ProgramId, ok: bool },
    UseProgram(ProgramId),
    DeleteProgram(ProgramId),
    CreateBuffer(BufferId, BufferTarget),
    BufferData { buffer: BufferId, len: usize },
    DeleteBuffer(BufferId),
    VertexAttribPointer { location: u32, pointer: AttribPointer },
    UniformMatrix4 { location: UniformLocation, value: Mat4 },
    Uniform3f { location: UniformLocation, value: Vec3 },
    Enable(Capability),
    Disable(Capability),
    ClearColor(Color),
    Clear(ClearMask),
    DrawElements { mode: Primitive, count: u32, first: u32 },
    DrawArrays { mode: Primitive, first: u32, count: u32 },
}

impl GlCall {
    /// True for calls that allocate a GPU object.
    pub fn allocates(&self) -> bool {
        matches!(
            self,
            GlCall::CreateShader(..) | GlCall::CreateProgram(_) | GlCall::CreateBuffer(..)
        )
    }

    pub fn is_draw(&self) -> bool {
        matches!(self, GlCall::DrawElements { .. } | GlCall::DrawArrays { .. })
    }
}

/// Objects currently alive in a [`RecordingContext`].
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct LiveResources {
    pub shaders: usize,
    pub programs: usize,
    pub buffers: usize,
}

impl LiveResources {
    pub fn total(&self) -> usize {
        self.shaders + self.programs + self.buffers
    }
}

struct RecordedBuffer {
    target: BufferTarget,
    data: Vec<u8>,
}

/// Headless backend that validates and records every call.
///
/// Shader sources go through the same validation and reflection as the GPU
/// backend, so uniform and attribute lookups behave identically. Draws that
/// would be rejected by a driver (no program, unbound attributes, index range
/// outside the buffer) are logged and not recorded.
#[derive(Default)]
pub struct RecordingContext {
    state: ContextState,
    buffers: SlotMap<BufferId, RecordedBuffer>,
    calls: Vec<GlCall>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call recorded since creation (or the last [`take_calls`](Self::take_calls)).
    pub fn calls(&self) -> &[GlCall] {
        &self.calls
    }

    /// Drains the call log.
    pub fn take_calls(&mut self) -> Vec<GlCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn draw_calls(&self) -> usize {
        self.calls.iter().filter(|c| c.is_draw()).count()
    }

    pub fn live_resources(&self) -> LiveResources {
        LiveResources {
            shaders: self.state.shaders.len(),
            programs: self.state.programs.len(),
            buffers: self.buffers.len(),
        }
    }

    /// Contents last uploaded to `buffer`.
    pub fn buffer_contents(&self, buffer: BufferId) -> Option<&[u8]> {
        self.buffers.get(buffer).map(|b| b.data.as_slice())
    }

    pub fn current_program(&self) -> Option<ProgramId> {
        self.state.current
    }

    pub fn is_enabled(&self, capability: Capability) -> bool {
        match capability {
            Capability::DepthTest => self.state.depth_test,
            Capability::CullFace => self.state.cull_face,
        }
    }

    /// Raw bytes of `program`'s uniform block as the next draw would see them.
    pub fn uniform_data(&self, program: ProgramId) -> Option<&[u8]> {
        self.state
            .programs
            .get(program)
            .map(|p| p.uniform_data.as_slice())
    }

    fn draw_ready(&self) -> bool {
        let Some((_, _, linked)) = self.state.current_program() else {
            log::error!("draw call with no linked program in use; ignored");
            return false;
        };
        match self.state.bound_attributes(linked) {
            Ok(_) => true,
            Err(name) => {
                log::error!("draw call with attribute `{name}` unbound; ignored");
                false
            }
        }
    }
}

impl GraphicsContext for RecordingContext {
    fn create_shader(&mut self, stage: ShaderStage) -> ShaderId {
        let id = self.state.create_shader(stage);
        self.calls.push(GlCall::CreateShader(id, stage));
        id
    }

    fn compile_shader(&mut self, shader: ShaderId, source: &str) -> Status {
        let status = self.state.compile_shader(shader, source);
        self.calls.push(GlCall::CompileShader { shader, ok: status.ok });
        status
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        if self.state.delete_shader(shader) {
            self.calls.push(GlCall::DeleteShader(shader));
        }
    }

    fn create_program(&mut self) -> ProgramId {
        let id = self.state.create_program();
        self.calls.push(GlCall::CreateProgram(id));
        id
    }

    fn link_program(&mut self, program: ProgramId, vertex: ShaderId, fragment: ShaderId) -> Status {
        let status = self.state.link_program(program, vertex, fragment);
        self.calls.push(GlCall::LinkProgram { program, ok: status.ok });
        status
    }

    fn use_program(&mut self, program: ProgramId) {
        if self.state.use_program(program) {
            self.calls.push(GlCall::UseProgram(program));
        } else {
            log::error!("use_program on an unlinked program; ignored");
        }
    }

    fn delete_program(&mut self, program: ProgramId) {
        if self.state.delete_program(program) {
            self.calls.push(GlCall::DeleteProgram(program));
        }
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
        let id = self.buffers.insert(RecordedBuffer { target, data: Vec::new() });
        self.calls.push(GlCall::CreateBuffer(id, target));
        id
    }

    fn buffer_data(&mut self, buffer: BufferId, data: &[u8]) {
        let Some(buf) = self.buffers.get_mut(buffer) else {
            log::error!("buffer_data on an unknown buffer; ignored");
            return;
        };
        buf.data = data.to_vec();
        self.calls.push(GlCall::BufferData { buffer, len: data.len() });
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if self.buffers.remove(buffer).is_some() {
            self.state.attribs.retain(|_, p| p.buffer != buffer);
            self.calls.push(GlCall::DeleteBuffer(buffer));
        }
    }

    fn vertex_attrib_pointer(&mut self, location: u32, pointer: AttribPointer) {
        let valid = self
            .buffers
            .get(pointer.buffer)
            .is_some_and(|b| b.target == BufferTarget::Vertex);
        if !valid || !(1..=4).contains(&pointer.components) {
            log::error!("invalid attribute pointer for location {location}; ignored");
            return;
        }
        self.state.attribs.insert(location, pointer);
        self.calls.push(GlCall::VertexAttribPointer { location, pointer });
    }

    fn uniform_matrix4(&mut self, location: UniformLocation, value: &Mat4) {
        let cols = value.to_cols_array();
        if self.state.write_uniform(location, bytemuck::cast_slice(&cols)) {
            self.calls.push(GlCall::UniformMatrix4 { location, value: *value });
        }
    }

    fn uniform3f(&mut self, location: UniformLocation, value: Vec3) {
        let v = value.to_array();
        if self.state.write_uniform(location, bytemuck::cast_slice(&v)) {
            self.calls.push(GlCall::Uniform3f { location, value });
        }
    }

    fn enable(&mut self, capability: Capability) {
        self.state.set_capability(capability, true);
        self.calls.push(GlCall::Enable(capability));
    }

    fn disable(&mut self, capability: Capability) {
        self.state.set_capability(capability, false);
        self.calls.push(GlCall::Disable(capability));
    }

    fn clear_color(&mut self, color: Color) {
        self.state.clear_color = color;
        self.calls.push(GlCall::ClearColor(color));
    }

    fn clear(&mut self, mask: ClearMask) {
        self.calls.push(GlCall::Clear(mask));
    }

    fn draw_elements(&mut self, mode: Primitive, indices: BufferId, count: u32, first: u32) {
        let in_range = self.buffers.get(indices).is_some_and(|b| {
            b.target == BufferTarget::Index
                && (first as usize + count as usize) * 2 <= b.data.len()
        });
        if !in_range {
            log::error!("draw_elements range {first}+{count} outside the index buffer; ignored");
            return;
        }
        if self.draw_ready() {
            self.calls.push(GlCall::DrawElements { mode, count, first });
        }
    }

    fn draw_arrays(&mut self, mode: Primitive, first: u32, count: u32) {
        if self.draw_ready() {
            self.calls.push(GlCall::DrawArrays { mode, first, count });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VS: &str = r"
struct Uniforms {
    world: mat4x4<f32>,
};

@group(0) @binding(0) var<uniform> u: Uniforms;

@vertex
fn main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return u.world * vec4<f32>(position, 1.0);
}
";

    const FS: &str = r"
@fragment
fn main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0);
}
";

    fn linked_program(gl: &mut RecordingContext) -> ProgramId {
        let vs = gl.create_shader(ShaderStage::Vertex);
        assert!(gl.compile_shader(vs, VS).ok);
        let fs = gl.create_shader(ShaderStage::Fragment);
        assert!(gl.compile_shader(fs, FS).ok);
        let program = gl.create_program();
        assert!(gl.link_program(program, vs, fs).ok);
        gl.delete_shader(vs);
        gl.delete_shader(fs);
        program
    }

    #[test]
    fn link_fails_for_uncompiled_shader() {
        let mut gl = RecordingContext::new();
        let vs = gl.create_shader(ShaderStage::Vertex);
        let fs = gl.create_shader(ShaderStage::Fragment);
        assert!(gl.compile_shader(fs, FS).ok);
        let program = gl.create_program();
        let status = gl.link_program(program, vs, fs);
        assert!(!status.ok);
        assert!(status.log.contains("not compiled"));
    }

    #[test]
    fn uniform_writes_require_current_program() {
        let mut gl = RecordingContext::new();
        let program = linked_program(&mut gl);
        let loc = gl.uniform_location(program, "world").unwrap();

        gl.uniform_matrix4(loc, &Mat4::IDENTITY);
        assert!(!gl.calls().iter().any(|c| matches!(c, GlCall::UniformMatrix4 { .. })));

        gl.use_program(program);
        gl.uniform_matrix4(loc, &Mat4::from_scale(Vec3::splat(2.0)));
        let data = gl.uniform_data(program).unwrap();
        let first: f32 = bytemuck::pod_read_unaligned(&data[0..4]);
        assert_eq!(first, 2.0);
    }

    #[test]
    fn draw_without_bound_attribute_is_dropped() {
        let mut gl = RecordingContext::new();
        let program = linked_program(&mut gl);
        gl.use_program(program);
        gl.draw_arrays(Primitive::Triangles, 0, 3);
        assert_eq!(gl.draw_calls(), 0);

        let vbo = gl.create_buffer(BufferTarget::Vertex);
        gl.buffer_data(vbo, &[0; 36]);
        gl.vertex_attrib_pointer(
            0,
            AttribPointer { buffer: vbo, components: 3, stride: 12, offset: 0 },
        );
        gl.draw_arrays(Primitive::Triangles, 0, 3);
        assert_eq!(gl.draw_calls(), 1);
    }

    #[test]
    fn draw_elements_checks_index_range() {
        let mut gl = RecordingContext::new();
        let program = linked_program(&mut gl);
        gl.use_program(program);
        let vbo = gl.create_buffer(BufferTarget::Vertex);
        gl.buffer_data(vbo, &[0; 36]);
        gl.vertex_attrib_pointer(
            0,
            AttribPointer { buffer: vbo, components: 3, stride: 12, offset: 0 },
        );
        let ibo = gl.create_buffer(BufferTarget::Index);
        gl.buffer_data(ibo, bytemuck::cast_slice(&[0u16, 1, 2]));

        gl.draw_elements(Primitive::Triangles, ibo, 6, 0);
        assert_eq!(gl.draw_calls(), 0);
        gl.draw_elements(Primitive::Triangles, ibo, 3, 0);
        assert_eq!(gl.draw_calls(), 1);
    }

    #[test]
    fn deletes_are_tracked() {
        let mut gl = RecordingContext::new();
        let program = linked_program(&mut gl);
        let vbo = gl.create_buffer(BufferTarget::Vertex);
        assert_eq!(gl.live_resources(), LiveResources { shaders: 0, programs: 1, buffers: 1 });

        gl.delete_program(program);
        gl.delete_buffer(vbo);
        gl.delete_buffer(vbo);
        assert_eq!(gl.live_resources().total(), 0);
        let deletes = gl
            .calls()
            .iter()
            .filter(|c| matches!(c, GlCall::DeleteBuffer(_)))
            .count();
        assert_eq!(deletes, 1);
    }
}
