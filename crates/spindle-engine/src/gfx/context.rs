use glam::{Mat4, Vec3};

use crate::paint::Color;

use super::types::{
    AttribPointer, BufferId, BufferTarget, Capability, ClearMask, Primitive, ProgramId, ShaderId,
    ShaderStage, Status, UniformLocation,
};

/// GL-shaped capability set the renderer is written against.
///
/// Semantics follow the WebGL model the demos were written for:
/// - objects are created empty and filled later (`create_*` then
///   `compile_shader` / `link_program` / `buffer_data`)
/// - `use_program`, `vertex_attrib_pointer`, `enable` and uniform writes
///   mutate current state that the next draw call reads
/// - nothing is freed implicitly; every `create_*` needs a matching `delete_*`
///
/// Invalid calls (unknown handles, locations of another program, out of range
/// draws) are logged and ignored, like a GL error flag nobody reads.
pub trait GraphicsContext {
    fn create_shader(&mut self, stage: ShaderStage) -> ShaderId;

    /// Compiles `source` into `shader`. Compile diagnostics are in the status log.
    fn compile_shader(&mut self, shader: ShaderId, source: &str) -> Status;

    fn delete_shader(&mut self, shader: ShaderId);

    fn create_program(&mut self) -> ProgramId;

    /// Links a compiled vertex and fragment shader into `program`.
    ///
    /// The shaders may be deleted after linking; the program keeps what it needs.
    fn link_program(&mut self, program: ProgramId, vertex: ShaderId, fragment: ShaderId)
        -> Status;

    /// Makes `program` current for uniform writes and draws.
    fn use_program(&mut self, program: ProgramId);

    fn delete_program(&mut self, program: ProgramId);

    /// Names of the uniforms a linked program declares.
    fn active_uniforms(&self, program: ProgramId) -> Vec<String>;

    /// Attributes (name, location) a linked program reads.
    fn active_attributes(&self, program: ProgramId) -> Vec<(String, u32)>;

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32>;

    fn create_buffer(&mut self, target: BufferTarget) -> BufferId;

    /// Replaces the whole content of `buffer`.
    fn buffer_data(&mut self, buffer: BufferId, data: &[u8]);

    fn delete_buffer(&mut self, buffer: BufferId);

    /// Points attribute `location` at `pointer` for subsequent draws.
    fn vertex_attrib_pointer(&mut self, location: u32, pointer: AttribPointer);

    fn uniform_matrix4(&mut self, location: UniformLocation, value: &Mat4);

    fn uniform3f(&mut self, location: UniformLocation, value: Vec3);

    fn enable(&mut self, capability: Capability);

    fn disable(&mut self, capability: Capability);

    fn clear_color(&mut self, color: Color);

    fn clear(&mut self, mask: ClearMask);

    /// Draws `count` indices of the `u16` index buffer `indices`, starting at index `first`.
    fn draw_elements(&mut self, mode: Primitive, indices: BufferId, count: u32, first: u32);

    /// Draws `count` vertices starting at vertex `first`.
    fn draw_arrays(&mut self, mode: Primitive, first: u32, count: u32);
}
