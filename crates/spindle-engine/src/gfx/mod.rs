//! Graphics context abstraction.
//!
//! Renderers never touch a GPU API directly. They talk to a [`GraphicsContext`],
//! a small GL-shaped capability set with two implementations:
//! - [`WgpuContext`] records calls during a frame and replays them into a wgpu
//!   render pass on [`WgpuContext::flush`]
//! - [`RecordingContext`] is headless and keeps a log of every call
//!
//! Both backends share shader validation and reflection (naga, through the
//! `wgpu::naga` re-export), so a program that links headless links on the GPU.
//!
//! Shader conventions (WGSL):
//! - one `@vertex` / `@fragment` entry point per source
//! - all uniforms live in a single struct bound at `@group(0) @binding(0)`;
//!   struct member names are the uniform names
//! - vertex attributes are `@location(n)` arguments of the vertex entry point

mod context;
mod recording;
mod reflect;
mod state;
mod types;
mod wgpu_backend;

pub use context::GraphicsContext;
pub use recording::{GlCall, LiveResources, RecordingContext};
pub use reflect::{AttributeInfo, UniformBlock, UniformField};
pub use types::{
    AttribPointer,
    BufferId,
    BufferTarget,
    Capability,
    ClearMask,
    Primitive,
    ProgramId,
    ShaderId,
    ShaderStage,
    Status,
    UniformLocation,
};
pub use wgpu_backend::WgpuContext;
