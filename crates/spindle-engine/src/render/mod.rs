//! Renderer abstractions over a [`GraphicsContext`](crate::gfx::GraphicsContext).
//!
//! Each type owns one kind of context resource with an explicit
//! create / upload / release lifecycle:
//! - [`ShaderProgram`]: one linked program.
//! - [`GeometryBuffer`]: one vertex buffer and an optional index buffer.
//! - [`Scene`]: a program, a camera and spinning objects, drawn once per tick.
//!
//! Conventions:
//! - Matrices are column-major, right-handed, depth range `0..1`.
//! - World matrix is `translate · rotate`.
//! - Counter-clockwise triangles face the viewer.

mod camera;
mod command;
mod error;
mod geometry;
mod program;
mod scene;
mod transform;

pub use camera::{look_at, perspective, Camera, CameraConfig};
pub use command::{CommandSender, SceneCommand};
pub use error::{RenderError, RenderResult};
pub use geometry::{
    AttributeLayout, AttributeNames, Channel, GeometryBuffer, GeometryData, MAX_INDEXED_VERTICES,
};
pub use program::ShaderProgram;
pub use scene::{
    FrameStats, ProgramSource, Scene, SceneConfig, SceneObjectDesc, SceneState, UniformNames,
};
pub use transform::{Spin, Transform};
