use std::fmt;

use bitflags::bitflags;
use slotmap::new_key_type;

new_key_type! {
    /// Handle to a shader object.
    pub struct ShaderId;

    /// Handle to a program object.
    pub struct ProgramId;

    /// Handle to a buffer object.
    pub struct BufferId;
}

/// Programmable pipeline stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Binding target a buffer is created for.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferTarget {
    /// Vertex attribute data.
    Vertex,
    /// `u16` element indices.
    Index,
}

/// Opaque uniform handle returned by [`GraphicsContext::uniform_location`].
///
/// Locations are only valid for the program they were queried from.
///
/// [`GraphicsContext::uniform_location`]: super::GraphicsContext::uniform_location
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct UniformLocation {
    pub(crate) program: ProgramId,
    pub(crate) offset: u32,
    pub(crate) size: u32,
}

impl UniformLocation {
    /// Program this location belongs to.
    #[inline]
    pub fn program(&self) -> ProgramId {
        self.program
    }

    /// Byte offset inside the program's uniform block.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Bytes available to this uniform, including trailing padding.
    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }
}

/// Describes where a vertex attribute reads its data from.
///
/// All values are in bytes except `components` (number of `f32`s, 1..=4).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct AttribPointer {
    pub buffer: BufferId,
    pub components: u32,
    pub stride: u32,
    pub offset: u32,
}

/// Fixed-function state toggled with `enable` / `disable`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Capability {
    /// Depth testing against a depth buffer (`Less`).
    DepthTest,
    /// Back-face culling, counter-clockwise front faces.
    CullFace,
}

bitflags! {
    /// Buffers cleared by `clear`.
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
    pub struct ClearMask: u8 {
        const COLOR = 0b01;
        const DEPTH = 0b10;
    }
}

/// Primitive assembly mode for draw calls.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Primitive {
    Triangles,
    TriangleStrip,
    /// Every triangle shares the first vertex of the range.
    TriangleFan,
    Lines,
}

impl Primitive {
    /// Number of triangles produced by `count` vertices (or indices).
    pub fn triangle_count(self, count: u32) -> u32 {
        match self {
            Primitive::Triangles => count / 3,
            Primitive::TriangleStrip | Primitive::TriangleFan => count.saturating_sub(2),
            Primitive::Lines => 0,
        }
    }
}

/// Result of a compile or link step, mirroring a driver's status + info log.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Status {
    pub ok: bool,
    pub log: String,
}

impl Status {
    pub(crate) fn success() -> Self {
        Self { ok: true, log: String::new() }
    }

    pub(crate) fn failure(log: impl Into<String>) -> Self {
        Self { ok: false, log: log.into() }
    }
}
