use crate::gfx::ShaderStage;

use super::scene::SceneState;

pub type RenderResult<T> = Result<T, RenderError>;

/// Failures of the renderer abstractions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    /// A shader stage failed to compile; `log` is the compiler diagnostic.
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: ShaderStage, log: String },

    /// Compiled stages could not be linked into a program.
    #[error("program failed to link:\n{log}")]
    Link { log: String },

    /// An index refers past the end of the vertex list.
    #[error("index {index} at position {position} is out of range for {vertex_count} vertices")]
    InvalidIndex {
        index: u16,
        position: usize,
        vertex_count: usize,
    },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The program reads an attribute the geometry does not provide.
    #[error("program reads attribute `{name}` but the geometry has no matching channel")]
    MissingAttribute { name: String },

    #[error("uniform `{name}` is not declared by the program")]
    UniformNotFound { name: String },

    /// Operation not allowed in the scene's current lifecycle state.
    #[error("cannot {action} a scene in state {state:?}")]
    InvalidState {
        action: &'static str,
        state: SceneState,
    },

    /// No window, adapter, device or surface could be obtained.
    #[error("graphics context unavailable: {0}")]
    ResourceUnavailable(String),
}

impl RenderError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        RenderError::InvalidParameter(msg.into())
    }
}
