use std::collections::HashMap;

use crate::gfx::{GraphicsContext, ProgramId, ShaderStage, UniformLocation};

use super::error::{RenderError, RenderResult};

/// A linked vertex + fragment program and the interface it exposes.
///
/// Owns one program object on the context; call [`release`](Self::release)
/// when done. Dropping without releasing leaks the object.
#[derive(Debug)]
pub struct ShaderProgram {
    id: ProgramId,
    uniforms: HashMap<String, UniformLocation>,
    attributes: Vec<(String, u32)>,
}

impl ShaderProgram {
    /// Compiles both stages and links them.
    ///
    /// Diagnostics are logged and returned in the error. Nothing stays
    /// allocated on failure; the transient shader objects are deleted in every
    /// case.
    pub fn compile<G>(gl: &mut G, vertex_src: &str, fragment_src: &str) -> RenderResult<Self>
    where
        G: GraphicsContext + ?Sized,
    {
        let vs = compile_stage(gl, ShaderStage::Vertex, vertex_src)?;
        let fs = match compile_stage(gl, ShaderStage::Fragment, fragment_src) {
            Ok(fs) => fs,
            Err(e) => {
                gl.delete_shader(vs);
                return Err(e);
            }
        };

        let id = gl.create_program();
        let status = gl.link_program(id, vs, fs);
        gl.delete_shader(vs);
        gl.delete_shader(fs);

        if !status.ok {
            log::error!("program link failed:\n{}", status.log);
            gl.delete_program(id);
            return Err(RenderError::Link { log: status.log });
        }

        let uniforms = gl
            .active_uniforms(id)
            .into_iter()
            .filter_map(|name| {
                let loc = gl.uniform_location(id, &name)?;
                Some((name, loc))
            })
            .collect::<HashMap<_, _>>();
        let attributes = gl.active_attributes(id);

        log::debug!(
            "program linked: uniforms {:?}, attributes {:?}",
            uniforms.keys().collect::<Vec<_>>(),
            attributes
        );

        Ok(Self { id, uniforms, attributes })
    }

    /// Makes this program current.
    pub fn bind<G: GraphicsContext + ?Sized>(&self, gl: &mut G) {
        gl.use_program(self.id);
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn uniform_location(&self, name: &str) -> RenderResult<UniformLocation> {
        self.uniforms
            .get(name)
            .copied()
            .ok_or_else(|| RenderError::UniformNotFound { name: name.to_owned() })
    }

    pub fn has_uniform(&self, name: &str) -> bool {
        self.uniforms.contains_key(name)
    }

    pub fn attrib_location(&self, name: &str) -> Option<u32> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, loc)| *loc)
    }

    /// Attributes (name, location) the vertex stage reads, in location order.
    pub fn attributes(&self) -> &[(String, u32)] {
        &self.attributes
    }

    pub fn release<G: GraphicsContext + ?Sized>(self, gl: &mut G) {
        gl.delete_program(self.id);
    }
}

fn compile_stage<G>(gl: &mut G, stage: ShaderStage, source: &str) -> RenderResult<crate::gfx::ShaderId>
where
    G: GraphicsContext + ?Sized,
{
    let shader = gl.create_shader(stage);
    let status = gl.compile_shader(shader, source);
    if status.ok {
        return Ok(shader);
    }

    log::error!("{stage} shader compile failed:\n{}", status.log);
    gl.delete_shader(shader);
    Err(RenderError::Compile { stage, log: status.log })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{GlCall, RecordingContext};

    const VS: &str = r"
struct Uniforms {
    world: mat4x4<f32>,
    color: vec3<f32>,
};

@group(0) @binding(0) var<uniform> u: Uniforms;

@vertex
fn main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return u.world * vec4<f32>(position, 1.0);
}
";

    const FS: &str = r"
struct Uniforms {
    world: mat4x4<f32>,
    color: vec3<f32>,
};

@group(0) @binding(0) var<uniform> u: Uniforms;

@fragment
fn main() -> @location(0) vec4<f32> {
    return vec4<f32>(u.color, 1.0);
}
";

    #[test]
    fn compiles_and_reflects_interface() {
        let mut gl = RecordingContext::new();
        let program = ShaderProgram::compile(&mut gl, VS, FS).unwrap();

        assert!(program.uniform_location("world").is_ok());
        assert!(program.uniform_location("color").is_ok());
        assert_eq!(program.attrib_location("position"), Some(0));
        assert_eq!(program.attrib_location("normal"), None);

        // Shaders are detached and deleted once linked.
        assert_eq!(gl.live_resources().shaders, 0);
        assert_eq!(gl.live_resources().programs, 1);

        program.release(&mut gl);
        assert_eq!(gl.live_resources().total(), 0);
    }

    #[test]
    fn unknown_uniform_is_an_error() {
        let mut gl = RecordingContext::new();
        let program = ShaderProgram::compile(&mut gl, VS, FS).unwrap();
        assert_eq!(
            program.uniform_location("projection"),
            Err(RenderError::UniformNotFound { name: "projection".into() })
        );
    }

    #[test]
    fn compile_failure_reports_stage_and_frees_shaders() {
        let mut gl = RecordingContext::new();
        let err = ShaderProgram::compile(&mut gl, VS, "@fragment fn main( {").unwrap_err();
        match err {
            RenderError::Compile { stage, log } => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(gl.live_resources().total(), 0);
        assert!(!gl.calls().iter().any(|c| matches!(c, GlCall::CreateProgram(_))));
    }

    #[test]
    fn mismatched_uniform_layouts_fail_to_link() {
        let fs = FS.replace("color", "tint");
        let mut gl = RecordingContext::new();
        let err = ShaderProgram::compile(&mut gl, VS, &fs).unwrap_err();
        assert!(matches!(err, RenderError::Link { .. }), "{err:?}");
        assert_eq!(gl.live_resources().total(), 0);
    }
}
