//! Backend-independent object bookkeeping: shaders, programs, current state.

use std::collections::BTreeMap;

use slotmap::SlotMap;

use crate::paint::Color;

use super::reflect::{self, AttributeInfo, CompiledShader, UniformBlock};
use super::types::{
    AttribPointer, Capability, ProgramId, ShaderId, ShaderStage, Status, UniformLocation,
};

pub(crate) struct ShaderObject {
    pub stage: ShaderStage,
    pub compiled: Option<CompiledShader>,
}

/// What a program keeps after a successful link.
pub(crate) struct LinkedProgram {
    pub vertex: CompiledShader,
    pub fragment: CompiledShader,
    pub uniforms: Option<UniformBlock>,
    pub attributes: Vec<AttributeInfo>,
}

pub(crate) struct ProgramObject {
    pub linked: Option<LinkedProgram>,
    /// CPU copy of the uniform block; uniforms persist until overwritten.
    pub uniform_data: Vec<u8>,
}

/// State every backend tracks the same way.
pub(crate) struct ContextState {
    pub shaders: SlotMap<ShaderId, ShaderObject>,
    pub programs: SlotMap<ProgramId, ProgramObject>,
    pub current: Option<ProgramId>,
    pub attribs: BTreeMap<u32, AttribPointer>,
    pub depth_test: bool,
    pub cull_face: bool,
    pub clear_color: Color,
}

impl Default for ContextState {
    fn default() -> Self {
        Self {
            shaders: SlotMap::with_key(),
            programs: SlotMap::with_key(),
            current: None,
            attribs: BTreeMap::new(),
            depth_test: false,
            cull_face: false,
            clear_color: Color::BLACK,
        }
    }
}

impl ContextState {
    pub fn create_shader(&mut self, stage: ShaderStage) -> ShaderId {
        self.shaders.insert(ShaderObject { stage, compiled: None })
    }

    pub fn compile_shader(&mut self, shader: ShaderId, source: &str) -> Status {
        let Some(obj) = self.shaders.get_mut(shader) else {
            return Status::failure("invalid shader handle");
        };

        match reflect::compile(obj.stage, source) {
            Ok(compiled) => {
                obj.compiled = Some(compiled);
                Status::success()
            }
            Err(log) => {
                obj.compiled = None;
                Status::failure(log)
            }
        }
    }

    pub fn delete_shader(&mut self, shader: ShaderId) -> bool {
        self.shaders.remove(shader).is_some()
    }

    pub fn create_program(&mut self) -> ProgramId {
        self.programs.insert(ProgramObject { linked: None, uniform_data: Vec::new() })
    }

    pub fn link_program(&mut self, program: ProgramId, vertex: ShaderId, fragment: ShaderId) -> Status {
        let compiled = |id: ShaderId| -> Result<&CompiledShader, String> {
            let obj = self.shaders.get(id).ok_or("invalid shader handle")?;
            obj.compiled
                .as_ref()
                .ok_or_else(|| format!("{} shader is not compiled", obj.stage))
        };

        let linked = compiled(vertex).and_then(|vs| {
            let fs = compiled(fragment)?;
            let (uniforms, attributes) = reflect::link(vs, fs)?;
            Ok(LinkedProgram {
                vertex: vs.clone(),
                fragment: fs.clone(),
                uniforms,
                attributes,
            })
        });

        let Some(obj) = self.programs.get_mut(program) else {
            return Status::failure("invalid program handle");
        };

        match linked {
            Ok(linked) => {
                let size = linked.uniforms.as_ref().map_or(0, |b| b.size as usize);
                obj.uniform_data = vec![0; size];
                obj.linked = Some(linked);
                Status::success()
            }
            Err(log) => {
                obj.linked = None;
                obj.uniform_data.clear();
                Status::failure(log)
            }
        }
    }

    pub fn use_program(&mut self, program: ProgramId) -> bool {
        let linked = self
            .programs
            .get(program)
            .is_some_and(|p| p.linked.is_some());
        if linked {
            self.current = Some(program);
        }
        linked
    }

    pub fn delete_program(&mut self, program: ProgramId) -> bool {
        if self.current == Some(program) {
            self.current = None;
        }
        self.programs.remove(program).is_some()
    }

    pub fn linked(&self, program: ProgramId) -> Option<&LinkedProgram> {
        self.programs.get(program)?.linked.as_ref()
    }

    pub fn active_uniforms(&self, program: ProgramId) -> Vec<String> {
        self.linked(program)
            .and_then(|p| p.uniforms.as_ref())
            .map(|b| b.fields.iter().map(|f| f.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn active_attributes(&self, program: ProgramId) -> Vec<(String, u32)> {
        self.linked(program)
            .map(|p| p.attributes.iter().map(|a| (a.name.clone(), a.location)).collect())
            .unwrap_or_default()
    }

    pub fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let field = self.linked(program)?.uniforms.as_ref()?.field(name)?;
        Some(UniformLocation {
            program,
            offset: field.offset,
            size: field.size,
        })
    }

    pub fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        self.linked(program)?
            .attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.location)
    }

    /// Writes `bytes` into the current program's uniform block.
    ///
    /// Returns `false` (and leaves state untouched) if `location` belongs to a
    /// program that is not current or does not fit.
    pub fn write_uniform(&mut self, location: UniformLocation, bytes: &[u8]) -> bool {
        if self.current != Some(location.program) {
            log::warn!("uniform write for a program that is not current; ignored");
            return false;
        }
        if bytes.len() > location.size as usize {
            log::warn!(
                "uniform write of {} bytes exceeds its {} byte slot; ignored",
                bytes.len(),
                location.size
            );
            return false;
        }
        let Some(obj) = self.programs.get_mut(location.program) else { return false };

        let start = location.offset as usize;
        let Some(slot) = obj.uniform_data.get_mut(start..start + bytes.len()) else {
            return false;
        };
        slot.copy_from_slice(bytes);
        true
    }

    pub fn set_capability(&mut self, capability: Capability, on: bool) {
        match capability {
            Capability::DepthTest => self.depth_test = on,
            Capability::CullFace => self.cull_face = on,
        }
    }

    /// Current program and its linked interface, if one is bound.
    pub fn current_program(&self) -> Option<(ProgramId, &ProgramObject, &LinkedProgram)> {
        let id = self.current?;
        let obj = self.programs.get(id)?;
        let linked = obj.linked.as_ref()?;
        Some((id, obj, linked))
    }

    /// Attribute pointers for every input the current program reads.
    ///
    /// Returns the name of the first input with no pointer bound.
    pub fn bound_attributes(&self, linked: &LinkedProgram) -> Result<Vec<(u32, AttribPointer)>, String> {
        linked
            .attributes
            .iter()
            .map(|a| {
                self.attribs
                    .get(&a.location)
                    .map(|p| (a.location, *p))
                    .ok_or_else(|| a.name.clone())
            })
            .collect()
    }
}
