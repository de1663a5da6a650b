//! WGSL validation and reflection shared by every backend.

use wgpu::naga;

use super::types::ShaderStage;

/// A uniform struct member.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UniformField {
    pub name: String,
    pub offset: u32,
    /// Bytes up to the next member (or the end of the block).
    pub size: u32,
}

/// The single uniform block of a program, bound at `@group(0) @binding(0)`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UniformBlock {
    pub size: u32,
    pub fields: Vec<UniformField>,
}

impl UniformBlock {
    pub fn field(&self, name: &str) -> Option<&UniformField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A vertex shader input.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AttributeInfo {
    pub name: String,
    pub location: u32,
}

/// A validated shader stage and what the rest of the pipeline needs to know about it.
#[derive(Debug, Clone)]
pub(crate) struct CompiledShader {
    pub stage: ShaderStage,
    pub source: String,
    pub entry_point: String,
    pub uniforms: Option<UniformBlock>,
    pub attributes: Vec<AttributeInfo>,
}

/// Parses and validates a WGSL source for `stage`.
///
/// The error string is a human-readable diagnostic with source context.
pub(crate) fn compile(stage: ShaderStage, source: &str) -> Result<CompiledShader, String> {
    if source.trim().is_empty() {
        return Err(format!("{stage} shader source is empty"));
    }

    let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|e| e.emit_to_string(source))?;

    let naga_stage = match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    };

    let entry = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == naga_stage)
        .ok_or_else(|| format!("no @{stage} entry point found"))?;

    let attributes = match stage {
        ShaderStage::Vertex => vertex_attributes(&module, entry),
        ShaderStage::Fragment => Vec::new(),
    };

    Ok(CompiledShader {
        stage,
        source: source.to_owned(),
        entry_point: entry.name.clone(),
        uniforms: uniform_block(&module)?,
        attributes,
    })
}

/// Merges the stage interfaces of a program.
///
/// Both stages may declare the uniform block, but then the layouts must agree.
pub(crate) fn link(
    vertex: &CompiledShader,
    fragment: &CompiledShader,
) -> Result<(Option<UniformBlock>, Vec<AttributeInfo>), String> {
    if vertex.stage != ShaderStage::Vertex {
        return Err(format!("expected a vertex shader, got a {} shader", vertex.stage));
    }
    if fragment.stage != ShaderStage::Fragment {
        return Err(format!("expected a fragment shader, got a {} shader", fragment.stage));
    }

    let uniforms = match (&vertex.uniforms, &fragment.uniforms) {
        (Some(v), Some(f)) if v != f => {
            return Err("uniform block layout differs between vertex and fragment stages".into());
        }
        (Some(v), _) => Some(v.clone()),
        (None, f) => f.clone(),
    };

    Ok((uniforms, vertex.attributes.clone()))
}

fn uniform_block(module: &naga::Module) -> Result<Option<UniformBlock>, String> {
    let mut block = None;

    for (_, var) in module.global_variables.iter() {
        if var.space != naga::AddressSpace::Uniform {
            continue;
        }
        let name = var.name.as_deref().unwrap_or("<unnamed>");

        match &var.binding {
            Some(naga::ResourceBinding { group: 0, binding: 0 }) => {}
            _ => return Err(format!("uniform `{name}` must be bound at @group(0) @binding(0)")),
        }
        if block.is_some() {
            return Err("only one uniform block is supported".into());
        }

        let naga::TypeInner::Struct { members, span } = &module.types[var.ty].inner else {
            return Err(format!("uniform `{name}` must be a struct"));
        };

        let fields = members
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let end = members.get(i + 1).map_or(*span, |next| next.offset);
                UniformField {
                    name: m.name.clone().unwrap_or_default(),
                    offset: m.offset,
                    size: end - m.offset,
                }
            })
            .collect();

        block = Some(UniformBlock { size: *span, fields });
    }

    Ok(block)
}

fn vertex_attributes(module: &naga::Module, entry: &naga::EntryPoint) -> Vec<AttributeInfo> {
    let mut out = Vec::new();

    for arg in &entry.function.arguments {
        match &arg.binding {
            Some(naga::Binding::Location { location, .. }) => out.push(AttributeInfo {
                name: arg.name.clone().unwrap_or_default(),
                location: *location,
            }),
            Some(naga::Binding::BuiltIn(_)) => {}
            // Inputs grouped in a struct carry their bindings on the members.
            None => {
                if let naga::TypeInner::Struct { members, .. } = &module.types[arg.ty].inner {
                    for m in members {
                        if let Some(naga::Binding::Location { location, .. }) = &m.binding {
                            out.push(AttributeInfo {
                                name: m.name.clone().unwrap_or_default(),
                                location: *location,
                            });
                        }
                    }
                }
            }
        }
    }

    out.sort_by_key(|a| a.location);
    out
}
