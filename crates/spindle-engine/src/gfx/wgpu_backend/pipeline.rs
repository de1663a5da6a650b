use std::num::NonZeroU64;

use crate::gfx::state::LinkedProgram;
use crate::gfx::types::{AttribPointer, Primitive, ProgramId};

pub(super) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// One vertex buffer slot: a single attribute read from its own buffer binding.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub(super) struct SlotLayout {
    pub location: u32,
    pub components: u32,
    pub stride: u32,
}

impl SlotLayout {
    pub fn from_pointer(location: u32, pointer: &AttribPointer) -> Self {
        // A zero stride means tightly packed.
        let stride = if pointer.stride == 0 { pointer.components * 4 } else { pointer.stride };
        Self { location, components: pointer.components, stride }
    }

    fn format(&self) -> wgpu::VertexFormat {
        match self.components {
            1 => wgpu::VertexFormat::Float32,
            2 => wgpu::VertexFormat::Float32x2,
            3 => wgpu::VertexFormat::Float32x3,
            _ => wgpu::VertexFormat::Float32x4,
        }
    }
}

/// Everything that selects a distinct render pipeline.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub(super) struct PipelineKey {
    pub program: ProgramId,
    pub topology: wgpu::PrimitiveTopology,
    pub slots: Vec<SlotLayout>,
    pub depth_test: bool,
    pub cull_face: bool,
}

pub(super) fn topology(mode: Primitive) -> wgpu::PrimitiveTopology {
    match mode {
        // Fans are expanded to lists before they reach the pipeline.
        Primitive::Triangles | Primitive::TriangleFan => wgpu::PrimitiveTopology::TriangleList,
        Primitive::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        Primitive::Lines => wgpu::PrimitiveTopology::LineList,
    }
}

/// Index list drawing a `count`-vertex fan as a triangle list, relative to the first vertex.
pub(super) fn fan_indices(count: u32) -> Vec<u32> {
    (1..count.saturating_sub(1))
        .flat_map(|i| [0, i, i + 1])
        .collect()
}

/// Device objects shared by every pipeline of one linked program.
pub(super) struct ProgramGpu {
    pub vertex: wgpu::ShaderModule,
    pub fragment: wgpu::ShaderModule,
    pub vertex_entry: String,
    pub fragment_entry: String,
    pub bind_group_layout: Option<wgpu::BindGroupLayout>,
    pub uniform_size: u64,
    pub layout: wgpu::PipelineLayout,
}

impl ProgramGpu {
    pub fn new(device: &wgpu::Device, linked: &LinkedProgram) -> Self {
        let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("spindle vertex shader"),
            source: wgpu::ShaderSource::Wgsl(linked.vertex.source.as_str().into()),
        });
        let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("spindle fragment shader"),
            source: wgpu::ShaderSource::Wgsl(linked.fragment.source.as_str().into()),
        });

        let uniform_size = linked.uniforms.as_ref().map_or(0, |b| u64::from(b.size));
        let bind_group_layout = NonZeroU64::new(uniform_size).map(|min_size| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("spindle uniforms bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: Some(min_size),
                    },
                    count: None,
                }],
            })
        });

        let layouts: Vec<&wgpu::BindGroupLayout> = bind_group_layout.iter().collect();
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("spindle pipeline layout"),
            bind_group_layouts: &layouts,
            immediate_size: 0,
        });

        Self {
            vertex,
            fragment,
            vertex_entry: linked.vertex.entry_point.clone(),
            fragment_entry: linked.fragment.entry_point.clone(),
            bind_group_layout,
            uniform_size,
            layout,
        }
    }

    pub fn create_pipeline(
        &self,
        device: &wgpu::Device,
        key: &PipelineKey,
        color_format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        let attributes: Vec<[wgpu::VertexAttribute; 1]> = key
            .slots
            .iter()
            .map(|s| {
                [wgpu::VertexAttribute {
                    format: s.format(),
                    offset: 0,
                    shader_location: s.location,
                }]
            })
            .collect();
        let buffers: Vec<wgpu::VertexBufferLayout<'_>> = key
            .slots
            .iter()
            .zip(&attributes)
            .map(|(s, attrs)| wgpu::VertexBufferLayout {
                array_stride: u64::from(s.stride),
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attrs,
            })
            .collect();

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("spindle pipeline"),
            layout: Some(&self.layout),

            vertex: wgpu::VertexState {
                module: &self.vertex,
                entry_point: Some(self.vertex_entry.as_str()),
                compilation_options: Default::default(),
                buffers: &buffers,
            },

            fragment: Some(wgpu::FragmentState {
                module: &self.fragment,
                entry_point: Some(self.fragment_entry.as_str()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: key.topology,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: key.cull_face.then_some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            // The pass always carries a depth attachment; a disabled test still needs a state.
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: key.depth_test,
                depth_compare: if key.depth_test {
                    wgpu::CompareFunction::Less
                } else {
                    wgpu::CompareFunction::Always
                },
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),

            multiview_mask: None,
            cache: None,
        })
    }
}
