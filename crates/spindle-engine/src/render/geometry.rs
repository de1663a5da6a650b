use crate::gfx::{AttribPointer, BufferId, BufferTarget, GraphicsContext, Primitive};

use super::error::{RenderError, RenderResult};
use super::program::ShaderProgram;

/// Largest vertex count addressable by `u16` indices.
pub const MAX_INDEXED_VERTICES: usize = u16::MAX as usize + 1;

/// CPU-side mesh: positions, optional per-vertex colors and triangle indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryData {
    pub positions: Vec<[f32; 3]>,
    pub colors: Option<Vec<[f32; 3]>>,
    pub indices: Vec<u16>,
}

impl GeometryData {
    pub fn new(positions: Vec<[f32; 3]>, indices: Vec<u16>) -> Self {
        Self { positions, colors: None, indices }
    }

    pub fn with_colors(mut self, colors: Vec<[f32; 3]>) -> Self {
        self.colors = Some(colors);
        self
    }

    /// Axis-aligned cube centered on the origin, one flat color per face.
    ///
    /// 24 vertices (4 per face, so faces do not share colors) and 36 indices,
    /// counter-clockwise when seen from outside.
    pub fn cube(edge: f32) -> Self {
        let h = edge * 0.5;

        #[rustfmt::skip]
        let positions = vec![
            // front (+z)
            [-h, -h,  h], [ h, -h,  h], [ h,  h,  h], [-h,  h,  h],
            // back (-z)
            [-h, -h, -h], [-h,  h, -h], [ h,  h, -h], [ h, -h, -h],
            // top (+y)
            [-h,  h, -h], [-h,  h,  h], [ h,  h,  h], [ h,  h, -h],
            // bottom (-y)
            [-h, -h, -h], [ h, -h, -h], [ h, -h,  h], [-h, -h,  h],
            // right (+x)
            [ h, -h, -h], [ h,  h, -h], [ h,  h,  h], [ h, -h,  h],
            // left (-x)
            [-h, -h, -h], [-h, -h,  h], [-h,  h,  h], [-h,  h, -h],
        ];

        const FACE_COLORS: [[f32; 3]; 6] = [
            [1.0, 1.0, 1.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 1.0, 0.0],
            [1.0, 0.0, 1.0],
        ];
        let colors = FACE_COLORS.iter().flat_map(|c| [*c; 4]).collect();

        let indices = (0..6u16)
            .flat_map(|face| {
                let b = face * 4;
                [b, b + 1, b + 2, b, b + 2, b + 3]
            })
            .collect();

        Self::new(positions, indices).with_colors(colors)
    }

    /// Triangle fan around `center` through every point of `ring`, closed back
    /// onto the first ring point. Has no indices; upload with
    /// [`GeometryBuffer::upload_fan`].
    pub fn polygon_fan(center: [f32; 3], ring: &[[f32; 3]]) -> Self {
        let mut positions = Vec::with_capacity(ring.len() + 2);
        positions.push(center);
        positions.extend_from_slice(ring);
        if let Some(first) = ring.first() {
            positions.push(*first);
        }
        Self::new(positions, Vec::new())
    }

    /// Regular polygon of `sides` vertices, `radius` from the origin in the XY plane.
    pub fn regular_polygon(sides: u16, radius: f32) -> Self {
        let ring: Vec<[f32; 3]> = (0..sides)
            .map(|i| {
                let a = std::f32::consts::TAU * f32::from(i) / f32::from(sides.max(1));
                [radius * a.cos(), radius * a.sin(), 0.0]
            })
            .collect();
        Self::polygon_fan([0.0; 3], &ring)
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    fn validate_vertices(&self) -> RenderResult<()> {
        if self.positions.is_empty() {
            return Err(RenderError::invalid("geometry has no vertices"));
        }
        if self.positions.iter().flatten().any(|v| !v.is_finite()) {
            return Err(RenderError::invalid("vertex positions must be finite"));
        }
        if let Some(colors) = &self.colors {
            if colors.len() != self.positions.len() {
                return Err(RenderError::invalid(format!(
                    "{} colors for {} vertices",
                    colors.len(),
                    self.positions.len()
                )));
            }
        }
        Ok(())
    }

    /// Checks everything an indexed upload relies on.
    pub fn validate_indexed(&self) -> RenderResult<()> {
        self.validate_vertices()?;
        let vertex_count = self.positions.len();
        if vertex_count > MAX_INDEXED_VERTICES {
            return Err(RenderError::invalid(format!(
                "{vertex_count} vertices exceed the u16 index range"
            )));
        }
        if self.indices.is_empty() || self.indices.len() % 3 != 0 {
            return Err(RenderError::invalid(format!(
                "index count {} is not a positive multiple of 3",
                self.indices.len()
            )));
        }
        if let Some((position, &index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|(_, i)| usize::from(**i) >= vertex_count)
        {
            return Err(RenderError::InvalidIndex { index, position, vertex_count });
        }
        Ok(())
    }

    /// Checks everything a fan upload relies on.
    pub fn validate_fan(&self) -> RenderResult<()> {
        self.validate_vertices()?;
        if self.positions.len() < 3 {
            return Err(RenderError::invalid("a triangle fan needs at least 3 vertices"));
        }
        if !self.indices.is_empty() {
            return Err(RenderError::invalid("fan geometry is drawn without indices"));
        }
        Ok(())
    }

    fn interleaved(&self) -> (Vec<f32>, Vec<AttributeLayout>) {
        let has_color = self.colors.is_some();
        let floats_per_vertex = if has_color { 6 } else { 3 };
        let stride = floats_per_vertex * 4;

        let mut data = Vec::with_capacity(self.positions.len() * floats_per_vertex as usize);
        for (i, p) in self.positions.iter().enumerate() {
            data.extend_from_slice(p);
            if let Some(colors) = &self.colors {
                data.extend_from_slice(&colors[i]);
            }
        }

        let mut layouts = vec![AttributeLayout {
            channel: Channel::Position,
            components: 3,
            stride,
            offset: 0,
        }];
        if has_color {
            layouts.push(AttributeLayout {
                channel: Channel::Color,
                components: 3,
                stride,
                offset: 12,
            });
        }
        (data, layouts)
    }
}

/// Vertex data channel a geometry can provide.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Channel {
    Position,
    Color,
}

/// Where one channel lives in the interleaved vertex buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AttributeLayout {
    pub channel: Channel,
    pub components: u32,
    pub stride: u32,
    pub offset: u32,
}

/// Shader attribute names mapped to geometry channels.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AttributeNames {
    pub position: String,
    pub color: String,
}

impl Default for AttributeNames {
    fn default() -> Self {
        Self {
            position: "position".to_string(),
            color: "color".to_string(),
        }
    }
}

impl AttributeNames {
    fn channel(&self, name: &str) -> Option<Channel> {
        if name == self.position {
            Some(Channel::Position)
        } else if name == self.color {
            Some(Channel::Color)
        } else {
            None
        }
    }
}

/// Immutable geometry resident in context buffers.
///
/// Owns one vertex buffer and, for indexed geometry, one index buffer; call
/// [`release`](Self::release) when done.
#[derive(Debug)]
pub struct GeometryBuffer {
    vertex_buffer: BufferId,
    index_buffer: Option<BufferId>,
    layouts: Vec<AttributeLayout>,
    mode: Primitive,
    count: u32,
}

impl GeometryBuffer {
    /// Validates and uploads indexed triangle geometry.
    ///
    /// Nothing is allocated when validation fails.
    pub fn upload<G>(gl: &mut G, data: &GeometryData) -> RenderResult<Self>
    where
        G: GraphicsContext + ?Sized,
    {
        data.validate_indexed()?;

        let (vertices, layouts) = data.interleaved();
        let vertex_buffer = gl.create_buffer(BufferTarget::Vertex);
        gl.buffer_data(vertex_buffer, bytemuck::cast_slice(&vertices));
        let index_buffer = gl.create_buffer(BufferTarget::Index);
        gl.buffer_data(index_buffer, bytemuck::cast_slice(&data.indices));

        log::debug!(
            "geometry uploaded: {} vertices, {} indices",
            data.vertex_count(),
            data.indices.len()
        );

        Ok(Self {
            vertex_buffer,
            index_buffer: Some(index_buffer),
            layouts,
            mode: Primitive::Triangles,
            count: data.indices.len() as u32,
        })
    }

    /// Validates and uploads a non-indexed triangle fan.
    pub fn upload_fan<G>(gl: &mut G, data: &GeometryData) -> RenderResult<Self>
    where
        G: GraphicsContext + ?Sized,
    {
        data.validate_fan()?;

        let (vertices, layouts) = data.interleaved();
        let vertex_buffer = gl.create_buffer(BufferTarget::Vertex);
        gl.buffer_data(vertex_buffer, bytemuck::cast_slice(&vertices));

        log::debug!("fan geometry uploaded: {} vertices", data.vertex_count());

        Ok(Self {
            vertex_buffer,
            index_buffer: None,
            layouts,
            mode: Primitive::TriangleFan,
            count: data.vertex_count() as u32,
        })
    }

    pub fn triangle_count(&self) -> u32 {
        self.mode.triangle_count(self.count)
    }

    /// Elements one draw consumes: indices for indexed geometry, vertices for fans.
    pub fn element_count(&self) -> u32 {
        self.count
    }

    pub fn is_indexed(&self) -> bool {
        self.index_buffer.is_some()
    }

    pub fn layouts(&self) -> &[AttributeLayout] {
        &self.layouts
    }

    pub fn layout(&self, channel: Channel) -> Option<&AttributeLayout> {
        self.layouts.iter().find(|l| l.channel == channel)
    }

    /// Checks that this geometry can feed every attribute `program` reads.
    pub fn check_attributes(&self, program: &ShaderProgram, names: &AttributeNames) -> RenderResult<()> {
        self.attribute_pointers(program, names).map(|_| ())
    }

    /// Points every attribute `program` reads at this geometry's buffer.
    ///
    /// Fails before touching the context when the program reads an attribute
    /// this geometry cannot feed.
    pub fn bind_attributes<G>(
        &self,
        gl: &mut G,
        program: &ShaderProgram,
        names: &AttributeNames,
    ) -> RenderResult<()>
    where
        G: GraphicsContext + ?Sized,
    {
        for (location, pointer) in self.attribute_pointers(program, names)? {
            gl.vertex_attrib_pointer(location, pointer);
        }
        Ok(())
    }

    fn attribute_pointers(
        &self,
        program: &ShaderProgram,
        names: &AttributeNames,
    ) -> RenderResult<Vec<(u32, AttribPointer)>> {
        program
            .attributes()
            .iter()
            .map(|(name, location)| {
                let layout = names
                    .channel(name)
                    .and_then(|c| self.layout(c))
                    .ok_or_else(|| RenderError::MissingAttribute { name: name.clone() })?;
                Ok((
                    *location,
                    AttribPointer {
                        buffer: self.vertex_buffer,
                        components: layout.components,
                        stride: layout.stride,
                        offset: layout.offset,
                    },
                ))
            })
            .collect()
    }

    /// Issues one draw call over the full element range.
    pub fn draw<G: GraphicsContext + ?Sized>(&self, gl: &mut G) {
        match self.index_buffer {
            Some(indices) => gl.draw_elements(self.mode, indices, self.count, 0),
            None => gl.draw_arrays(self.mode, 0, self.count),
        }
    }

    pub fn release<G: GraphicsContext + ?Sized>(self, gl: &mut G) {
        gl.delete_buffer(self.vertex_buffer);
        if let Some(indices) = self.index_buffer {
            gl.delete_buffer(indices);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{GlCall, RecordingContext};

    fn triangle() -> GeometryData {
        GeometryData::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![0, 1, 2],
        )
    }

    // ── upload ──────────────────────────────────────────────────────────

    #[test]
    fn cube_uploads_twelve_triangles() {
        let mut gl = RecordingContext::new();
        let cube = GeometryData::cube(2.0);
        assert_eq!(cube.vertex_count(), 24);

        let buffer = GeometryBuffer::upload(&mut gl, &cube).unwrap();
        assert_eq!(buffer.element_count(), 36);
        assert_eq!(buffer.triangle_count(), 12);
        assert_eq!(gl.live_resources().buffers, 2);

        let color = buffer.layout(Channel::Color).unwrap();
        assert_eq!((color.stride, color.offset), (24, 12));
    }

    #[test]
    fn triangle_count_is_a_third_of_the_indices() {
        let mut gl = RecordingContext::new();
        let quad = GeometryData::new(
            vec![[0.0; 3], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            vec![0, 1, 2, 0, 2, 3],
        );
        let buffer = GeometryBuffer::upload(&mut gl, &quad).unwrap();
        assert_eq!(buffer.triangle_count(), 2);
        assert!(buffer.layout(Channel::Color).is_none());
        assert_eq!(buffer.layout(Channel::Position).unwrap().stride, 12);
    }

    #[test]
    fn out_of_range_index_fails_without_gpu_calls() {
        let mut gl = RecordingContext::new();
        let mut data = triangle();
        data.indices[2] = 3;

        let err = GeometryBuffer::upload(&mut gl, &data).unwrap_err();
        assert_eq!(err, RenderError::InvalidIndex { index: 3, position: 2, vertex_count: 3 });
        assert!(gl.calls().is_empty());
    }

    #[test]
    fn color_count_must_match_vertices() {
        let mut gl = RecordingContext::new();
        let data = triangle().with_colors(vec![[1.0, 0.0, 0.0]; 2]);
        let err = GeometryBuffer::upload(&mut gl, &data).unwrap_err();
        assert!(matches!(err, RenderError::InvalidParameter(_)));
        assert!(gl.calls().is_empty());
    }

    #[test]
    fn index_count_must_be_whole_triangles() {
        let mut data = triangle();
        data.indices.push(0);
        assert!(matches!(data.validate_indexed(), Err(RenderError::InvalidParameter(_))));
        data.indices.clear();
        assert!(matches!(data.validate_indexed(), Err(RenderError::InvalidParameter(_))));
    }

    #[test]
    fn upload_writes_interleaved_vertices() {
        let mut gl = RecordingContext::new();
        let data = triangle().with_colors(vec![[0.5, 0.25, 1.0]; 3]);
        GeometryBuffer::upload(&mut gl, &data).unwrap();

        let Some(GlCall::CreateBuffer(vbo, BufferTarget::Vertex)) = gl.calls().first().cloned() else {
            panic!("vertex buffer not created first");
        };
        let floats: &[f32] = bytemuck::cast_slice(gl.buffer_contents(vbo).unwrap());
        assert_eq!(&floats[..6], &[0.0, 0.0, 0.0, 0.5, 0.25, 1.0]);
        assert_eq!(floats.len(), 18);
    }

    // ── fans ────────────────────────────────────────────────────────────

    #[test]
    fn polygon_fan_closes_the_ring() {
        let ring = [[-0.5, 0.0, 0.0], [-0.25, 0.5, 0.0], [0.25, 0.5, 0.0], [0.5, 0.0, 0.0]];
        let data = GeometryData::polygon_fan([0.0; 3], &ring);
        assert_eq!(data.vertex_count(), 6);
        assert_eq!(data.positions.last(), Some(&ring[0]));

        let mut gl = RecordingContext::new();
        let buffer = GeometryBuffer::upload_fan(&mut gl, &data).unwrap();
        assert!(!buffer.is_indexed());
        assert_eq!(buffer.triangle_count(), 4);
        assert_eq!(gl.live_resources().buffers, 1);
    }

    #[test]
    fn degenerate_fan_is_rejected() {
        let data = GeometryData::new(vec![[0.0; 3], [1.0, 0.0, 0.0]], Vec::new());
        assert!(data.validate_fan().is_err());
    }

    // ── binding ─────────────────────────────────────────────────────────

    const COLORED_VS: &str = r"
struct Uniforms {
    world: mat4x4<f32>,
};

@group(0) @binding(0) var<uniform> u: Uniforms;

struct VertexOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) color: vec3<f32>,
};

@vertex
fn main(@location(0) position: vec3<f32>, @location(1) color: vec3<f32>) -> VertexOut {
    var out: VertexOut;
    out.clip = u.world * vec4<f32>(position, 1.0);
    out.color = color;
    return out;
}
";

    const COLORED_FS: &str = r"
@fragment
fn main(@location(0) color: vec3<f32>) -> @location(0) vec4<f32> {
    return vec4<f32>(color, 1.0);
}
";

    #[test]
    fn binding_requires_every_program_attribute() {
        let mut gl = RecordingContext::new();
        let program = ShaderProgram::compile(&mut gl, COLORED_VS, COLORED_FS).unwrap();
        let plain = GeometryBuffer::upload(&mut gl, &triangle()).unwrap();

        let err = plain
            .bind_attributes(&mut gl, &program, &AttributeNames::default())
            .unwrap_err();
        assert_eq!(err, RenderError::MissingAttribute { name: "color".into() });
        assert!(!gl.calls().iter().any(|c| matches!(c, GlCall::VertexAttribPointer { .. })));
    }

    #[test]
    fn bound_geometry_draws_its_full_range() {
        let mut gl = RecordingContext::new();
        let program = ShaderProgram::compile(&mut gl, COLORED_VS, COLORED_FS).unwrap();
        let cube = GeometryBuffer::upload(&mut gl, &GeometryData::cube(1.0)).unwrap();

        program.bind(&mut gl);
        cube.bind_attributes(&mut gl, &program, &AttributeNames::default()).unwrap();
        cube.draw(&mut gl);

        let draw = gl.calls().iter().rev().find(|c| c.is_draw()).cloned();
        assert_eq!(
            draw,
            Some(GlCall::DrawElements { mode: Primitive::Triangles, count: 36, first: 0 })
        );

        cube.release(&mut gl);
        program.release(&mut gl);
        assert_eq!(gl.live_resources().total(), 0);
    }
}
