use glam::{Mat4, Vec3};

use crate::gfx::{Capability, ClearMask, GraphicsContext, UniformLocation};
use crate::paint::Color;

use super::camera::{Camera, CameraConfig};
use super::command::{CommandQueue, CommandSender, SceneCommand};
use super::error::{RenderError, RenderResult};
use super::geometry::{AttributeNames, GeometryBuffer, GeometryData};
use super::program::ShaderProgram;
use super::transform::Spin;

/// Lifecycle of a [`Scene`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SceneState {
    /// Constructed; nothing allocated on the context.
    Uninitialized,
    /// Program linked and geometry uploaded; no frame drawn yet.
    Ready,
    /// At least one frame drawn.
    Rendering,
    /// Every handle released. Terminal.
    Disposed,
}

/// Uniform names the scene writes.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UniformNames {
    pub world: String,
    pub view: String,
    pub projection: String,
    pub color: String,
}

impl Default for UniformNames {
    fn default() -> Self {
        Self {
            world: "world".to_string(),
            view: "view".to_string(),
            projection: "projection".to_string(),
            color: "color".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub clear_color: Color,
    /// Depth testing and back-face culling.
    pub depth: bool,
    /// `None` draws in clip space: no view or projection uniforms.
    pub camera: Option<CameraConfig>,
    /// Written to the color uniform at initialization, when the program has one.
    pub initial_color: Option<Vec3>,
    pub uniforms: UniformNames,
    pub attributes: AttributeNames,
}

impl SceneConfig {
    /// Perspective scene with depth testing and culling.
    pub fn scene_3d(camera: CameraConfig) -> Self {
        Self {
            clear_color: Color::BLACK,
            depth: true,
            camera: Some(camera),
            initial_color: None,
            uniforms: UniformNames::default(),
            attributes: AttributeNames::default(),
        }
    }

    /// Flat scene in clip space, depth and culling off.
    pub fn scene_2d() -> Self {
        Self {
            clear_color: Color::BLACK,
            depth: false,
            camera: None,
            initial_color: None,
            uniforms: UniformNames::default(),
            attributes: AttributeNames::default(),
        }
    }

    pub fn with_clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    pub fn with_initial_color(mut self, color: Vec3) -> Self {
        self.initial_color = Some(color);
        self
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::scene_3d(CameraConfig::default())
    }
}

/// Vertex and fragment sources of the scene's program.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ProgramSource {
    pub vertex: String,
    pub fragment: String,
}

impl ProgramSource {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self { vertex: vertex.into(), fragment: fragment.into() }
    }
}

/// Geometry plus the motion applied to it every frame.
///
/// Geometry without indices is drawn as a triangle fan.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObjectDesc {
    pub geometry: GeometryData,
    pub spin: Spin,
}

impl SceneObjectDesc {
    pub fn new(geometry: GeometryData, spin: Spin) -> Self {
        Self { geometry, spin }
    }

    fn is_fan(&self) -> bool {
        self.geometry.indices.is_empty()
    }

    fn validate(&self) -> RenderResult<()> {
        if self.is_fan() {
            self.geometry.validate_fan()
        } else {
            self.geometry.validate_indexed()
        }
    }
}

/// Work submitted by one [`Scene::render`].
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameStats {
    pub draw_calls: u32,
    /// Elements consumed: indices for indexed objects, vertices for fans.
    pub indices: u32,
    pub triangles: u32,
    pub commands: u32,
}

#[derive(Debug)]
struct SceneObject {
    geometry: GeometryBuffer,
    spin: Spin,
}

#[derive(Debug, Copy, Clone)]
struct Locations {
    world: UniformLocation,
    view_projection: Option<(UniformLocation, UniformLocation)>,
    color: Option<UniformLocation>,
}

/// Everything allocated on the context between `initialize` and `dispose`.
#[derive(Debug)]
struct Live {
    program: ShaderProgram,
    objects: Vec<SceneObject>,
    locations: Locations,
}

/// One program, a camera and a list of spinning objects.
///
/// All per-frame state lives here. Other code talks to a running scene only
/// through the [`CommandSender`] from [`commands`](Self::commands).
#[derive(Debug)]
pub struct Scene {
    config: SceneConfig,
    source: ProgramSource,
    descs: Vec<SceneObjectDesc>,
    camera: Option<Camera>,
    state: SceneState,
    live: Option<Live>,
    commands: CommandQueue,
    worlds: Vec<Mat4>,
    warned_no_color: bool,
}

impl Scene {
    /// Validates the camera up front; nothing touches a context until
    /// [`initialize`](Self::initialize).
    pub fn new(config: SceneConfig, source: ProgramSource) -> RenderResult<Self> {
        let camera = config.camera.map(Camera::new).transpose()?;
        if !config.clear_color.is_finite() {
            return Err(RenderError::invalid("clear color must be finite"));
        }
        Ok(Self {
            config,
            source,
            descs: Vec::new(),
            camera,
            state: SceneState::Uninitialized,
            live: None,
            commands: CommandQueue::new(),
            worlds: Vec::new(),
            warned_no_color: false,
        })
    }

    /// Adds an object. Only allowed before initialization.
    pub fn add_object(&mut self, desc: SceneObjectDesc) -> RenderResult<()> {
        if self.state != SceneState::Uninitialized {
            return Err(RenderError::InvalidState { action: "add objects to", state: self.state });
        }
        desc.validate()?;
        self.descs.push(desc);
        Ok(())
    }

    pub fn state(&self) -> SceneState {
        self.state
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn object_count(&self) -> usize {
        self.descs.len()
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    /// Handle for queueing commands; applied at the start of the next tick.
    pub fn commands(&self) -> CommandSender {
        self.commands.sender()
    }

    /// World matrices computed by the last [`render`](Self::render), one per object.
    pub fn world_matrices(&self) -> &[Mat4] {
        &self.worlds
    }

    /// Rebuilds the projection; uploaded at the start of the next tick.
    ///
    /// Flat scenes have no projection and ignore this.
    pub fn set_aspect(&mut self, aspect: f32) -> RenderResult<()> {
        match &mut self.camera {
            Some(camera) => camera.set_aspect(aspect),
            None => Ok(()),
        }
    }

    /// Compiles the program, uploads every object and sets fixed state.
    ///
    /// Fails fast: on any error whatever was already allocated is released
    /// and the scene stays [`SceneState::Uninitialized`].
    pub fn initialize<G>(&mut self, gl: &mut G) -> RenderResult<()>
    where
        G: GraphicsContext + ?Sized,
    {
        if self.state != SceneState::Uninitialized {
            return Err(RenderError::InvalidState { action: "initialize", state: self.state });
        }

        let live = self.allocate(gl).inspect_err(|e| {
            log::error!("scene initialization failed: {e}");
        })?;

        live.program.bind(gl);
        if self.config.depth {
            gl.enable(Capability::DepthTest);
            gl.enable(Capability::CullFace);
        } else {
            gl.disable(Capability::DepthTest);
            gl.disable(Capability::CullFace);
        }
        gl.clear_color(self.config.clear_color);

        if let (Some(camera), Some((view, projection))) =
            (&mut self.camera, live.locations.view_projection)
        {
            camera.take_dirty();
            gl.uniform_matrix4(view, &camera.view());
            gl.uniform_matrix4(projection, &camera.projection());
        }
        if let (Some(rgb), Some(color)) = (self.config.initial_color, live.locations.color) {
            gl.uniform3f(color, rgb);
        }

        log::info!(
            "scene ready: {} object(s), {}",
            live.objects.len(),
            if self.config.depth { "3d" } else { "2d" }
        );
        self.live = Some(live);
        self.state = SceneState::Ready;
        Ok(())
    }

    fn allocate<G>(&self, gl: &mut G) -> RenderResult<Live>
    where
        G: GraphicsContext + ?Sized,
    {
        let program = ShaderProgram::compile(gl, &self.source.vertex, &self.source.fragment)?;

        let locations = match self.resolve_locations(&program) {
            Ok(l) => l,
            Err(e) => {
                program.release(gl);
                return Err(e);
            }
        };

        let mut objects: Vec<SceneObject> = Vec::with_capacity(self.descs.len());
        for desc in &self.descs {
            let uploaded = if desc.is_fan() {
                GeometryBuffer::upload_fan(gl, &desc.geometry)
            } else {
                GeometryBuffer::upload(gl, &desc.geometry)
            };
            let checked = uploaded.and_then(|geometry| {
                match geometry.check_attributes(&program, &self.config.attributes) {
                    Ok(()) => Ok(geometry),
                    Err(e) => {
                        geometry.release(gl);
                        Err(e)
                    }
                }
            });
            match checked {
                Ok(geometry) => objects.push(SceneObject { geometry, spin: desc.spin }),
                Err(e) => {
                    for object in objects {
                        object.geometry.release(gl);
                    }
                    program.release(gl);
                    return Err(e);
                }
            }
        }

        Ok(Live { program, objects, locations })
    }

    fn resolve_locations(&self, program: &ShaderProgram) -> RenderResult<Locations> {
        let names = &self.config.uniforms;
        let world = program.uniform_location(&names.world)?;
        let view_projection = match self.camera {
            Some(_) => Some((
                program.uniform_location(&names.view)?,
                program.uniform_location(&names.projection)?,
            )),
            None => None,
        };
        let color = program.uniform_location(&names.color).ok();
        Ok(Locations { world, view_projection, color })
    }

    /// Draws one frame for `elapsed` seconds since the animation started.
    ///
    /// Applies queued commands, re-uploads the projection if the camera
    /// changed, clears, then uploads each object's world matrix and draws it.
    pub fn render<G>(&mut self, gl: &mut G, elapsed: f64) -> RenderResult<FrameStats>
    where
        G: GraphicsContext + ?Sized,
    {
        let Some(live) = self.live.as_ref().filter(|_| {
            matches!(self.state, SceneState::Ready | SceneState::Rendering)
        }) else {
            return Err(RenderError::InvalidState { action: "render", state: self.state });
        };
        if !elapsed.is_finite() {
            return Err(RenderError::invalid(format!("elapsed time {elapsed} is not finite")));
        }

        let mut stats = FrameStats::default();
        live.program.bind(gl);

        for command in self.commands.drain() {
            stats.commands += 1;
            match command {
                SceneCommand::SetColor(rgb) => match live.locations.color {
                    Some(color) => gl.uniform3f(color, rgb),
                    None if !self.warned_no_color => {
                        log::warn!(
                            "program has no `{}` uniform; color commands are dropped",
                            self.config.uniforms.color
                        );
                        self.warned_no_color = true;
                    }
                    None => {}
                },
            }
        }

        if let (Some(camera), Some((_, projection))) =
            (&mut self.camera, live.locations.view_projection)
        {
            if camera.take_dirty() {
                log::debug!("projection re-uploaded for aspect {}", camera.config().aspect);
                gl.uniform_matrix4(projection, &camera.projection());
            }
        }

        let mut mask = ClearMask::COLOR;
        if self.config.depth {
            mask |= ClearMask::DEPTH;
        }
        gl.clear(mask);

        self.worlds.clear();
        for object in &live.objects {
            let world = object.spin.transform_at(elapsed).world_matrix();
            gl.uniform_matrix4(live.locations.world, &world);
            object
                .geometry
                .bind_attributes(gl, &live.program, &self.config.attributes)?;
            object.geometry.draw(gl);

            self.worlds.push(world);
            stats.draw_calls += 1;
            stats.indices += object.geometry.element_count();
            stats.triangles += object.geometry.triangle_count();
        }

        if self.state == SceneState::Ready {
            log::info!("scene rendering");
        }
        self.state = SceneState::Rendering;
        log::trace!("frame at {elapsed:.3}s: {stats:?}");
        Ok(stats)
    }

    /// Releases every handle. Calling it again is a no-op.
    ///
    /// A scene disposed before initialization just becomes unusable.
    pub fn dispose<G>(&mut self, gl: &mut G)
    where
        G: GraphicsContext + ?Sized,
    {
        if self.state == SceneState::Disposed {
            return;
        }
        if let Some(live) = self.live.take() {
            for object in live.objects {
                object.geometry.release(gl);
            }
            live.program.release(gl);
        }
        self.worlds.clear();
        self.state = SceneState::Disposed;
        log::info!("scene disposed");
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::gfx::{GlCall, Primitive, RecordingContext};

    const VS: &str = r"
struct Uniforms {
    world: mat4x4<f32>,
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    color: vec3<f32>,
};

@group(0) @binding(0) var<uniform> u: Uniforms;

struct VertexOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) color: vec3<f32>,
};

@vertex
fn main(@location(0) position: vec3<f32>, @location(1) color: vec3<f32>) -> VertexOut {
    var out: VertexOut;
    out.clip = u.projection * u.view * u.world * vec4<f32>(position, 1.0);
    out.color = color * u.color;
    return out;
}
";

    const FS: &str = r"
@fragment
fn main(@location(0) color: vec3<f32>) -> @location(0) vec4<f32> {
    return vec4<f32>(color, 1.0);
}
";

    const FLAT_VS: &str = r"
struct Uniforms {
    world: mat4x4<f32>,
};

@group(0) @binding(0) var<uniform> u: Uniforms;

@vertex
fn main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return u.world * vec4<f32>(position, 1.0);
}
";

    const FLAT_FS: &str = r"
@fragment
fn main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 0.5, 0.0, 1.0);
}
";

    fn cube_scene(translations: &[Vec3]) -> Scene {
        let mut scene =
            Scene::new(SceneConfig::default(), ProgramSource::new(VS, FS)).unwrap();
        for t in translations {
            let spin = Spin::new(Vec3::Y, 6.0).unwrap().with_translation(*t);
            scene
                .add_object(SceneObjectDesc::new(GeometryData::cube(2.0), spin))
                .unwrap();
        }
        scene
    }

    fn color_writes(gl: &RecordingContext) -> Vec<Vec3> {
        gl.calls()
            .iter()
            .filter_map(|c| match c {
                GlCall::Uniform3f { value, .. } => Some(*value),
                _ => None,
            })
            .collect()
    }

    // ── lifecycle ───────────────────────────────────────────────────────

    #[test]
    fn cube_at_time_zero_is_pure_translation() {
        let mut gl = RecordingContext::new();
        let mut scene = cube_scene(&[Vec3::new(-2.0, 1.0, 0.0)]);
        scene.initialize(&mut gl).unwrap();
        assert_eq!(scene.state(), SceneState::Ready);

        let stats = scene.render(&mut gl, 0.0).unwrap();
        assert_eq!(scene.state(), SceneState::Rendering);
        assert_eq!(stats.draw_calls, 1);
        assert_eq!(stats.indices, 36);
        assert_eq!(stats.triangles, 12);

        let expected = Mat4::from_translation(Vec3::new(-2.0, 1.0, 0.0));
        let world = scene.world_matrices()[0];
        for (a, b) in world.to_cols_array().iter().zip(expected.to_cols_array()) {
            assert_relative_eq!(*a, b, epsilon = 1e-6);
        }

        let draws: Vec<_> = gl.calls().iter().filter(|c| c.is_draw()).cloned().collect();
        assert_eq!(
            draws,
            vec![GlCall::DrawElements { mode: Primitive::Triangles, count: 36, first: 0 }]
        );
    }

    #[test]
    fn initialize_sets_3d_state_and_uploads_camera_once() {
        let mut gl = RecordingContext::new();
        let mut scene = cube_scene(&[Vec3::ZERO]);
        scene.initialize(&mut gl).unwrap();
        scene.render(&mut gl, 0.5).unwrap();
        scene.render(&mut gl, 1.0).unwrap();

        assert!(gl.is_enabled(Capability::DepthTest));
        assert!(gl.is_enabled(Capability::CullFace));
        let matrix_uploads = gl
            .calls()
            .iter()
            .filter(|c| matches!(c, GlCall::UniformMatrix4 { .. }))
            .count();
        // view + projection once, then one world matrix per frame.
        assert_eq!(matrix_uploads, 4);
        assert!(gl.calls().contains(&GlCall::Clear(ClearMask::COLOR | ClearMask::DEPTH)));
    }

    #[test]
    fn every_cube_gets_its_own_draw() {
        let mut gl = RecordingContext::new();
        let translations = [Vec3::new(-2.0, 1.0, 0.0), Vec3::new(2.0, -1.0, 0.0), Vec3::ZERO];
        let mut scene = cube_scene(&translations);
        scene.initialize(&mut gl).unwrap();

        let stats = scene.render(&mut gl, 1.5).unwrap();
        assert_eq!(stats.draw_calls, 3);
        assert_eq!(stats.indices, 108);
        assert_eq!(gl.draw_calls(), 3);
        for (world, t) in scene.world_matrices().iter().zip(translations) {
            assert_relative_eq!(world.w_axis.truncate().distance(t), 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn render_requires_an_initialized_scene() {
        let mut gl = RecordingContext::new();
        let mut scene = cube_scene(&[Vec3::ZERO]);
        assert_eq!(
            scene.render(&mut gl, 0.0),
            Err(RenderError::InvalidState { action: "render", state: SceneState::Uninitialized })
        );

        scene.initialize(&mut gl).unwrap();
        scene.dispose(&mut gl);
        assert_eq!(
            scene.render(&mut gl, 0.0),
            Err(RenderError::InvalidState { action: "render", state: SceneState::Disposed })
        );
        assert!(scene.initialize(&mut gl).is_err());
    }

    #[test]
    fn dispose_releases_everything_once() {
        let mut gl = RecordingContext::new();
        let mut scene = cube_scene(&[Vec3::ZERO, Vec3::X]);
        scene.initialize(&mut gl).unwrap();
        scene.render(&mut gl, 0.1).unwrap();
        assert_eq!(gl.live_resources().programs, 1);
        assert_eq!(gl.live_resources().buffers, 4);

        scene.dispose(&mut gl);
        assert_eq!(gl.live_resources().total(), 0);
        let calls = gl.calls().len();
        scene.dispose(&mut gl);
        assert_eq!(gl.calls().len(), calls);
        assert_eq!(scene.state(), SceneState::Disposed);
    }

    #[test]
    fn objects_cannot_be_added_after_initialize() {
        let mut gl = RecordingContext::new();
        let mut scene = cube_scene(&[]);
        scene.initialize(&mut gl).unwrap();
        let spin = Spin::new(Vec3::Y, 1.0).unwrap();
        let err = scene
            .add_object(SceneObjectDesc::new(GeometryData::cube(1.0), spin))
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidState { .. }));
    }

    // ── failure paths ───────────────────────────────────────────────────

    #[test]
    fn compile_failure_leaves_scene_uninitialized() {
        let mut gl = RecordingContext::new();
        let mut scene =
            Scene::new(SceneConfig::default(), ProgramSource::new(VS, "fn broken(")).unwrap();
        let err = scene.initialize(&mut gl).unwrap_err();
        assert!(matches!(err, RenderError::Compile { .. }));
        assert_eq!(scene.state(), SceneState::Uninitialized);
        assert_eq!(gl.live_resources().total(), 0);
    }

    #[test]
    fn missing_attribute_releases_partial_uploads() {
        let mut gl = RecordingContext::new();
        let mut scene = cube_scene(&[Vec3::ZERO]);
        // Uncolored geometry after a colored one; the program reads `color`.
        let plain = GeometryData::new(
            vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![0, 1, 2],
        );
        scene
            .add_object(SceneObjectDesc::new(plain, Spin::new(Vec3::Z, 1.0).unwrap()))
            .unwrap();

        let err = scene.initialize(&mut gl).unwrap_err();
        assert_eq!(err, RenderError::MissingAttribute { name: "color".into() });
        assert_eq!(scene.state(), SceneState::Uninitialized);
        assert_eq!(gl.live_resources().total(), 0);
    }

    #[test]
    fn camera_scene_needs_view_and_projection_uniforms() {
        let mut gl = RecordingContext::new();
        let mut scene =
            Scene::new(SceneConfig::default(), ProgramSource::new(FLAT_VS, FLAT_FS)).unwrap();
        let err = scene.initialize(&mut gl).unwrap_err();
        assert_eq!(err, RenderError::UniformNotFound { name: "view".into() });
        assert_eq!(gl.live_resources().total(), 0);
    }

    #[test]
    fn invalid_camera_is_rejected_at_construction() {
        let camera = CameraConfig { near: 0.0, ..CameraConfig::default() };
        let err = Scene::new(SceneConfig::scene_3d(camera), ProgramSource::new(VS, FS)).unwrap_err();
        assert!(matches!(err, RenderError::InvalidParameter(_)));
    }

    #[test]
    fn bad_index_is_rejected_when_added() {
        let mut scene = cube_scene(&[]);
        let mut cube = GeometryData::cube(1.0);
        cube.indices[5] = 24;
        let err = scene
            .add_object(SceneObjectDesc::new(cube, Spin::new(Vec3::Y, 1.0).unwrap()))
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidIndex { index: 24, position: 5, .. }));
        assert_eq!(scene.object_count(), 0);
    }

    // ── commands ────────────────────────────────────────────────────────

    #[test]
    fn command_applies_once_on_the_next_tick() {
        let mut gl = RecordingContext::new();
        let mut scene = cube_scene(&[Vec3::new(-2.0, 1.0, 0.0)]);
        let mut reference = cube_scene(&[Vec3::new(-2.0, 1.0, 0.0)]);
        let mut reference_gl = RecordingContext::new();
        scene.initialize(&mut gl).unwrap();
        reference.initialize(&mut reference_gl).unwrap();

        let sender = scene.commands();
        let red = Vec3::new(1.0, 0.0, 0.0);

        // Tick N: the command arrives after the tick has drained the queue.
        let stats = scene.render(&mut gl, 1.0).unwrap();
        assert_eq!(stats.commands, 0);
        assert!(sender.send(SceneCommand::SetColor(red)));
        assert!(color_writes(&gl).is_empty());

        // Tick N+1 applies it, and nothing after that re-applies it.
        let stats = scene.render(&mut gl, 2.0).unwrap();
        assert_eq!(stats.commands, 1);
        scene.render(&mut gl, 3.0).unwrap();
        assert_eq!(color_writes(&gl), vec![red]);

        reference.render(&mut reference_gl, 3.0).unwrap();
        assert_eq!(scene.world_matrices(), reference.world_matrices());
    }

    #[test]
    fn color_command_without_uniform_is_dropped() {
        let mut gl = RecordingContext::new();
        let mut scene = Scene::new(SceneConfig::scene_2d(), ProgramSource::new(FLAT_VS, FLAT_FS))
            .unwrap();
        scene
            .add_object(SceneObjectDesc::new(
                GeometryData::regular_polygon(6, 0.5),
                Spin::new(Vec3::Z, 4.0).unwrap(),
            ))
            .unwrap();
        scene.initialize(&mut gl).unwrap();

        let sender = scene.commands();
        sender.send(SceneCommand::SetColor(Vec3::ONE));
        sender.send(SceneCommand::SetColor(Vec3::ZERO));
        let stats = scene.render(&mut gl, 0.0).unwrap();
        assert_eq!(stats.commands, 2);
        assert!(color_writes(&gl).is_empty());
        assert_eq!(gl.draw_calls(), 1);
    }

    #[test]
    fn initial_color_is_written_at_initialize() {
        let mut gl = RecordingContext::new();
        let tint = Vec3::new(0.2, 0.4, 0.6);
        let config = SceneConfig::default().with_initial_color(tint);
        let mut scene = Scene::new(config, ProgramSource::new(VS, FS)).unwrap();
        scene.initialize(&mut gl).unwrap();
        assert_eq!(color_writes(&gl), vec![tint]);
    }

    // ── 2D and resize ───────────────────────────────────────────────────

    #[test]
    fn flat_scene_draws_a_fan_without_depth() {
        let mut gl = RecordingContext::new();
        let clear = Color::rgb(0.5, 0.5, 0.9);
        let config = SceneConfig::scene_2d().with_clear_color(clear);
        let mut scene = Scene::new(config, ProgramSource::new(FLAT_VS, FLAT_FS)).unwrap();
        scene
            .add_object(SceneObjectDesc::new(
                GeometryData::regular_polygon(6, 0.5),
                Spin::new(Vec3::Z, 4.0).unwrap(),
            ))
            .unwrap();
        scene.initialize(&mut gl).unwrap();
        assert!(!gl.is_enabled(Capability::DepthTest));
        assert!(!gl.is_enabled(Capability::CullFace));

        let stats = scene.render(&mut gl, 1.0).unwrap();
        assert_eq!(stats.triangles, 6);
        assert!(gl.calls().contains(&GlCall::ClearColor(clear)));
        assert!(gl.calls().contains(&GlCall::Clear(ClearMask::COLOR)));
        assert!(gl
            .calls()
            .contains(&GlCall::DrawArrays { mode: Primitive::TriangleFan, first: 0, count: 8 }));

        // A quarter turn after one second of a four second period.
        let x = scene.world_matrices()[0].transform_vector3(Vec3::X);
        assert_relative_eq!(x.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn resize_reuploads_projection_on_next_tick() {
        let mut gl = RecordingContext::new();
        let mut scene = cube_scene(&[Vec3::ZERO]);
        scene.initialize(&mut gl).unwrap();
        scene.render(&mut gl, 0.0).unwrap();
        gl.take_calls();

        scene.set_aspect(16.0 / 9.0).unwrap();
        scene.render(&mut gl, 0.1).unwrap();
        let uploads: Vec<Mat4> = gl
            .calls()
            .iter()
            .filter_map(|c| match c {
                GlCall::UniformMatrix4 { value, .. } => Some(*value),
                _ => None,
            })
            .collect();
        let projection = scene.camera().unwrap().projection();
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[0], projection);

        assert!(scene.set_aspect(0.0).is_err());
    }
}
