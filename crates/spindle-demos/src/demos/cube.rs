use glam::Vec3;
use spindle_engine::paint::Color;
use spindle_engine::render::{
    CameraConfig, GeometryData, ProgramSource, RenderResult, Scene, SceneConfig, SceneObjectDesc,
    Spin,
};

pub const VERTEX: &str = include_str!("../../shaders/cube.vert.wgsl");
pub const FRAGMENT: &str = include_str!("../../shaders/cube.frag.wgsl");

pub const CLEAR_COLOR: Color = Color::rgb(0.08, 0.08, 0.1);

pub const EDGE: f32 = 2.0;

/// Scene config shared by the cube demos: default camera, white tint.
pub fn config() -> SceneConfig {
    SceneConfig::scene_3d(CameraConfig::default())
        .with_clear_color(CLEAR_COLOR)
        .with_initial_color(Vec3::ONE)
}

/// One cube at the origin tumbling about a tilted axis.
pub fn scene(period: f64) -> RenderResult<Scene> {
    let mut scene = Scene::new(config(), ProgramSource::new(VERTEX, FRAGMENT))?;
    scene.add_object(SceneObjectDesc::new(
        GeometryData::cube(EDGE),
        Spin::new(Vec3::new(1.0, 1.0, 0.0), period)?,
    ))?;
    Ok(scene)
}
