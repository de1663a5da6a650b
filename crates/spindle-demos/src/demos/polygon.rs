use glam::Vec3;
use spindle_engine::paint::Color;
use spindle_engine::render::{
    GeometryData, ProgramSource, RenderResult, Scene, SceneConfig, SceneObjectDesc, Spin,
};

pub const VERTEX: &str = include_str!("../../shaders/polygon.vert.wgsl");
pub const FRAGMENT: &str = include_str!("../../shaders/polygon.frag.wgsl");

pub const CLEAR_COLOR: Color = Color::rgb(0.5, 0.5, 0.9);

/// Hexagon outline in clip space, walked from the left corner.
#[rustfmt::skip]
pub const RING: [[f32; 3]; 6] = [
    [-0.5,   0.0, 0.0],
    [-0.25,  0.5, 0.0],
    [ 0.25,  0.5, 0.0],
    [ 0.5,   0.0, 0.0],
    [ 0.25, -0.5, 0.0],
    [-0.25, -0.5, 0.0],
];

/// Single fan-drawn hexagon turning about the view axis.
pub fn scene(period: f64, color: Vec3) -> RenderResult<Scene> {
    let config = SceneConfig::scene_2d()
        .with_clear_color(CLEAR_COLOR)
        .with_initial_color(color);
    let mut scene = Scene::new(config, ProgramSource::new(VERTEX, FRAGMENT))?;
    scene.add_object(SceneObjectDesc::new(
        GeometryData::polygon_fan([0.0; 3], &RING),
        Spin::new(Vec3::Z, period)?,
    ))?;
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use spindle_engine::gfx::{GlCall, Primitive, RecordingContext};

    use super::*;

    #[test]
    fn hexagon_is_one_eight_vertex_fan() {
        let mut gl = RecordingContext::new();
        let color = Vec3::new(0.3, 0.6, 0.9);
        let mut scene = scene(4.0, color).unwrap();
        scene.initialize(&mut gl).unwrap();
        let stats = scene.render(&mut gl, 0.0).unwrap();

        assert_eq!(stats.triangles, 6);
        assert!(gl
            .calls()
            .contains(&GlCall::DrawArrays { mode: Primitive::TriangleFan, first: 0, count: 8 }));
        assert!(gl.calls().contains(&GlCall::ClearColor(CLEAR_COLOR)));
        assert!(gl.calls().iter().any(|c| matches!(
            c,
            GlCall::Uniform3f { value, .. } if *value == color
        )));
    }
}
