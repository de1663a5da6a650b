use glam::Vec3;
use spindle_engine::render::{
    GeometryData, ProgramSource, RenderResult, Scene, SceneObjectDesc, Spin,
};

use super::cube::{config, FRAGMENT, VERTEX};

pub const EDGE: f32 = 1.5;

/// (translation, rotation axis, period multiplier) of every cube.
#[rustfmt::skip]
const LAYOUT: [([f32; 3], [f32; 3], f64); 5] = [
    ([-2.0,  1.0,  0.0], [0.0, 1.0, 0.0], 1.0),
    ([ 2.0,  1.0,  0.0], [1.0, 0.0, 0.0], 0.75),
    ([-2.0, -1.5,  0.0], [0.0, 0.0, 1.0], 1.5),
    ([ 2.0, -1.5,  0.0], [1.0, 1.0, 1.0], 0.5),
    ([ 0.0,  0.0,  3.0], [1.0, 0.0, 1.0], 2.0),
];

/// Five cubes sharing one program and camera, each spinning on its own.
///
/// `period` is the turn time of the first cube; the others scale it.
pub fn scene(period: f64) -> RenderResult<Scene> {
    let mut scene = Scene::new(config(), ProgramSource::new(VERTEX, FRAGMENT))?;
    for (translation, axis, speed) in LAYOUT {
        let spin = Spin::new(Vec3::from(axis), period * speed)?
            .with_translation(Vec3::from(translation));
        scene.add_object(SceneObjectDesc::new(GeometryData::cube(EDGE), spin))?;
    }
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use spindle_engine::gfx::RecordingContext;

    use super::*;

    #[test]
    fn cubes_start_at_their_translations() {
        let mut gl = RecordingContext::new();
        let mut scene = scene(8.0).unwrap();
        scene.initialize(&mut gl).unwrap();

        let stats = scene.render(&mut gl, 0.0).unwrap();
        assert_eq!(stats.draw_calls, 5);
        assert_eq!(stats.indices, 5 * 36);
        assert_eq!(gl.draw_calls(), 5);

        for (world, (t, _, _)) in scene.world_matrices().iter().zip(LAYOUT) {
            let origin = world.transform_point3(Vec3::ZERO);
            assert_relative_eq!(origin.distance(Vec3::from(t)), 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn cubes_spin_at_different_rates() {
        let mut gl = RecordingContext::new();
        let mut scene = scene(8.0).unwrap();
        scene.initialize(&mut gl).unwrap();
        scene.render(&mut gl, 1.0).unwrap();

        let worlds = scene.world_matrices();
        assert_ne!(worlds[0], worlds[1]);
        // Translation is untouched by the spin.
        assert_relative_eq!(worlds[4].w_axis.z, 3.0);
    }
}
