//! The bundled scenes.
//!
//! Each demo is a [`Scene`] built from configuration only: geometry, spins,
//! camera and shader sources. Nothing here touches a graphics context.

pub mod cube;
pub mod cubes;
pub mod polygon;

use glam::Vec3;
use rand::Rng;
use spindle_engine::render::{RenderResult, Scene};

#[derive(Debug, Copy, Clone, Eq, PartialEq, clap::ValueEnum)]
pub enum DemoKind {
    /// Hexagon spinning in the screen plane; activations recolor it.
    Polygon,
    /// One rotating cube with per-face colors.
    Cube,
    /// Several cubes, each with its own axis and speed.
    Cubes,
}

impl DemoKind {
    /// Seconds per full turn when `--period` is not given.
    pub fn default_period(self) -> f64 {
        match self {
            DemoKind::Polygon => 4.0,
            DemoKind::Cube => 6.0,
            DemoKind::Cubes => 8.0,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            DemoKind::Polygon => "spindle: polygon",
            DemoKind::Cube => "spindle: cube",
            DemoKind::Cubes => "spindle: cubes",
        }
    }

    /// Builds the scene, uninitialized.
    pub fn build<R: Rng + ?Sized>(self, period: Option<f64>, rng: &mut R) -> RenderResult<Scene> {
        let period = period.unwrap_or(self.default_period());
        match self {
            DemoKind::Polygon => polygon::scene(period, random_color(rng)),
            DemoKind::Cube => cube::scene(period),
            DemoKind::Cubes => cubes::scene(period),
        }
    }
}

/// Uniformly random RGB in `[0, 1)`.
pub fn random_color<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    Vec3::new(
        rng.gen_range(0.0..1.0),
        rng.gen_range(0.0..1.0),
        rng.gen_range(0.0..1.0),
    )
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use spindle_engine::gfx::RecordingContext;
    use spindle_engine::render::{SceneState, ShaderProgram};

    use super::*;

    const ALL: [DemoKind; 3] = [DemoKind::Polygon, DemoKind::Cube, DemoKind::Cubes];

    #[test]
    fn bundled_shaders_compile_and_link() {
        let mut gl = RecordingContext::new();
        for (vs, fs) in [
            (polygon::VERTEX, polygon::FRAGMENT),
            (cube::VERTEX, cube::FRAGMENT),
        ] {
            let program = ShaderProgram::compile(&mut gl, vs, fs).unwrap();
            assert!(program.has_uniform("world"));
            assert!(program.has_uniform("color"));
            assert_eq!(program.attrib_location("position"), Some(0));
            program.release(&mut gl);
        }
        assert_eq!(gl.live_resources().total(), 0);
    }

    #[test]
    fn every_demo_initializes_and_disposes_cleanly() {
        let mut rng = StdRng::seed_from_u64(7);
        for kind in ALL {
            let mut gl = RecordingContext::new();
            let mut scene = kind.build(None, &mut rng).unwrap();
            scene.initialize(&mut gl).unwrap();
            assert_eq!(scene.state(), SceneState::Ready, "{kind:?}");

            let stats = scene.render(&mut gl, 0.25).unwrap();
            assert_eq!(stats.draw_calls as usize, scene.object_count());

            scene.dispose(&mut gl);
            assert_eq!(gl.live_resources().total(), 0, "{kind:?} leaked");
        }
    }

    #[test]
    fn period_override_is_validated() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(DemoKind::Cube.build(Some(0.0), &mut rng).is_err());
        assert!(DemoKind::Polygon.build(Some(-3.0), &mut rng).is_err());
        assert!(DemoKind::Cubes.build(Some(2.5), &mut rng).is_ok());
    }

    #[test]
    fn random_colors_stay_in_unit_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let c = random_color(&mut rng);
            assert!(c.cmpge(Vec3::ZERO).all() && c.cmplt(Vec3::ONE).all(), "{c}");
        }
    }
}
