//! Window-free runs against a [`RecordingContext`].

use std::time::Duration;

use anyhow::{Context, Result};
use rand::Rng;
use spindle_engine::core::AppControl;
use spindle_engine::driver::run_ticks;
use spindle_engine::gfx::RecordingContext;
use spindle_engine::render::{Scene, SceneCommand};
use spindle_engine::time::FrameClock;

use crate::demos::random_color;

#[derive(Debug, Clone)]
pub struct HeadlessOptions {
    pub ticks: u64,
    /// Fixed clock step per tick.
    pub step: Duration,
    /// Queue a recolor every N ticks.
    pub click_every: Option<u64>,
}

/// Totals over a headless run.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct HeadlessReport {
    pub ticks: u64,
    pub draw_calls: u64,
    pub triangles: u64,
    pub commands: u64,
}

/// Initializes `scene`, renders it for `options.ticks` fixed steps, then
/// disposes it and checks nothing leaked.
pub fn run<R: Rng + ?Sized>(
    mut scene: Scene,
    options: &HeadlessOptions,
    rng: &mut R,
) -> Result<HeadlessReport> {
    let mut gl = RecordingContext::new();
    scene
        .initialize(&mut gl)
        .context("scene initialization failed")?;

    let sender = scene.commands();
    let mut clock = FrameClock::fixed(options.step);
    let mut report = HeadlessReport::default();
    let mut failure = None;

    report.ticks = run_ticks(&mut clock, options.ticks, |time| {
        let stats = match scene.render(&mut gl, time.elapsed) {
            Ok(stats) => stats,
            Err(e) => {
                failure = Some(e);
                return AppControl::Exit;
            }
        };
        report.draw_calls += u64::from(stats.draw_calls);
        report.triangles += u64::from(stats.triangles);
        report.commands += u64::from(stats.commands);
        gl.take_calls();

        // A click lands while the tick is in flight; the scene sees it next tick.
        if let Some(every) = options.click_every {
            if time.frame_index % every == every - 1 {
                sender.send(SceneCommand::SetColor(random_color(&mut *rng)));
            }
        }
        AppControl::Continue
    });

    scene.dispose(&mut gl);
    if let Some(e) = failure {
        return Err(e).context(format!("render failed after {} tick(s)", report.ticks));
    }

    let live = gl.live_resources();
    anyhow::ensure!(live.total() == 0, "resources leaked after dispose: {live:?}");

    log::info!(
        "headless run: {} tick(s), {} draw call(s), {} triangle(s), {} command(s)",
        report.ticks,
        report.draw_calls,
        report.triangles,
        report.commands
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::demos::DemoKind;

    fn options(ticks: u64, click_every: Option<u64>) -> HeadlessOptions {
        HeadlessOptions { ticks, step: Duration::from_millis(16), click_every }
    }

    #[test]
    fn cube_run_completes() {
        let mut rng = StdRng::seed_from_u64(3);
        let scene = DemoKind::Cube.build(None, &mut rng).unwrap();
        let report = run(scene, &options(10, None), &mut rng).unwrap();
        assert_eq!(
            report,
            HeadlessReport { ticks: 10, draw_calls: 10, triangles: 120, commands: 0 }
        );
    }

    #[test]
    fn simulated_clicks_become_commands() {
        let mut rng = StdRng::seed_from_u64(5);
        let scene = DemoKind::Polygon.build(None, &mut rng).unwrap();
        let report = run(scene, &options(12, Some(4)), &mut rng).unwrap();
        // Clicks on ticks 3, 7 and 11 are each applied on the following tick,
        // which the last one never reaches.
        assert_eq!(report.commands, 2);
        assert_eq!(report.draw_calls, 12);
    }

    #[test]
    fn broken_scene_fails_before_rendering() {
        use spindle_engine::render::{ProgramSource, SceneConfig};

        let mut rng = StdRng::seed_from_u64(9);
        let scene = Scene::new(
            SceneConfig::default(),
            ProgramSource::new("@vertex fn main(", "@fragment fn main() {}"),
        )
        .unwrap();
        let err = run(scene, &options(5, None), &mut rng).unwrap_err();
        assert!(format!("{err:#}").contains("initialization"));
    }
}
