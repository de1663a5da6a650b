use std::time::Duration;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::demos::DemoKind;
use crate::headless::HeadlessOptions;

/// Spinning polygon and rotating cube demos.
///
/// Click, or press Space or Enter, to recolor. Escape quits.
#[derive(Debug, Parser)]
#[command(name = "spindle-demos", version, about)]
pub struct Cli {
    /// Which scene to show.
    #[arg(long, value_enum, default_value_t = DemoKind::Cube)]
    pub demo: DemoKind,

    /// Seconds per full turn; each demo has its own default.
    #[arg(long)]
    pub period: Option<f64>,

    /// Render into a recording context for a fixed number of ticks, no window.
    #[arg(long)]
    pub headless: bool,

    /// Ticks to run in headless mode.
    #[arg(long, default_value_t = 120)]
    pub ticks: u64,

    /// Simulated frame time in headless mode, milliseconds.
    #[arg(long, default_value_t = 16, value_parser = clap::value_parser!(u64).range(1..))]
    pub step_ms: u64,

    /// Headless mode: simulate an activation every N ticks.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub click_every: Option<u64>,

    /// Seed for the color generator.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log filter in `env_logger` syntax; overrides `RUST_LOG`.
    #[arg(long)]
    pub log_filter: Option<String>,

    /// Initial window width, logical pixels.
    #[arg(long, default_value_t = 800.0)]
    pub width: f64,

    /// Initial window height, logical pixels.
    #[arg(long, default_value_t = 800.0)]
    pub height: f64,

    /// Window title; defaults to the demo name.
    #[arg(long)]
    pub title: Option<String>,
}

impl Cli {
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    pub fn headless_options(&self) -> HeadlessOptions {
        HeadlessOptions {
            ticks: self.ticks,
            step: Duration::from_millis(self.step_ms),
            click_every: self.click_every,
        }
    }

    pub fn window_title(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| self.demo.title().to_string())
    }
}
