mod app;
mod cli;
mod demos;
mod headless;

use anyhow::{Context, Result};
use clap::Parser;
use spindle_engine::device::GpuInit;
use spindle_engine::logging::{init_logging, LoggingConfig};
use spindle_engine::window::{Runtime, RuntimeConfig};
use winit::dpi::LogicalSize;

use crate::app::DemoApp;
use crate::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(LoggingConfig {
        env_filter: cli.log_filter.clone(),
        ..LoggingConfig::default()
    });

    let mut rng = cli.rng();
    let scene = cli
        .demo
        .build(cli.period, &mut rng)
        .with_context(|| format!("invalid {:?} demo configuration", cli.demo))?;

    if cli.headless {
        headless::run(scene, &cli.headless_options(), &mut rng)?;
        return Ok(());
    }

    let config = RuntimeConfig {
        title: cli.window_title(),
        initial_size: LogicalSize::new(cli.width, cli.height),
    };
    log::info!("starting {:?} demo", cli.demo);
    Runtime::run(config, GpuInit::default(), DemoApp::new(cli.demo, scene, rng))
}
