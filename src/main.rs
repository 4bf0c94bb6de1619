mod cli;
mod config;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tern_navigation::script::{arcs, shapes_demo};
use tern_navigation::{Behavior, Driver, Exploration, FigureEight, RunSummary, TickOutcome};
use tern_sim::SimulatedRobot;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::{Mission, Settings};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let mut settings = config::load(cli.config.as_deref())?;
    if let Some(mission) = cli.mission {
        settings.mission = mission;
    }
    info!(mission = ?settings.mission, realtime = cli.realtime, "Tern mission runner started");

    match settings.mission {
        Mission::Explore => {
            let driver = execute(&settings, Exploration::new(settings.exploration), cli.realtime).await?;
            let context = driver.behavior().context();
            info!(
                state = %context.state(),
                boxes = context.boxes_completed(),
                target = settings.exploration.obstacle_count,
                depth = context.box_depth(),
                width = context.temporary_width(),
                "Exploration report"
            );
            report(&driver);
        }
        Mission::Shapes => {
            let driver = execute(&settings, shapes_demo(&settings.primitives.shapes), cli.realtime).await?;
            report(&driver);
        }
        Mission::Circles => {
            let driver = execute(&settings, arcs(&settings.primitives.circles), cli.realtime).await?;
            report(&driver);
        }
        Mission::FigureEight => {
            let driver = execute(&settings, FigureEight::new(settings.figure_eight.clone()), cli.realtime).await?;
            info!(avoidances = driver.behavior().avoidances(), "Figure eight report");
            report(&driver);
        }
    }
    Ok(())
}

/// Builds the simulated robot for `settings` and runs `behavior` on it to the end.
async fn execute<B: Behavior>(
    settings: &Settings,
    behavior: B,
    realtime: bool,
) -> Result<Driver<SimulatedRobot, B>> {
    let drive = settings.robot.drive()?;
    let world = settings.simulation.world(settings.mission, settings.exploration.obstacle_count);
    info!(obstacles = world.obstacles().len(), "World ready");

    let host = SimulatedRobot::new(drive, world, settings.simulation.host).context("failed to start simulator")?;
    let mut driver = Driver::new(host, drive, behavior, settings.perception.clear_range);
    if let Some(max_ticks) = settings.simulation.max_ticks {
        driver = driver.with_max_ticks(max_ticks);
    }

    // The driver logs its own run summary on shutdown.
    if realtime {
        let period = Duration::try_from_secs_f64(settings.simulation.host.time_step)
            .context("time step does not fit a wall-clock period")?;
        run_paced(&mut driver, period).await;
    } else {
        driver.run();
    }
    Ok(driver)
}

/// Ticks once per `period` of wall-clock time until the run ends or Ctrl-C.
async fn run_paced<B: Behavior>(driver: &mut Driver<SimulatedRobot, B>, period: Duration) -> RunSummary {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    info!(period_ms = period.as_millis() as u64, "Paced run started");
    loop {
        tokio::select! {
            _ = interval.tick() => {
                if driver.tick() != TickOutcome::Continue {
                    break;
                }
            }
            result = &mut ctrl_c => {
                if let Err(e) = result {
                    warn!("Failed to listen for Ctrl-C: {e}");
                }
                driver.cancel();
                break;
            }
        }
    }
    driver.shutdown()
}

fn report<B: Behavior>(driver: &Driver<SimulatedRobot, B>) {
    let host = driver.host();
    info!(
        pose = %host.pose(),
        time = host.time(),
        collisions = host.collisions(),
        "Ground truth"
    );
}
