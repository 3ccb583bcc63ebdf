//! Drill binary for the Parley message pipeline.
//!
//! Wires the tick loop to a seeded demo population and scripted squad
//! commanders, runs until a bound or an interrupt, and prints a JSON summary
//! of what the pipeline did.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `parley-config.yaml` (or `PARLEY_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Build the pipeline world from the decision thresholds and verb table
//! 4. Spawn squads and their commanders
//! 5. Create operator state from the simulation bounds
//! 6. Run the tick loop
//! 7. Log and print the result

mod commander;
mod error;
mod report;
mod spawner;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use parley_core::config::SimulationConfig;
use parley_core::operator::OperatorState;
use parley_core::runner;
use parley_core::tick::PipelineState;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::commander::ScriptedCommander;
use crate::error::EngineError;
use crate::report::RunReport;
use crate::spawner::Roster;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "parley-config.yaml";

/// Application entry point for the drill.
///
/// # Errors
///
/// Returns an error if configuration, population setup, or the run fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let (config, config_path) = load_config().context("loading configuration")?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("parley-engine starting");
    info!(
        path = config_path.as_ref().map(|p| p.display().to_string()),
        world_name = config.world.name,
        seed = config.world.seed,
        tick_interval_ms = config.world.tick_interval_ms,
        pipeline_enabled = config.pipeline.enabled,
        mode = ?config.pipeline.mode,
        "Configuration loaded"
    );

    // 3-4. Build the world and the population.
    let (mut state, roster) = setup(&config).context("setting up the drill")?;
    let mut commander = ScriptedCommander::new(&roster, &config.population, config.world.seed);

    // 5. Create operator state.
    let operator = Arc::new(OperatorState::new(
        config.world.tick_interval_ms,
        &config.simulation,
    ));
    operator.set_pipeline_enabled(config.pipeline.enabled);
    info!(
        max_ticks = operator.max_ticks(),
        max_real_time_seconds = operator.max_real_time_seconds(),
        tick_interval_ms = operator.tick_interval_ms(),
        "Operator state initialized"
    );

    let stopper = Arc::clone(&operator);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping before the next tick");
            stopper.request_stop();
        }
    });

    // 6. Run.
    let mut report = RunReport::default();
    let result = runner::run_simulation(&mut state, &mut commander, &operator, &mut report)
        .await
        .map_err(EngineError::from)?;

    // 7. Log and print results.
    runner::log_simulation_end(&result);

    let status = operator
        .status(state.clock.tick(), state.world.live_count())
        .await;
    let summary = serde_json::json!({
        "world": config.world.name,
        "seed": config.world.seed,
        "squads": roster.squads.len(),
        "population": roster.population(),
        "status": status,
        "totals": report,
        "decisions": commander.tally(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        "parley-engine shutdown complete"
    );
    Ok(())
}

/// Load configuration from `PARLEY_CONFIG` or [`DEFAULT_CONFIG_PATH`].
///
/// Falls back to defaults when no file exists. Returns the path that was
/// read, if any.
fn load_config() -> Result<(SimulationConfig, Option<PathBuf>), EngineError> {
    let path = std::env::var_os("PARLEY_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if path.exists() {
        let config = SimulationConfig::from_file(&path)?;
        Ok((config, Some(path)))
    } else {
        let mut config = SimulationConfig::default();
        config.apply_env_overrides();
        Ok((config, None))
    }
}

/// Build the pipeline state and spawn the demo population into it.
fn setup(config: &SimulationConfig) -> Result<(PipelineState, Roster), EngineError> {
    let mut state = PipelineState::from_config(config)?;
    let roster = spawner::spawn_population(&config.population, config.world.seed, &mut state.world)?;
    Ok((state, roster))
}
