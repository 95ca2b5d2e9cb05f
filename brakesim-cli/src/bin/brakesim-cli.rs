use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

extern crate brakesim_core;
use brakesim_core::prelude::*;

/// Steps one car's brakes through a trainline pressure trace.
/// After running `cargo build --release`, run with
/// ```bash
/// ./target/release/brakesim-cli --config brakesim-core/tests/assets/twin_pipe_config.yaml --trace brakesim-core/tests/assets/service_trace.csv
/// ```
/// Without `--trace`, a full-service application and release at one point per second is used.
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct BrakeSimApi {
    #[clap(long, value_parser)]
    /// Path to brake configuration file (yaml or json); defaults to a single-pipe air brake
    config: Option<PathBuf>,
    #[clap(long, value_parser)]
    /// Path to pressure trace file (csv, yaml or json)
    trace: Option<PathBuf>,
    #[clap(long, value_parser, default_value_t = 15.0)]
    /// Car length in meters, used when no config file is given
    car_length: f32,
    #[clap(long, action)]
    /// Hold the cylinder at the brake pipe reduction while releasing
    graduated_release: bool,
    #[clap(long, action)]
    /// Start with the handbrake fully applied
    handbrake: bool,
    #[clap(long, value_parser, default_value_t = 1)]
    /// Steps between saved history entries, 0 disables history
    save_interval: usize,
    #[clap(long, value_parser)]
    /// Write the final persisted brake state bytes to this file
    save_state: Option<PathBuf>,
    #[clap(long, value_parser)]
    /// Write the finished simulation, history included, to this file (yaml, json or bin)
    output: Option<PathBuf>,
    #[clap(long, value_parser, default_value = "summary")]
    /// How to return results: `json` or `summary`
    res_fmt: String,
}

fn run(api: BrakeSimApi) -> anyhow::Result<()> {
    let config = match &api.config {
        Some(path) => BrakeConfig::from_file(path)
            .with_context(|| format!("Failed to load brake config {path:?}"))?,
        None => BrakeConfig {
            car_length_m: api.car_length,
            ..Default::default()
        },
    };
    let trace = match &api.trace {
        Some(path) => PressureTrace::from_path(path)
            .with_context(|| format!("Failed to load pressure trace {path:?}"))?,
        None => PressureTrace::default(),
    };
    let kind = config.resolved_kind();
    match &api.config {
        Some(path) => log::info!("Loaded `{kind}` brake config from {path:?}"),
        None => log::info!("Using default `{kind}` brake config"),
    }
    match &api.trace {
        Some(path) => log::info!("Loaded {} trace points from {path:?}", trace.len()),
        None => log::info!("Using built-in demo trace of {} points", trace.len()),
    }
    let mut settings = config.settings;
    settings.graduated_release |= api.graduated_release;
    let save_interval = (api.save_interval > 0).then_some(api.save_interval);

    let mut sim = BrakeSimulation::new(config.build()?, trace, settings, save_interval)?;
    sim.initialize(api.handbrake);
    sim.walk()?;

    if let Some(path) = &api.save_state {
        std::fs::write(path, sim.brakes.save_to_bytes()?)
            .with_context(|| format!("Failed to write brake state {path:?}"))?;
    }
    if let Some(path) = &api.output {
        sim.to_file(path)?;
    }

    let summary = sim.summary();
    match api.res_fmt.as_str() {
        "json" => println!("{}", serde_json::to_string(&summary)?),
        "summary" => print_summary(&summary),
        other => anyhow::bail!("Invalid option `{other}` for `--res-fmt`"),
    }
    Ok(())
}

fn print_summary(summary: &SimulationSummary) {
    let fmt = |x: Option<f32>| x.map_or_else(|| "n/a".to_string(), |x| format!("{x:.2}"));
    println!("brake system: {}", summary.kind);
    println!("steps: {} ({} s)", summary.steps, summary.final_time_s);
    println!("peak cylinder [psi]: {}", fmt(summary.peak_cylinder_psi));
    println!("peak friction force [N]: {}", fmt(summary.peak_friction_force_n));
    println!("min brake pipe [psi]: {}", fmt(summary.min_line1_psi));
    println!("first application [s]: {}", fmt(summary.first_application_s));
    println!("events: {}", summary.events);
    println!("final valve state: {}", summary.final_valve_state);
    println!("final status: {}", summary.final_status);
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    run(BrakeSimApi::parse())
}
