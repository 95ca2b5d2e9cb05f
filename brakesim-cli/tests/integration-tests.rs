use std::path::PathBuf;
use std::process::Command;

use assert_cmd::prelude::{CommandCargoExt, OutputAssertExt};
use predicates::prelude::predicate;

fn core_asset(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../brakesim-core/tests/assets")
        .join(name)
        .canonicalize()
        .unwrap()
}

#[test]
fn test_that_cli_app_runs_demo_trace() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("brakesim-cli")?;
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("brake system: air_single_pipe"))
        .stdout(predicate::str::contains("steps: 240"))
        .stdout(predicate::str::contains("final valve state: Release"));
    Ok(())
}

#[test]
fn test_that_cli_app_produces_json() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("brakesim-cli")?;
    cmd.args([
        "--config",
        core_asset("twin_pipe_config.yaml").to_str().unwrap(),
        "--trace",
        core_asset("service_trace.csv").to_str().unwrap(),
        "--res-fmt",
        "json",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(r#""kind":"air_twin_pipe""#))
        .stdout(predicate::str::contains(r#""steps":120"#))
        .stdout(predicate::str::contains(r#""first_application_s":10.0"#));
    Ok(())
}

#[test]
fn test_that_cli_app_writes_state_and_output() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let state_path = dir.path().join("brakes.bin");
    let output_path = dir.path().join("sim.json");

    let mut cmd = Command::cargo_bin("brakesim-cli")?;
    cmd.args([
        "--graduated-release",
        "--save-interval",
        "10",
        "--save-state",
        state_path.to_str().unwrap(),
        "--output",
        output_path.to_str().unwrap(),
    ]);
    cmd.assert().success();

    assert_eq!(std::fs::read(&state_path)?.len(), 44);
    let output = std::fs::read_to_string(&output_path)?;
    assert!(output.contains(r#""graduated_release":true"#));
    Ok(())
}

#[test]
fn test_that_cli_app_rejects_bad_input() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("brakesim-cli")?;
    cmd.args(["--res-fmt", "mpgge"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid option `mpgge`"));

    let mut cmd = Command::cargo_bin("brakesim-cli")?;
    cmd.args(["--trace", "does-not-exist.csv"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load pressure trace"));
    Ok(())
}

#[test]
fn test_that_cli_app_logs_inputs() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("brakesim-cli")?;
    cmd.env("RUST_LOG", "info");
    cmd.assert()
        .success()
        .stderr(predicate::str::contains(
            "Using default `air_single_pipe` brake config",
        ))
        .stderr(predicate::str::contains(
            "Using built-in demo trace of 241 points",
        ));
    Ok(())
}
