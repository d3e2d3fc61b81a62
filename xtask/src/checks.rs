//! Test runners
//!
//! This module provides the `test-matrix` and `loom` subcommands. Both shell
//! out to the `cargo` that invoked the xtask.

use anyhow::{Context, Result, bail};
use clap::Args;
use std::env;
use std::path::PathBuf;
use std::process::Command;

/// Feature combinations exercised by `test-matrix`.
const FEATURE_MATRIX: &[&[&str]] = &[
    &["sequence"],
    &["container"],
    &["container", "smallvec"],
    &["container", "fxhash"],
    &["container", "ahash"],
    &["container", "serde"],
    &["full"],
];

/// Feature combinations exercised by `test-matrix --quick`.
const QUICK_MATRIX: &[&[&str]] = &[&["full"]];

/// Arguments for the test-matrix subcommand
#[derive(Args, Debug)]
pub struct TestMatrixArgs {
    /// Only run the default and `full` feature sets
    #[arg(long)]
    pub quick: bool,

    /// Skip doctests
    #[arg(long)]
    pub no_doc: bool,
}

/// Arguments for the loom subcommand
#[derive(Args, Debug)]
pub struct LoomArgs {
    /// Bound on thread preemptions explored per model
    #[arg(long, default_value_t = 3)]
    pub preemption_bound: u32,

    /// Run a single loom test by name
    #[arg(long)]
    pub test_name: Option<String>,
}

fn cargo() -> String {
    env::var("CARGO").unwrap_or_else(|_| "cargo".to_string())
}

/// Get the project root directory
fn project_root() -> PathBuf {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").map_or_else(|_| PathBuf::from("."), PathBuf::from);

    // xtask is in project_root/xtask, so go up one level
    if manifest_dir.ends_with("xtask")
        && let Some(parent) = manifest_dir.parent()
    {
        return parent.to_path_buf();
    }
    manifest_dir
}

fn run(mut command: Command, description: &str) -> Result<()> {
    println!("==> {description}");
    let status = command
        .current_dir(project_root())
        .status()
        .with_context(|| format!("Failed to spawn cargo for {description}"))?;

    if !status.success() {
        bail!("{description} failed with {status}");
    }
    Ok(())
}

fn cargo_test(features: Option<&[&str]>, no_doc: bool) -> Command {
    let mut command = Command::new(cargo());
    command.args(["test", "--package", "deferred-collections"]);
    if let Some(features) = features {
        command
            .arg("--no-default-features")
            .arg("--features")
            .arg(features.join(","));
    }
    if no_doc {
        command.args(["--lib", "--tests"]);
    }
    command
}

/// Runs `cargo test` for every feature combination
pub fn test_matrix(args: &TestMatrixArgs) -> Result<()> {
    run(cargo_test(None, args.no_doc), "default features")?;

    let combinations = if args.quick {
        QUICK_MATRIX
    } else {
        FEATURE_MATRIX
    };

    for &features in combinations {
        run(
            cargo_test(Some(features), args.no_doc),
            &format!("features [{}]", features.join(", ")),
        )?;
    }

    println!("All feature combinations passed");
    Ok(())
}

/// Runs the loom suite with `--cfg loom`
pub fn loom(args: &LoomArgs) -> Result<()> {
    let rustflags = env::var("RUSTFLAGS").map_or_else(
        |_| "--cfg loom".to_string(),
        |existing| format!("{existing} --cfg loom"),
    );

    let mut command = Command::new(cargo());
    command
        .args([
            "test",
            "--package",
            "deferred-collections",
            "--release",
            "--test",
            "container_loom_tests",
        ])
        .env("RUSTFLAGS", rustflags)
        .env("LOOM_MAX_PREEMPTIONS", args.preemption_bound.to_string());
    if let Some(test_name) = &args.test_name {
        command.arg(test_name);
    }

    run(command, "loom model checking")
}
