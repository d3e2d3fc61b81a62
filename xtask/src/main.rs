//! xtask - Development task runner for deferred-collections
//!
//! Usage:
//!   cargo xtask test-matrix [--quick]
//!   cargo xtask loom [--preemption-bound <n>]

mod checks;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development task runner for deferred-collections")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the test suite once per feature combination
    TestMatrix(checks::TestMatrixArgs),
    /// Run the loom model-checking suite
    Loom(checks::LoomArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::TestMatrix(args) => checks::test_matrix(&args),
        Commands::Loom(args) => checks::loom(&args),
    }
}
