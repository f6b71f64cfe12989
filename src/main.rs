mod cli;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use cli::diff::DiffArgs;
use cli::optimize::OptimizeArgs;
use cli::run::RunArgs;
use cli::verify::VerifyArgs;

#[derive(Parser)]
#[command(
    name = "codeopt",
    version,
    about = "Rewrite C/C++ sources with textual passes and check the result by building and running it"
)]
struct Cli {
    /// Config file (default: nearest codeopt.toml above the working directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Optimize a source file (corpus answer or rule-based rewrite)
    Optimize(OptimizeArgs),
    /// Show the unified diff of each pipeline stage
    Diff(DiffArgs),
    /// Build and run two programs and compare their output
    Verify(VerifyArgs),
    /// Optimize a file, then verify the rewrite against the original
    Run(RunArgs),
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    let config = cli::load_config(args.config.as_deref())?;

    match args.command {
        Command::Optimize(args) => cli::optimize::cmd_optimize(args, &config),
        Command::Diff(args) => cli::diff::cmd_diff(args, &config),
        Command::Verify(args) => cli::verify::cmd_verify(args, &config).await,
        Command::Run(args) => cli::run::cmd_run(args, &config).await,
    }
}
