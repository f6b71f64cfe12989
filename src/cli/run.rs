use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use codeopt::config::Config;
use codeopt::report::{
    format_run, format_verification, to_json, OptimizeReport, VerificationReport,
};
use codeopt::{Oracle, Origin};

use super::{build_selector, exit_code, read_source, render_build_failures};

#[derive(Args)]
pub struct RunArgs {
    /// Input C/C++ source file
    pub input: PathBuf,
    /// Corpus of known optimizations (JSON array, JSON Lines or CSV)
    #[arg(long)]
    pub corpus: Option<PathBuf>,
    /// Emit a JSON report
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct RunSummary {
    optimize: OptimizeReport,
    verification: VerificationReport,
}

/// Optimize `input`, then build and run both versions.
pub async fn cmd_run(args: RunArgs, config: &Config) -> Result<ExitCode> {
    let source = read_source(&args.input)?;
    let selector = build_selector(config, args.corpus.as_deref())?;
    let optimized = selector.optimize(&source);

    let oracle = Oracle::new(config.oracle_config());
    let verification = oracle.verify(&source, &optimized.text).await?;

    if args.json {
        let report = RunSummary {
            optimize: OptimizeReport::new(&optimized),
            verification: VerificationReport::new(&verification),
        };
        println!("{}", to_json(&report)?);
        return Ok(exit_code(&verification));
    }

    println!("Original Code:\n{}", source);
    println!("Optimized Code:\n{}", optimized.text);
    match &optimized.origin {
        Origin::Corpus { index, score } => {
            eprintln!("Answered from corpus row {} (similarity {:.3})", index, score);
        }
        Origin::Pipeline { run, .. } => eprint!("{}", format_run(run)),
    }

    let name = args.input.display().to_string();
    let rewritten_name = format!("{} (optimized)", name);
    render_build_failures(
        &verification,
        (name.as_str(), &source),
        (rewritten_name.as_str(), &optimized.text),
    );
    eprint!("{}", format_verification(&verification));
    Ok(exit_code(&verification))
}
