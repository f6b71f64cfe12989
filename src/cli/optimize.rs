use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use codeopt::config::Config;
use codeopt::report::{format_run, to_json, OptimizeReport};
use codeopt::Origin;

use super::{build_selector, read_source};

#[derive(Args)]
pub struct OptimizeArgs {
    /// Input C/C++ source file
    pub input: PathBuf,
    /// Corpus of known optimizations (JSON array, JSON Lines or CSV)
    #[arg(long)]
    pub corpus: Option<PathBuf>,
    /// Print the per-stage table to stderr
    #[arg(long)]
    pub stages: bool,
    /// Emit a JSON report instead of the optimized source
    #[arg(long)]
    pub json: bool,
}

pub fn cmd_optimize(args: OptimizeArgs, config: &Config) -> Result<ExitCode> {
    let OptimizeArgs {
        input,
        corpus,
        stages,
        json,
    } = args;
    let source = read_source(&input)?;
    let selector = build_selector(config, corpus.as_deref())?;
    let optimized = selector.optimize(&source);

    if json {
        println!("{}", to_json(&OptimizeReport::new(&optimized))?);
        return Ok(ExitCode::SUCCESS);
    }

    match &optimized.origin {
        Origin::Corpus { index, score } => {
            eprintln!("Answered from corpus row {} (similarity {:.3})", index, score);
        }
        Origin::Pipeline { run, .. } => {
            eprintln!(
                "Rewritten by {} of {} passes",
                run.effective_passes().len(),
                run.stages().len()
            );
            if stages {
                eprint!("{}", format_run(run));
            }
        }
    }
    print!("{}", optimized.text);
    Ok(ExitCode::SUCCESS)
}
