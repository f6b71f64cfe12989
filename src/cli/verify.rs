use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use codeopt::config::Config;
use codeopt::report::{format_verification, to_json, VerificationReport};
use codeopt::Oracle;

use super::{exit_code, read_source, render_build_failures};

#[derive(Args)]
pub struct VerifyArgs {
    /// Original program
    pub original: PathBuf,
    /// Rewritten program
    pub rewritten: PathBuf,
    /// Emit a JSON report
    #[arg(long)]
    pub json: bool,
}

/// Exit status: 0 equivalent, 1 diverged, 2 inconclusive.
pub async fn cmd_verify(args: VerifyArgs, config: &Config) -> Result<ExitCode> {
    let original = read_source(&args.original)?;
    let rewritten = read_source(&args.rewritten)?;

    let oracle = Oracle::new(config.oracle_config());
    let verification = oracle.verify(&original, &rewritten).await?;

    if args.json {
        println!("{}", to_json(&VerificationReport::new(&verification))?);
    } else {
        let original_name = args.original.display().to_string();
        let rewritten_name = args.rewritten.display().to_string();
        render_build_failures(
            &verification,
            (original_name.as_str(), &original),
            (rewritten_name.as_str(), &rewritten),
        );
        eprint!("{}", format_verification(&verification));
    }
    Ok(exit_code(&verification))
}
