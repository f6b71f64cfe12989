use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use codeopt::config::Config;
use codeopt::report::DIFF_CONTEXT;

use super::read_source;

#[derive(Args)]
pub struct DiffArgs {
    /// Input C/C++ source file
    pub input: PathBuf,
    /// Lines of context around each hunk
    #[arg(long, default_value_t = DIFF_CONTEXT)]
    pub context: usize,
}

pub fn cmd_diff(args: DiffArgs, config: &Config) -> Result<ExitCode> {
    let source = read_source(&args.input)?;
    let run = config.build_pipeline()?.run(&source);

    let mut any = false;
    for stage in run.stages() {
        let text = stage.diff().unified(stage.pass, args.context);
        if !text.is_empty() {
            any = true;
            print!("{}", text);
        }
    }
    if !any {
        eprintln!("No pass changed '{}'", args.input.display());
    }
    Ok(ExitCode::SUCCESS)
}
