pub mod diff;
pub mod optimize;
pub mod run;
pub mod verify;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::warn;

use codeopt::config::Config;
use codeopt::diagnostic::render_diagnostics;
use codeopt::oracle::{VariantOutcome, Verification};
use codeopt::{Corpus, Equivalence, FallbackSelector, Language, Retriever, SourceText};

/// Explicit `--config`, else the nearest codeopt.toml, else defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return Config::load(path).with_context(|| format!("loading {}", path.display()));
    }
    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    Ok(Config::discover(&cwd)?)
}

/// Read a source file; `.c` files are tagged C, everything else C++.
pub fn read_source(path: &Path) -> Result<SourceText> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read '{}'", path.display()))?;
    let language = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(Language::from_tag)
        .unwrap_or_default();
    Ok(SourceText::new(text, language))
}

/// Load the corpus named on the command line or in config.
///
/// A corpus that fails to load leaves the selector rule-based only.
pub fn load_retriever(config: &Config, explicit: Option<&Path>) -> Option<Arc<Retriever>> {
    let path: PathBuf = match explicit {
        Some(p) => p.to_path_buf(),
        None => config.corpus_path()?,
    };
    match Corpus::load(&path) {
        Ok(corpus) => Some(Arc::new(Retriever::new(corpus))),
        Err(e) => {
            warn!(error = %e, "corpus unavailable");
            eprintln!("warning: {}; using rule-based rewriting only", e);
            None
        }
    }
}

pub fn build_selector(config: &Config, corpus: Option<&Path>) -> Result<FallbackSelector> {
    let pipeline = config.build_pipeline()?;
    let selector = FallbackSelector::new(load_retriever(config, corpus), pipeline);
    Ok(match config.retrieval.min_similarity {
        Some(t) => selector.with_min_similarity(t),
        None => selector,
    })
}

/// Render parsed toolchain diagnostics for any variant that failed to build.
pub fn render_build_failures(
    verification: &Verification,
    original: (&str, &SourceText),
    rewritten: (&str, &SourceText),
) {
    for (outcome, (name, source)) in [
        (&verification.original, original),
        (&verification.rewritten, rewritten),
    ] {
        if let VariantOutcome::CompilationFailed(failure) = outcome {
            if failure.diagnostics.is_empty() {
                eprint!("{}", failure.stderr);
            } else {
                render_diagnostics(&failure.diagnostics, name, source.as_str());
            }
        }
    }
}

pub fn exit_code(verification: &Verification) -> ExitCode {
    match verification.equivalence() {
        Equivalence::Equivalent => ExitCode::SUCCESS,
        Equivalence::Diverged { .. } => ExitCode::from(1),
        Equivalence::Inconclusive => ExitCode::from(2),
    }
}
