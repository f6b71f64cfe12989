use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Resource failures that abort a single verification request.
///
/// Compilation failures, unlaunchable artifacts, non-zero exits and timeouts
/// of the program under test are not errors; they are reported as
/// `VariantOutcome`s.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("cannot create verification workspace: {0}")]
    Workspace(#[source] io::Error),
    #[error("cannot write `{}`: {source}", path.display())]
    WriteSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The toolchain itself could not be started.
    #[error("cannot launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("cannot remove verification workspace `{}`: {source}", path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read `{}`: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config `{}`: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("unknown pass `{name}` in [pipeline] extra_passes")]
    UnknownPass { name: String },
    #[error("toolchain argument template must mention {{output}}")]
    MissingOutputPlaceholder,
    #[error("min_similarity must be within 0.0..=1.0, got {0}")]
    SimilarityOutOfRange(f64),
}

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("cannot read corpus `{}`: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("corpus `{}` line {line}: {source}", path.display())]
    Record {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("corpus `{}` is not a JSON array: {source}", path.display())]
    Document {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("corpus `{}` is not valid CSV: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
