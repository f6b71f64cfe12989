//! Build-and-run equivalence oracle.
//!
//! Writes the original and rewritten programs into a fresh workspace,
//! builds each with the configured toolchain, runs each artifact with no
//! input, and reports both outcomes side by side. Both variants are driven
//! concurrently and independently: one failing to build or hanging never
//! affects the other's result.
//!
//! The oracle does not decide equivalence; `Verification::equivalence`
//! applies the byte-equal stdout rule for callers that want it. That rule
//! is a single sampled execution, not a proof.

mod process;
pub mod toolchain;
mod workspace;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tokio::process::Command;
use tracing::{info, warn};

use crate::diagnostic::{parse_toolchain_output, Diagnostic};
use crate::error::OracleError;
use crate::source::SourceText;
use process::{run_bounded, Bounded};
pub use toolchain::Toolchain;
use workspace::Workspace;

// ─── Types ─────────────────────────────────────────────────────────

/// Which side of the comparison a result belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Original,
    Rewritten,
}

impl Variant {
    fn stem(self) -> &'static str {
        match self {
            Variant::Original => "original",
            Variant::Rewritten => "rewritten",
        }
    }
}

/// Captured streams and exit status of one artifact run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was ended by a signal.
    pub exit_code: Option<i32>,
    pub elapsed: Duration,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompileFailureReason {
    /// Toolchain exited non-zero (`None`: killed by a signal).
    Exit(Option<i32>),
    TimedOut(Duration),
    /// Toolchain reported success but wrote no artifact.
    MissingArtifact,
    /// The artifact exists but the OS refused to launch it.
    NotExecutable(std::io::ErrorKind),
}

/// A variant that never produced a runnable artifact.
#[derive(Clone, Debug, PartialEq)]
pub struct CompilationFailure {
    pub reason: CompileFailureReason,
    pub stdout: String,
    pub stderr: String,
    /// `stderr` parsed into positioned diagnostics, where it could be.
    pub diagnostics: Vec<Diagnostic>,
}

/// What happened to one variant.
#[derive(Clone, Debug, PartialEq)]
pub enum VariantOutcome {
    /// Built and exited with status 0.
    Completed(ExecutionResult),
    /// Built, ran, and exited non-zero or was signalled.
    ExecutionFailed(ExecutionResult),
    /// Built, but the run exceeded the time limit and was killed.
    TimedOut { limit: Duration },
    CompilationFailed(CompilationFailure),
}

impl VariantOutcome {
    /// The execution result, if the artifact ran to completion.
    pub fn execution(&self) -> Option<&ExecutionResult> {
        match self {
            VariantOutcome::Completed(r) | VariantOutcome::ExecutionFailed(r) => Some(r),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VariantOutcome::Completed(_) => "completed",
            VariantOutcome::ExecutionFailed(_) => "execution-failed",
            VariantOutcome::TimedOut { .. } => "timed-out",
            VariantOutcome::CompilationFailed(_) => "compilation-failed",
        }
    }
}

/// How the two variants compare under the stdout oracle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "lowercase")]
pub enum Equivalence {
    /// Both ran; stdout bytes and exit codes match.
    Equivalent,
    /// Both ran and differ.
    Diverged {
        stdout_differs: bool,
        exit_differs: bool,
    },
    /// At least one variant did not run to completion.
    Inconclusive,
}

/// Both outcomes of one `verify` call.
#[derive(Clone, Debug, PartialEq)]
pub struct Verification {
    pub original: VariantOutcome,
    pub rewritten: VariantOutcome,
}

impl Verification {
    pub fn equivalence(&self) -> Equivalence {
        match (self.original.execution(), self.rewritten.execution()) {
            (Some(a), Some(b)) => {
                let stdout_differs = a.stdout != b.stdout;
                let exit_differs = a.exit_code != b.exit_code;
                if stdout_differs || exit_differs {
                    Equivalence::Diverged {
                        stdout_differs,
                        exit_differs,
                    }
                } else {
                    Equivalence::Equivalent
                }
            }
            _ => Equivalence::Inconclusive,
        }
    }

    pub fn outcome(&self, variant: Variant) -> &VariantOutcome {
        match variant {
            Variant::Original => &self.original,
            Variant::Rewritten => &self.rewritten,
        }
    }
}

// ─── Configuration ─────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct OracleConfig {
    pub toolchain: Toolchain,
    pub compile_timeout: Duration,
    pub run_timeout: Duration,
    /// Parent for per-request workspaces; system temp dir when `None`.
    pub workspace_root: Option<PathBuf>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            toolchain: Toolchain::default(),
            compile_timeout: Duration::from_secs(60),
            run_timeout: Duration::from_secs(10),
            workspace_root: None,
        }
    }
}

// ─── Oracle ────────────────────────────────────────────────────────

/// Stateless apart from its config; safe to share across requests.
#[derive(Clone, Debug, Default)]
pub struct Oracle {
    config: OracleConfig,
}

impl Oracle {
    pub fn new(config: OracleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    /// Build and run both variants, returning both outcomes.
    ///
    /// The workspace is removed before this returns, on every path.
    pub async fn verify(
        &self,
        original: &SourceText,
        rewritten: &SourceText,
    ) -> Result<Verification, OracleError> {
        let ws = Workspace::create(self.config.workspace_root.as_deref())?;
        info!(
            workspace = %ws.path().display(),
            original = %original.short_fingerprint(),
            rewritten = %rewritten.short_fingerprint(),
            "verifying rewrite"
        );

        let (a, b) = tokio::join!(
            self.build_and_run(&ws, Variant::Original, original),
            self.build_and_run(&ws, Variant::Rewritten, rewritten),
        );
        let closed = ws.close();

        let verification = Verification {
            original: a?,
            rewritten: b?,
        };
        closed?;

        info!(
            original = verification.original.label(),
            rewritten = verification.rewritten.label(),
            equivalence = ?verification.equivalence(),
            "verification finished"
        );
        Ok(verification)
    }

    async fn build_and_run(
        &self,
        ws: &Workspace,
        variant: Variant,
        source: &SourceText,
    ) -> Result<VariantOutcome, OracleError> {
        let src_path = ws.write_source(variant, source)?;
        let artifact = ws.artifact_path(variant);

        if let Some(failure) = self.compile(ws.path(), &src_path, &artifact, source).await? {
            warn!(variant = variant.stem(), reason = ?failure.reason, "compilation failed");
            return Ok(VariantOutcome::CompilationFailed(failure));
        }

        let mut cmd = Command::new(&artifact);
        cmd.current_dir(ws.path());
        let limit = self.config.run_timeout;
        let outcome = match run_bounded(cmd, limit).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(variant = variant.stem(), error = %e, "artifact could not be launched");
                return Ok(VariantOutcome::CompilationFailed(CompilationFailure {
                    reason: CompileFailureReason::NotExecutable(e.kind()),
                    stdout: String::new(),
                    stderr: e.to_string(),
                    diagnostics: Vec::new(),
                }));
            }
        };

        Ok(match outcome {
            Bounded::TimedOut => {
                warn!(variant = variant.stem(), limit_ms = limit.as_millis() as u64, "execution timed out");
                VariantOutcome::TimedOut { limit }
            }
            Bounded::Finished {
                status,
                stdout,
                stderr,
                elapsed,
            } => {
                let result = ExecutionResult {
                    stdout: String::from_utf8_lossy(&stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&stderr).into_owned(),
                    exit_code: status.code(),
                    elapsed,
                };
                if status.success() {
                    VariantOutcome::Completed(result)
                } else {
                    VariantOutcome::ExecutionFailed(result)
                }
            }
        })
    }

    /// Run the toolchain. `Ok(None)` means an artifact is ready.
    async fn compile(
        &self,
        cwd: &Path,
        src_path: &Path,
        artifact: &Path,
        source: &SourceText,
    ) -> Result<Option<CompilationFailure>, OracleError> {
        let toolchain = &self.config.toolchain;
        let cmd = toolchain.command(src_path, artifact, cwd);
        let limit = self.config.compile_timeout;
        let outcome = run_bounded(cmd, limit)
            .await
            .map_err(|e| OracleError::Spawn {
                program: toolchain.program.clone(),
                source: e,
            })?;

        let failure = match outcome {
            Bounded::TimedOut => CompilationFailure {
                reason: CompileFailureReason::TimedOut(limit),
                stdout: String::new(),
                stderr: String::new(),
                diagnostics: Vec::new(),
            },
            Bounded::Finished {
                status,
                stdout,
                stderr,
                ..
            } => {
                let stdout = String::from_utf8_lossy(&stdout).into_owned();
                let stderr = String::from_utf8_lossy(&stderr).into_owned();
                let reason = if !status.success() {
                    CompileFailureReason::Exit(status.code())
                } else if !artifact.is_file() {
                    CompileFailureReason::MissingArtifact
                } else {
                    return Ok(None);
                };
                let diagnostics = parse_toolchain_output(&stderr, source.as_str());
                CompilationFailure {
                    reason,
                    stdout,
                    stderr,
                    diagnostics,
                }
            }
        };
        Ok(Some(failure))
    }
}
