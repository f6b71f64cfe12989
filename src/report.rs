//! Machine-readable and table-style reports for pipeline runs and
//! verifications.
//!
//! The JSON shapes are plain serde structs built from the library types;
//! the text tables follow the same column layout for every report.

use serde::Serialize;

use crate::diagnostic::Diagnostic;
use crate::oracle::{CompileFailureReason, Equivalence, Variant, VariantOutcome, Verification};
use crate::pipeline::PipelineRun;
use crate::select::{FallbackReason, Optimized, Origin};

/// Context lines around each hunk in stage diffs.
pub const DIFF_CONTEXT: usize = 3;

// ─── Data Structures ───────────────────────────────────────────────

#[derive(Clone, Debug, Serialize)]
pub struct StageReport {
    pub index: usize,
    pub pass: &'static str,
    pub changed: bool,
    pub inserted: usize,
    pub deleted: usize,
    /// Unified diff of this stage; empty when unchanged.
    pub diff: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub input_fingerprint: String,
    pub output_fingerprint: String,
    pub stages: Vec<StageReport>,
    pub output: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct OptimizeReport {
    /// `"corpus"` or `"pipeline"`.
    pub origin: &'static str,
    pub corpus_row: Option<usize>,
    pub score: Option<f64>,
    pub fallback_reason: Option<&'static str>,
    pub corpus_unavailable: bool,
    pub output: String,
    pub run: Option<RunReport>,
}

#[derive(Clone, Debug, Serialize)]
pub struct VariantReport {
    pub variant: Variant,
    pub outcome: &'static str,
    pub exit_code: Option<i32>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub elapsed_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
    pub compile_failure: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Clone, Debug, Serialize)]
pub struct VerificationReport {
    pub original: VariantReport,
    pub rewritten: VariantReport,
    pub equivalence: Equivalence,
}

// ─── Builders ──────────────────────────────────────────────────────

impl RunReport {
    pub fn new(run: &PipelineRun) -> Self {
        let stages = run
            .stages()
            .iter()
            .map(|stage| {
                let d = stage.diff();
                StageReport {
                    index: stage.index,
                    pass: stage.pass,
                    changed: stage.changed(),
                    inserted: d.insertions(),
                    deleted: d.deletions(),
                    diff: d.unified(stage.pass, DIFF_CONTEXT),
                }
            })
            .collect();
        Self {
            input_fingerprint: run.input().short_fingerprint(),
            output_fingerprint: run.output().short_fingerprint(),
            stages,
            output: run.output().as_str().to_string(),
        }
    }
}

fn reason_label(reason: FallbackReason) -> &'static str {
    match reason {
        FallbackReason::CorpusUnavailable => "corpus-unavailable",
        FallbackReason::EmptyOptimized { .. } => "empty-optimized",
        FallbackReason::BelowThreshold { .. } => "below-threshold",
    }
}

impl OptimizeReport {
    pub fn new(optimized: &Optimized) -> Self {
        let output = optimized.text.as_str().to_string();
        let corpus_unavailable = optimized.corpus_unavailable();
        match &optimized.origin {
            Origin::Corpus { index, score } => Self {
                origin: "corpus",
                corpus_row: Some(*index),
                score: Some(*score),
                fallback_reason: None,
                corpus_unavailable,
                output,
                run: None,
            },
            Origin::Pipeline { run, reason } => {
                let (corpus_row, score) = match *reason {
                    FallbackReason::CorpusUnavailable => (None, None),
                    FallbackReason::EmptyOptimized { index } => (Some(index), None),
                    FallbackReason::BelowThreshold { index, score } => (Some(index), Some(score)),
                };
                Self {
                    origin: "pipeline",
                    corpus_row,
                    score,
                    fallback_reason: Some(reason_label(*reason)),
                    corpus_unavailable,
                    output,
                    run: Some(RunReport::new(run)),
                }
            }
        }
    }
}

fn compile_failure_label(reason: &CompileFailureReason) -> String {
    match reason {
        CompileFailureReason::Exit(Some(code)) => format!("exit status {}", code),
        CompileFailureReason::Exit(None) => "terminated by signal".to_string(),
        CompileFailureReason::TimedOut(limit) => format!("timed out after {}ms", limit.as_millis()),
        CompileFailureReason::MissingArtifact => "no artifact produced".to_string(),
        CompileFailureReason::NotExecutable(kind) => format!("artifact not executable: {}", kind),
    }
}

impl VariantReport {
    pub fn new(variant: Variant, outcome: &VariantOutcome) -> Self {
        let mut report = Self {
            variant,
            outcome: outcome.label(),
            exit_code: None,
            stdout: None,
            stderr: None,
            elapsed_ms: None,
            timeout_ms: None,
            compile_failure: None,
            diagnostics: Vec::new(),
        };
        match outcome {
            VariantOutcome::Completed(r) | VariantOutcome::ExecutionFailed(r) => {
                report.exit_code = r.exit_code;
                report.stdout = Some(r.stdout.clone());
                report.stderr = Some(r.stderr.clone());
                report.elapsed_ms = Some(r.elapsed.as_millis() as u64);
            }
            VariantOutcome::TimedOut { limit } => {
                report.timeout_ms = Some(limit.as_millis() as u64);
            }
            VariantOutcome::CompilationFailed(failure) => {
                report.stderr = Some(failure.stderr.clone());
                report.compile_failure = Some(compile_failure_label(&failure.reason));
                report.diagnostics = failure.diagnostics.clone();
            }
        }
        report
    }
}

impl VerificationReport {
    pub fn new(verification: &Verification) -> Self {
        Self {
            original: VariantReport::new(Variant::Original, &verification.original),
            rewritten: VariantReport::new(Variant::Rewritten, &verification.rewritten),
            equivalence: verification.equivalence(),
        }
    }
}

/// Pretty-printed JSON for any report.
pub fn to_json<T: Serialize>(report: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

// ─── Text Formatting ───────────────────────────────────────────────

/// Table of stages: which passes fired and how many lines they touched.
pub fn format_run(run: &PipelineRun) -> String {
    let report = RunReport::new(run);
    let mut out = String::new();
    out.push_str(&format!(
        "Pipeline report: {} -> {}\n",
        report.input_fingerprint, report.output_fingerprint
    ));
    out.push_str(&format!(
        "{:<6} {:<24} {:>8} {:>6} {:>6}\n",
        "Stage", "Pass", "changed", "+", "-"
    ));
    out.push_str(&"-".repeat(54));
    out.push('\n');

    let (mut inserted, mut deleted) = (0, 0);
    for stage in &report.stages {
        out.push_str(&format!(
            "{:<6} {:<24} {:>8} {:>6} {:>6}\n",
            stage.index,
            stage.pass,
            if stage.changed { "yes" } else { "no" },
            stage.inserted,
            stage.deleted,
        ));
        inserted += stage.inserted;
        deleted += stage.deleted;
    }

    out.push_str(&"-".repeat(54));
    out.push('\n');
    out.push_str(&format!(
        "{:<6} {:<24} {:>8} {:>6} {:>6}\n",
        "TOTAL",
        "",
        run.effective_passes().len(),
        inserted,
        deleted,
    ));
    out
}

/// Side-by-side summary of both variants plus the equivalence verdict.
pub fn format_verification(verification: &Verification) -> String {
    let report = VerificationReport::new(verification);
    let mut out = String::new();
    out.push_str("Verification report\n");
    out.push_str(&format!(
        "{:<10} {:<20} {:>6} {:>10}  {}\n",
        "Variant", "Outcome", "exit", "elapsed", "detail"
    ));
    out.push_str(&"-".repeat(64));
    out.push('\n');

    for (name, v) in [("original", &report.original), ("rewritten", &report.rewritten)] {
        let exit = v.exit_code.map_or("-".to_string(), |c| c.to_string());
        let elapsed = v.elapsed_ms.map_or("-".to_string(), |ms| format!("{}ms", ms));
        let detail = match (&v.compile_failure, v.timeout_ms) {
            (Some(reason), _) => reason.clone(),
            (None, Some(ms)) => format!("killed after {}ms", ms),
            (None, None) => String::new(),
        };
        out.push_str(&format!(
            "{:<10} {:<20} {:>6} {:>10}  {}\n",
            name, v.outcome, exit, elapsed, detail
        ));
    }

    out.push_str(&"-".repeat(64));
    out.push('\n');
    let verdict = match report.equivalence {
        Equivalence::Equivalent => "equivalent (stdout and exit code match)".to_string(),
        Equivalence::Diverged {
            stdout_differs,
            exit_differs,
        } => {
            let mut parts = Vec::new();
            if stdout_differs {
                parts.push("stdout");
            }
            if exit_differs {
                parts.push("exit code");
            }
            format!("diverged ({} differ)", parts.join(", "))
        }
        Equivalence::Inconclusive => "inconclusive (a variant did not run)".to_string(),
    };
    out.push_str(&format!("Verdict: {}\n", verdict));
    out
}
