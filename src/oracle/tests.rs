//! Oracle tests. A `sh` one-liner stands in for the C++ toolchain: it
//! copies the "source" (a shell script) to the artifact path and marks it
//! executable, so the tests exercise real build and run subprocesses
//! without needing g++.
#![cfg(unix)]

use std::fs;

use super::*;
use crate::source::SourceText;

const COPY_BUILD: &str = r#"cp "$0" "$1" && chmod +x "$1""#;
const NOEXEC_BUILD: &str = r#"cp "$0" "$1"; grep -q NOEXEC "$0" || chmod +x "$1""#;
const FAILING_BUILD: &str = r#"grep -q BROKEN "$0" && { echo "$0:2:1: error: BROKEN marker found" >&2; exit 1; }; cp "$0" "$1" && chmod +x "$1""#;

fn script_toolchain(script: &str) -> Toolchain {
    Toolchain {
        program: "sh".to_string(),
        args: vec![
            "-c".to_string(),
            script.to_string(),
            toolchain::SOURCE_PLACEHOLDER.to_string(),
            toolchain::OUTPUT_PLACEHOLDER.to_string(),
        ],
    }
}

fn oracle_in(root: &Path, script: &str, run_timeout: Duration) -> Oracle {
    Oracle::new(OracleConfig {
        toolchain: script_toolchain(script),
        compile_timeout: Duration::from_secs(20),
        run_timeout,
        workspace_root: Some(root.to_path_buf()),
    })
}

fn program(body: &str) -> SourceText {
    SourceText::cpp(format!("#!/bin/sh\n{}\n", body))
}

fn assert_root_empty(root: &Path) {
    let leftovers: Vec<_> = fs::read_dir(root)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert!(leftovers.is_empty(), "left behind: {:?}", leftovers);
}

#[tokio::test]
async fn equal_output_is_equivalent() {
    let root = tempfile::tempdir().unwrap();
    let oracle = oracle_in(root.path(), COPY_BUILD, Duration::from_secs(10));

    let v = oracle
        .verify(&program("echo 25"), &program("echo '25'"))
        .await
        .unwrap();

    let original = v.original.execution().unwrap();
    assert_eq!(original.stdout, "25\n");
    assert!(original.success());
    assert!(matches!(v.rewritten, VariantOutcome::Completed(_)));
    assert_eq!(v.equivalence(), Equivalence::Equivalent);
    assert_root_empty(root.path());
}

#[tokio::test]
async fn different_output_diverges() {
    let root = tempfile::tempdir().unwrap();
    let oracle = oracle_in(root.path(), COPY_BUILD, Duration::from_secs(10));

    let v = oracle
        .verify(&program("echo 25"), &program("echo 26; exit 4"))
        .await
        .unwrap();

    assert!(matches!(v.rewritten, VariantOutcome::ExecutionFailed(ref r) if r.exit_code == Some(4)));
    assert_eq!(
        v.equivalence(),
        Equivalence::Diverged {
            stdout_differs: true,
            exit_differs: true,
        }
    );
    assert_root_empty(root.path());
}

#[tokio::test]
async fn compile_failure_is_reported_per_variant() {
    let root = tempfile::tempdir().unwrap();
    let oracle = oracle_in(root.path(), FAILING_BUILD, Duration::from_secs(10));

    let v = oracle
        .verify(&program("echo ok"), &program("echo BROKEN"))
        .await
        .unwrap();

    assert!(matches!(v.original, VariantOutcome::Completed(_)));
    match &v.rewritten {
        VariantOutcome::CompilationFailed(failure) => {
            assert_eq!(failure.reason, CompileFailureReason::Exit(Some(1)));
            assert!(failure.stderr.contains("BROKEN marker found"));
            assert_eq!(failure.diagnostics.len(), 1);
            assert_eq!(failure.diagnostics[0].line, 2);
        }
        other => panic!("expected compilation failure, got {:?}", other),
    }
    assert_eq!(v.equivalence(), Equivalence::Inconclusive);
    assert_root_empty(root.path());
}

#[tokio::test]
async fn build_without_artifact_is_a_compile_failure() {
    let root = tempfile::tempdir().unwrap();
    let oracle = oracle_in(root.path(), "true", Duration::from_secs(10));

    let v = oracle
        .verify(&program("echo a"), &program("echo a"))
        .await
        .unwrap();

    for outcome in [&v.original, &v.rewritten] {
        assert!(matches!(
            outcome,
            VariantOutcome::CompilationFailed(CompilationFailure {
                reason: CompileFailureReason::MissingArtifact,
                ..
            })
        ));
    }
    assert_root_empty(root.path());
}

#[tokio::test]
async fn timeout_only_affects_the_hanging_variant() {
    let root = tempfile::tempdir().unwrap();
    let oracle = oracle_in(root.path(), COPY_BUILD, Duration::from_millis(500));

    let v = oracle
        .verify(&program("exec sleep 30"), &program("echo done"))
        .await
        .unwrap();

    assert_eq!(
        v.original,
        VariantOutcome::TimedOut {
            limit: Duration::from_millis(500)
        }
    );
    let rewritten = v.rewritten.execution().unwrap();
    assert_eq!(rewritten.stdout, "done\n");
    assert_eq!(v.equivalence(), Equivalence::Inconclusive);
    assert_root_empty(root.path());
}

#[tokio::test]
async fn artifacts_run_inside_the_workspace() {
    let root = tempfile::tempdir().unwrap();
    let oracle = oracle_in(root.path(), COPY_BUILD, Duration::from_secs(10));

    // Files the program writes land in the workspace and go with it.
    let v = oracle
        .verify(&program("echo x > scratch.txt; ls"), &program("true"))
        .await
        .unwrap();

    let listing = &v.original.execution().unwrap().stdout;
    assert!(listing.contains("scratch.txt"));
    assert!(listing.contains("original.cpp"));
    assert_root_empty(root.path());
}

#[tokio::test]
async fn missing_toolchain_is_fatal_and_still_cleans_up() {
    let root = tempfile::tempdir().unwrap();
    let oracle = Oracle::new(OracleConfig {
        toolchain: Toolchain {
            program: "/nonexistent/codeopt-cc".to_string(),
            args: vec!["{source}".into(), "-o".into(), "{output}".into()],
        },
        workspace_root: Some(root.path().to_path_buf()),
        ..OracleConfig::default()
    });

    let err = oracle
        .verify(&program("echo a"), &program("echo a"))
        .await
        .unwrap_err();
    assert!(matches!(err, OracleError::Spawn { ref program, .. } if program.contains("codeopt-cc")));
    assert_root_empty(root.path());
}

#[tokio::test]
async fn unlaunchable_artifact_only_fails_its_variant() {
    let root = tempfile::tempdir().unwrap();
    let oracle = oracle_in(root.path(), NOEXEC_BUILD, Duration::from_secs(10));

    let v = oracle
        .verify(&program("echo ok"), &program("echo NOEXEC"))
        .await
        .unwrap();

    assert_eq!(v.original.execution().unwrap().stdout, "ok\n");
    assert!(matches!(v.original, VariantOutcome::Completed(_)));
    match &v.rewritten {
        VariantOutcome::CompilationFailed(failure) => {
            assert!(matches!(failure.reason, CompileFailureReason::NotExecutable(_)));
            assert!(!failure.stderr.is_empty());
        }
        other => panic!("expected a launch failure, got {:?}", other),
    }
    assert_eq!(v.equivalence(), Equivalence::Inconclusive);
    assert_root_empty(root.path());
}

#[tokio::test]
async fn concurrent_requests_do_not_collide() {
    let root = tempfile::tempdir().unwrap();
    let oracle = oracle_in(root.path(), COPY_BUILD, Duration::from_secs(10));

    let runs = (0..4).map(|i| {
        let oracle = oracle.clone();
        let a = program(&format!("echo {}", i));
        let b = program(&format!("echo {}", i));
        tokio::spawn(async move { oracle.verify(&a, &b).await })
    });
    for (i, handle) in runs.collect::<Vec<_>>().into_iter().enumerate() {
        let v = handle.await.unwrap().unwrap();
        assert_eq!(v.original.execution().unwrap().stdout, format!("{}\n", i));
        assert_eq!(v.equivalence(), Equivalence::Equivalent);
    }
    assert_root_empty(root.path());
}
