//! Request-scoped scratch directory for one verification.
//!
//! Sources and artifacts of both variants live under a single fresh temp
//! directory with per-variant file names. Dropping the workspace removes
//! everything in it; `close` does the same and reports failures.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::Variant;
use crate::error::OracleError;
use crate::source::SourceText;

pub(crate) struct Workspace {
    dir: TempDir,
    root: PathBuf,
}

impl Workspace {
    /// Create a fresh `codeopt-*` directory under `parent`, or under the
    /// system temp dir when `parent` is `None`.
    pub(crate) fn create(parent: Option<&Path>) -> Result<Self, OracleError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("codeopt-");
        let dir = match parent {
            Some(p) => builder.tempdir_in(p),
            None => builder.tempdir(),
        }
        .map_err(OracleError::Workspace)?;
        // Absolute path so spawned artifacts resolve regardless of cwd.
        let root = dir.path().canonicalize().map_err(OracleError::Workspace)?;
        Ok(Self { dir, root })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.root
    }

    pub(crate) fn source_path(&self, variant: Variant, source: &SourceText) -> PathBuf {
        self.root
            .join(format!("{}.{}", variant.stem(), source.language().extension()))
    }

    pub(crate) fn artifact_path(&self, variant: Variant) -> PathBuf {
        let name = if std::env::consts::EXE_EXTENSION.is_empty() {
            format!("{}_exe", variant.stem())
        } else {
            format!("{}_exe.{}", variant.stem(), std::env::consts::EXE_EXTENSION)
        };
        self.root.join(name)
    }

    pub(crate) fn write_source(
        &self,
        variant: Variant,
        source: &SourceText,
    ) -> Result<PathBuf, OracleError> {
        let path = self.source_path(variant, source);
        fs::write(&path, source.as_str()).map_err(|e| OracleError::WriteSource {
            path: path.clone(),
            source: e,
        })?;
        Ok(path)
    }

    /// Remove the directory now, surfacing any error.
    pub(crate) fn close(self) -> Result<(), OracleError> {
        let path = self.root;
        self.dir
            .close()
            .map_err(|e| OracleError::Cleanup { path, source: e })
    }
}
