use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::process::Command;

pub const SOURCE_PLACEHOLDER: &str = "{source}";
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// External compiler invocation: a program plus an argument template.
///
/// `{source}` and `{output}` in any argument are replaced by the source
/// file and artifact paths. A non-zero exit means the build failed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toolchain {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self::gxx()
    }
}

impl Toolchain {
    /// `g++ {source} -o {output}`
    pub fn gxx() -> Self {
        Self {
            program: "g++".to_string(),
            args: vec![
                SOURCE_PLACEHOLDER.to_string(),
                "-o".to_string(),
                OUTPUT_PLACEHOLDER.to_string(),
            ],
        }
    }

    /// `gcc {source} -o {output}`
    pub fn gcc() -> Self {
        Self {
            program: "gcc".to_string(),
            ..Self::gxx()
        }
    }

    pub fn mentions_output(&self) -> bool {
        self.args.iter().any(|a| a.contains(OUTPUT_PLACEHOLDER))
    }

    /// Expanded argument list for one build.
    pub fn expand_args(&self, source: &Path, output: &Path) -> Vec<String> {
        let source = source.to_string_lossy();
        let output = output.to_string_lossy();
        self.args
            .iter()
            .map(|a| {
                a.replace(SOURCE_PLACEHOLDER, &source)
                    .replace(OUTPUT_PLACEHOLDER, &output)
            })
            .collect()
    }

    pub(crate) fn command(&self, source: &Path, output: &Path, cwd: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.expand_args(source, output)).current_dir(cwd);
        cmd
    }
}
