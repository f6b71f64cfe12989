use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::oracle::{OracleConfig, Toolchain};
use crate::pass;
use crate::pipeline::Pipeline;

pub const CONFIG_FILE: &str = "codeopt.toml";

/// Settings from `codeopt.toml`. Every field is optional.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub oracle: OracleSection,
    pub retrieval: RetrievalSection,
    pub pipeline: PipelineSection,
    /// Directory holding the config file; relative paths resolve here.
    #[serde(skip)]
    pub root_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct OracleSection {
    pub compiler: Option<String>,
    /// Argument template; must contain `{output}`.
    pub args: Option<Vec<String>>,
    pub compile_timeout_ms: Option<u64>,
    pub run_timeout_ms: Option<u64>,
    pub workspace_root: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RetrievalSection {
    pub corpus: Option<PathBuf>,
    pub min_similarity: Option<f64>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineSection {
    /// Supplementary passes, run after the canonical four in this order.
    pub extra_passes: Vec<String>,
}

impl Config {
    /// Load and validate a config file.
    pub fn load(toml_path: &Path) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(toml_path).map_err(|e| ConfigError::Read {
            path: toml_path.to_path_buf(),
            source: e,
        })?;
        let mut config = Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: toml_path.to_path_buf(),
            source: e,
        })?;
        config.root_dir = Some(
            toml_path
                .parent()
                .unwrap_or(Path::new("."))
                .to_path_buf(),
        );
        config.validate()?;
        Ok(config)
    }

    fn parse(content: &str) -> Result<Config, toml::de::Error> {
        toml::from_str(content)
    }

    /// Try to find a codeopt.toml in the given directory or its ancestors.
    pub fn find(start_dir: &Path) -> Option<PathBuf> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                return Some(candidate);
            }
            if !dir.pop() {
                return None;
            }
        }
    }

    /// Load the nearest config above `start_dir`, or defaults if none exists.
    pub fn discover(start_dir: &Path) -> Result<Config, ConfigError> {
        match Self::find(start_dir) {
            Some(path) => Self::load(&path),
            None => Ok(Config::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.toolchain().mentions_output() {
            return Err(ConfigError::MissingOutputPlaceholder);
        }
        if let Some(t) = self.retrieval.min_similarity {
            if !(0.0..=1.0).contains(&t) {
                return Err(ConfigError::SimilarityOutOfRange(t));
            }
        }
        for name in &self.pipeline.extra_passes {
            if pass::by_name(name).is_none() {
                return Err(ConfigError::UnknownPass { name: name.clone() });
            }
        }
        Ok(())
    }

    pub fn toolchain(&self) -> Toolchain {
        let mut toolchain = Toolchain::default();
        if let Some(compiler) = &self.oracle.compiler {
            toolchain.program = compiler.clone();
        }
        if let Some(args) = &self.oracle.args {
            toolchain.args = args.clone();
        }
        toolchain
    }

    pub fn oracle_config(&self) -> OracleConfig {
        let defaults = OracleConfig::default();
        OracleConfig {
            toolchain: self.toolchain(),
            compile_timeout: self
                .oracle
                .compile_timeout_ms
                .map_or(defaults.compile_timeout, Duration::from_millis),
            run_timeout: self
                .oracle
                .run_timeout_ms
                .map_or(defaults.run_timeout, Duration::from_millis),
            workspace_root: self.oracle.workspace_root.as_deref().map(|p| self.resolve(p)),
        }
    }

    /// Canonical passes plus `[pipeline] extra_passes`.
    pub fn build_pipeline(&self) -> Result<Pipeline, ConfigError> {
        let mut extra = Vec::with_capacity(self.pipeline.extra_passes.len());
        for name in &self.pipeline.extra_passes {
            let pass = pass::by_name(name).ok_or_else(|| ConfigError::UnknownPass {
                name: name.clone(),
            })?;
            extra.push(pass);
        }
        Ok(Pipeline::extended(extra))
    }

    pub fn corpus_path(&self) -> Option<PathBuf> {
        self.retrieval.corpus.as_deref().map(|p| self.resolve(p))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root_dir {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_config() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join(CONFIG_FILE);
        fs::write(
            &toml_path,
            r#"[oracle]
compiler = "clang++"
args = ["-O2", "{source}", "-o", "{output}"]
run_timeout_ms = 1500
workspace_root = "scratch"

[retrieval]
corpus = "data/pairs.jsonl"
min_similarity = 0.25

[pipeline]
extra_passes = ["strip-comments", "unordered-containers"]
"#,
        )
        .unwrap();

        let config = Config::load(&toml_path).unwrap();
        let oracle = config.oracle_config();
        assert_eq!(oracle.toolchain.program, "clang++");
        assert_eq!(oracle.toolchain.args[0], "-O2");
        assert_eq!(oracle.run_timeout, Duration::from_millis(1500));
        assert_eq!(oracle.compile_timeout, OracleConfig::default().compile_timeout);
        assert_eq!(oracle.workspace_root, Some(dir.path().join("scratch")));
        assert_eq!(config.corpus_path(), Some(dir.path().join("data/pairs.jsonl")));
        assert_eq!(config.retrieval.min_similarity, Some(0.25));

        let pipeline = config.build_pipeline().unwrap();
        assert_eq!(
            pipeline.pass_names(),
            vec![
                "constant-folding",
                "dead-code-elimination",
                "peephole",
                "inline-expansion",
                "strip-comments",
                "unordered-containers",
            ]
        );
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.validate().is_ok());
        assert_eq!(config.toolchain(), Toolchain::gxx());
        assert_eq!(config.build_pipeline().unwrap().pass_names().len(), 4);
        assert!(config.corpus_path().is_none());
    }

    #[test]
    fn unknown_pass_is_rejected() {
        let mut config = Config::default();
        config.pipeline.extra_passes.push("loop-unrolling".to_string());
        match config.validate() {
            Err(ConfigError::UnknownPass { name }) => assert_eq!(name, "loop-unrolling"),
            other => panic!("expected unknown pass, got {:?}", other),
        }
    }

    #[test]
    fn args_without_output_are_rejected() {
        let config = Config::parse("[oracle]\nargs = [\"{source}\"]\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingOutputPlaceholder)
        ));
    }

    #[test]
    fn similarity_must_be_a_fraction() {
        let config = Config::parse("[retrieval]\nmin_similarity = 1.5\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SimilarityOutOfRange(t)) if t == 1.5
        ));
    }

    #[test]
    fn unknown_keys_are_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join(CONFIG_FILE);
        fs::write(&toml_path, "[oracle]\ncompiller = \"g++\"\n").unwrap();
        assert!(matches!(
            Config::load(&toml_path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn find_walks_up_to_ancestors() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "[oracle]\nrun_timeout_ms = 42\n").unwrap();

        assert_eq!(Config::find(&nested), Some(dir.path().join(CONFIG_FILE)));
        let config = Config::discover(&nested).unwrap();
        assert_eq!(config.oracle_config().run_timeout, Duration::from_millis(42));
    }
}
