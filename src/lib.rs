pub mod config;
pub mod diagnostic;
pub mod diff;
pub mod error;
pub mod oracle;
pub mod pass;
pub mod pipeline;
pub mod report;
pub mod retrieve;
pub mod select;
pub mod source;

use std::sync::Arc;

pub use error::{ConfigError, CorpusError, OracleError};
pub use oracle::{Equivalence, Oracle, OracleConfig, VariantOutcome, Verification};
pub use pipeline::{Pipeline, PipelineRun};
pub use retrieve::{Corpus, Retriever};
pub use select::{FallbackSelector, Optimized, Origin};
pub use source::{Language, SourceText};

/// Run the canonical passes over a source string and return the result.
pub fn rewrite(source: &str) -> String {
    Pipeline::canonical()
        .run(&SourceText::cpp(source))
        .into_output()
        .as_str()
        .to_string()
}

/// Answer from the corpus when it has a usable neighbour, otherwise
/// rewrite with the canonical pipeline.
pub fn optimize(source: &SourceText, retriever: Option<Arc<Retriever>>) -> Optimized {
    FallbackSelector::new(retriever, Pipeline::canonical()).optimize(source)
}

/// Build and run both programs with the default toolchain (`g++`).
pub async fn verify(
    original: &SourceText,
    rewritten: &SourceText,
) -> Result<Verification, OracleError> {
    Oracle::default().verify(original, rewritten).await
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::retrieve::CorpusEntry;

    const SAMPLE: &str = "inline int square(int x) { return x * x; }\n\nint main() {\n    int a = 2 + 3;\n    if (false) { a = 100; }\n    x = x + 0;\n    return square(4) + square(a);\n}\n";

    #[test]
    fn test_sample_program_rewrites() {
        let out = rewrite(SAMPLE);
        assert!(out.contains("int a = 5;"));
        assert!(out.contains("4 * 4"));
        assert!(out.contains("square(a)"));
        assert!(!out.contains("if (false)"));
        assert!(!out.contains("x = x + 0;"));
        assert!(!out.contains("inline int square"));
    }

    #[test]
    fn test_optimize_prefers_corpus() {
        let retriever = Arc::new(Retriever::new(Corpus::new(vec![CorpusEntry::new(
            SAMPLE,
            "int main() { return 25 + 16; }\n",
        )])));
        let opt = optimize(&SourceText::cpp(SAMPLE), Some(retriever));
        assert_eq!(opt.text.as_str(), "int main() { return 25 + 16; }\n");
        assert!(matches!(opt.origin, Origin::Corpus { index: 0, .. }));

        let fallback = optimize(&SourceText::cpp(SAMPLE), None);
        assert_eq!(fallback.text.as_str(), rewrite(SAMPLE));
    }
}
