//! Choose between a corpus answer and rule-based rewriting.
//!
//! The selector owns the pipeline and a shared, read-only handle to the
//! retriever. With no retriever (corpus not loaded) every query goes
//! through the pipeline; that degradation is reported in `Origin`, never
//! as an error.

use std::sync::Arc;

use tracing::{info, warn};

use crate::pipeline::{Pipeline, PipelineRun};
use crate::retrieve::{RetrievalVerdict, Retriever};
use crate::source::SourceText;

/// Why a query was answered by the pipeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FallbackReason {
    /// No retriever was supplied, or its corpus is empty.
    CorpusUnavailable,
    /// The nearest entry's optimized text is empty.
    EmptyOptimized { index: usize },
    /// The nearest entry scored below the configured threshold.
    BelowThreshold { index: usize, score: f64 },
}

/// Where an optimized program came from.
#[derive(Clone, Debug)]
pub enum Origin {
    Corpus { index: usize, score: f64 },
    Pipeline {
        run: PipelineRun,
        reason: FallbackReason,
    },
}

#[derive(Clone, Debug)]
pub struct Optimized {
    pub text: SourceText,
    pub origin: Origin,
}

impl Optimized {
    /// Informational flag: the corpus could not be consulted at all.
    pub fn corpus_unavailable(&self) -> bool {
        matches!(
            self.origin,
            Origin::Pipeline {
                reason: FallbackReason::CorpusUnavailable,
                ..
            }
        )
    }

    pub fn run(&self) -> Option<&PipelineRun> {
        match &self.origin {
            Origin::Pipeline { run, .. } => Some(run),
            Origin::Corpus { .. } => None,
        }
    }
}

/// Decision for one verdict, before any pipeline work.
enum Choice<'a> {
    Corpus { index: usize, score: f64, text: &'a str },
    Fallback(FallbackReason),
}

pub struct FallbackSelector {
    retriever: Option<Arc<Retriever>>,
    pipeline: Pipeline,
    min_similarity: Option<f64>,
}

impl FallbackSelector {
    pub fn new(retriever: Option<Arc<Retriever>>, pipeline: Pipeline) -> Self {
        Self {
            retriever,
            pipeline,
            min_similarity: None,
        }
    }

    /// Pipeline only; the corpus is treated as unavailable.
    pub fn rule_based(pipeline: Pipeline) -> Self {
        Self::new(None, pipeline)
    }

    /// Reject neighbours scoring below `threshold`. Without a threshold
    /// any neighbour with a non-empty optimized text is used.
    pub fn with_min_similarity(mut self, threshold: f64) -> Self {
        self.min_similarity = Some(threshold);
        self
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn retriever(&self) -> Option<&Retriever> {
        self.retriever.as_deref()
    }

    /// Nearest corpus entry for `query`, or an empty verdict without a corpus.
    pub fn retrieve(&self, query: &SourceText) -> RetrievalVerdict<'_> {
        match &self.retriever {
            Some(r) => r.retrieve(query),
            None => RetrievalVerdict::unavailable(),
        }
    }

    fn choose<'a>(&self, verdict: &RetrievalVerdict<'a>) -> Choice<'a> {
        let Some(n) = verdict.neighbor else {
            return Choice::Fallback(FallbackReason::CorpusUnavailable);
        };
        if !n.entry.has_optimized() {
            return Choice::Fallback(FallbackReason::EmptyOptimized { index: n.index });
        }
        if let Some(threshold) = self.min_similarity {
            if n.score < threshold {
                return Choice::Fallback(FallbackReason::BelowThreshold {
                    index: n.index,
                    score: n.score,
                });
            }
        }
        Choice::Corpus {
            index: n.index,
            score: n.score,
            text: &n.entry.optimized,
        }
    }

    /// The stored optimized text when the verdict is usable, else the
    /// pipeline's final output for `query`.
    pub fn select(&self, query: &SourceText, verdict: &RetrievalVerdict<'_>) -> SourceText {
        match self.choose(verdict) {
            Choice::Corpus { text, .. } => query.with_text(text),
            Choice::Fallback(_) => self.pipeline.run(query).into_output(),
        }
    }

    /// Retrieve, decide, and (if needed) rewrite, keeping the provenance.
    pub fn optimize(&self, query: &SourceText) -> Optimized {
        let verdict = self.retrieve(query);
        match self.choose(&verdict) {
            Choice::Corpus { index, score, text } => {
                info!(row = index, score, "answered from corpus");
                Optimized {
                    text: query.with_text(text),
                    origin: Origin::Corpus { index, score },
                }
            }
            Choice::Fallback(reason) => {
                if reason == FallbackReason::CorpusUnavailable {
                    warn!("corpus unavailable, using rule-based rewriting");
                } else {
                    info!(?reason, "corpus answer not usable, using rule-based rewriting");
                }
                let run = self.pipeline.run(query);
                Optimized {
                    text: run.output().clone(),
                    origin: Origin::Pipeline { run, reason },
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieve::{Corpus, CorpusEntry};

    fn selector(entries: Vec<CorpusEntry>) -> FallbackSelector {
        let retriever = Arc::new(Retriever::new(Corpus::new(entries)));
        FallbackSelector::new(Some(retriever), Pipeline::canonical())
    }

    #[test]
    fn exact_query_returns_stored_optimized_text() {
        let s = selector(vec![
            CorpusEntry::new("int a = 1 + 1;", "int a = 2;"),
            CorpusEntry::new("while (i < n) { i++; }", "for (; i < n; i++) {}"),
        ]);
        let q = SourceText::cpp("while (i < n) { i++; }");
        let verdict = s.retrieve(&q);
        assert_eq!(s.select(&q, &verdict).as_str(), "for (; i < n; i++) {}");

        let opt = s.optimize(&q);
        assert!(matches!(opt.origin, Origin::Corpus { index: 1, .. }));
        assert!(opt.run().is_none());
    }

    #[test]
    fn no_corpus_matches_pipeline_output() {
        let q = SourceText::cpp("int a = 2 + 3;\nx = x + 0;\n");
        let expected = Pipeline::canonical().run(&q).into_output();

        let rule_based = FallbackSelector::rule_based(Pipeline::canonical());
        assert_eq!(rule_based.select(&q, &RetrievalVerdict::unavailable()), expected);
        let opt = rule_based.optimize(&q);
        assert_eq!(opt.text, expected);
        assert!(opt.corpus_unavailable());

        let empty = selector(Vec::new());
        assert_eq!(empty.optimize(&q).text, expected);
        assert!(empty.optimize(&q).corpus_unavailable());
    }

    #[test]
    fn empty_optimized_text_falls_through() {
        let s = selector(vec![CorpusEntry::new("int a = 2 + 3;", "")]);
        let q = SourceText::cpp("int a = 2 + 3;");
        let opt = s.optimize(&q);
        assert_eq!(opt.text.as_str(), "int a = 5;");
        assert!(matches!(
            opt.origin,
            Origin::Pipeline {
                reason: FallbackReason::EmptyOptimized { index: 0 },
                ..
            }
        ));
        assert!(!opt.corpus_unavailable());
    }

    #[test]
    fn whitespace_optimized_text_is_an_answer() {
        let s = selector(vec![CorpusEntry::new("int a = 2 + 3;", "  \n")]);
        let opt = s.optimize(&SourceText::cpp("int a = 2 + 3;"));
        assert_eq!(opt.text.as_str(), "  \n");
        assert!(matches!(opt.origin, Origin::Corpus { index: 0, .. }));
    }

    #[test]
    fn threshold_rejects_weak_matches() {
        let s = selector(vec![CorpusEntry::new("alpha beta gamma delta", "replacement")])
            .with_min_similarity(0.9);
        let weak = SourceText::cpp("alpha zeta eta theta");
        let opt = s.optimize(&weak);
        assert!(matches!(
            opt.origin,
            Origin::Pipeline {
                reason: FallbackReason::BelowThreshold { .. },
                ..
            }
        ));
        assert_eq!(opt.text, weak);

        let strong = SourceText::cpp("alpha beta gamma delta");
        assert_eq!(s.optimize(&strong).text.as_str(), "replacement");
    }

    #[test]
    fn without_threshold_any_neighbor_is_used() {
        let s = selector(vec![CorpusEntry::new("alpha beta", "stored")]);
        let opt = s.optimize(&SourceText::cpp("completely different text"));
        assert_eq!(opt.text.as_str(), "stored");
    }

    #[test]
    fn corpus_answer_keeps_query_language() {
        let s = selector(vec![CorpusEntry::new("alpha beta", "stored")]);
        let q = SourceText::new("alpha beta", crate::source::Language::C);
        assert_eq!(s.optimize(&q).text.language(), crate::source::Language::C);
    }
}
