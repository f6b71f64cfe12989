//! Nearest-neighbour retrieval over a corpus of known optimizations.
//!
//! The index is built once from a corpus and never changes afterwards;
//! queries only read it, so one `Retriever` can be shared across threads
//! behind an `Arc`.

mod corpus;
pub mod tfidf;

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::debug;

pub use corpus::{Corpus, CorpusEntry};
pub use tfidf::{SparseVector, TfidfVectorizer};

use crate::source::{fingerprint, SourceText};

/// Fitted vectorizer plus one vector per corpus entry, row-aligned.
#[derive(Debug)]
pub struct SimilarityIndex {
    vectorizer: TfidfVectorizer,
    rows: Vec<SparseVector>,
    /// Fingerprint of each original to its first row.
    exact: HashMap<String, usize>,
}

impl SimilarityIndex {
    pub fn build(corpus: &Corpus) -> Self {
        let originals: Vec<&str> = corpus.entries().iter().map(|e| e.original.as_str()).collect();
        let vectorizer = TfidfVectorizer::fit(&originals);
        let rows = vectorizer.transform_all(&originals);

        let mut exact = HashMap::with_capacity(originals.len());
        for (row, text) in originals.iter().enumerate() {
            exact.entry(fingerprint(text)).or_insert(row);
        }

        debug!(
            rows = rows.len(),
            vocabulary = vectorizer.vocabulary_len(),
            "similarity index built"
        );
        Self {
            vectorizer,
            rows,
            exact,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row and cosine similarity of the nearest entry. Ties resolve to the
    /// lowest row.
    pub fn nearest(&self, text: &str) -> Option<(usize, f64)> {
        if self.rows.is_empty() {
            return None;
        }
        if let Some(&row) = self.exact.get(&fingerprint(text)) {
            return Some((row, 1.0));
        }

        let query = self.vectorizer.transform(text);
        self.rows
            .par_iter()
            .enumerate()
            .map(|(row, v)| (row, query.dot(v)))
            .reduce_with(|a, b| {
                if b.1 > a.1 || (b.1 == a.1 && b.0 < a.0) {
                    b
                } else {
                    a
                }
            })
    }
}

/// The closest corpus entry and its score.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor<'a> {
    pub index: usize,
    /// Cosine similarity in `[0, 1]`.
    pub score: f64,
    pub entry: &'a CorpusEntry,
}

/// Outcome of one retrieval; `neighbor` is `None` when there is no corpus
/// to search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetrievalVerdict<'a> {
    pub neighbor: Option<Neighbor<'a>>,
}

impl<'a> RetrievalVerdict<'a> {
    pub fn unavailable() -> Self {
        Self { neighbor: None }
    }

    pub fn score(&self) -> Option<f64> {
        self.neighbor.map(|n| n.score)
    }
}

/// Corpus and index, constructed together at startup.
#[derive(Debug)]
pub struct Retriever {
    corpus: Corpus,
    index: SimilarityIndex,
}

impl Retriever {
    pub fn new(corpus: Corpus) -> Self {
        let index = SimilarityIndex::build(&corpus);
        Self { corpus, index }
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    pub fn is_empty(&self) -> bool {
        self.corpus.is_empty()
    }

    pub fn retrieve(&self, query: &SourceText) -> RetrievalVerdict<'_> {
        let neighbor = self
            .index
            .nearest(query.as_str())
            .and_then(|(index, score)| {
                self.corpus.get(index).map(|entry| Neighbor {
                    index,
                    score,
                    entry,
                })
            });
        if let Some(n) = &neighbor {
            debug!(
                query = %query.short_fingerprint(),
                row = n.index,
                score = n.score,
                "nearest corpus entry"
            );
        }
        RetrievalVerdict { neighbor }
    }
}
