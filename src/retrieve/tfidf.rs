//! Term-frequency / inverse-document-frequency vectors over code tokens.
//!
//! Tokens are runs of two or more word characters after lowercasing.
//! Weights use the smoothed idf `ln((1 + n) / (1 + df)) + 1`, and every
//! vector is L2-normalised, so cosine similarity is a plain dot product.

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use rayon::prelude::*;
use regex::Regex;

static TOKEN: OnceLock<Regex> = OnceLock::new();

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    let re = TOKEN.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("token pattern must be a valid regex"));
    re.find_iter(text).map(|m| m.as_str().to_lowercase())
}

/// Sparse vector: `(term id, weight)` sorted by term id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(u32, f64)>,
}

impl SparseVector {
    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Dot product of two sorted sparse vectors.
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (ti, wi) = self.entries[i];
            let (tj, wj) = other.entries[j];
            match ti.cmp(&tj) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += wi * wj;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    fn normalized(mut entries: Vec<(u32, f64)>) -> Self {
        let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut entries {
                *w /= norm;
            }
        } else {
            entries.clear();
        }
        Self { entries }
    }
}

/// Vocabulary and idf weights fitted on a set of documents.
#[derive(Clone, Debug, Default)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, u32>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Fit on `documents`. Term ids follow sorted token order.
    pub fn fit<S: AsRef<str> + Sync>(documents: &[S]) -> Self {
        let per_doc: Vec<Vec<String>> = documents
            .par_iter()
            .map(|d| {
                let mut seen: Vec<String> = tokens(d.as_ref()).collect();
                seen.sort_unstable();
                seen.dedup();
                seen
            })
            .collect();

        let mut df: BTreeMap<String, usize> = BTreeMap::new();
        for doc in per_doc {
            for term in doc {
                *df.entry(term).or_insert(0) += 1;
            }
        }

        let n = documents.len() as f64;
        let mut vocabulary = HashMap::with_capacity(df.len());
        let mut idf = Vec::with_capacity(df.len());
        for (id, (term, count)) in df.into_iter().enumerate() {
            vocabulary.insert(term, id as u32);
            idf.push(((1.0 + n) / (1.0 + count as f64)).ln() + 1.0);
        }
        Self { vocabulary, idf }
    }

    pub fn vocabulary_len(&self) -> usize {
        self.idf.len()
    }

    pub fn term_id(&self, term: &str) -> Option<u32> {
        self.vocabulary.get(term).copied()
    }

    /// Project text into the fitted space. Unknown tokens are ignored; text
    /// with no known tokens maps to the zero vector.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: BTreeMap<u32, f64> = BTreeMap::new();
        for token in tokens(text) {
            if let Some(&id) = self.vocabulary.get(&token) {
                *counts.entry(id).or_insert(0.0) += 1.0;
            }
        }
        let weighted = counts
            .into_iter()
            .map(|(id, tf)| (id, tf * self.idf[id as usize]))
            .collect();
        SparseVector::normalized(weighted)
    }

    pub fn transform_all<S: AsRef<str> + Sync>(&self, documents: &[S]) -> Vec<SparseVector> {
        documents
            .par_iter()
            .map(|d| self.transform(d.as_ref()))
            .collect()
    }
}
