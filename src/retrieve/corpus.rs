//! Reference corpus of (original, known-optimized) program pairs.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::CorpusError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorpusEntry {
    pub original: String,
    pub optimized: String,
}

impl CorpusEntry {
    pub fn new(original: impl Into<String>, optimized: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            optimized: optimized.into(),
        }
    }

    /// Whether the stored optimized text is usable as an answer.
    pub fn has_optimized(&self) -> bool {
        !self.optimized.is_empty()
    }
}

/// On-disk record shape: the dataset's `code` / `optimized_code` columns.
#[derive(Deserialize)]
struct Record {
    code: Option<String>,
    optimized_code: Option<String>,
}

impl Record {
    fn into_entry(self) -> Option<CorpusEntry> {
        Some(CorpusEntry {
            original: self.code?,
            optimized: self.optimized_code?,
        })
    }
}

/// Read-only list of corpus entries.
#[derive(Clone, Debug, Default)]
pub struct Corpus {
    entries: Vec<CorpusEntry>,
}

impl Corpus {
    pub fn new(entries: Vec<CorpusEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CorpusEntry> {
        self.entries.get(index)
    }

    /// Load a JSON array, JSON Lines or CSV (by `.csv` extension) file of
    /// `{code, optimized_code}` records. Records missing either field (or
    /// holding `null`) are dropped; empty strings are kept in JSON. In CSV
    /// an empty cell counts as missing.
    pub fn load(path: &Path) -> Result<Self, CorpusError> {
        let text = fs::read_to_string(path).map_err(|e| CorpusError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let corpus = Self::parse(&text, path)?;
        info!(path = %path.display(), entries = corpus.len(), "corpus loaded");
        Ok(corpus)
    }

    fn parse(text: &str, path: &Path) -> Result<Self, CorpusError> {
        let records: Vec<Record> = if is_csv(path) {
            csv::Reader::from_reader(text.as_bytes())
                .deserialize()
                .collect::<Result<_, _>>()
                .map_err(|e| CorpusError::Csv {
                    path: path.to_path_buf(),
                    source: e,
                })?
        } else if text.trim_start().starts_with('[') {
            serde_json::from_str(text).map_err(|e| CorpusError::Document {
                path: path.to_path_buf(),
                source: e,
            })?
        } else {
            let mut records = Vec::new();
            for (idx, line) in text.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let record = serde_json::from_str(line).map_err(|e| CorpusError::Record {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    source: e,
                })?;
                records.push(record);
            }
            records
        };

        let total = records.len();
        let entries: Vec<CorpusEntry> = records.into_iter().filter_map(Record::into_entry).collect();
        if entries.len() < total {
            info!(dropped = total - entries.len(), "dropped incomplete corpus records");
        }
        Ok(Self { entries })
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}
