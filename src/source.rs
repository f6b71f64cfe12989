//! Immutable program text with a language tag.
//!
//! Passes never mutate a `SourceText`; each rewrite produces a new one.
//! The text is reference-counted so pipeline stages can share it cheaply.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Target language family. Decides the source file extension handed to the
/// toolchain; passes are lexical and do not look at it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Cpp,
    C,
}

impl Language {
    pub fn extension(self) -> &'static str {
        match self {
            Language::Cpp => "cpp",
            Language::C => "c",
        }
    }

    /// Parse a user-supplied tag ("cpp", "c++", "c").
    pub fn from_tag(tag: &str) -> Option<Language> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "cpp" | "c++" | "cxx" | "cc" => Some(Language::Cpp),
            "c" => Some(Language::C),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SourceText {
    text: Arc<str>,
    language: Language,
}

impl SourceText {
    pub fn new(text: impl Into<Arc<str>>, language: Language) -> Self {
        Self {
            text: text.into(),
            language,
        }
    }

    /// C++ source, the default toolchain target.
    pub fn cpp(text: impl Into<Arc<str>>) -> Self {
        Self::new(text, Language::Cpp)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// A new value with the same language tag and different text.
    pub fn with_text(&self, text: impl Into<Arc<str>>) -> Self {
        Self::new(text, self.language)
    }

    /// Content hash (blake3, hex) of the text alone.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.text)
    }

    /// First 12 hex chars of the fingerprint, for log fields.
    pub fn short_fingerprint(&self) -> String {
        let mut hex = self.fingerprint();
        hex.truncate(12);
        hex
    }
}

/// blake3 hex digest of arbitrary program text.
pub(crate) fn fingerprint(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

impl fmt::Debug for SourceText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceText")
            .field("language", &self.language)
            .field("len", &self.text.len())
            .field("text", &&*self.text)
            .finish()
    }
}

impl fmt::Display for SourceText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<str> for SourceText {
    fn as_ref(&self) -> &str {
        &self.text
    }
}
