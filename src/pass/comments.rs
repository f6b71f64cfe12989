use std::sync::OnceLock;

use regex::Regex;

use super::{cached, Pass};

pub(super) const NAME: &str = "strip-comments";

/// Remove `//` and `/* */` comments, then trailing blanks on each line.
///
/// Comment markers inside string literals are not recognised as such.
pub struct StripComments;

static LINE_COMMENT: OnceLock<Regex> = OnceLock::new();
static BLOCK_COMMENT: OnceLock<Regex> = OnceLock::new();
static TRAILING_BLANKS: OnceLock<Regex> = OnceLock::new();

impl Pass for StripComments {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, text: &str) -> String {
        let line = cached(&LINE_COMMENT, r"//[^\n]*");
        let block = cached(&BLOCK_COMMENT, r"(?s)/\*.*?\*/");
        let trailing = cached(&TRAILING_BLANKS, r"(?m)[ \t]+$");

        let out = line.replace_all(text, "");
        let out = block.replace_all(&out, "");
        trailing.replace_all(&out, "").into_owned()
    }
}
