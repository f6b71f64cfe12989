use std::sync::OnceLock;

use regex::Regex;

use super::{cached, Pass};

pub(super) const NAME: &str = "dead-code-elimination";

/// Remove `if (false) { ... }` blocks.
///
/// The body match is non-greedy and ends at the first `}`, so a nested
/// block inside the dead branch leaves its outer tail behind. That is a
/// known limitation of the lexical rule; a brace-aware variant belongs in
/// a separate pass.
pub struct DeadCodeElimination;

static DEAD_BLOCK: OnceLock<Regex> = OnceLock::new();

impl Pass for DeadCodeElimination {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, text: &str) -> String {
        let re = cached(&DEAD_BLOCK, r"(?s)if\s*\(false\)\s*\{.*?\}");
        re.replace_all(text, "").into_owned()
    }
}
