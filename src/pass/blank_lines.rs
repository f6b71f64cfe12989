use std::sync::OnceLock;

use regex::Regex;

use super::{cached, Pass};

pub(super) const NAME: &str = "collapse-blank-lines";

/// Drop blank lines, including lines holding only spaces or tabs.
pub struct CollapseBlankLines;

static BLANK_RUN: OnceLock<Regex> = OnceLock::new();

impl Pass for CollapseBlankLines {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, text: &str) -> String {
        let re = cached(&BLANK_RUN, r"\n(?:[ \t]*\n)+");
        re.replace_all(text, "\n").into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_runs() {
        assert_eq!(
            CollapseBlankLines.apply("a;\n\n\n  \nb;\n\t\nc;\n"),
            "a;\nb;\nc;\n"
        );
    }

    #[test]
    fn dense_text_is_unchanged() {
        let src = "a;\n  b;\nc;";
        assert_eq!(CollapseBlankLines.apply(src), src);
    }
}
