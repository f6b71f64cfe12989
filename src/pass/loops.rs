use std::sync::OnceLock;

use regex::Regex;

use super::{cached, Pass};

pub(super) const NAME: &str = "while-to-for";

/// Turn `while (c) { v++; ...` into `for (; c; v++) { ...`.
///
/// Only a loop whose body opens with a bare `v++;` qualifies, and the
/// condition must fit on one line without parentheses. The increment moves
/// from the top of the body to the step clause, so it now runs after the
/// body instead of before it. Opt-in only.
pub struct WhileToFor;

static LEADING_INCREMENT: OnceLock<Regex> = OnceLock::new();

impl Pass for WhileToFor {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, text: &str) -> String {
        let re = cached(
            &LEADING_INCREMENT,
            r"\bwhile\s*\(([^()\n]*)\)\s*\{\s*([A-Za-z_]\w*)\+\+;",
        );
        re.replace_all(text, "for (; ${1}; ${2}++) {").into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_leading_increment_into_step() {
        let src = "while (i < n) {\n    i++;\n    sum += i;\n}\n";
        assert_eq!(
            WhileToFor.apply(src),
            "for (; i < n; i++) {\n    sum += i;\n}\n"
        );
    }

    #[test]
    fn loops_without_leading_increment_are_kept() {
        let src = "while (i < n) { sum += i; i++; }\nwhile (f(i)) { i++; }\n";
        assert_eq!(WhileToFor.apply(src), src);
    }
}
