use std::sync::OnceLock;

use regex::{Captures, Regex};

use super::{cached, Pass};

pub(super) const NAME: &str = "increment-idioms";

/// Rewrite `x = x + 1;` as `x++;` and `x = x - 1;` as `x--;`.
///
/// Both sides must name the same identifier. Member accesses are not
/// recognised: in `p->x = x + 1;` only the trailing `x = x + 1;` is seen.
pub struct IncrementIdioms;

static SELF_STEP: OnceLock<Regex> = OnceLock::new();

impl Pass for IncrementIdioms {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, text: &str) -> String {
        let re = cached(
            &SELF_STEP,
            r"\b([A-Za-z_]\w*)\s*=\s*([A-Za-z_]\w*)\s*([+-])\s*1\s*;",
        );
        re.replace_all(text, |caps: &Captures| step(caps))
            .into_owned()
    }
}

fn step(caps: &Captures) -> String {
    if caps[1] != caps[2] {
        return caps[0].to_string();
    }
    let op = if &caps[3] == "+" { "++" } else { "--" };
    format!("{}{};", &caps[1], op)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_self_increment_and_decrement() {
        assert_eq!(IncrementIdioms.apply("x = x + 1;"), "x++;");
        assert_eq!(IncrementIdioms.apply("count=count-1;"), "count--;");
        assert_eq!(
            IncrementIdioms.apply("i = i + 1; j = j - 1;"),
            "i++; j--;"
        );
    }

    #[test]
    fn different_identifiers_are_left_alone() {
        let src = "y = x + 1;\nx = xs + 1;\nxs = x + 1;";
        assert_eq!(IncrementIdioms.apply(src), src);
    }

    #[test]
    fn other_steps_are_left_alone() {
        let src = "x = x + 10;\nx = x + 1.5;\nx = x * 1;";
        assert_eq!(IncrementIdioms.apply(src), src);
    }
}
