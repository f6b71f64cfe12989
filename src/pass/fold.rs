use std::sync::OnceLock;

use regex::{Captures, Regex};

use super::{cached, Pass};

pub(super) const NAME: &str = "constant-folding";

/// Fold `A + B` on integer literals into the sum.
///
/// Single left-to-right scan over non-overlapping matches: `1 + 2 + 3`
/// becomes `3 + 3`, not `6`. The match is purely lexical, so digits at the
/// tail of an identifier (`a1 + 2`) fold too. A sum that does not fit in
/// `u128` is left as written. Only ASCII digits count as literals.
pub struct ConstantFolding;

static ADDITION: OnceLock<Regex> = OnceLock::new();

impl Pass for ConstantFolding {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, text: &str) -> String {
        let re = cached(&ADDITION, r"([0-9]+)\s*\+\s*([0-9]+)");
        re.replace_all(text, |caps: &Captures| fold(caps))
            .into_owned()
    }
}

fn fold(caps: &Captures) -> String {
    let lhs = caps[1].parse::<u128>();
    let rhs = caps[2].parse::<u128>();
    match (lhs, rhs) {
        (Ok(a), Ok(b)) => match a.checked_add(b) {
            Some(sum) => sum.to_string(),
            None => caps[0].to_string(),
        },
        _ => caps[0].to_string(),
    }
}
