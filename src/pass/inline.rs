use std::sync::OnceLock;

use regex::Regex;

use super::{cached, Pass};

pub(super) const NAME: &str = "inline-expansion";

/// Inline the one-line `inline int square(int v) { ... }` helper.
///
/// The definition is erased and every `square(<integer literal>)` becomes
/// `<n> * <n>`. Calls with any other argument, `square(n)` included, are
/// left as they are even though the definition is gone.
pub struct InlineExpansion;

static DEFINITION: OnceLock<Regex> = OnceLock::new();
static LITERAL_CALL: OnceLock<Regex> = OnceLock::new();

impl Pass for InlineExpansion {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, text: &str) -> String {
        let def = cached(
            &DEFINITION,
            r"inline\s+int\s+square\s*\(int\s+\w+\)\s*\{[^}]*\}",
        );
        let call = cached(&LITERAL_CALL, r"square\s*\(\s*([0-9]+)\s*\)");
        let without_def = def.replace_all(text, "");
        call.replace_all(&without_def, "${1} * ${1}").into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_literal_call_and_drops_helper() {
        let src = "inline int square(int x) { return x * x; }\nint main() { return square(4); }";
        assert_eq!(
            InlineExpansion.apply(src),
            "\nint main() { return 4 * 4; }"
        );
    }

    #[test]
    fn non_literal_call_is_kept() {
        let src = "inline int square(int x) { return x * x; }\nint f(int n) { return square(n) + square( 12 ); }";
        assert_eq!(
            InlineExpansion.apply(src),
            "\nint f(int n) { return square(n) + 12 * 12; }"
        );
    }

    #[test]
    fn other_helpers_are_not_inlined() {
        let src = "inline int cube(int x) { return x * x * x; }\nint y = cube(3);";
        assert_eq!(InlineExpansion.apply(src), src);
    }
}
