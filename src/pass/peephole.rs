use super::Pass;

pub(super) const NAME: &str = "peephole";

const SELF_ADD_ZERO: &str = "x = x + 0;";

/// Drop the literal `x = x + 0;` statement.
///
/// Only that exact spelling is matched. Other variable names are handled by
/// adding passes, not by widening this one.
pub struct Peephole;

impl Pass for Peephole {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, text: &str) -> String {
        text.replace(SELF_ADD_ZERO, "")
    }
}
