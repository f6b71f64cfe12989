//! Source-to-source rewrite passes.
//!
//! Every pass is a total function over program text: when its trigger
//! pattern is absent the input comes back unchanged, and no input makes a
//! pass fail. Passes are lexical; they never parse the program.
//!
//! The four canonical passes run in a fixed order (see [`canonical`]).
//! Supplementary passes are opt-in by name and always run after them.

mod blank_lines;
mod comments;
mod containers;
mod dce;
mod fold;
mod increment;
mod inline;
mod loops;
mod peephole;
mod zero_init;

use std::sync::OnceLock;

use regex::Regex;

pub use blank_lines::CollapseBlankLines;
pub use comments::StripComments;
pub use containers::UnorderedContainers;
pub use dce::DeadCodeElimination;
pub use fold::ConstantFolding;
pub use increment::IncrementIdioms;
pub use inline::InlineExpansion;
pub use loops::WhileToFor;
pub use peephole::Peephole;
pub use zero_init::DropZeroInit;

/// One named optimization rule.
///
/// `apply` must be deterministic and total. A pass that finds nothing to do
/// returns its input verbatim.
pub trait Pass: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, text: &str) -> String;
}

// ─── Registry ──────────────────────────────────────────────────────

/// Canonical pass order.
pub fn canonical() -> Vec<Box<dyn Pass>> {
    vec![
        Box::new(ConstantFolding),
        Box::new(DeadCodeElimination),
        Box::new(Peephole),
        Box::new(InlineExpansion),
    ]
}

/// Names of the canonical passes, in pipeline order.
pub const CANONICAL_NAMES: [&str; 4] = [
    fold::NAME,
    dce::NAME,
    peephole::NAME,
    inline::NAME,
];

/// Names accepted by [`by_name`] beyond the canonical set.
pub const SUPPLEMENTARY_NAMES: [&str; 6] = [
    comments::NAME,
    containers::NAME,
    increment::NAME,
    loops::NAME,
    zero_init::NAME,
    blank_lines::NAME,
];

/// Look up any known pass by its name.
pub fn by_name(name: &str) -> Option<Box<dyn Pass>> {
    let pass: Box<dyn Pass> = match name {
        fold::NAME => Box::new(ConstantFolding),
        dce::NAME => Box::new(DeadCodeElimination),
        peephole::NAME => Box::new(Peephole),
        inline::NAME => Box::new(InlineExpansion),
        comments::NAME => Box::new(StripComments),
        containers::NAME => Box::new(UnorderedContainers),
        increment::NAME => Box::new(IncrementIdioms),
        loops::NAME => Box::new(WhileToFor),
        zero_init::NAME => Box::new(DropZeroInit),
        blank_lines::NAME => Box::new(CollapseBlankLines),
        _ => return None,
    };
    Some(pass)
}

/// Compile a fixed pattern once per process.
///
/// Patterns are literals in this module tree; a failure here is a bug in
/// the pattern text, not in user input.
pub(crate) fn cached(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("pass pattern must be a valid regex"))
}
