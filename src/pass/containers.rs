use std::sync::OnceLock;

use regex::Regex;

use super::{cached, Pass};

pub(super) const NAME: &str = "unordered-containers";

/// Swap ordered std containers for their hashed counterparts.
///
/// Iteration order changes, so programs that print in container order will
/// diverge under the oracle. Opt-in only.
pub struct UnorderedContainers;

static ORDERED_MAP: OnceLock<Regex> = OnceLock::new();
static ORDERED_SET: OnceLock<Regex> = OnceLock::new();

impl Pass for UnorderedContainers {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, text: &str) -> String {
        let map = cached(&ORDERED_MAP, r"\bstd::map\b");
        let set = cached(&ORDERED_SET, r"\bstd::set\b");
        let out = map.replace_all(text, "std::unordered_map");
        set.replace_all(&out, "std::unordered_set").into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_map_and_set() {
        let src = "std::map<int, int> m; std::set<int> s;";
        assert_eq!(
            UnorderedContainers.apply(src),
            "std::unordered_map<int, int> m; std::unordered_set<int> s;"
        );
    }

    #[test]
    fn respects_identifier_boundaries() {
        let src = "std::multimap<int, int> m; std::set_union(a, b); std::unordered_map<int, int> u;";
        assert_eq!(UnorderedContainers.apply(src), src);
    }
}
