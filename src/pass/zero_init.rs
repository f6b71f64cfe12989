use std::collections::HashMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use super::{cached, Pass};

pub(super) const NAME: &str = "drop-zero-init";

/// Remove zero-initialised scalar declarations (`int x = 0;`,
/// `double y = 0.0;`) whose name appears nowhere else in the text.
///
/// Usage is counted lexically over the whole input, so a name shadowed or
/// reused in another scope keeps every declaration of it.
pub struct DropZeroInit;

static ZERO_DECL: OnceLock<Regex> = OnceLock::new();
static IDENT: OnceLock<Regex> = OnceLock::new();

impl Pass for DropZeroInit {
    fn name(&self) -> &'static str {
        NAME
    }

    fn apply(&self, text: &str) -> String {
        let decl = cached(
            &ZERO_DECL,
            r"\b(?:(?:unsigned|signed|long|short)\s+)*(?:int|float|double|char|bool|long|short)\s+([A-Za-z_]\w*)\s*=\s*0(?:\.0)?\s*;",
        );
        if !decl.is_match(text) {
            return text.to_string();
        }

        let ident = cached(&IDENT, r"\b[A-Za-z_]\w*\b");
        let mut uses: HashMap<&str, usize> = HashMap::new();
        for m in ident.find_iter(text) {
            *uses.entry(m.as_str()).or_default() += 1;
        }

        decl.replace_all(text, |caps: &Captures| {
            if uses.get(&caps[1]).copied().unwrap_or(0) > 1 {
                caps[0].to_string()
            } else {
                String::new()
            }
        })
        .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_only_unused_declarations() {
        let src = "int main() {\n    int unused = 0;\n    double ratio = 0.0;\n    long long sum = 0;\n    sum += 2;\n    return sum;\n}\n";
        assert_eq!(
            DropZeroInit.apply(src),
            "int main() {\n    \n    \n    long long sum = 0;\n    sum += 2;\n    return sum;\n}\n"
        );
    }

    #[test]
    fn nonzero_initialisers_are_kept() {
        let src = "int a = 1;\nint b = 00;\nint c = 0.0f;\n";
        assert_eq!(DropZeroInit.apply(src), src);
    }
}
