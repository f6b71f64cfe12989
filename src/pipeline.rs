//! Ordered pass pipeline and its stage record.
//!
//! Stages run strictly in sequence: each pass sees the previous pass's
//! output. Every stage is recorded, including those that change nothing,
//! so the stage list always has one entry per pass in pipeline order.

use tracing::{debug, enabled, Level};

use crate::diff::{diff, StageDiff};
use crate::pass::{self, Pass};
use crate::source::SourceText;

/// One pass application.
#[derive(Clone, Debug)]
pub struct Stage {
    pub index: usize,
    pub pass: &'static str,
    pub before: SourceText,
    pub after: SourceText,
}

impl Stage {
    pub fn changed(&self) -> bool {
        self.before.as_str() != self.after.as_str()
    }

    pub fn diff(&self) -> StageDiff<'_> {
        diff(self.before.as_str(), self.after.as_str())
    }
}

/// The full trail of one pipeline invocation.
#[derive(Clone, Debug)]
pub struct PipelineRun {
    input: SourceText,
    stages: Vec<Stage>,
}

impl PipelineRun {
    pub fn input(&self) -> &SourceText {
        &self.input
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Output of the last stage, or the input when there are no stages.
    pub fn output(&self) -> &SourceText {
        self.stages.last().map_or(&self.input, |s| &s.after)
    }

    pub fn into_output(self) -> SourceText {
        match self.stages.into_iter().last() {
            Some(stage) => stage.after,
            None => self.input,
        }
    }

    /// Per-stage diffs, in stage order.
    pub fn diffs(&self) -> Vec<StageDiff<'_>> {
        self.stages.iter().map(Stage::diff).collect()
    }

    /// Names of the passes that changed the text.
    pub fn effective_passes(&self) -> Vec<&'static str> {
        self.stages
            .iter()
            .filter(|s| s.changed())
            .map(|s| s.pass)
            .collect()
    }
}

/// Fixed, ordered list of passes.
pub struct Pipeline {
    passes: Vec<Box<dyn Pass>>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::canonical()
    }
}

impl Pipeline {
    /// Constant folding, dead-code elimination, peephole, inline expansion.
    pub fn canonical() -> Self {
        Self {
            passes: pass::canonical(),
        }
    }

    pub fn with_passes(passes: Vec<Box<dyn Pass>>) -> Self {
        Self { passes }
    }

    /// Canonical passes followed by `extra`, in the order given.
    pub fn extended(extra: Vec<Box<dyn Pass>>) -> Self {
        let mut passes = pass::canonical();
        passes.extend(extra);
        Self { passes }
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    pub fn run(&self, source: &SourceText) -> PipelineRun {
        let mut stages = Vec::with_capacity(self.passes.len());
        let mut current = source.clone();

        for (index, pass) in self.passes.iter().enumerate() {
            let rewritten = pass.apply(current.as_str());
            let after = if rewritten == current.as_str() {
                current.clone()
            } else {
                current.with_text(rewritten)
            };

            let stage = Stage {
                index,
                pass: pass.name(),
                before: current,
                after: after.clone(),
            };
            if enabled!(Level::DEBUG) {
                log_stage(&stage);
            }
            stages.push(stage);
            current = after;
        }

        PipelineRun {
            input: source.clone(),
            stages,
        }
    }
}

fn log_stage(stage: &Stage) {
    if stage.changed() {
        let d = stage.diff();
        debug!(
            stage = stage.index,
            pass = stage.pass,
            inserted = d.insertions(),
            deleted = d.deletions(),
            "pass rewrote source"
        );
    } else {
        debug!(stage = stage.index, pass = stage.pass, "pass left source unchanged");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pass::{by_name, CANONICAL_NAMES};

    const SAMPLE: &str = "\
inline int square(int x) { return x * x; }
int main() {
    int a = 2 + 3;
    x = x + 0;
    if (false) { a = 9; }
    return square(4) + square(a);
}
";

    #[test]
    fn large_source_with_one_rewrite() {
        let body: String = (0..20_000).map(|i| format!("    int v{i} = {i};\n")).collect();
        let source = SourceText::cpp(format!("int main() {{\n    int a = 2 + 3;\n{body}}}\n"));
        let run = Pipeline::canonical().run(&source);
        assert_eq!(run.effective_passes(), vec!["constant-folding"]);
        let d = run.stages()[0].diff();
        assert_eq!((d.deletions(), d.insertions()), (1, 1));
        assert!(run.output().as_str().starts_with("int main() {\n    int a = 5;\n"));
    }

    #[test]
    fn records_every_stage_in_order() {
        let run = Pipeline::canonical().run(&SourceText::cpp("int main() { return 0; }"));
        let names: Vec<&str> = run.stages().iter().map(|s| s.pass).collect();
        assert_eq!(names, CANONICAL_NAMES);
        assert!(run.effective_passes().is_empty());
        assert_eq!(run.output().as_str(), "int main() { return 0; }");
    }

    #[test]
    fn stages_are_continuous() {
        let run = Pipeline::canonical().run(&SourceText::cpp(SAMPLE));
        assert_eq!(run.stages()[0].before, *run.input());
        for pair in run.stages().windows(2) {
            assert_eq!(pair[0].after, pair[1].before);
        }
        for (i, stage) in run.stages().iter().enumerate() {
            assert_eq!(stage.index, i);
        }
    }

    #[test]
    fn full_pipeline_output() {
        let run = Pipeline::canonical().run(&SourceText::cpp(SAMPLE));
        assert_eq!(
            run.output().as_str(),
            "\nint main() {\n    int a = 5;\n    \n    \n    return 4 * 4 + square(a);\n}\n"
        );
        assert_eq!(run.effective_passes(), CANONICAL_NAMES);
    }

    #[test]
    fn diffs_rebuild_each_stage() {
        let run = Pipeline::canonical().run(&SourceText::cpp(SAMPLE));
        let diffs = run.diffs();
        assert_eq!(diffs.len(), run.stages().len());
        for (stage, d) in run.stages().iter().zip(diffs.iter()) {
            assert_eq!(d.apply(stage.before.as_str()).as_deref(), Some(stage.after.as_str()));
            assert_eq!(d.is_unchanged(), !stage.changed());
        }
    }

    #[test]
    fn empty_pipeline_passes_input_through() {
        let src = SourceText::cpp("a = 1 + 1;");
        let run = Pipeline::with_passes(Vec::new()).run(&src);
        assert!(run.stages().is_empty());
        assert_eq!(run.output(), &src);
        assert_eq!(run.into_output(), src);
    }

    #[test]
    fn extended_passes_run_after_canonical() {
        let extra = vec![by_name("strip-comments").unwrap()];
        let pipeline = Pipeline::extended(extra);
        assert_eq!(pipeline.pass_names().last(), Some(&"strip-comments"));
        let run = pipeline.run(&SourceText::cpp("int a = 1 + 2; // sum\n"));
        assert_eq!(run.output().as_str(), "int a = 3;\n");
    }

    #[test]
    fn language_tag_survives_rewrites() {
        let src = SourceText::new("a = 2 + 3;", crate::source::Language::C);
        let run = Pipeline::canonical().run(&src);
        assert_eq!(run.output().language(), crate::source::Language::C);
    }
}
