use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Byte range into a source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn dummy() -> Self {
        Self { start: 0, end: 0 }
    }

    pub fn range(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }
}

/// A toolchain diagnostic (error or warning) mapped back onto the source.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    /// 1-based line as reported by the toolchain.
    pub line: usize,
    pub notes: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Diagnostic {
    pub fn error(message: String, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            message,
            span,
            line: 0,
            notes: Vec::new(),
        }
    }

    pub fn warning(message: String, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            message,
            span,
            line: 0,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    fn report<'a>(
        &self,
        filename: &'a str,
        colored: bool,
    ) -> ariadne::Report<'a, (&'a str, Range<usize>)> {
        use ariadne::{Color, Config, Label, Report, ReportKind};

        let kind = match self.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
        };

        let color = match self.severity {
            Severity::Error => Color::Red,
            Severity::Warning => Color::Yellow,
        };

        let mut label = Label::new((filename, self.span.range())).with_message(&self.message);
        if colored {
            label = label.with_color(color);
        }

        let mut report = Report::build(kind, filename, self.span.start as usize)
            .with_config(Config::default().with_color(colored))
            .with_message(&self.message)
            .with_label(label);

        for note in &self.notes {
            report = report.with_note(note);
        }

        report.finish()
    }

    /// Render the diagnostic to stderr using ariadne.
    pub fn render(&self, filename: &str, source: &str) {
        use ariadne::Source;

        if let Err(e) = self
            .report(filename, true)
            .eprint((filename, Source::from(source)))
        {
            tracing::warn!(error = %e, "failed to render diagnostic");
        }
    }

    /// Render without colour, for reports and tests.
    pub fn render_plain(&self, filename: &str, source: &str) -> String {
        use ariadne::Source;

        let mut buf = Vec::new();
        match self
            .report(filename, false)
            .write((filename, Source::from(source)), &mut buf)
        {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.message.clone(),
        }
    }
}

/// Render a list of diagnostics.
pub fn render_diagnostics(diagnostics: &[Diagnostic], filename: &str, source: &str) {
    for diag in diagnostics {
        diag.render(filename, source);
    }
}

// ─── Toolchain Output ──────────────────────────────────────────────

static GCC_LINE: OnceLock<Regex> = OnceLock::new();

/// Parse gcc/clang style diagnostics (`file:line:col: error: message`)
/// out of captured compiler stderr.
///
/// `note:` lines attach to the preceding diagnostic. Lines in any other
/// shape (`In function ...`, caret excerpts) are skipped. Spans cover from
/// the reported column to the end of that line in `source`.
pub fn parse_toolchain_output(stderr: &str, source: &str) -> Vec<Diagnostic> {
    let re = GCC_LINE.get_or_init(|| {
        Regex::new(
            r"^[^:\n]+:(?P<line>\d+):(?:(?P<col>\d+):)?\s*(?P<sev>fatal error|error|warning|note):\s*(?P<msg>.*)$",
        )
        .expect("diagnostic pattern must be a valid regex")
    });

    let mut out: Vec<Diagnostic> = Vec::new();
    for raw in stderr.lines() {
        let Some(caps) = re.captures(raw) else {
            continue;
        };
        let line: usize = caps["line"].parse().unwrap_or(1);
        let col: usize = caps
            .name("col")
            .and_then(|c| c.as_str().parse().ok())
            .unwrap_or(1);
        let message = caps["msg"].trim().to_string();

        let severity = match &caps["sev"] {
            "warning" => Severity::Warning,
            "note" => {
                if let Some(last) = out.last_mut() {
                    last.notes.push(message);
                }
                continue;
            }
            _ => Severity::Error,
        };

        out.push(Diagnostic {
            severity,
            message,
            span: span_at(source, line, col),
            line,
            notes: Vec::new(),
        });
    }
    out
}

/// Byte span from (line, col), both 1-based, to the end of that line.
fn span_at(source: &str, line: usize, col: usize) -> Span {
    let mut offset = 0usize;
    for (idx, text) in source.split_inclusive('\n').enumerate() {
        if idx + 1 == line {
            let body = text.trim_end_matches(['\n', '\r']);
            let start = offset + col.saturating_sub(1).min(body.len());
            let end = (offset + body.len()).max(start);
            return Span::new(start as u32, end as u32);
        }
        offset += text.len();
    }
    let end = source.len() as u32;
    Span::new(end, end)
}
