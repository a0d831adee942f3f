// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Error types, diagnostics, and run reports for the compiler.

use std::fmt;
use std::sync::Arc;

use crate::core::lexicon::Span;

/// Categories of compiler errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScummErrorKind {
    Cli,
    Io,
    Syntax,
    Compile,
    Unsupported,
    Internal,
}

impl ScummErrorKind {
    /// Process exit status contributed by a failure of this kind.
    pub fn exit_code(self) -> i32 {
        match self {
            ScummErrorKind::Cli => 1,
            ScummErrorKind::Syntax | ScummErrorKind::Compile | ScummErrorKind::Unsupported => 2,
            ScummErrorKind::Io | ScummErrorKind::Internal => 3,
        }
    }
}

/// A compiler error with a kind, a message and an optional source span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScummError {
    kind: ScummErrorKind,
    message: String,
    span: Option<Span>,
}

impl ScummError {
    pub fn new(kind: ScummErrorKind, msg: &str, param: Option<&str>) -> Self {
        Self {
            kind,
            message: format_error(msg, param),
            span: None,
        }
    }

    pub fn syntax(msg: impl Into<String>) -> Self {
        Self {
            kind: ScummErrorKind::Syntax,
            message: msg.into(),
            span: None,
        }
    }

    pub fn compile(msg: impl Into<String>) -> Self {
        Self {
            kind: ScummErrorKind::Compile,
            message: msg.into(),
            span: None,
        }
    }

    /// Attach a span unless one is already recorded; the innermost span wins.
    pub fn with_span(mut self, span: Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> ScummErrorKind {
        self.kind
    }

    pub fn span(&self) -> Option<Span> {
        self.span
    }
}

impl fmt::Display for ScummError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ScummError {}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// A diagnostic message with location and context.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub(crate) line: u32,
    pub(crate) column: Option<usize>,
    pub(crate) col_end: Option<usize>,
    pub(crate) code: String,
    pub(crate) severity: Severity,
    pub(crate) error: ScummError,
    pub(crate) file: Option<String>,
    pub(crate) source: Option<String>,
    pub(crate) notes: Vec<String>,
    pub(crate) help: Vec<String>,
}

impl Diagnostic {
    pub fn new(line: u32, severity: Severity, error: ScummError) -> Self {
        Self {
            line,
            column: None,
            col_end: None,
            code: default_diagnostic_code(error.kind()).to_string(),
            severity,
            error,
            file: None,
            source: None,
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    /// Build an error diagnostic positioned at the error's span, if it has one.
    pub fn from_error(error: ScummError) -> Self {
        match error.span() {
            Some(span) => Diagnostic::new(span.line, Severity::Error, error)
                .with_column(Some(span.col_start))
                .with_col_end(Some(span.col_end)),
            None => Diagnostic::new(0, Severity::Error, error),
        }
    }

    pub fn with_column(mut self, column: Option<usize>) -> Self {
        self.column = column;
        self
    }

    pub fn with_col_end(mut self, col_end: Option<usize>) -> Self {
        self.col_end = col_end;
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_file(mut self, file: Option<String>) -> Self {
        self.file = file;
        self
    }

    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.source = source;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }

    pub fn format_with_context(&self, lines: Option<&[String]>, use_color: bool) -> String {
        let sev = match self.severity {
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        };
        let header = match &self.file {
            Some(file) => format!("{file}:{}: {sev} [{}]", self.line, self.code),
            None => format!("{}: {sev} [{}]", self.line, self.code),
        };

        let mut out = String::new();
        out.push_str(&header);
        out.push('\n');

        if self.line > 0 {
            let context = build_context_lines(
                self.line,
                self.column,
                self.col_end,
                lines,
                self.source.as_deref(),
                use_color,
            );
            for line in context {
                out.push_str(&line);
                out.push('\n');
            }
        }

        for note in &self.notes {
            out.push_str("note: ");
            out.push_str(note);
            out.push('\n');
        }

        for help in &self.help {
            out.push_str("help: ");
            out.push_str(help);
            out.push('\n');
        }

        out.push_str(&format!("{sev}: {}", self.error.message()));
        out
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn kind(&self) -> ScummErrorKind {
        self.error.kind()
    }

    pub fn code(&self) -> &str {
        self.code.as_str()
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> Option<usize> {
        self.column
    }

    pub fn col_end(&self) -> Option<usize> {
        self.col_end
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn message(&self) -> &str {
        self.error.message()
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn help(&self) -> &[String] {
        &self.help
    }
}

/// Report from a successful compile of one file, with any warnings.
#[derive(Debug)]
pub struct RunReport {
    input: String,
    output: String,
    block_name: &'static str,
    size: usize,
    diagnostics: Vec<Diagnostic>,
    source_lines: Arc<Vec<String>>,
}

impl RunReport {
    pub fn new(
        input: impl Into<String>,
        output: impl Into<String>,
        block_name: &'static str,
        size: usize,
        diagnostics: Vec<Diagnostic>,
        source_lines: impl Into<Arc<Vec<String>>>,
    ) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            block_name,
            size,
            diagnostics,
            source_lines: source_lines.into(),
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn block_name(&self) -> &'static str {
        self.block_name
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn source_lines(&self) -> &[String] {
        &self.source_lines
    }
}

/// Error from a failed compile of one file, or from invalid invocation.
#[derive(Debug)]
pub struct RunError {
    error: ScummError,
    diagnostics: Vec<Diagnostic>,
    source_lines: Arc<Vec<String>>,
}

impl RunError {
    pub fn new(
        error: ScummError,
        diagnostics: Vec<Diagnostic>,
        source_lines: impl Into<Arc<Vec<String>>>,
    ) -> Self {
        Self {
            error,
            diagnostics,
            source_lines: source_lines.into(),
        }
    }

    pub fn kind(&self) -> ScummErrorKind {
        self.error.kind()
    }

    pub fn exit_code(&self) -> i32 {
        self.error.kind().exit_code()
    }

    pub fn message(&self) -> &str {
        self.error.message()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn source_lines(&self) -> &[String] {
        &self.source_lines
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for RunError {}

/// Build context lines for error display.
pub fn build_context_lines(
    line_num: u32,
    column: Option<usize>,
    col_end: Option<usize>,
    lines: Option<&[String]>,
    source_override: Option<&str>,
    use_color: bool,
) -> Vec<String> {
    let mut out = Vec::new();
    let line_idx = line_num.saturating_sub(1) as usize;

    if let Some(source) = source_override {
        let highlighted = highlight_span(source, column, col_end, use_color);
        out.push(format!("{:>5} | {}", line_num, highlighted));
        return out;
    }

    let line = match lines.and_then(|lines| lines.get(line_idx)) {
        Some(line) => line,
        None => {
            out.push(format!("{:>5} | <source unavailable>", line_num));
            return out;
        }
    };

    out.push(format!(
        "{:>5} | {}",
        line_num,
        highlight_span(line, column, col_end, use_color)
    ));
    if !use_color {
        if let Some(marker) = caret_marker(line, column, col_end) {
            out.push(format!("      | {marker}"));
        }
    }

    out
}

fn highlight_span(
    line: &str,
    column: Option<usize>,
    col_end: Option<usize>,
    use_color: bool,
) -> String {
    crate::core::report::highlight_span(line, column, col_end, use_color)
}

fn caret_marker(line: &str, column: Option<usize>, col_end: Option<usize>) -> Option<String> {
    let start = column.filter(|col| *col > 0)?;
    let end = col_end.unwrap_or(start).max(start);
    let width = line.chars().count().max(start);
    let end = end.min(width.max(start));
    let mut marker = " ".repeat(start - 1);
    marker.push_str(&"^".repeat(end - start + 1));
    Some(marker)
}

fn default_diagnostic_code(kind: ScummErrorKind) -> &'static str {
    match kind {
        ScummErrorKind::Syntax => "scm001",
        ScummErrorKind::Cli => "scm101",
        ScummErrorKind::Compile => "scm201",
        ScummErrorKind::Unsupported => "scm202",
        ScummErrorKind::Io => "scm501",
        ScummErrorKind::Internal => "scm901",
    }
}

/// Format an error message with an optional parameter.
pub fn format_error(msg: &str, param: Option<&str>) -> String {
    match param {
        Some(p) => format!("{msg}: {p}"),
        None => msg.to_string(),
    }
}
