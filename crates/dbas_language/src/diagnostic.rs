//! Diagnostics shared by every compiler phase.
//!
//! Each phase accumulates [`Diagnostic`] values and keeps going whenever its
//! state stays recoverable; the pipeline halts at the end of the first phase
//! that produced errors and surfaces the full list. A diagnostic renders as:
//!
//! ```text
//! main.dbas: parse error at line 3, column 9: expected THEN, found NEWLINE
//!   3 | IF x > 0
//!               ^
//!   hint: IF statements require THEN
//! ```
//!
//! Diagnostics are `Serialize`, so the CLI can also emit them as JSON for
//! editor integration.

use serde::Serialize;

/// The phase that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Reserved: illegal tokens are tolerated and surface as parse errors.
    Lex,
    Parse,
    Semantic,
    Preprocess,
    Codegen,
    Driver,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Lex => "lex",
            Phase::Parse => "parse",
            Phase::Semantic => "semantic",
            Phase::Preprocess => "preprocess",
            Phase::Codegen => "codegen",
            Phase::Driver => "driver",
        };
        f.write_str(name)
    }
}

/// Error or warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single user-facing message with source context.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub phase: Phase,
    pub severity: Severity,
    pub message: String,
    /// Original file the line maps back to, when known.
    pub file: Option<String>,
    /// 1-based line in `file`; 0 when no location applies.
    pub line: u32,
    /// 1-based column, when known.
    pub col: Option<u32>,
    /// The offending source line, verbatim.
    pub snippet: Option<String>,
    pub hint: Option<String>,
}

impl Diagnostic {
    pub fn error(phase: Phase, message: impl Into<String>) -> Self {
        Diagnostic {
            phase,
            severity: Severity::Error,
            message: message.into(),
            file: None,
            line: 0,
            col: None,
            snippet: None,
            hint: None,
        }
    }

    pub fn warning(phase: Phase, message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            ..Diagnostic::error(phase, message)
        }
    }

    pub fn at(mut self, line: u32, col: Option<u32>) -> Self {
        self.line = line;
        self.col = col;
        self
    }

    pub fn in_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}: ", file)?;
        }
        let kind = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{} {}", self.phase, kind)?;
        if self.line > 0 {
            write!(f, " at line {}", self.line)?;
            if let Some(col) = self.col {
                write!(f, ", column {}", col)?;
            }
        }
        write!(f, ": {}", self.message)?;
        if let Some(snippet) = &self.snippet {
            let prefix = format!("  {} | ", self.line);
            write!(f, "\n{}{}", prefix, snippet)?;
            if let Some(col) = self.col {
                let pad = prefix.len() + col.saturating_sub(1) as usize;
                write!(f, "\n{}^", " ".repeat(pad))?;
            }
        }
        if let Some(hint) = &self.hint {
            write!(f, "\n  hint: {}", hint)?;
        }
        Ok(())
    }
}
