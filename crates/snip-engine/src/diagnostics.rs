//! Diagnostics side-channel.
//!
//! Every non-fatal content problem is logged through `tracing` at `warn`
//! level and collected, so callers can both see it in logs and inspect it
//! programmatically (the CLI's `check` command does the latter).

use std::fmt;

use crate::pipeline::Stage;

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(rename_all = "kebab-case")
)]
pub enum DiagnosticKind {
    /// Opener with no closer after it.
    Unterminated,
    /// Closer with no opener before it.
    OrphanedCloser,
    /// A second `{{tooltip-content}}` for a key already defined.
    DuplicateDefinition,
    /// `{{tooltip-title}}` with no matching definition.
    UnresolvedReference,
    /// `{{quote-author}}` with no blockquote to attach to.
    MissingBlockquote,
    /// Reveal-answer block without any `{{correct}}`/`{{wrong}}` marker.
    NoAnswers,
    /// A payload the widget cannot use (unsafe style value, unknown palette).
    InvalidValue,
    /// Announcement bar and content root overlap.
    BoundaryViolation,
    /// No content root on the page.
    MissingRoot,
    /// A builder step failed; the stage was abandoned.
    StageFailed,
}

impl DiagnosticKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unterminated => "unterminated",
            Self::OrphanedCloser => "orphaned-closer",
            Self::DuplicateDefinition => "duplicate-definition",
            Self::UnresolvedReference => "unresolved-reference",
            Self::MissingBlockquote => "missing-blockquote",
            Self::NoAnswers => "no-answers",
            Self::InvalidValue => "invalid-value",
            Self::BoundaryViolation => "boundary-violation",
            Self::MissingRoot => "missing-root",
            Self::StageFailed => "stage-failed",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single reported problem.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Diagnostic {
    pub stage: Stage,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.stage, self.kind, self.message)
    }
}

/// Collector for one pipeline run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Log and record a diagnostic.
    pub fn report(&mut self, stage: Stage, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(stage = %stage, kind = %kind, "{message}");
        self.items.push(Diagnostic {
            stage,
            kind,
            message,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Number of diagnostics of one kind.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.items.iter().filter(|d| d.kind == kind).count()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}
