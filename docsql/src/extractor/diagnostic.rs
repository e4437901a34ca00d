use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};

/// A recoverable problem found while reading or scanning a source.
#[derive(Debug, Clone)]
pub struct ExtractDiagnostic {
    pub message: String,
    /// Byte span in the source; `None` when the file could not be read at all.
    pub span: Option<Range<usize>>,
    pub file_id: usize,
    pub severity: Severity,
    pub notes: Vec<String>,
}

impl ExtractDiagnostic {
    pub fn warning(message: impl Into<String>, span: Range<usize>, file_id: usize) -> Self {
        ExtractDiagnostic {
            message: message.into(),
            span: Some(span),
            file_id,
            severity: Severity::Warning,
            notes: Vec::new(),
        }
    }

    /// A warning about a file that never made it into the file database.
    pub fn unlocated(message: impl Into<String>) -> Self {
        ExtractDiagnostic {
            message: message.into(),
            span: None,
            file_id: 0,
            severity: Severity::Warning,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let labels = match &self.span {
            Some(span) => vec![Label::primary(self.file_id, span.clone())],
            None => Vec::new(),
        };
        Diagnostic::new(self.severity)
            .with_message(&self.message)
            .with_labels(labels)
            .with_notes(self.notes.clone())
    }
}
