//!
//! Diagnostic Module - Rich Error Reporting
//!
//! Renders compile errors with source context using miette. When the unit
//! being compiled names its source file the report shows the offending call
//! with line and column; otherwise only the message is printed.
//!
//! Usage:
//!   let reporter = DiagnosticReporter::new(Some(&source_file));
//!   return Err(reporter.to_report(&err));
//!

use miette::{Diagnostic, LabeledSpan, NamedSource, Report, SourceSpan};
use thiserror::Error;

use crate::error::CompileError;
use crate::source::{SourceFile, Spanned};

#[derive(Debug, Error)]
#[error("{message}")]
pub struct CallDiagnostic {
    message: String,
    src: Option<NamedSource<String>>,
    span: SourceSpan,
    label: String,
    help_text: Option<String>,
}

impl Diagnostic for CallDiagnostic {
    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.src.as_ref().map(|s| s as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        self.src.as_ref()?;
        Some(Box::new(std::iter::once(LabeledSpan::new_primary_with_span(
            Some(self.label.clone()),
            self.span,
        ))))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.help_text
            .as_ref()
            .map(|h| Box::new(h.clone()) as Box<dyn std::fmt::Display>)
    }
}

impl CallDiagnostic {
    pub fn from_compile_error(err: &CompileError, source: Option<&SourceFile>) -> Self {
        let span = err.span();
        let (label, help) = compile_error_details(err);

        let (message, src) = match source {
            Some(file) => {
                let (line, col) = file.line_col(span.start);
                (
                    format!("{} in {} on line {}:{}", err, file.name, line, col),
                    Some(NamedSource::new(&file.name, file.source.clone())),
                )
            }
            None => (err.to_string(), None),
        };

        Self {
            message,
            src,
            span: (span.start as usize, span.len() as usize).into(),
            label,
            help_text: help,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

fn compile_error_details(err: &CompileError) -> (String, Option<String>) {
    match err {
        CompileError::Arity { found, .. } => (
            format!("called with {} parameter(s)", found),
            None,
        ),
        CompileError::IncompatibleDestination { name, ty, .. } => (
            format!("'{}' is declared as {}", name, ty),
            Some(format!("declare '{}' as 'var' to hold the result", name)),
        ),
        CompileError::UndefinedVariable { .. } => (
            "not found in this scope".to_string(),
            Some("check spelling or declare the variable".to_string()),
        ),
        CompileError::MissingDestination { .. } => (
            "result is never stored".to_string(),
            Some("assign the call to a variable".to_string()),
        ),
        CompileError::DuplicateVariable { .. } => (
            "already declared".to_string(),
            Some("rename or remove one of the declarations".to_string()),
        ),
    }
}

pub struct DiagnosticReporter<'a> {
    source: Option<&'a SourceFile>,
}

impl<'a> DiagnosticReporter<'a> {
    pub fn new(source: Option<&'a SourceFile>) -> Self {
        Self { source }
    }

    pub fn to_report(&self, err: &CompileError) -> Report {
        Report::new(CallDiagnostic::from_compile_error(err, self.source))
    }
}
