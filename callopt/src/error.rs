///
/// Compile Error Types
///
/// Errors raised while lowering a builtin call. Every error carries the span
/// of the call (or parameter) that caused it so it can be reported once,
/// with its source location, and compilation of that call stops.
///
/// Error categories:
/// - Arity: Too few or too many parameters for the builtin
/// - IncompatibleDestination: Result assigned to a fixed-type variable
/// - UndefinedVariable: Parameter or destination not declared
/// - MissingDestination: No destination and the caller forbade a temporary
/// - DuplicateVariable: Same name declared twice in one unit
///
/// A rule declining a call is not an error; see `optimizer::Outcome`.
///

use thiserror::Error;

use crate::source::{Span, Spanned};
use crate::symbols::VarType;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("'{function}' {requirement}")]
    Arity {
        function: String,
        requirement: String,
        found: usize,
        span: Span,
    },

    #[error("Returned values by functions can only be assigned to variant variables")]
    IncompatibleDestination {
        name: String,
        ty: VarType,
        span: Span,
    },

    #[error("Cannot read variable '{name}' because it wasn't declared")]
    UndefinedVariable { name: String, span: Span },

    #[error("Call to '{function}' has no destination for its result")]
    MissingDestination { function: String, span: Span },

    #[error("Variable '{name}' is already declared")]
    DuplicateVariable { name: String, span: Span },
}

impl CompileError {
    pub fn arity(function: &str, requirement: &str, found: usize, span: Span) -> Self {
        CompileError::Arity {
            function: function.to_string(),
            requirement: requirement.to_string(),
            found,
            span,
        }
    }
}

impl Spanned for CompileError {
    fn span(&self) -> Span {
        match self {
            CompileError::Arity { span, .. }
            | CompileError::IncompatibleDestination { span, .. }
            | CompileError::UndefinedVariable { span, .. }
            | CompileError::MissingDestination { span, .. }
            | CompileError::DuplicateVariable { span, .. } => *span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = CompileError::arity("explode", "requires two parameters", 1, Span::new(4, 20, 0));
        assert_eq!(err.to_string(), "'explode' requires two parameters");
        assert_eq!(err.span(), Span::new(4, 20, 0));

        let err = CompileError::IncompatibleDestination {
            name: "count".to_string(),
            ty: VarType::Int,
            span: Span::dummy(),
        };
        assert!(err.to_string().contains("variant variables"));

        let err = CompileError::UndefinedVariable {
            name: "x".to_string(),
            span: Span::dummy(),
        };
        assert!(err.to_string().contains("'x'"));
        assert!(err.to_string().contains("wasn't declared"));
    }
}
