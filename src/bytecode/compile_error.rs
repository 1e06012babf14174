use thiserror::Error;

use crate::frontend::lexer::Span;

/// What went wrong while compiling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileErrorKind {
    #[error("unknown selector '{0}'")]
    UnknownSelector(String),

    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),

    #[error("too many local variables (max {max})")]
    TooManyLocals { max: usize },

    #[error("expected expression")]
    ExpectedExpression,

    #[error("expected ')'")]
    ExpectedRParen,

    #[error("expected '.'")]
    ExpectedPeriod,

    #[error("string literal too long ({len} bytes, max {max})")]
    StringTooLong { len: usize, max: usize },

    #[error("parentheses nested too deeply (max {max})")]
    NestingTooDeep { max: usize },
}

/// A compile error with the position of the offending token.
///
/// Formats as `line:col: message`, like the rest of the CLI diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{span}: {kind}")]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub span: Span,
}

impl CompileError {
    pub fn new(kind: CompileErrorKind, span: Span) -> Self {
        CompileError { kind, span }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(kind: CompileErrorKind) -> CompileError {
        CompileError::new(kind, Span { line: 2, col: 5 })
    }

    #[test]
    fn test_unknown_selector_display() {
        let msg = at(CompileErrorKind::UnknownSelector("foo".to_string())).to_string();
        assert_eq!(msg, "2:5: unknown selector 'foo'");
    }

    #[test]
    fn test_too_many_locals_display() {
        let msg = at(CompileErrorKind::TooManyLocals { max: 256 }).to_string();
        assert!(msg.contains("too many local variables"));
        assert!(msg.contains("256"));
    }

    #[test]
    fn test_punctuation_messages() {
        assert!(at(CompileErrorKind::ExpectedPeriod).to_string().ends_with("expected '.'"));
        assert!(at(CompileErrorKind::ExpectedRParen).to_string().ends_with("expected ')'"));
    }

    #[test]
    fn test_error_implements_std_error() {
        let err = at(CompileErrorKind::ExpectedExpression);
        let _: &dyn std::error::Error = &err;
    }
}
