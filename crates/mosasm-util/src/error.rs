//! Core error types for expression evaluation.
//!
//! Every error raised by the expression engine pairs one of the kinds
//! below with the source position it was detected at.

use thiserror::Error;

use crate::span::Span;

/// The reason an expression failed to lex, parse, or evaluate.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ErrorKind {
    /// A byte that cannot start or continue any token.
    #[error("invalid character")]
    InvalidCharacter,

    /// A string literal with no closing quote before end of line.
    #[error("unterminated string")]
    MissingQuote,

    /// An identifier not present in the symbol table.
    #[error("symbol '{0}' not defined")]
    SymbolNotDefined(String),

    /// The expression produced no value at all.
    #[error("expression is empty")]
    EmptyExpression,

    /// A bracket with no partner, in either direction.
    #[error("mismatched parentheses")]
    MismatchedParentheses,

    /// Wrong number of arguments to a named function.
    #[error("wrong number of parameters")]
    ParameterCount,

    /// Value or operator stack limit exceeded.
    #[error("expression too complex")]
    ExpressionTooComplex,

    /// A number where a string was required, or vice versa.
    #[error("type mismatch")]
    TypeMismatch,

    /// An operator executed with too few operands on the stack.
    #[error("missing value")]
    MissingValue,

    #[error("division by zero")]
    DivisionByZero,

    /// Arithmetic overflow (power).
    #[error("number too big")]
    NumberTooBig,

    /// Domain or range violation: trig, log, exp, sqrt, string bounds,
    /// RND below 1.
    #[error("illegal operation")]
    IllegalOperation,

    /// A double outside the 32-bit integer coercion range.
    #[error("number out of integer range")]
    OutOfIntegerRange,

    /// TIME$ formatting failed or produced nothing.
    #[error("time result too big")]
    TimeResultTooBig,
}

/// An expression error with the position it occurred at.
#[derive(Clone, Debug, PartialEq, Error)]
#[error("{span}: {kind}")]
pub struct ExprError {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Where it went wrong.
    pub span: Span,
}

impl ExprError {
    /// Create a new error at the given position.
    #[inline]
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// True for [`ErrorKind::SymbolNotDefined`], which receives special
    /// treatment on the first assembly pass.
    #[inline]
    pub fn is_symbol_not_defined(&self) -> bool {
        matches!(self.kind, ErrorKind::SymbolNotDefined(_))
    }
}

/// Result type alias for expression engine operations.
pub type ExprResult<T> = std::result::Result<T, ExprError>;
