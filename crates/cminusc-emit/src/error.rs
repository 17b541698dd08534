//! Emitter error vocabulary.

use cminusc_util::Span;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EmitError {
    #[error("redeclaration of variable '{name}' at {span}")]
    VariableRedeclared { name: String, span: Span },

    #[error("redeclaration of function '{name}' at {span} does not match its earlier declaration at {earlier}")]
    FunctionSignatureMismatch {
        name: String,
        span: Span,
        earlier: Span,
    },

    #[error("redefinition of function '{name}' (already defined at {earlier})")]
    FunctionRedefined { name: String, span: Span, earlier: Span },

    #[error("call to undeclared function '{name}' at {span}")]
    UndeclaredFunction { name: String, span: Span },

    #[error("call to '{name}' at {span} passes {given} argument(s), expected {expected}")]
    ArityMismatch {
        name: String,
        given: usize,
        expected: usize,
        span: Span,
    },

    #[error("call to function '{name}' with no existing definition")]
    CalledButNeverDefined { name: String },

    #[error("reference to undeclared identifier '{name}' at {span}")]
    UndeclaredIdentifier { name: String, span: Span },

    #[error("Floats not supported yet (at {span})")]
    FloatUnsupported { span: Span },

    #[error("I/O error writing assembly output: {0}")]
    Io(String),
}

pub type EmitResult<T> = Result<T, EmitError>;
